use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::market_data::Quote;
use crate::orders::{Order, OrderSide, OrderType};
use crate::random::RandomSource;

const PRICE_DP: u32 = 8;

/// Outcome of checking one resting order against a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Hold,
    /// Stop condition of a stop-limit met; the order becomes a limit order.
    ConvertToLimit,
    Fill { price: Decimal },
}

/// A fill that has been priced but not yet applied to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledFill {
    pub order_id: Uuid,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub priced_at: DateTime<Utc>,
}

/// Fill pricing and commission rules.
#[derive(Debug, Clone)]
pub struct ExecutionModel {
    slippage: Decimal,
    commission_rate: Decimal,
}

impl ExecutionModel {
    pub fn new(slippage: Decimal, commission_rate: Decimal) -> Self {
        Self {
            slippage,
            commission_rate,
        }
    }

    /// Opposing side of the spread, perturbed by up to `slippage` either way.
    pub fn market_price(
        &self,
        side: OrderSide,
        quote: &Quote,
        rng: &mut dyn RandomSource,
    ) -> Decimal {
        let base = match side {
            OrderSide::Buy => quote.ask,
            OrderSide::Sell => quote.bid,
        };
        let draw = Decimal::from_f64(rng.next_signed()).unwrap_or(Decimal::ZERO);
        (base * (Decimal::ONE + self.slippage * draw)).round_dp(PRICE_DP)
    }

    pub fn commission(&self, price: Decimal, quantity: Decimal) -> Decimal {
        price * quantity * self.commission_rate
    }

    /// Price used for the margin check at submission.
    pub fn reference_price(order: &Order, quote: &Quote) -> Decimal {
        match order.order_type {
            OrderType::Market => match order.side {
                OrderSide::Buy => quote.ask,
                OrderSide::Sell => quote.bid,
            },
            OrderType::Limit { price } => price,
            OrderType::Stop { stop_price } => stop_price,
            OrderType::StopLimit { limit_price, .. } => limit_price,
        }
    }

    pub fn evaluate(&self, order: &Order, quote: &Quote, rng: &mut dyn RandomSource) -> Trigger {
        match order.order_type {
            OrderType::Market => Trigger::Fill {
                price: self.market_price(order.side, quote, rng),
            },
            OrderType::Limit { price } => {
                if limit_reached(order.side, price, quote) {
                    Trigger::Fill { price }
                } else {
                    Trigger::Hold
                }
            }
            OrderType::Stop { stop_price } => {
                if stop_reached(order.side, stop_price, quote) {
                    Trigger::Fill {
                        price: self.market_price(order.side, quote, rng),
                    }
                } else {
                    Trigger::Hold
                }
            }
            OrderType::StopLimit { stop_price, .. } => {
                if stop_reached(order.side, stop_price, quote) {
                    Trigger::ConvertToLimit
                } else {
                    Trigger::Hold
                }
            }
        }
    }
}

fn limit_reached(side: OrderSide, limit: Decimal, quote: &Quote) -> bool {
    match side {
        OrderSide::Buy => quote.ask <= limit,
        OrderSide::Sell => quote.bid >= limit,
    }
}

fn stop_reached(side: OrderSide, stop: Decimal, quote: &Quote) -> bool {
    match side {
        OrderSide::Buy => quote.price >= stop,
        OrderSide::Sell => quote.price <= stop,
    }
}
