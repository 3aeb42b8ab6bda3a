use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RejectReason;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: Uuid,

    // Core fields
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub order_type: OrderType,

    // State
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub average_fill_price: Option<Decimal>,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub events: Vec<OrderEvent>,

    // Metadata
    pub strategy: Option<String>,
}

/// What a caller submits; identity and state are assigned by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub strategy: Option<String>,
}

impl OrderRequest {
    pub fn market(symbol: &str, side: OrderSide, quantity: Decimal) -> Self {
        Self::new(symbol, side, quantity, OrderType::Market)
    }

    pub fn limit(symbol: &str, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self::new(symbol, side, quantity, OrderType::Limit { price })
    }

    pub fn stop(symbol: &str, side: OrderSide, quantity: Decimal, stop_price: Decimal) -> Self {
        Self::new(symbol, side, quantity, OrderType::Stop { stop_price })
    }

    pub fn stop_limit(
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self::new(
            symbol,
            side,
            quantity,
            OrderType::StopLimit {
                stop_price,
                limit_price,
            },
        )
    }

    pub fn with_strategy(mut self, strategy: &str) -> Self {
        self.strategy = Some(strategy.to_string());
        self
    }

    fn new(symbol: &str, side: OrderSide, quantity: Decimal, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            quantity,
            order_type,
            strategy: None,
        }
    }
}

impl Order {
    pub fn new(request: OrderRequest) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();

        Self {
            id,
            symbol: request.symbol,
            side: request.side,
            quantity: request.quantity,
            order_type: request.order_type,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            average_fill_price: None,
            created_at: now,
            updated_at: now,
            events: vec![OrderEvent {
                event_type: OrderEventType::Created,
                timestamp: now,
                detail: None,
            }],
            strategy: request.strategy,
        }
    }

    pub fn add_event(&mut self, event_type: OrderEventType, detail: Option<String>) {
        let now = Utc::now();
        self.events.push(OrderEvent {
            event_type,
            timestamp: now,
            detail,
        });
        self.updated_at = now;
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    pub fn reject(&mut self, reason: &RejectReason) {
        debug_assert!(self.is_pending(), "only a pending order can be rejected");
        self.status = OrderStatus::Rejected {
            reason: reason.to_string(),
        };
        self.add_event(OrderEventType::Rejected, Some(reason.to_string()));
    }

    /// Returns false if the order had already reached a terminal state.
    pub fn cancel(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        self.add_event(OrderEventType::Cancelled, None);
        true
    }

    /// Stop-limit edge: once the stop condition holds the order becomes a
    /// plain limit order at its limit price. Returns true if converted.
    pub fn trigger_stop_limit(&mut self) -> bool {
        let OrderType::StopLimit {
            stop_price,
            limit_price,
        } = self.order_type
        else {
            return false;
        };
        self.order_type = OrderType::Limit { price: limit_price };
        self.add_event(
            OrderEventType::Triggered,
            Some(format!("stop {} hit, now limit {}", stop_price, limit_price)),
        );
        true
    }

    /// Accumulates a fill; the order becomes FILLED once nothing remains.
    pub fn record_fill(&mut self, quantity: Decimal, price: Decimal) {
        assert!(self.is_pending(), "fill on non-pending order {}", self.id);
        assert!(quantity > Decimal::ZERO, "fill quantity must be positive");
        assert!(
            quantity <= self.remaining_quantity(),
            "fill of {} exceeds remaining {} on order {}",
            quantity,
            self.remaining_quantity(),
            self.id
        );

        let previous_notional =
            self.average_fill_price.unwrap_or(Decimal::ZERO) * self.filled_quantity;
        self.filled_quantity += quantity;
        self.average_fill_price =
            Some((previous_notional + price * quantity) / self.filled_quantity);

        if self.remaining_quantity() == Decimal::ZERO {
            self.status = OrderStatus::Filled;
        }
        self.add_event(
            OrderEventType::Filled,
            Some(format!("{} @ {}", quantity, price)),
        );
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OrderType {
    Market,
    Limit {
        price: Decimal,
    },
    Stop {
        stop_price: Decimal,
    },
    StopLimit {
        stop_price: Decimal,
        limit_price: Decimal,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Rejected { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_type: OrderEventType,
    pub timestamp: DateTime<Utc>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderEventType {
    Created,
    Triggered,
    Filled,
    Cancelled,
    Rejected,
}

// Validation that needs no market state
pub fn validate_order(order: &Order, min_quantity: Decimal) -> Result<(), RejectReason> {
    if order.quantity < min_quantity {
        return Err(RejectReason::BelowMinimumQuantity {
            quantity: order.quantity,
            minimum: min_quantity,
        });
    }

    match &order.order_type {
        OrderType::Limit { price } => {
            if *price <= Decimal::ZERO {
                return Err(RejectReason::InvalidPrice(
                    "limit price must be positive".to_string(),
                ));
            }
        }
        OrderType::Stop { stop_price } => {
            if *stop_price <= Decimal::ZERO {
                return Err(RejectReason::InvalidPrice(
                    "stop price must be positive".to_string(),
                ));
            }
        }
        OrderType::StopLimit {
            stop_price,
            limit_price,
        } => {
            if *stop_price <= Decimal::ZERO || *limit_price <= Decimal::ZERO {
                return Err(RejectReason::InvalidPrice(
                    "stop and limit prices must be positive".to_string(),
                ));
            }
        }
        OrderType::Market => {}
    }

    Ok(())
}
