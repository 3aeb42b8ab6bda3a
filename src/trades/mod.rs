use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::PositionChange;
use crate::orders::OrderSide;

/// Immutable record of one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    /// P&L realized by this fill against an existing position.
    pub realized_pnl: Decimal,
    pub position_change: PositionChange,
    pub timestamp: DateTime<Utc>,
    pub strategy: Option<String>,
}

impl Trade {
    /// True if the fill reduced, closed or flipped a position.
    pub fn closes_exposure(&self) -> bool {
        matches!(
            self.position_change,
            PositionChange::Reduced | PositionChange::Closed | PositionChange::Flipped
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub closing_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_realized_pnl: Decimal,
    pub total_commission: Decimal,
    pub net_pnl: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_percent: Decimal,
    pub sharpe_ratio: f64,
}

/// Append-only, chronological.
#[derive(Debug, Default)]
pub struct TradeLog {
    trades: Vec<Trade>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn clear(&mut self) {
        self.trades.clear();
    }

    /// Metrics over the realized balance curve starting at `initial_balance`.
    pub fn metrics(&self, initial_balance: Decimal) -> PerformanceMetrics {
        let mut balance = initial_balance;
        let mut peak = initial_balance;
        let mut max_drawdown = Decimal::ZERO;
        let mut max_drawdown_percent = Decimal::ZERO;
        let mut returns = Vec::new();
        let mut closing_trades = 0;
        let mut winning_trades = 0;
        let mut losing_trades = 0;
        let mut total_realized_pnl = Decimal::ZERO;
        let mut total_commission = Decimal::ZERO;

        for trade in &self.trades {
            let net = trade.realized_pnl - trade.commission;
            if trade.closes_exposure() {
                closing_trades += 1;
                if trade.realized_pnl > Decimal::ZERO {
                    winning_trades += 1;
                } else if trade.realized_pnl < Decimal::ZERO {
                    losing_trades += 1;
                }
                if !balance.is_zero() {
                    if let Some(r) = (net / balance).to_f64() {
                        returns.push(r);
                    }
                }
            }

            total_realized_pnl += trade.realized_pnl;
            total_commission += trade.commission;
            balance += net;

            if balance > peak {
                peak = balance;
            }
            let drawdown = peak - balance;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
                if peak > Decimal::ZERO {
                    max_drawdown_percent = drawdown / peak * Decimal::ONE_HUNDRED;
                }
            }
        }

        let win_rate = if closing_trades == 0 {
            0.0
        } else {
            winning_trades as f64 / closing_trades as f64 * 100.0
        };

        PerformanceMetrics {
            total_trades: self.trades.len(),
            closing_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_realized_pnl,
            total_commission,
            net_pnl: total_realized_pnl - total_commission,
            max_drawdown,
            max_drawdown_percent,
            sharpe_ratio: sharpe_ratio(&returns),
        }
    }
}

/// Per-trade mean over standard deviation, not annualized.
fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return 0.0;
    }

    mean / std_dev
}
