use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::ledger::{Account, Position, PositionSide};
use crate::market_data::Quote;
use crate::orders::{Order, OrderRequest, OrderSide};
use crate::trades::Trade;

pub mod paper_broker;

/// Order-entry and account surface shared by the paper exchange, backtest
/// drivers and live venue adapters.
#[async_trait]
pub trait BrokerAPI: Send + Sync {
    /// Submit order; MARKET orders resolve to FILLED or REJECTED
    async fn submit_order(&self, request: OrderRequest) -> Result<Order>;

    /// Cancel order; false unless it was still pending
    async fn cancel_order(&self, order_id: Uuid) -> Result<bool>;

    /// Get account info
    async fn get_account(&self) -> Result<Account>;

    /// Get positions
    async fn get_positions(&self) -> Result<Vec<Position>>;

    async fn get_orders(&self) -> Result<Vec<Order>>;

    /// Chronological fills
    async fn get_trades(&self) -> Result<Vec<Trade>>;

    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>>;

    /// Oldest-first
    async fn get_price_history(&self, symbol: &str) -> Result<Option<Vec<Decimal>>>;

    async fn reset(&self) -> Result<()>;
}

/// Flattens the open position in `symbol` with an opposite MARKET order.
/// Returns `None` when there is nothing to close.
pub async fn close_position(broker: &dyn BrokerAPI, symbol: &str) -> Result<Option<Order>> {
    let positions = broker.get_positions().await?;
    let Some(position) = positions.iter().find(|p| p.symbol == symbol) else {
        return Ok(None);
    };

    let side = match position.side {
        PositionSide::Long => OrderSide::Sell,
        PositionSide::Short => OrderSide::Buy,
    };
    let order = broker
        .submit_order(OrderRequest::market(symbol, side, position.quantity))
        .await?;
    Ok(Some(order))
}
