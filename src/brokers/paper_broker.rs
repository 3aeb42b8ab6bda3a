use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::brokers::BrokerAPI;
use crate::error::Result;
use crate::ledger::{Account, Position};
use crate::market_data::Quote;
use crate::orders::{Order, OrderRequest};
use crate::session::ExchangeHandle;
use crate::trades::Trade;

#[async_trait]
impl BrokerAPI for ExchangeHandle {
    async fn submit_order(&self, request: OrderRequest) -> Result<Order> {
        ExchangeHandle::submit_order(self, request).await
    }

    async fn cancel_order(&self, order_id: Uuid) -> Result<bool> {
        ExchangeHandle::cancel_order(self, order_id).await
    }

    async fn get_account(&self) -> Result<Account> {
        self.account().await
    }

    async fn get_positions(&self) -> Result<Vec<Position>> {
        self.positions().await
    }

    async fn get_orders(&self) -> Result<Vec<Order>> {
        self.orders().await
    }

    async fn get_trades(&self) -> Result<Vec<Trade>> {
        self.trades().await
    }

    async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        self.quote(symbol).await
    }

    async fn get_price_history(&self, symbol: &str) -> Result<Option<Vec<Decimal>>> {
        self.price_history(symbol).await
    }

    async fn reset(&self) -> Result<()> {
        ExchangeHandle::reset(self).await
    }
}
