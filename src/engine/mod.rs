use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, RejectReason, Result};
use crate::execution::{ExecutionModel, ScheduledFill, Trigger};
use crate::ledger::{Account, AccountLedger, Position, PositionLedger};
use crate::market_data::{MarketDataFeed, Quote};
use crate::orders::{validate_order, Order, OrderRequest, OrderType};
use crate::random::RandomSource;
use crate::trades::{PerformanceMetrics, Trade, TradeLog};

/// What a price change produced once resting orders were re-evaluated.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Orders filled during this step, in evaluation order.
    pub filled: Vec<Order>,
    /// Triggered fills held back for simulated latency.
    pub scheduled: Vec<ScheduledFill>,
}

/// In-memory simulated exchange for one trading session.
///
/// Every mutation goes through `&mut self`, so price updates, order
/// evaluation and fills are applied in one total order. A price change is
/// reflected in position marks before any resting order is checked against it.
pub struct PaperExchange {
    config: EngineConfig,
    feed: MarketDataFeed,
    execution: ExecutionModel,
    orders: HashMap<Uuid, Order>,
    order_sequence: Vec<Uuid>,
    in_flight: HashSet<Uuid>,
    defer_fills: bool,
    positions: PositionLedger,
    account: AccountLedger,
    trades: TradeLog,
    rng: Box<dyn RandomSource>,
}

impl PaperExchange {
    pub fn new(config: EngineConfig, rng: Box<dyn RandomSource>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            feed: MarketDataFeed::new(&config.market)?,
            execution: ExecutionModel::new(config.slippage, config.commission_rate),
            orders: HashMap::new(),
            order_sequence: Vec::new(),
            in_flight: HashSet::new(),
            defer_fills: false,
            positions: PositionLedger::new(),
            account: AccountLedger::new(config.initial_balance, config.margin_multiplier),
            trades: TradeLog::new(),
            rng,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// When set, fills triggered by price changes are returned as
    /// `TickOutcome::scheduled` instead of being applied.
    pub fn set_defer_fills(&mut self, defer: bool) {
        self.defer_fills = defer;
    }

    pub fn add_symbol(
        &mut self,
        symbol: &str,
        initial_price: Decimal,
        volume: Decimal,
    ) -> Result<()> {
        self.feed.add_symbol(symbol, initial_price, volume)
    }

    /// Validates and registers an order. MARKET orders come back with their
    /// priced fill, already marked in flight; resting orders stay PENDING.
    pub fn accept_order(
        &mut self,
        request: OrderRequest,
    ) -> Result<(Order, Option<ScheduledFill>)> {
        let mut order = Order::new(request);
        let order_id = order.id;

        if let Err(reason) = self.check_order(&order) {
            warn!("Rejected order {} for {}: {}", order_id, order.symbol, reason);
            order.reject(&reason);
            self.insert_order(order);
            return Err(EngineError::Rejected { order_id, reason });
        }

        info!(
            "Accepted {:?} {:?} {} {} ({})",
            order.order_type, order.side, order.quantity, order.symbol, order_id
        );

        let scheduled = match (&order.order_type, self.feed.quote(&order.symbol)) {
            (OrderType::Market, Some(quote)) => {
                let price = self
                    .execution
                    .market_price(order.side, quote, self.rng.as_mut());
                self.in_flight.insert(order_id);
                Some(ScheduledFill {
                    order_id,
                    symbol: order.symbol.clone(),
                    quantity: order.quantity,
                    price,
                    priced_at: Utc::now(),
                })
            }
            _ => None,
        };

        self.insert_order(order.clone());
        Ok((order, scheduled))
    }

    /// Submits an order; a MARKET order is filled before this returns.
    pub fn submit_order(&mut self, request: OrderRequest) -> Result<Order> {
        let (order, scheduled) = self.accept_order(request)?;
        match scheduled {
            Some(fill) => Ok(self.apply_scheduled_fill(fill).unwrap_or(order)),
            None => Ok(order),
        }
    }

    /// Applies a previously priced fill if its order is still PENDING.
    /// Returns the order's resulting state, or `None` for an unknown order.
    pub fn apply_scheduled_fill(&mut self, fill: ScheduledFill) -> Option<Order> {
        self.in_flight.remove(&fill.order_id);

        let Some(order) = self.orders.get(&fill.order_id) else {
            warn!("Dropping fill for unknown order {}", fill.order_id);
            return None;
        };
        if !order.is_pending() {
            warn!(
                "Dropping fill for order {} in state {:?}",
                fill.order_id, order.status
            );
            return Some(order.clone());
        }

        self.execute_fill(&fill);
        self.orders.get(&fill.order_id).cloned()
    }

    /// Only a PENDING order can be cancelled; anything else returns false.
    pub fn cancel_order(&mut self, order_id: Uuid) -> bool {
        let cancelled = self
            .orders
            .get_mut(&order_id)
            .map(Order::cancel)
            .unwrap_or(false);

        if cancelled {
            self.in_flight.remove(&order_id);
            info!("Cancelled order {}", order_id);
        }
        cancelled
    }

    /// One simulation step across every tracked symbol.
    pub fn tick(&mut self) -> TickOutcome {
        self.feed.tick(self.rng.as_mut());
        for quote in self.feed.quotes() {
            self.positions.remark(&quote.symbol, quote.price);
        }
        debug!("Tick applied to {} symbols", self.feed.symbols().len());
        self.evaluate_resting_orders()
    }

    /// Applies an external last price for one symbol, then re-evaluates.
    pub fn update_price(&mut self, symbol: &str, price: Decimal) -> Result<TickOutcome> {
        self.feed.update_price(symbol, price)?;
        self.positions.remark(symbol, price);
        debug!("Price update {} -> {}", symbol, price);
        Ok(self.evaluate_resting_orders())
    }

    pub fn account(&self) -> Account {
        self.account.snapshot(self.positions.iter())
    }

    pub fn positions(&self) -> Vec<Position> {
        self.positions.snapshot()
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// All orders, including rejected ones, in submission order.
    pub fn orders(&self) -> Vec<Order> {
        self.order_sequence
            .iter()
            .filter_map(|id| self.orders.get(id).cloned())
            .collect()
    }

    pub fn order(&self, order_id: Uuid) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn trades(&self) -> &[Trade] {
        self.trades.trades()
    }

    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.feed.quote(symbol)
    }

    pub fn price_history(&self, symbol: &str) -> Option<Vec<Decimal>> {
        self.feed.price_history(symbol)
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.trades.metrics(self.config.initial_balance)
    }

    /// Back to the configured balance with no orders, positions or trades.
    /// Market prices are left where they are.
    pub fn reset(&mut self) {
        self.account.reset();
        self.positions.clear();
        self.orders.clear();
        self.order_sequence.clear();
        self.in_flight.clear();
        self.trades.clear();
        info!("Exchange reset to balance {}", self.config.initial_balance);
    }

    fn insert_order(&mut self, order: Order) {
        self.order_sequence.push(order.id);
        self.orders.insert(order.id, order);
    }

    fn check_order(&self, order: &Order) -> std::result::Result<(), RejectReason> {
        validate_order(order, self.config.min_quantity)?;

        let quote = self
            .feed
            .quote(&order.symbol)
            .ok_or_else(|| RejectReason::UnknownSymbol(order.symbol.clone()))?;

        let notional = ExecutionModel::reference_price(order, quote)
            .checked_mul(order.quantity)
            .ok_or(RejectReason::QuantityTooLarge(order.quantity))?;
        let required = notional
            .checked_mul(self.config.margin_multiplier)
            .ok_or(RejectReason::QuantityTooLarge(order.quantity))?;
        // commission is charged on the same notional at fill time
        if notional.checked_mul(self.config.commission_rate).is_none() {
            return Err(RejectReason::QuantityTooLarge(order.quantity));
        }
        let available = self.account().free_margin;
        if required > available {
            return Err(RejectReason::InsufficientMargin {
                required,
                available,
            });
        }

        Ok(())
    }

    /// Checks every resting order in submission order against its quote.
    fn evaluate_resting_orders(&mut self) -> TickOutcome {
        let mut triggered = Vec::new();

        for order_id in &self.order_sequence {
            if self.in_flight.contains(order_id) {
                continue;
            }
            let Some(order) = self.orders.get_mut(order_id) else {
                continue;
            };
            if !order.is_pending() {
                continue;
            }
            let Some(quote) = self.feed.quote(&order.symbol) else {
                continue;
            };

            let mut trigger = self.execution.evaluate(order, quote, self.rng.as_mut());
            if trigger == Trigger::ConvertToLimit {
                order.trigger_stop_limit();
                info!(
                    "Stop triggered for order {} on {} at {}",
                    order.id, order.symbol, quote.price
                );
                trigger = self.execution.evaluate(order, quote, self.rng.as_mut());
            }

            if let Trigger::Fill { price } = trigger {
                debug!("Order {} triggered at {}", order.id, price);
                triggered.push(ScheduledFill {
                    order_id: order.id,
                    symbol: order.symbol.clone(),
                    quantity: order.remaining_quantity(),
                    price,
                    priced_at: Utc::now(),
                });
            }
        }

        let mut outcome = TickOutcome::default();
        if self.defer_fills {
            for fill in &triggered {
                self.in_flight.insert(fill.order_id);
            }
            outcome.scheduled = triggered;
        } else {
            for fill in triggered {
                if let Some(order) = self.apply_scheduled_fill(fill) {
                    outcome.filled.push(order);
                }
            }
        }
        outcome
    }

    fn execute_fill(&mut self, fill: &ScheduledFill) {
        let mark = self
            .feed
            .quote(&fill.symbol)
            .map(|q| q.price)
            .unwrap_or(fill.price);

        let Some(order) = self.orders.get_mut(&fill.order_id) else {
            return;
        };
        order.record_fill(fill.quantity, fill.price);
        let side = order.side;
        let strategy = order.strategy.clone();

        let commission = self.execution.commission(fill.price, fill.quantity);
        self.account.charge_commission(commission);

        let now = Utc::now();
        let outcome = self.positions.apply_fill(
            &fill.symbol,
            side,
            fill.quantity,
            fill.price,
            mark,
            now,
            strategy.as_deref(),
        );
        self.account.realize(outcome.realized_pnl);

        self.trades.append(Trade {
            id: Uuid::new_v4(),
            order_id: fill.order_id,
            symbol: fill.symbol.clone(),
            side,
            quantity: fill.quantity,
            price: fill.price,
            commission,
            realized_pnl: outcome.realized_pnl,
            position_change: outcome.change,
            timestamp: now,
            strategy,
        });

        info!(
            "Filled order {}: {:?} {} {} @ {} | commission {} | realized {} | {:?}",
            fill.order_id,
            side,
            fill.quantity,
            fill.symbol,
            fill.price,
            commission,
            outcome.realized_pnl,
            outcome.change
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MarketConfig, SymbolConfig};
    use crate::ledger::PositionSide;
    use crate::orders::{OrderEventType, OrderSide, OrderStatus};
    use crate::random::{SequenceRandom, StdRandom};
    use rust_decimal_macros::dec;

    fn config() -> EngineConfig {
        EngineConfig {
            initial_balance: dec!(10000),
            commission_rate: dec!(0.001),
            slippage: dec!(0.0005),
            latency_ms: 0,
            margin_multiplier: dec!(0.1),
            min_quantity: dec!(0.001),
            live_ticking: false,
            tick_interval_ms: 1000,
            market: MarketConfig {
                spread_fraction: dec!(0.0002),
                drift: 0.0,
                volatility: 0.002,
                history_capacity: 1000,
                symbols: vec![SymbolConfig {
                    symbol: "BTCUSD".to_string(),
                    initial_price: dec!(43200),
                    volume: dec!(1000),
                }],
            },
        }
    }

    fn exchange() -> PaperExchange {
        PaperExchange::new(config(), Box::new(SequenceRandom::neutral())).unwrap()
    }

    #[test]
    fn test_market_order_fills_synchronously() {
        let mut exchange = exchange();
        let order = exchange
            .submit_order(OrderRequest::market("BTCUSD", OrderSide::Buy, dec!(0.1)))
            .unwrap();

        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.average_fill_price, Some(dec!(43204.32)));
        assert_eq!(exchange.trades().len(), 1);
        let position = exchange.position("BTCUSD").unwrap();
        assert_eq!(position.side, PositionSide::Long);
        assert_eq!(position.entry_price, dec!(43204.32));
    }

    #[test]
    fn test_rejections_are_retained() {
        let mut exchange = exchange();

        let unknown = exchange.submit_order(OrderRequest::market("DOGEUSD", OrderSide::Buy, dec!(1)));
        assert!(matches!(
            unknown,
            Err(EngineError::Rejected {
                reason: RejectReason::UnknownSymbol(_),
                ..
            })
        ));

        let tiny = exchange.submit_order(OrderRequest::market("BTCUSD", OrderSide::Buy, dec!(0.0001)));
        assert!(matches!(
            tiny,
            Err(EngineError::Rejected {
                reason: RejectReason::BelowMinimumQuantity { .. },
                ..
            })
        ));

        let orders = exchange.orders();
        assert_eq!(orders.len(), 2);
        assert!(orders
            .iter()
            .all(|o| matches!(o.status, OrderStatus::Rejected { .. })));
        assert!(exchange.trades().is_empty());
        assert_eq!(exchange.account().balance, dec!(10000));
    }

    #[test]
    fn test_limit_order_rests_until_price_crosses() {
        let mut exchange = exchange();
        let order = exchange
            .submit_order(OrderRequest::limit("BTCUSD", OrderSide::Buy, dec!(0.1), dec!(43000)))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let outcome = exchange.update_price("BTCUSD", dec!(43100)).unwrap();
        assert!(outcome.filled.is_empty());

        // ask = 42990 * 1.0001 = 42994.299 <= 43000
        let outcome = exchange.update_price("BTCUSD", dec!(42990)).unwrap();
        assert_eq!(outcome.filled.len(), 1);
        assert_eq!(outcome.filled[0].average_fill_price, Some(dec!(43000)));
        assert_eq!(exchange.order(order.id).unwrap().status, OrderStatus::Filled);
    }

    #[test]
    fn test_stop_limit_flips_then_waits_for_limit() {
        let mut exchange = exchange();
        // Buy stop at 43500, limit 43400: the stop tick itself is above the limit.
        let order = exchange
            .submit_order(OrderRequest::stop_limit(
                "BTCUSD",
                OrderSide::Buy,
                dec!(0.1),
                dec!(43500),
                dec!(43400),
            ))
            .unwrap();

        let outcome = exchange.update_price("BTCUSD", dec!(43600)).unwrap();
        assert!(outcome.filled.is_empty());
        let resting = exchange.order(order.id).unwrap();
        assert_eq!(resting.order_type, OrderType::Limit { price: dec!(43400) });
        assert!(resting
            .events
            .iter()
            .any(|e| e.event_type == OrderEventType::Triggered));

        let outcome = exchange.update_price("BTCUSD", dec!(43300)).unwrap();
        assert_eq!(outcome.filled.len(), 1);
        assert_eq!(outcome.filled[0].average_fill_price, Some(dec!(43400)));
    }

    #[test]
    fn test_stop_limit_fills_on_flip_tick_when_limit_already_met() {
        let mut exchange = exchange();
        let order = exchange
            .submit_order(OrderRequest::stop_limit(
                "BTCUSD",
                OrderSide::Sell,
                dec!(0.1),
                dec!(43000),
                dec!(42800),
            ))
            .unwrap();

        // last 42950 <= stop, bid 42945.705 >= limit 42800
        let outcome = exchange.update_price("BTCUSD", dec!(42950)).unwrap();
        assert_eq!(outcome.filled.len(), 1);
        assert_eq!(exchange.order(order.id).unwrap().average_fill_price, Some(dec!(42800)));
        assert_eq!(exchange.position("BTCUSD").unwrap().side, PositionSide::Short);
    }

    #[test]
    fn test_resting_orders_fill_in_submission_order() {
        let mut exchange = exchange();
        let first = exchange
            .submit_order(OrderRequest::limit("BTCUSD", OrderSide::Buy, dec!(0.01), dec!(43000)))
            .unwrap();
        let second = exchange
            .submit_order(OrderRequest::stop("BTCUSD", OrderSide::Sell, dec!(0.02), dec!(43100)))
            .unwrap();

        let outcome = exchange.update_price("BTCUSD", dec!(42900)).unwrap();
        let ids: Vec<Uuid> = outcome.filled.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(exchange.trades()[0].order_id, first.id);
        assert_eq!(exchange.trades()[1].order_id, second.id);
    }

    #[test]
    fn test_cancel_only_while_pending() {
        let mut exchange = exchange();
        let resting = exchange
            .submit_order(OrderRequest::limit("BTCUSD", OrderSide::Buy, dec!(0.1), dec!(40000)))
            .unwrap();
        let filled = exchange
            .submit_order(OrderRequest::market("BTCUSD", OrderSide::Buy, dec!(0.01)))
            .unwrap();

        assert!(exchange.cancel_order(resting.id));
        assert!(!exchange.cancel_order(resting.id));

        let before = exchange.account();
        assert!(!exchange.cancel_order(filled.id));
        assert!(!exchange.cancel_order(Uuid::new_v4()));
        assert_eq!(exchange.account(), before);
        assert_eq!(exchange.order(filled.id).unwrap().status, OrderStatus::Filled);

        // A cancelled limit never fills even when crossed.
        let outcome = exchange.update_price("BTCUSD", dec!(39000)).unwrap();
        assert!(outcome.filled.is_empty());
    }

    #[test]
    fn test_trigger_applied_before_cancel_wins() {
        let mut exchange = exchange();
        let order = exchange
            .submit_order(OrderRequest::limit("BTCUSD", OrderSide::Buy, dec!(0.1), dec!(43000)))
            .unwrap();
        exchange.update_price("BTCUSD", dec!(42900)).unwrap();
        assert!(!exchange.cancel_order(order.id));
        assert!(exchange.position("BTCUSD").is_some());
    }

    #[test]
    fn test_cancel_before_deferred_fill_wins() {
        let mut exchange = exchange();
        exchange.set_defer_fills(true);
        let order = exchange
            .submit_order(OrderRequest::limit("BTCUSD", OrderSide::Buy, dec!(0.1), dec!(43000)))
            .unwrap();

        let outcome = exchange.update_price("BTCUSD", dec!(42900)).unwrap();
        assert!(outcome.filled.is_empty());
        assert_eq!(outcome.scheduled.len(), 1);

        // In flight: later ticks must not schedule it twice.
        let again = exchange.update_price("BTCUSD", dec!(42800)).unwrap();
        assert!(again.scheduled.is_empty());

        assert!(exchange.cancel_order(order.id));
        let fill = outcome.scheduled.into_iter().next().unwrap();
        let after = exchange.apply_scheduled_fill(fill).unwrap();
        assert_eq!(after.status, OrderStatus::Cancelled);
        assert!(exchange.position("BTCUSD").is_none());
        assert!(exchange.trades().is_empty());
    }

    #[test]
    fn test_accept_then_apply_market_fill() {
        let mut exchange = exchange();
        let (order, fill) = exchange
            .accept_order(OrderRequest::market("BTCUSD", OrderSide::Sell, dec!(0.1)))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        let fill = fill.unwrap();
        assert_eq!(fill.price, dec!(43195.68));

        // price moves while the fill is in flight; the priced fill stands
        exchange.update_price("BTCUSD", dec!(43500)).unwrap();
        let filled = exchange.apply_scheduled_fill(fill).unwrap();
        assert_eq!(filled.status, OrderStatus::Filled);
        assert_eq!(filled.average_fill_price, Some(dec!(43195.68)));
        let position = exchange.position("BTCUSD").unwrap();
        assert_eq!(position.mark_price, dec!(43500));
    }

    #[test]
    fn test_limit_buy_never_above_limit_under_random_walk() {
        let mut exchange = PaperExchange::new(config(), Box::new(StdRandom::seeded(11))).unwrap();
        let limits = [dec!(43100), dec!(43000), dec!(42900), dec!(43300)];
        for limit in limits {
            exchange
                .submit_order(OrderRequest::limit("BTCUSD", OrderSide::Buy, dec!(0.01), limit))
                .unwrap();
            exchange
                .submit_order(OrderRequest::limit("BTCUSD", OrderSide::Sell, dec!(0.01), limit))
                .unwrap();
        }
        for _ in 0..500 {
            exchange.tick();
        }

        for order in exchange.orders() {
            let (Some(fill), OrderType::Limit { price }) = (order.average_fill_price, &order.order_type)
            else {
                continue;
            };
            match order.side {
                OrderSide::Buy => assert!(fill <= *price),
                OrderSide::Sell => assert!(fill >= *price),
            }
        }
    }

    #[test]
    fn test_equity_tracks_balance_plus_unrealized() {
        let mut exchange = PaperExchange::new(config(), Box::new(StdRandom::seeded(3))).unwrap();
        exchange
            .submit_order(OrderRequest::market("BTCUSD", OrderSide::Buy, dec!(0.05)))
            .unwrap();
        exchange
            .submit_order(OrderRequest::stop("BTCUSD", OrderSide::Sell, dec!(0.08), dec!(43000)))
            .unwrap();

        for _ in 0..300 {
            exchange.tick();
            let account = exchange.account();
            let unrealized: Decimal = exchange.positions().iter().map(|p| p.unrealized_pnl).sum();
            assert_eq!(account.equity, account.balance + unrealized);
            assert_eq!(account.free_margin, account.equity - account.margin);
        }
    }

    #[test]
    fn test_reset() {
        let mut exchange = exchange();
        exchange
            .submit_order(OrderRequest::market("BTCUSD", OrderSide::Buy, dec!(0.1)))
            .unwrap();
        exchange.reset();

        assert!(exchange.orders().is_empty());
        assert!(exchange.positions().is_empty());
        assert!(exchange.trades().is_empty());
        assert_eq!(exchange.account().balance, dec!(10000));
        assert!(exchange.quote("BTCUSD").is_some());
    }

    #[test]
    fn test_unknown_symbol_queries() {
        let mut exchange = exchange();
        assert!(exchange.quote("XRPUSD").is_none());
        assert!(exchange.price_history("XRPUSD").is_none());
        assert!(matches!(
            exchange.update_price("XRPUSD", dec!(1)),
            Err(EngineError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_unvaluable_quantity_is_rejected() {
        let mut exchange = exchange();

        for request in [
            OrderRequest::market("BTCUSD", OrderSide::Buy, Decimal::MAX),
            OrderRequest::limit("BTCUSD", OrderSide::Sell, Decimal::MAX, dec!(43000)),
        ] {
            let result = exchange.submit_order(request);
            assert!(matches!(
                result,
                Err(EngineError::Rejected {
                    reason: RejectReason::QuantityTooLarge(_),
                    ..
                })
            ));
        }

        assert_eq!(exchange.orders().len(), 2);
        assert!(exchange.positions().is_empty());
        assert_eq!(exchange.account().balance, dec!(10000));

        // still usable afterwards
        let order = exchange
            .submit_order(OrderRequest::market("BTCUSD", OrderSide::Buy, dec!(0.1)))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn test_bad_prices_leave_state_untouched() {
        let mut exchange = exchange();
        exchange
            .submit_order(OrderRequest::market("BTCUSD", OrderSide::Buy, dec!(0.1)))
            .unwrap();
        let before = exchange.account();

        for price in [Decimal::ZERO, dec!(-5)] {
            assert!(matches!(
                exchange.update_price("BTCUSD", price),
                Err(EngineError::InvalidPrice { .. })
            ));
        }
        assert!(matches!(
            exchange.add_symbol("SOLUSD", Decimal::ZERO, dec!(100)),
            Err(EngineError::InvalidPrice { .. })
        ));

        assert_eq!(exchange.account(), before);
        assert_eq!(exchange.quote("BTCUSD").unwrap().price, dec!(43200));
        assert!(exchange.quote("SOLUSD").is_none());

        exchange.add_symbol("SOLUSD", dec!(95), dec!(100)).unwrap();
        assert_eq!(exchange.quote("SOLUSD").unwrap().price, dec!(95));
    }
}
