use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::PaperExchange;
use crate::error::{EngineError, Result};
use crate::execution::ScheduledFill;
use crate::ledger::{Account, Position};
use crate::market_data::Quote;
use crate::orders::{Order, OrderRequest};
use crate::trades::{PerformanceMetrics, Trade};

const COMMAND_BUFFER: usize = 256;

enum Command {
    Submit {
        request: OrderRequest,
        reply: oneshot::Sender<Result<Order>>,
    },
    ApplyFill {
        fill: ScheduledFill,
        reply: Option<oneshot::Sender<Result<Order>>>,
    },
    Cancel {
        order_id: Uuid,
        reply: oneshot::Sender<bool>,
    },
    Tick {
        reply: oneshot::Sender<Vec<Order>>,
    },
    UpdatePrice {
        symbol: String,
        price: Decimal,
        reply: oneshot::Sender<Result<Vec<Order>>>,
    },
    Account {
        reply: oneshot::Sender<Account>,
    },
    Positions {
        reply: oneshot::Sender<Vec<Position>>,
    },
    Orders {
        reply: oneshot::Sender<Vec<Order>>,
    },
    Trades {
        reply: oneshot::Sender<Vec<Trade>>,
    },
    Quote {
        symbol: String,
        reply: oneshot::Sender<Option<Quote>>,
    },
    PriceHistory {
        symbol: String,
        reply: oneshot::Sender<Option<Vec<Decimal>>>,
    },
    Metrics {
        reply: oneshot::Sender<PerformanceMetrics>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Runs a `PaperExchange` on its own task. All commands and live ticks are
/// processed one at a time by that task.
pub struct ExchangeSession;

impl ExchangeSession {
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut exchange: PaperExchange) -> (ExchangeHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let latency = exchange.config().latency();
        let tick_interval = exchange.config().tick_interval();
        let live_ticking = exchange.config().live_ticking;
        exchange.set_defer_fills(!latency.is_zero());

        let actor = ExchangeActor {
            exchange,
            commands: rx,
            loopback: tx.downgrade(),
            latency,
        };
        let task = tokio::spawn(actor.run(live_ticking, tick_interval));

        (ExchangeHandle { tx }, task)
    }
}

struct ExchangeActor {
    exchange: PaperExchange,
    commands: mpsc::Receiver<Command>,
    loopback: mpsc::WeakSender<Command>,
    latency: Duration,
}

impl ExchangeActor {
    async fn run(mut self, live_ticking: bool, tick_interval: Duration) {
        info!(
            "Exchange session started (live ticking: {}, latency: {:?})",
            live_ticking, self.latency
        );

        let mut interval = tokio::time::interval(tick_interval.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = interval.tick(), if live_ticking => {
                    let outcome = self.exchange.tick();
                    self.schedule_all(outcome.scheduled);
                }
            }
        }

        info!("Exchange session stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Submit { request, reply } => self.submit(request, reply),
            Command::ApplyFill { fill, reply } => {
                let order_id = fill.order_id;
                let order = self.exchange.apply_scheduled_fill(fill);
                if let Some(reply) = reply {
                    let _ = reply.send(order.ok_or(EngineError::OrderNotFound(order_id)));
                }
            }
            Command::Cancel { order_id, reply } => {
                let _ = reply.send(self.exchange.cancel_order(order_id));
            }
            Command::Tick { reply } => {
                let outcome = self.exchange.tick();
                self.schedule_all(outcome.scheduled);
                let _ = reply.send(outcome.filled);
            }
            Command::UpdatePrice {
                symbol,
                price,
                reply,
            } => {
                let result = self.exchange.update_price(&symbol, price).map(|outcome| {
                    self.schedule_all(outcome.scheduled);
                    outcome.filled
                });
                let _ = reply.send(result);
            }
            Command::Account { reply } => {
                let _ = reply.send(self.exchange.account());
            }
            Command::Positions { reply } => {
                let _ = reply.send(self.exchange.positions());
            }
            Command::Orders { reply } => {
                let _ = reply.send(self.exchange.orders());
            }
            Command::Trades { reply } => {
                let _ = reply.send(self.exchange.trades().to_vec());
            }
            Command::Quote { symbol, reply } => {
                let _ = reply.send(self.exchange.quote(&symbol).cloned());
            }
            Command::PriceHistory { symbol, reply } => {
                let _ = reply.send(self.exchange.price_history(&symbol));
            }
            Command::Metrics { reply } => {
                let _ = reply.send(self.exchange.metrics());
            }
            Command::Reset { reply } => {
                self.exchange.reset();
                let _ = reply.send(());
            }
            Command::Shutdown => {}
        }
    }

    /// MARKET orders are priced now; with latency the fill is applied by
    /// the actor later and the caller is answered from `ApplyFill`.
    fn submit(&mut self, request: OrderRequest, reply: oneshot::Sender<Result<Order>>) {
        if self.latency.is_zero() {
            let _ = reply.send(self.exchange.submit_order(request));
            return;
        }

        match self.exchange.accept_order(request) {
            Ok((_, Some(fill))) => self.schedule(fill, Some(reply)),
            Ok((order, None)) => {
                let _ = reply.send(Ok(order));
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        }
    }

    fn schedule_all(&self, fills: Vec<ScheduledFill>) {
        for fill in fills {
            self.schedule(fill, None);
        }
    }

    /// Delays a fill without holding up the tick loop. The fill is applied
    /// whether or not anyone is still waiting on `reply`.
    fn schedule(&self, fill: ScheduledFill, reply: Option<oneshot::Sender<Result<Order>>>) {
        let Some(tx) = self.loopback.upgrade() else {
            warn!("Session closing, dropping fill for order {}", fill.order_id);
            return;
        };
        let delay = self.latency;
        debug!("Fill for order {} scheduled in {:?}", fill.order_id, delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Command::ApplyFill { fill, reply }).await;
        });
    }
}

/// Cloneable front door to a running session.
#[derive(Clone)]
pub struct ExchangeHandle {
    tx: mpsc::Sender<Command>,
}

impl ExchangeHandle {
    /// Resolves once the order is FILLED, REJECTED, or resting as PENDING.
    /// A MARKET order cancelled while its fill is in flight comes back
    /// CANCELLED. Dropping the returned future does not stop the fill.
    pub async fn submit_order(&self, request: OrderRequest) -> Result<Order> {
        self.call(|reply| Command::Submit { request, reply })
            .await?
    }

    pub async fn cancel_order(&self, order_id: Uuid) -> Result<bool> {
        self.call(|reply| Command::Cancel { order_id, reply }).await
    }

    /// Forces one simulation step; returns orders filled by it.
    pub async fn tick(&self) -> Result<Vec<Order>> {
        self.call(|reply| Command::Tick { reply }).await
    }

    pub async fn update_price(&self, symbol: &str, price: Decimal) -> Result<Vec<Order>> {
        let symbol = symbol.to_string();
        self.call(|reply| Command::UpdatePrice {
            symbol,
            price,
            reply,
        })
        .await?
    }

    pub async fn account(&self) -> Result<Account> {
        self.call(|reply| Command::Account { reply }).await
    }

    pub async fn positions(&self) -> Result<Vec<Position>> {
        self.call(|reply| Command::Positions { reply }).await
    }

    pub async fn orders(&self) -> Result<Vec<Order>> {
        self.call(|reply| Command::Orders { reply }).await
    }

    pub async fn trades(&self) -> Result<Vec<Trade>> {
        self.call(|reply| Command::Trades { reply }).await
    }

    pub async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let symbol = symbol.to_string();
        self.call(|reply| Command::Quote { symbol, reply }).await
    }

    pub async fn price_history(&self, symbol: &str) -> Result<Option<Vec<Decimal>>> {
        let symbol = symbol.to_string();
        self.call(|reply| Command::PriceHistory { symbol, reply })
            .await
    }

    pub async fn metrics(&self) -> Result<PerformanceMetrics> {
        self.call(|reply| Command::Metrics { reply }).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.call(|reply| Command::Reset { reply }).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| EngineError::SessionClosed)
    }

    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| EngineError::SessionClosed)?;
        response.await.map_err(|_| EngineError::SessionClosed)
    }
}
