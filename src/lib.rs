//! Simulated paper-trading exchange: a synthetic quote stream, market and
//! resting order execution with slippage and commission, netted positions
//! and a margin account derived from live marks.

pub mod brokers;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod ledger;
pub mod market_data;
pub mod orders;
pub mod random;
pub mod session;
pub mod trades;

pub use brokers::BrokerAPI;
pub use crate::config::{EngineConfig, MarketConfig, SymbolConfig};
pub use engine::{PaperExchange, TickOutcome};
pub use error::{EngineError, RejectReason, Result};
pub use ledger::{Account, Position, PositionSide};
pub use market_data::Quote;
pub use orders::{Order, OrderRequest, OrderSide, OrderStatus, OrderType};
pub use random::{RandomSource, SequenceRandom, StdRandom};
pub use session::{ExchangeHandle, ExchangeSession};
pub use trades::{PerformanceMetrics, Trade};
