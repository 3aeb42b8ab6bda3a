use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Why an order submission was refused. The order itself is kept in the
/// order set with `OrderStatus::Rejected`.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("quantity {quantity} is below the minimum lot {minimum}")]
    BelowMinimumQuantity { quantity: Decimal, minimum: Decimal },

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("quantity {0} is too large to value")]
    QuantityTooLarge(Decimal),

    #[error("insufficient margin: required {required}, available {available}")]
    InsufficientMargin { required: Decimal, available: Decimal },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("order {order_id} rejected: {reason}")]
    Rejected { order_id: Uuid, reason: RejectReason },

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: Decimal },

    #[error("order {0} not found")]
    OrderNotFound(Uuid),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("exchange session is closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, EngineError>;
