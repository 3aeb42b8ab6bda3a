pub mod account;
pub mod position;

pub use account::{Account, AccountLedger};
pub use position::{FillOutcome, Position, PositionChange, PositionLedger, PositionSide};
