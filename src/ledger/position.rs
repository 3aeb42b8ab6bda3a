use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::orders::OrderSide;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn sign(self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// True if an order on `side` adds to a position on this side.
    pub fn is_increased_by(self, side: OrderSide) -> bool {
        matches!(
            (self, side),
            (PositionSide::Long, OrderSide::Buy) | (PositionSide::Short, OrderSide::Sell)
        )
    }
}

impl From<OrderSide> for PositionSide {
    fn from(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => PositionSide::Long,
            OrderSide::Sell => PositionSide::Short,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: Decimal,
    /// Volume-weighted average cost of the open quantity.
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_percent: Decimal,
    pub opened_at: DateTime<Utc>,
    pub strategy: Option<String>,
}

impl Position {
    fn open(
        symbol: &str,
        side: PositionSide,
        quantity: Decimal,
        price: Decimal,
        timestamp: DateTime<Utc>,
        strategy: Option<&str>,
    ) -> Self {
        let mut position = Self {
            symbol: symbol.to_string(),
            side,
            quantity,
            entry_price: price,
            mark_price: price,
            unrealized_pnl: Decimal::ZERO,
            unrealized_pnl_percent: Decimal::ZERO,
            opened_at: timestamp,
            strategy: strategy.map(str::to_string),
        };
        position.remark(price);
        position
    }

    pub fn remark(&mut self, mark: Decimal) {
        self.mark_price = mark;
        self.unrealized_pnl = (mark - self.entry_price) * self.quantity * self.side.sign();
        let cost = self.entry_price * self.quantity;
        self.unrealized_pnl_percent = if cost.is_zero() {
            Decimal::ZERO
        } else {
            self.unrealized_pnl / cost * Decimal::ONE_HUNDRED
        };
    }

    pub fn required_margin(&self, margin_multiplier: Decimal) -> Decimal {
        self.entry_price * self.quantity * margin_multiplier
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionChange {
    Opened,
    Increased,
    Reduced,
    Closed,
    Flipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    pub change: PositionChange,
    /// P&L realized on the closed portion; zero when nothing was closed.
    pub realized_pnl: Decimal,
}

/// Netted positions, at most one per symbol.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Snapshot ordered by symbol.
    pub fn snapshot(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }

    pub fn remark(&mut self, symbol: &str, mark: Decimal) {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.remark(mark);
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Applies one fill to the symbol's position: open, increase, reduce,
    /// close or flip. `mark` is the current reference price for revaluation.
    pub fn apply_fill(
        &mut self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        mark: Decimal,
        timestamp: DateTime<Utc>,
        strategy: Option<&str>,
    ) -> FillOutcome {
        assert!(quantity > Decimal::ZERO, "fill quantity must be positive");
        assert!(price > Decimal::ZERO, "fill price must be positive");

        let Some(existing) = self.positions.get_mut(symbol) else {
            let mut position =
                Position::open(symbol, side.into(), quantity, price, timestamp, strategy);
            position.remark(mark);
            tracing::info!(
                "Opened {:?} {} {} @ {}",
                position.side,
                quantity,
                symbol,
                price
            );
            self.positions.insert(symbol.to_string(), position);
            return FillOutcome {
                change: PositionChange::Opened,
                realized_pnl: Decimal::ZERO,
            };
        };

        if existing.side.is_increased_by(side) {
            let total = existing.quantity + quantity;
            existing.entry_price =
                (existing.entry_price * existing.quantity + price * quantity) / total;
            existing.quantity = total;
            existing.remark(mark);
            tracing::info!(
                "Increased {:?} {} to {} (avg entry {})",
                existing.side,
                symbol,
                existing.quantity,
                existing.entry_price
            );
            return FillOutcome {
                change: PositionChange::Increased,
                realized_pnl: Decimal::ZERO,
            };
        }

        let closed_quantity = existing.quantity.min(quantity);
        let realized_pnl =
            (price - existing.entry_price) * closed_quantity * existing.side.sign();

        if quantity < existing.quantity {
            existing.quantity -= quantity;
            existing.remark(mark);
            tracing::info!(
                "Reduced {:?} {} to {} | realized {}",
                existing.side,
                symbol,
                existing.quantity,
                realized_pnl
            );
            return FillOutcome {
                change: PositionChange::Reduced,
                realized_pnl,
            };
        }

        let closed_side = existing.side;
        let leftover = quantity - existing.quantity;
        self.positions.remove(symbol);

        if leftover.is_zero() {
            tracing::info!("Closed {:?} {} | realized {}", closed_side, symbol, realized_pnl);
            return FillOutcome {
                change: PositionChange::Closed,
                realized_pnl,
            };
        }

        let mut flipped = Position::open(symbol, side.into(), leftover, price, timestamp, strategy);
        flipped.remark(mark);
        tracing::info!(
            "Flipped {} from {:?} to {:?} {} @ {} | realized {}",
            symbol,
            closed_side,
            flipped.side,
            leftover,
            price,
            realized_pnl
        );
        self.positions.insert(symbol.to_string(), flipped);
        FillOutcome {
            change: PositionChange::Flipped,
            realized_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fill(
        ledger: &mut PositionLedger,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> FillOutcome {
        ledger.apply_fill("ETHUSD", side, quantity, price, price, Utc::now(), None)
    }

    #[test]
    fn test_open_from_flat() {
        let mut ledger = PositionLedger::new();
        let outcome = fill(&mut ledger, OrderSide::Sell, dec!(2), dec!(2500));

        assert_eq!(outcome.change, PositionChange::Opened);
        assert_eq!(outcome.realized_pnl, Decimal::ZERO);
        let position = ledger.get("ETHUSD").unwrap();
        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.entry_price, dec!(2500));
    }

    #[test]
    fn test_increase_uses_weighted_average() {
        let mut ledger = PositionLedger::new();
        fill(&mut ledger, OrderSide::Buy, dec!(1), dec!(2500));
        let outcome = fill(&mut ledger, OrderSide::Buy, dec!(3), dec!(2600));

        assert_eq!(outcome.change, PositionChange::Increased);
        let position = ledger.get("ETHUSD").unwrap();
        assert_eq!(position.quantity, dec!(4));
        assert_eq!(
            position.entry_price,
            (dec!(2500) * dec!(1) + dec!(2600) * dec!(3)) / dec!(4)
        );
        assert_eq!(position.entry_price, dec!(2575));
    }

    #[test]
    fn test_partial_close_keeps_entry() {
        let mut ledger = PositionLedger::new();
        fill(&mut ledger, OrderSide::Buy, dec!(2), dec!(2500));
        let outcome = fill(&mut ledger, OrderSide::Sell, dec!(0.5), dec!(2700));

        assert_eq!(outcome.change, PositionChange::Reduced);
        assert_eq!(outcome.realized_pnl, dec!(100));
        let position = ledger.get("ETHUSD").unwrap();
        assert_eq!(position.quantity, dec!(1.5));
        assert_eq!(position.entry_price, dec!(2500));
    }

    #[test]
    fn test_full_close_removes_position() {
        let mut ledger = PositionLedger::new();
        fill(&mut ledger, OrderSide::Sell, dec!(1), dec!(2500));
        let outcome = fill(&mut ledger, OrderSide::Buy, dec!(1), dec!(2450));

        assert_eq!(outcome.change, PositionChange::Closed);
        assert_eq!(outcome.realized_pnl, dec!(50));
        assert!(ledger.get("ETHUSD").is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_flip_opens_opposite_side_at_fill_price() {
        let mut ledger = PositionLedger::new();
        fill(&mut ledger, OrderSide::Buy, dec!(1.0), dec!(2500));
        let outcome = fill(&mut ledger, OrderSide::Sell, dec!(1.5), dec!(2600));

        assert_eq!(outcome.change, PositionChange::Flipped);
        assert_eq!(outcome.realized_pnl, dec!(100));
        let position = ledger.get("ETHUSD").unwrap();
        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.quantity, dec!(0.5));
        assert_eq!(position.entry_price, dec!(2600));
    }

    #[test]
    fn test_reopen_after_close_is_fresh() {
        let mut ledger = PositionLedger::new();
        fill(&mut ledger, OrderSide::Buy, dec!(1), dec!(2500));
        fill(&mut ledger, OrderSide::Sell, dec!(1), dec!(2550));
        let outcome = fill(&mut ledger, OrderSide::Buy, dec!(1), dec!(2700));

        assert_eq!(outcome.change, PositionChange::Opened);
        assert_eq!(ledger.get("ETHUSD").unwrap().entry_price, dec!(2700));
    }

    #[test]
    fn test_quantity_never_negative_and_no_zero_rows() {
        let mut ledger = PositionLedger::new();
        let steps = [
            (OrderSide::Buy, dec!(1)),
            (OrderSide::Sell, dec!(0.4)),
            (OrderSide::Sell, dec!(0.6)),
            (OrderSide::Sell, dec!(2)),
            (OrderSide::Buy, dec!(0.5)),
            (OrderSide::Buy, dec!(3)),
            (OrderSide::Sell, dec!(1.5)),
        ];
        for (side, quantity) in steps {
            fill(&mut ledger, side, quantity, dec!(2500));
            match ledger.get("ETHUSD") {
                Some(position) => assert!(position.quantity > Decimal::ZERO),
                None => assert!(ledger.is_empty()),
            }
        }
        // +1 -0.4 -0.6 -2 +0.5 +3 -1.5 = 0
        assert!(ledger.get("ETHUSD").is_none());
    }

    #[test]
    fn test_remark_unrealized_sign() {
        let mut ledger = PositionLedger::new();
        fill(&mut ledger, OrderSide::Sell, dec!(2), dec!(100));
        ledger.remark("ETHUSD", dec!(90));
        let position = ledger.get("ETHUSD").unwrap();
        assert_eq!(position.unrealized_pnl, dec!(20));
        assert_eq!(position.unrealized_pnl_percent, dec!(10));
    }
}
