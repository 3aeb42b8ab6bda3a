use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::position::Position;

/// Account view. Every field besides the cash totals is derived from the
/// open positions at the moment the snapshot is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub initial_balance: Decimal,
    pub balance: Decimal,
    pub unrealized_pnl: Decimal,
    pub equity: Decimal,
    pub margin: Decimal,
    pub free_margin: Decimal,
    /// equity / margin * 100, or zero with no margin in use.
    pub margin_level: Decimal,
    pub realized_pnl: Decimal,
    pub commission_paid: Decimal,
}

/// Cash side of the account: the only state that is mutated directly.
#[derive(Debug, Clone)]
pub struct AccountLedger {
    initial_balance: Decimal,
    margin_multiplier: Decimal,
    balance: Decimal,
    realized_pnl: Decimal,
    commission_paid: Decimal,
}

impl AccountLedger {
    pub fn new(initial_balance: Decimal, margin_multiplier: Decimal) -> Self {
        Self {
            initial_balance,
            margin_multiplier,
            balance: initial_balance,
            realized_pnl: Decimal::ZERO,
            commission_paid: Decimal::ZERO,
        }
    }

    pub fn charge_commission(&mut self, commission: Decimal) {
        debug_assert!(commission >= Decimal::ZERO, "negative commission");
        self.balance -= commission;
        self.commission_paid += commission;
    }

    pub fn realize(&mut self, pnl: Decimal) {
        self.balance += pnl;
        self.realized_pnl += pnl;
    }

    pub fn reset(&mut self) {
        self.balance = self.initial_balance;
        self.realized_pnl = Decimal::ZERO;
        self.commission_paid = Decimal::ZERO;
    }

    pub fn snapshot<'a>(&self, positions: impl IntoIterator<Item = &'a Position>) -> Account {
        let (unrealized_pnl, margin) = positions.into_iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(unrealized, margin), position| {
                (
                    unrealized + position.unrealized_pnl,
                    margin + position.required_margin(self.margin_multiplier),
                )
            },
        );

        let equity = self.balance + unrealized_pnl;
        let margin_level = if margin > Decimal::ZERO {
            equity / margin * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Account {
            initial_balance: self.initial_balance,
            balance: self.balance,
            unrealized_pnl,
            equity,
            margin,
            free_margin: equity - margin,
            margin_level,
            realized_pnl: self.realized_pnl,
            commission_paid: self.commission_paid,
        }
    }
}
