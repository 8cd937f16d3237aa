//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (income/expense/transfer/adjustment/shortfall cover), keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Money;

/// Common metadata for transaction creation.
#[derive(Clone, Debug)]
pub struct TxMeta {
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TxMeta {
    #[must_use]
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            category_id: None,
            note: None,
            created_at,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Record an income on an account.
#[derive(Clone, Debug)]
pub struct IncomeCmd {
    pub owner_id: String,
    pub to_account_id: Uuid,
    pub amount: Money,
    pub meta: TxMeta,
}

impl IncomeCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        to_account_id: Uuid,
        amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            to_account_id,
            amount,
            meta: TxMeta::new(created_at),
        }
    }

    #[must_use]
    pub fn meta(mut self, meta: TxMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Record an expense on an account. Fails if the amount exceeds the
/// account's spendable balance.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub owner_id: String,
    pub from_account_id: Uuid,
    pub amount: Money,
    pub meta: TxMeta,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        from_account_id: Uuid,
        amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            from_account_id,
            amount,
            meta: TxMeta::new(created_at),
        }
    }

    #[must_use]
    pub fn meta(mut self, meta: TxMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Move money between two accounts of the same currency.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub owner_id: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Money,
    pub meta: TxMeta,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            from_account_id,
            to_account_id,
            amount,
            meta: TxMeta::new(created_at),
        }
    }

    #[must_use]
    pub fn meta(mut self, meta: TxMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Correct an account's balance so its spendable figure hits a target value.
///
/// The user states the desired spendable amount, not a delta; the engine
/// computes the signed delta and records it.
#[derive(Clone, Debug)]
pub struct AdjustBalanceCmd {
    pub owner_id: String,
    pub account_id: Uuid,
    pub target_spendable: Money,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AdjustBalanceCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        account_id: Uuid,
        target_spendable: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            account_id,
            target_spendable,
            note: None,
            created_at,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Spend more than the current spendable balance by first withdrawing from
/// named reservations, then recording the expense — all in one atomic unit.
#[derive(Clone, Debug)]
pub struct CoverShortfallCmd {
    pub owner_id: String,
    pub from_account_id: Uuid,
    pub amount: Money,
    /// `(category_id, amount)` pairs to withdraw before spending.
    pub withdrawals: Vec<(Uuid, Money)>,
    pub meta: TxMeta,
}

impl CoverShortfallCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        from_account_id: Uuid,
        amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            from_account_id,
            amount,
            withdrawals: Vec::new(),
            meta: TxMeta::new(created_at),
        }
    }

    #[must_use]
    pub fn withdrawal(mut self, category_id: Uuid, amount: Money) -> Self {
        self.withdrawals.push((category_id, amount));
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: TxMeta) -> Self {
        self.meta = meta;
        self
    }
}
