//! The module contains the errors the engine can return.
//!
//! Every variant is recoverable and user-facing: a failed operation leaves
//! the ledger untouched (the surrounding database transaction rolls back)
//! and the caller decides how to present the failure. The only non-domain
//! variant is [`Database`], which wraps backing-store errors transparently.
//!
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An operation mixed two different currencies.
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    /// A reservation increase would exceed the account's free balance.
    #[error("Insufficient unallocated balance: {0}")]
    InsufficientUnallocatedBalance(String),
    /// A withdrawal/decrease exceeds what is currently reserved.
    #[error("Exceeds reserved amount: {0}")]
    ExceedsReservedAmount(String),
    /// An expense or transfer exceeds spendable funds.
    #[error("Insufficient spendable funds: {0}")]
    InsufficientSpendable(String),
    /// Supplied withdrawals do not cover a pending expense.
    #[error("Shortfall not covered: {0}")]
    ShortfallNotCovered(String),
    /// A balance adjustment whose delta is zero.
    #[error("Adjustment is a no-op")]
    NoOpAdjustment,
    /// A balance adjustment targeting a negative spendable value.
    #[error("Target spendable must not be negative")]
    NegativeTargetSpendable,
    /// A downward adjustment larger than the current spendable amount.
    #[error("Adjustment exceeds spendable: {0}")]
    AdjustmentExceedsSpendable(String),
    /// A category move/attach that would break the hierarchy rules.
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (
                Self::InsufficientUnallocatedBalance(a),
                Self::InsufficientUnallocatedBalance(b),
            ) => a == b,
            (Self::ExceedsReservedAmount(a), Self::ExceedsReservedAmount(b)) => a == b,
            (Self::InsufficientSpendable(a), Self::InsufficientSpendable(b)) => a == b,
            (Self::ShortfallNotCovered(a), Self::ShortfallNotCovered(b)) => a == b,
            (Self::NoOpAdjustment, Self::NoOpAdjustment) => true,
            (Self::NegativeTargetSpendable, Self::NegativeTargetSpendable) => true,
            (Self::AdjustmentExceedsSpendable(a), Self::AdjustmentExceedsSpendable(b)) => a == b,
            (Self::InvalidHierarchy(a), Self::InvalidHierarchy(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
