//! Reservation-ledger core for envelope-style budgeting.
//!
//! The engine owns the rules that keep account balances, per-category
//! reservations, category hierarchy aggregation, and transaction application
//! mutually consistent. Every mutating operation runs as a single database
//! transaction against the backing store, so concurrent callers can never
//! observe a state where an account's reservations exceed its balance.
//!
//! Presentation, authentication, and transport live elsewhere; this crate is
//! called with owner-scoped operation requests and answers with typed
//! results.

pub use accounts::{Account, AccountKind, AccountSummary};
pub use categories::{Category, CategoryKind};
pub use commands::{
    AdjustBalanceCmd, CoverShortfallCmd, ExpenseCmd, IncomeCmd, TransferCmd, TxMeta,
};
pub use currency::Currency;
pub use error::EngineError;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use reservations::{AccountReservation, CategoryFundSummary, Reservation};
pub use transactions::{Transaction, TransactionDetail, TransactionKind};

mod accounts;
mod categories;
mod commands;
mod currency;
mod error;
mod hierarchy;
mod money;
mod ops;
mod reservations;
mod transactions;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
