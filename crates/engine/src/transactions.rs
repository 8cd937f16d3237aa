//! Transaction primitives.
//!
//! A `Transaction` is the immutable record of one applied ledger operation.
//! The per-kind fields live in the [`TransactionDetail`] sum type, so an
//! income can never carry a `from_account_id` and an adjustment always has
//! its signed delta. The persistence model flattens the union into optional
//! columns; `TryFrom<Model>` re-validates the shape on the way back.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::model_currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::Adjustment => "adjustment",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Per-kind payload of a transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TransactionDetail {
    Income {
        to_account_id: Uuid,
    },
    Expense {
        from_account_id: Uuid,
    },
    Transfer {
        from_account_id: Uuid,
        to_account_id: Uuid,
    },
    Adjustment {
        to_account_id: Uuid,
        /// The actual signed delta applied to the balance. The displayed
        /// `amount` is its absolute value.
        adjusted: Money,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    /// Displayed magnitude, always > 0.
    pub amount: Money,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub detail: TransactionDetail,
}

impl Transaction {
    pub fn new(
        owner_id: String,
        amount: Money,
        category_id: Option<Uuid>,
        note: Option<String>,
        created_at: DateTime<Utc>,
        detail: TransactionDetail,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if let TransactionDetail::Transfer {
            from_account_id,
            to_account_id,
        } = &detail
            && from_account_id == to_account_id
        {
            return Err(EngineError::InvalidAmount(
                "from_account_id and to_account_id must differ".to_string(),
            ));
        }
        if let TransactionDetail::Adjustment { adjusted, .. } = &detail
            && adjusted.is_zero()
        {
            return Err(EngineError::NoOpAdjustment);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            amount,
            category_id,
            note,
            created_at,
            detail,
        })
    }

    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        match self.detail {
            TransactionDetail::Income { .. } => TransactionKind::Income,
            TransactionDetail::Expense { .. } => TransactionKind::Expense,
            TransactionDetail::Transfer { .. } => TransactionKind::Transfer,
            TransactionDetail::Adjustment { .. } => TransactionKind::Adjustment,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub currency: String,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub adjusted_minor: Option<i64>,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        let (from_account_id, to_account_id, adjusted_minor) = match &tx.detail {
            TransactionDetail::Income { to_account_id } => (None, Some(*to_account_id), None),
            TransactionDetail::Expense { from_account_id } => {
                (Some(*from_account_id), None, None)
            }
            TransactionDetail::Transfer {
                from_account_id,
                to_account_id,
            } => (Some(*from_account_id), Some(*to_account_id), None),
            TransactionDetail::Adjustment {
                to_account_id,
                adjusted,
            } => (None, Some(*to_account_id), Some(adjusted.minor())),
        };

        Self {
            id: ActiveValue::Set(tx.id),
            owner_id: ActiveValue::Set(tx.owner_id.clone()),
            kind: ActiveValue::Set(tx.kind().as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            currency: ActiveValue::Set(tx.amount.currency().code().to_string()),
            from_account_id: ActiveValue::Set(from_account_id),
            to_account_id: ActiveValue::Set(to_account_id),
            category_id: ActiveValue::Set(tx.category_id),
            adjusted_minor: ActiveValue::Set(adjusted_minor),
            note: ActiveValue::Set(tx.note.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let malformed =
            |field: &str| EngineError::InvalidAmount(format!("transaction row missing {field}"));

        let kind = TransactionKind::try_from(model.kind.as_str())?;
        let currency = model_currency(model.currency.as_str())?;
        let detail = match kind {
            TransactionKind::Income => TransactionDetail::Income {
                to_account_id: model.to_account_id.ok_or_else(|| malformed("to_account_id"))?,
            },
            TransactionKind::Expense => TransactionDetail::Expense {
                from_account_id: model
                    .from_account_id
                    .ok_or_else(|| malformed("from_account_id"))?,
            },
            TransactionKind::Transfer => TransactionDetail::Transfer {
                from_account_id: model
                    .from_account_id
                    .ok_or_else(|| malformed("from_account_id"))?,
                to_account_id: model.to_account_id.ok_or_else(|| malformed("to_account_id"))?,
            },
            TransactionKind::Adjustment => TransactionDetail::Adjustment {
                to_account_id: model.to_account_id.ok_or_else(|| malformed("to_account_id"))?,
                adjusted: Money::new(
                    model.adjusted_minor.ok_or_else(|| malformed("adjusted_minor"))?,
                    currency,
                ),
            },
        };

        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            amount: Money::new(model.amount_minor, currency),
            category_id: model.category_id,
            note: model.note,
            created_at: model.created_at,
            detail,
        })
    }
}
