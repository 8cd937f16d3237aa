//! The module contains the `Account` struct and its persistence model.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, util::model_currency};

/// What kind of real-world holder an account represents.
///
/// Only `CreditCard` accounts are allowed to carry a negative balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    Checking,
    Savings,
    CreditCard,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::CreditCard => "credit_card",
        }
    }

    /// True if the account balance may go below zero.
    #[must_use]
    pub const fn allows_negative_balance(self) -> bool {
        matches!(self, Self::CreditCard)
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit_card" => Ok(Self::CreditCard),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

/// An account: a place where money is actually held (cash, bank, card).
///
/// The balance is the total funds notionally present, independent of any
/// reservations earmarked against it. The spendable figure is always derived
/// (`balance - total reserved`, floored at zero), never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Money,
}

impl Account {
    pub fn new(owner_id: String, name: String, kind: AccountKind, balance: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            kind,
            balance,
        }
    }

    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.balance.currency()
    }
}

/// Read-model returned to callers: the balance together with the derived
/// reservation total and spendable amount.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AccountSummary {
    pub balance: Money,
    pub reserved_total: Money,
    pub spendable: Money,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub currency: String,
    pub balance_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reservations::Entity")]
    Reservations,
}

impl Related<super::reservations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(crate::util::normalize_name_key(&value.name)),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            currency: ActiveValue::Set(value.currency().code().to_string()),
            balance_minor: ActiveValue::Set(value.balance.minor()),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let currency = model_currency(model.currency.as_str())?;
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            balance: Money::new(model.balance_minor, currency),
        })
    }
}
