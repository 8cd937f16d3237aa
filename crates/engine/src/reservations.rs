//! Reservations: the earmark of part of an account's balance for a category.
//!
//! A reservation never changes the account balance; it only narrows the
//! spendable portion. At most one row exists per `(category, account)` pair,
//! its amount is strictly positive (a zero row is pruned), and for every
//! account the sum of its reservations never exceeds the balance.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::model_currency};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub owner_id: String,
    pub category_id: Uuid,
    pub account_id: Uuid,
    pub reserved: Money,
}

impl Reservation {
    pub fn new(owner_id: String, category_id: Uuid, account_id: Uuid, reserved: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            category_id,
            account_id,
            reserved,
        }
    }
}

/// One row of a category fund breakdown: how much a given (leaf) category
/// has reserved on a given account.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountReservation {
    pub category_id: Uuid,
    pub account_id: Uuid,
    pub reserved: Money,
}

/// Read-model for a category's funds: the aggregated total plus the
/// per-account (and, for parents, per-child) breakdown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryFundSummary {
    pub reserved_total: Money,
    pub per_account: Vec<AccountReservation>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub category_id: Uuid,
    pub account_id: Uuid,
    pub currency: String,
    pub reserved_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Categories,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Reservation> for ActiveModel {
    fn from(value: &Reservation) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            category_id: ActiveValue::Set(value.category_id),
            account_id: ActiveValue::Set(value.account_id),
            currency: ActiveValue::Set(value.reserved.currency().code().to_string()),
            reserved_minor: ActiveValue::Set(value.reserved.minor()),
        }
    }
}

impl TryFrom<Model> for Reservation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let currency = model_currency(model.currency.as_str())?;
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            category_id: model.category_id,
            account_id: model.account_id,
            reserved: Money::new(model.reserved_minor, currency),
        })
    }
}
