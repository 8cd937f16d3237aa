//! Budget categories and their persistence model.
//!
//! Categories form a (shallow) tree: a category flagged `is_parent` may have
//! leaf children but never holds reservations of its own, and is never nested
//! under another parent. Only `expense`-type leaves hold funds.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid category kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub kind: CategoryKind,
    pub is_parent: bool,
    pub parent_id: Option<Uuid>,
    pub archived: bool,
}

impl Category {
    pub fn new(
        owner_id: String,
        name: String,
        kind: CategoryKind,
        is_parent: bool,
        parent_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            kind,
            is_parent,
            parent_id,
            archived: false,
        }
    }

    /// True if this category may hold reservations: a non-parent,
    /// non-archived expense category.
    #[must_use]
    pub const fn holds_funds(&self) -> bool {
        matches!(self.kind, CategoryKind::Expense) && !self.is_parent && !self.archived
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub is_parent: bool,
    pub parent_id: Option<Uuid>,
    pub archived: bool,
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

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(crate::util::normalize_name_key(&value.name)),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            is_parent: ActiveValue::Set(value.is_parent),
            parent_id: ActiveValue::Set(value.parent_id),
            archived: ActiveValue::Set(value.archived),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            kind: CategoryKind::try_from(model.kind.as_str())?,
            is_parent: model.is_parent,
            parent_id: model.parent_id,
            archived: model.archived,
        })
    }
}
