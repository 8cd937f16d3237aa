//! Owner-scoped lookups shared by the op modules.
//!
//! Every public operation goes through one of these helpers, so a caller can
//! never observe (or mutate) rows belonging to another owner — a foreign id
//! and a missing id are indistinguishable `NotFound` results.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Category, CategoryKind, EngineError, ResultEngine, accounts, categories, reservations,
    transactions,
};

use super::Engine;

/// Generates a `require_*` method returning the row only when it belongs to
/// the calling owner.
macro_rules! impl_require_owned {
    ($fn_name:ident, $entity:path, $owner_col:expr, $model:ty, $err_msg:literal) => {
        pub(super) async fn $fn_name(
            &self,
            db: &DatabaseTransaction,
            owner_id: &str,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .filter($owner_col.eq(owner_id))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::NotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_owned!(
        require_account,
        accounts::Entity,
        accounts::Column::OwnerId,
        accounts::Model,
        "account not exists"
    );

    impl_require_owned!(
        require_category,
        categories::Entity,
        categories::Column::OwnerId,
        categories::Model,
        "category not exists"
    );

    impl_require_owned!(
        require_transaction,
        transactions::Entity,
        transactions::Column::OwnerId,
        transactions::Model,
        "transaction not exists"
    );

    /// The unique reservation row for a `(category, account)` pair, if any.
    pub(super) async fn find_reservation(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
        account_id: Uuid,
    ) -> ResultEngine<Option<reservations::Model>> {
        reservations::Entity::find()
            .filter(reservations::Column::CategoryId.eq(category_id))
            .filter(reservations::Column::AccountId.eq(account_id))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Loads the owner's full category set, indexed by id, for hierarchy
    /// traversal.
    pub(super) async fn load_categories(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<HashMap<Uuid, Category>> {
        let models: Vec<categories::Model> = categories::Entity::find()
            .filter(categories::Column::OwnerId.eq(owner_id))
            .all(db)
            .await?;

        let mut out = HashMap::with_capacity(models.len());
        for model in models {
            let category = Category::try_from(model)?;
            out.insert(category.id, category);
        }
        Ok(out)
    }

    /// Requires a category capable of holding reservations: owned by the
    /// caller, expense-type, non-parent, not archived.
    pub(super) async fn require_fund_category(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        let model = self.require_category(db, owner_id, category_id).await?;
        if model.is_parent {
            return Err(EngineError::InvalidHierarchy(
                "parent categories hold no reservations".to_string(),
            ));
        }
        if CategoryKind::try_from(model.kind.as_str())? != CategoryKind::Expense {
            return Err(EngineError::InvalidHierarchy(
                "income categories never hold funds".to_string(),
            ));
        }
        if model.archived {
            return Err(EngineError::InvalidHierarchy(
                "archived categories hold no reservations".to_string(),
            ));
        }
        Ok(model)
    }
}
