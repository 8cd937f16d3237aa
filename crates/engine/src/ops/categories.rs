//! Category lifecycle, hierarchy moves, and fund aggregation.

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{
    AccountReservation, Category, CategoryFundSummary, CategoryKind, Currency, EngineError,
    Money, Reservation, ResultEngine, categories, hierarchy, transactions,
    util::{normalize_display_name, normalize_name_key},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a category, optionally attached under a parent category.
    ///
    /// A parent-type category can never itself be nested, and a child must
    /// share its parent's income/expense kind.
    pub async fn new_category(
        &self,
        owner_id: &str,
        name: &str,
        kind: CategoryKind,
        is_parent: bool,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| async {
            let name = normalize_display_name(name, "category")?;

            if is_parent && parent_id.is_some() {
                return Err(EngineError::InvalidHierarchy(
                    "parent categories are never nested".to_string(),
                ));
            }
            if let Some(parent_id) = parent_id {
                let parent = self.require_category(&db_tx, owner_id, parent_id).await?;
                if !parent.is_parent {
                    return Err(EngineError::InvalidHierarchy(
                        "target category does not accept children".to_string(),
                    ));
                }
                if CategoryKind::try_from(parent.kind.as_str())? != kind {
                    return Err(EngineError::InvalidHierarchy(
                        "parent and child must share the same kind".to_string(),
                    ));
                }
            }

            let duplicate = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(owner_id))
                .filter(categories::Column::NameNorm.eq(normalize_name_key(&name)))
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let category = Category::new(owner_id.to_string(), name, kind, is_parent, parent_id);
            let category_id = category.id;
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;

            info!(%category_id, owner_id, "category created");
            Ok(category_id)
        }
        .await)
    }

    /// Returns an owned category as a domain value.
    pub async fn category(&self, owner_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| async {
            let model = self.require_category(&db_tx, owner_id, category_id).await?;
            Category::try_from(model)
        }
        .await)
    }

    /// Re-parents a leaf category (or detaches it with `None`).
    ///
    /// Fails with [`EngineError::InvalidHierarchy`] if the move would create
    /// a cycle, mix income/expense kinds, or nest a parent category.
    pub async fn move_category(
        &self,
        owner_id: &str,
        category_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| async {
            let model = self.require_category(&db_tx, owner_id, category_id).await?;
            let categories_map = self.load_categories(&db_tx, owner_id).await?;

            match new_parent_id {
                Some(parent_id) => {
                    self.require_category(&db_tx, owner_id, parent_id).await?;
                    hierarchy::can_attach(&categories_map, category_id, parent_id)?;
                }
                None => {
                    if model.is_parent {
                        return Err(EngineError::InvalidHierarchy(
                            "parent categories are never moved".to_string(),
                        ));
                    }
                }
            }

            let active = categories::ActiveModel {
                id: ActiveValue::Set(category_id),
                parent_id: ActiveValue::Set(new_parent_id),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            info!(%category_id, ?new_parent_id, "category moved");
            Ok(())
        }
        .await)
    }

    /// Archives a category, releasing any funds it still holds back to the
    /// source accounts. History is preserved.
    pub async fn archive_category(&self, owner_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| async {
            self.require_category(&db_tx, owner_id, category_id).await?;
            self.release_all_in_tx(&db_tx, category_id).await?;

            let active = categories::ActiveModel {
                id: ActiveValue::Set(category_id),
                archived: ActiveValue::Set(true),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            info!(%category_id, "category archived");
            Ok(())
        }
        .await)
    }

    /// Deletes a category.
    ///
    /// Reservations it holds are released atomically with the delete, and
    /// historical transactions keep their rows with a nulled category
    /// reference. A parent category must be childless first.
    pub async fn delete_category(&self, owner_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| async {
            let model = self.require_category(&db_tx, owner_id, category_id).await?;

            if model.is_parent {
                let child = categories::Entity::find()
                    .filter(categories::Column::OwnerId.eq(owner_id))
                    .filter(categories::Column::ParentId.eq(category_id))
                    .one(&db_tx)
                    .await?;
                if child.is_some() {
                    return Err(EngineError::InvalidHierarchy(
                        "category still has children".to_string(),
                    ));
                }
            }

            self.release_all_in_tx(&db_tx, category_id).await?;
            self.null_category_refs(&db_tx, owner_id, category_id).await?;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;

            info!(%category_id, "category deleted");
            Ok(())
        }
        .await)
    }

    async fn null_category_refs(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<()> {
        let referencing: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .filter(transactions::Column::CategoryId.eq(category_id))
            .all(db)
            .await?;

        for model in referencing {
            let active = transactions::ActiveModel {
                id: ActiveValue::Set(model.id),
                category_id: ActiveValue::Set(None),
                ..Default::default()
            };
            active.update(db).await?;
        }
        Ok(())
    }

    /// Reserved total plus the per-account breakdown for a category.
    ///
    /// For a parent category the breakdown is the union of its children's
    /// reservations, annotated with the child each row belongs to.
    pub async fn category_fund_summary(
        &self,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<CategoryFundSummary> {
        with_tx!(self, |db_tx| async {
            self.require_category(&db_tx, owner_id, category_id).await?;
            let categories_map = self.load_categories(&db_tx, owner_id).await?;
            let leaves = hierarchy::fund_leaves(&categories_map, category_id)?;
            let rows = self.reservation_rows_for(&db_tx, &leaves).await?;

            let mut per_account = Vec::with_capacity(rows.len());
            let mut total: Option<Money> = None;
            for row in rows {
                let reservation = Reservation::try_from(row)?;
                total = Some(match total {
                    Some(sum) => sum.checked_add(reservation.reserved)?,
                    None => reservation.reserved,
                });
                per_account.push(AccountReservation {
                    category_id: reservation.category_id,
                    account_id: reservation.account_id,
                    reserved: reservation.reserved,
                });
            }

            Ok(CategoryFundSummary {
                reserved_total: total.unwrap_or_else(|| Money::zero(Currency::default())),
                per_account,
            })
        }
        .await)
    }

    /// The union of all reservations held under a parent category, annotated
    /// with the child and account each came from. Read-only display data.
    pub async fn aggregate_reservations(
        &self,
        owner_id: &str,
        parent_category_id: Uuid,
    ) -> ResultEngine<Vec<AccountReservation>> {
        with_tx!(self, |db_tx| async {
            let model = self
                .require_category(&db_tx, owner_id, parent_category_id)
                .await?;
            if !model.is_parent {
                return Err(EngineError::InvalidHierarchy(
                    "category is not a parent category".to_string(),
                ));
            }

            let categories_map = self.load_categories(&db_tx, owner_id).await?;
            let leaves = hierarchy::fund_leaves(&categories_map, parent_category_id)?;
            let rows = self.reservation_rows_for(&db_tx, &leaves).await?;

            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let reservation = Reservation::try_from(row)?;
                out.push(AccountReservation {
                    category_id: reservation.category_id,
                    account_id: reservation.account_id,
                    reserved: reservation.reserved,
                });
            }
            Ok(out)
        }
        .await)
    }
}
