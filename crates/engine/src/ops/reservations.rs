//! Reservation ledger operations.
//!
//! Single source of truth for "how much of account A's balance is earmarked
//! for category C". Increases are bounded by the account's unallocated
//! balance, decreases by the current reservation, and every mutation runs
//! inside one database transaction.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, Reservation, ResultEngine, hierarchy, reservations,
    util::{ensure_account_currency, model_currency},
};

use super::{Engine, with_tx};

/// `balance - reserved`, floored at zero.
pub(super) fn spendable_minor(balance_minor: i64, reserved_minor: i64) -> i64 {
    balance_minor.saturating_sub(reserved_minor).max(0)
}

fn checked_sum(values: impl Iterator<Item = i64>) -> ResultEngine<i64> {
    let mut total = 0i64;
    for value in values {
        total = total
            .checked_add(value)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
    }
    Ok(total)
}

impl Engine {
    /// Sum of all reservations on an account, in minor units.
    pub(super) async fn total_reserved_minor(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<i64> {
        let rows: Vec<reservations::Model> = reservations::Entity::find()
            .filter(reservations::Column::AccountId.eq(account_id))
            .all(db)
            .await?;
        checked_sum(rows.iter().map(|r| r.reserved_minor))
    }

    /// Decreases (withdraws from) one reservation inside the caller's
    /// transaction, pruning the row when it reaches zero. Returns the new
    /// reserved amount in minor units.
    pub(super) async fn decrease_reservation_in_tx(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        category_id: Uuid,
        account_id: Uuid,
        amount: Money,
    ) -> ResultEngine<i64> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "withdrawal amount must be > 0".to_string(),
            ));
        }
        self.require_category(db, owner_id, category_id).await?;

        let row = self
            .find_reservation(db, category_id, account_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("reservation not exists".to_string()))?;
        let row_currency = model_currency(row.currency.as_str())?;
        ensure_account_currency(row_currency, amount.currency())?;

        if amount.minor() > row.reserved_minor {
            return Err(EngineError::ExceedsReservedAmount(format!(
                "reserved {} minor units, requested {}",
                row.reserved_minor,
                amount.minor()
            )));
        }

        let new_reserved = row.reserved_minor - amount.minor();
        if new_reserved == 0 {
            reservations::Entity::delete_by_id(row.id).exec(db).await?;
        } else {
            let active = reservations::ActiveModel {
                id: ActiveValue::Set(row.id),
                reserved_minor: ActiveValue::Set(new_reserved),
                ..Default::default()
            };
            active.update(db).await?;
        }
        Ok(new_reserved)
    }

    /// Zeroes every reservation held by a category, returning the money to
    /// each source account's spendable pool. Runs inside the caller's
    /// transaction so an interrupted release is never observable.
    pub(super) async fn release_all_in_tx(
        &self,
        db: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<()> {
        let rows: Vec<reservations::Model> = reservations::Entity::find()
            .filter(reservations::Column::CategoryId.eq(category_id))
            .order_by_asc(reservations::Column::AccountId)
            .all(db)
            .await?;

        for row in rows {
            // A row that no longer parses means the store is corrupt; abort
            // the whole release and let the transaction roll back.
            model_currency(row.currency.as_str())?;
            reservations::Entity::delete_by_id(row.id).exec(db).await?;
        }
        Ok(())
    }

    /// All reservation rows for the given category ids.
    pub(super) async fn reservation_rows_for(
        &self,
        db: &DatabaseTransaction,
        category_ids: &[Uuid],
    ) -> ResultEngine<Vec<reservations::Model>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        reservations::Entity::find()
            .filter(reservations::Column::CategoryId.is_in(category_ids.iter().copied()))
            .order_by_asc(reservations::Column::AccountId)
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Earmarks `delta` more of the account's balance for a category.
    ///
    /// Fails with [`EngineError::InsufficientUnallocatedBalance`] when the
    /// delta exceeds `balance - total reserved`; the request is rejected,
    /// never capped. Returns the new reserved amount for the pair.
    pub async fn increase_reservation(
        &self,
        owner_id: &str,
        category_id: Uuid,
        account_id: Uuid,
        delta: Money,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| async {
            if !delta.is_positive() {
                return Err(EngineError::InvalidAmount(
                    "reservation delta must be > 0".to_string(),
                ));
            }

            let account = self.require_account(&db_tx, owner_id, account_id).await?;
            let account_currency = model_currency(account.currency.as_str())?;
            ensure_account_currency(account_currency, delta.currency())?;
            self.require_fund_category(&db_tx, owner_id, category_id)
                .await?;

            let reserved = self.total_reserved_minor(&db_tx, account_id).await?;
            let available = account.balance_minor.saturating_sub(reserved);
            if delta.minor() > available {
                return Err(EngineError::InsufficientUnallocatedBalance(account.name));
            }

            let new_reserved = match self
                .find_reservation(&db_tx, category_id, account_id)
                .await?
            {
                Some(row) => {
                    let total = row
                        .reserved_minor
                        .checked_add(delta.minor())
                        .ok_or_else(|| {
                            EngineError::InvalidAmount("amount overflow".to_string())
                        })?;
                    let active = reservations::ActiveModel {
                        id: ActiveValue::Set(row.id),
                        reserved_minor: ActiveValue::Set(total),
                        ..Default::default()
                    };
                    active.update(&db_tx).await?;
                    total
                }
                None => {
                    let reservation =
                        Reservation::new(owner_id.to_string(), category_id, account_id, delta);
                    reservations::ActiveModel::from(&reservation)
                        .insert(&db_tx)
                        .await?;
                    delta.minor()
                }
            };

            info!(
                %category_id,
                %account_id,
                delta_minor = delta.minor(),
                new_reserved,
                "reservation increased"
            );
            Ok(Money::new(new_reserved, account_currency))
        }
        .await)
    }

    /// Withdraws part (or all) of a reservation, freeing the money back into
    /// the account's spendable pool. Returns the new reserved amount.
    pub async fn decrease_reservation(
        &self,
        owner_id: &str,
        category_id: Uuid,
        account_id: Uuid,
        amount: Money,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| async {
            let account = self.require_account(&db_tx, owner_id, account_id).await?;
            let account_currency = model_currency(account.currency.as_str())?;
            let new_reserved = self
                .decrease_reservation_in_tx(&db_tx, owner_id, category_id, account_id, amount)
                .await?;
            info!(
                %category_id,
                %account_id,
                amount_minor = amount.minor(),
                new_reserved,
                "reservation decreased"
            );
            Ok(Money::new(new_reserved, account_currency))
        }
        .await)
    }

    /// Total reserved across all categories on one account.
    pub async fn total_reserved_for_account(
        &self,
        owner_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| async {
            let account = self.require_account(&db_tx, owner_id, account_id).await?;
            let currency = model_currency(account.currency.as_str())?;
            let reserved = self.total_reserved_minor(&db_tx, account_id).await?;
            Ok(Money::new(reserved, currency))
        }
        .await)
    }

    /// Total reserved for a category across accounts. For a parent category
    /// this aggregates over its fund-holding descendants.
    ///
    /// All contributing reservations must share one currency; an owner mixing
    /// currencies across the same category tree gets a `CurrencyMismatch`
    /// instead of a meaningless sum. An empty total reports zero in the
    /// default currency.
    pub async fn total_reserved_for_category(
        &self,
        owner_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| async {
            self.require_category(&db_tx, owner_id, category_id).await?;
            let categories = self.load_categories(&db_tx, owner_id).await?;
            let leaves = hierarchy::fund_leaves(&categories, category_id)?;
            let rows = self.reservation_rows_for(&db_tx, &leaves).await?;

            let mut total: Option<Money> = None;
            for row in rows {
                let reservation = Reservation::try_from(row)?;
                total = Some(match total {
                    Some(sum) => sum.checked_add(reservation.reserved)?,
                    None => reservation.reserved,
                });
            }
            Ok(total.unwrap_or_else(|| Money::zero(Currency::default())))
        }
        .await)
    }
}
