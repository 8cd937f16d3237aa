//! Account lifecycle and balance summaries.

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{
    Account, AccountKind, AccountSummary, EngineError, Money, ResultEngine, accounts,
    reservations, transactions,
    util::{normalize_display_name, normalize_name_key},
};

use super::{Engine, reservations::spendable_minor, with_tx};

impl Engine {
    /// Creates an account with an opening balance.
    ///
    /// The currency comes from the opening balance. Only credit-card
    /// accounts may open in the negative; names are unique per owner.
    pub async fn new_account(
        &self,
        owner_id: &str,
        name: &str,
        kind: AccountKind,
        opening_balance: Money,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| async {
            let name = normalize_display_name(name, "account")?;
            if opening_balance.is_negative() && !kind.allows_negative_balance() {
                return Err(EngineError::InvalidAmount(
                    "opening balance must not be negative".to_string(),
                ));
            }

            let duplicate = accounts::Entity::find()
                .filter(accounts::Column::OwnerId.eq(owner_id))
                .filter(accounts::Column::NameNorm.eq(normalize_name_key(&name)))
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let account = Account::new(owner_id.to_string(), name, kind, opening_balance);
            let account_id = account.id;
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;

            info!(%account_id, owner_id, "account created");
            Ok(account_id)
        }
        .await)
    }

    /// Deletes an account.
    ///
    /// Its reservations are released (deleted) in the same transaction;
    /// historical transactions keep the ledger honest, so an account that is
    /// still referenced by any transaction cannot be deleted.
    pub async fn delete_account(&self, owner_id: &str, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| async {
            let account = self.require_account(&db_tx, owner_id, account_id).await?;

            let referenced = transactions::Entity::find()
                .filter(
                    sea_orm::Condition::any()
                        .add(transactions::Column::FromAccountId.eq(account_id))
                        .add(transactions::Column::ToAccountId.eq(account_id)),
                )
                .one(&db_tx)
                .await?;
            if referenced.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "account '{}' still has transaction history",
                    account.name
                )));
            }

            reservations::Entity::delete_many()
                .filter(reservations::Column::AccountId.eq(account_id))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(account_id).exec(&db_tx).await?;

            info!(%account_id, owner_id, "account deleted");
            Ok(())
        }
        .await)
    }

    /// Returns an owned account as a domain value.
    pub async fn account(&self, owner_id: &str, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| async {
            let model = self.require_account(&db_tx, owner_id, account_id).await?;
            Account::try_from(model)
        }
        .await)
    }

    /// Balance, total reserved, and the derived spendable figure.
    ///
    /// Spendable is recomputed on every read, never stored, and is floored
    /// at zero.
    pub async fn account_summary(
        &self,
        owner_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<AccountSummary> {
        with_tx!(self, |db_tx| async {
            let model = self.require_account(&db_tx, owner_id, account_id).await?;
            let account = Account::try_from(model)?;
            let currency = account.currency();

            let reserved = self.total_reserved_minor(&db_tx, account_id).await?;
            let spendable = spendable_minor(account.balance.minor(), reserved);

            Ok(AccountSummary {
                balance: account.balance,
                reserved_total: Money::new(reserved, currency),
                spendable: Money::new(spendable, currency),
            })
        }
        .await)
    }
}
