//! Transaction application: the orchestration layer that ties the balance
//! engine and the reservation ledger together.
//!
//! Each public operation validates against current state, mutates balances
//! and reservations, and writes the immutable `Transaction` record as the
//! terminal step — all inside one database transaction, so a failure at any
//! point leaves no partial effect.

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    AdjustBalanceCmd, CoverShortfallCmd, EngineError, ExpenseCmd, IncomeCmd, Money, ResultEngine,
    Transaction, TransactionDetail, TransferCmd, TxMeta, accounts, transactions,
    util::{ensure_account_currency, model_currency, normalize_optional_text},
};

use super::{Engine, reservations::spendable_minor, with_tx};

fn overflow() -> EngineError {
    EngineError::InvalidAmount("amount overflow".to_string())
}

impl Engine {
    async fn set_balance(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        balance_minor: i64,
    ) -> ResultEngine<()> {
        let active = accounts::ActiveModel {
            id: ActiveValue::Set(account_id),
            balance_minor: ActiveValue::Set(balance_minor),
            ..Default::default()
        };
        active.update(db).await?;
        Ok(())
    }

    /// Validates the optional category reference carried by a transaction.
    async fn check_meta(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        meta: &TxMeta,
    ) -> ResultEngine<()> {
        if let Some(category_id) = meta.category_id {
            self.require_category(db, owner_id, category_id).await?;
        }
        Ok(())
    }

    /// Loads an account and checks that `amount` is positive and in the
    /// account's currency. Returns the model and its parsed currency.
    async fn require_funded_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        account_id: Uuid,
        amount: Money,
    ) -> ResultEngine<accounts::Model> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        let account = self.require_account(db, owner_id, account_id).await?;
        let currency = model_currency(account.currency.as_str())?;
        ensure_account_currency(currency, amount.currency())?;
        Ok(account)
    }

    /// Subtracts an expense from an account after the spendable check.
    /// Reservations protect themselves from ordinary spending: only an
    /// explicit withdrawal frees reserved money.
    async fn apply_expense_in_tx(
        &self,
        db: &DatabaseTransaction,
        account: &accounts::Model,
        amount_minor: i64,
    ) -> ResultEngine<i64> {
        let reserved = self.total_reserved_minor(db, account.id).await?;
        let spendable = spendable_minor(account.balance_minor, reserved);
        if amount_minor > spendable {
            return Err(EngineError::InsufficientSpendable(account.name.clone()));
        }
        let new_balance = account
            .balance_minor
            .checked_sub(amount_minor)
            .ok_or_else(overflow)?;
        self.set_balance(db, account.id, new_balance).await?;
        Ok(new_balance)
    }

    async fn insert_transaction(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        amount: Money,
        meta: TxMeta,
        detail: TransactionDetail,
    ) -> ResultEngine<Uuid> {
        let tx = Transaction::new(
            owner_id.to_string(),
            amount,
            meta.category_id,
            normalize_optional_text(meta.note.as_deref()),
            meta.created_at,
            detail,
        )?;
        let tx_id = tx.id;
        transactions::ActiveModel::from(&tx).insert(db).await?;
        Ok(tx_id)
    }

    /// Records an income: the account balance grows by the amount.
    pub async fn record_income(&self, cmd: IncomeCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| async {
            let account = self
                .require_funded_account(&db_tx, &cmd.owner_id, cmd.to_account_id, cmd.amount)
                .await?;
            self.check_meta(&db_tx, &cmd.owner_id, &cmd.meta).await?;

            let new_balance = account
                .balance_minor
                .checked_add(cmd.amount.minor())
                .ok_or_else(overflow)?;
            self.set_balance(&db_tx, account.id, new_balance).await?;

            let tx_id = self
                .insert_transaction(
                    &db_tx,
                    &cmd.owner_id,
                    cmd.amount,
                    cmd.meta,
                    TransactionDetail::Income {
                        to_account_id: cmd.to_account_id,
                    },
                )
                .await?;

            info!(%tx_id, account_id = %cmd.to_account_id, amount_minor = cmd.amount.minor(), "income recorded");
            Ok(tx_id)
        }
        .await)
    }

    /// Records an expense against spendable funds.
    pub async fn record_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| async {
            let account = self
                .require_funded_account(&db_tx, &cmd.owner_id, cmd.from_account_id, cmd.amount)
                .await?;
            self.check_meta(&db_tx, &cmd.owner_id, &cmd.meta).await?;

            self.apply_expense_in_tx(&db_tx, &account, cmd.amount.minor())
                .await?;

            let tx_id = self
                .insert_transaction(
                    &db_tx,
                    &cmd.owner_id,
                    cmd.amount,
                    cmd.meta,
                    TransactionDetail::Expense {
                        from_account_id: cmd.from_account_id,
                    },
                )
                .await?;

            info!(%tx_id, account_id = %cmd.from_account_id, amount_minor = cmd.amount.minor(), "expense recorded");
            Ok(tx_id)
        }
        .await)
    }

    /// Moves money between two accounts. The source side follows the same
    /// spendable rule as an expense.
    pub async fn record_transfer(&self, cmd: TransferCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| async {
            if cmd.from_account_id == cmd.to_account_id {
                return Err(EngineError::InvalidAmount(
                    "from_account_id and to_account_id must differ".to_string(),
                ));
            }
            let from = self
                .require_funded_account(&db_tx, &cmd.owner_id, cmd.from_account_id, cmd.amount)
                .await?;
            let to = self
                .require_account(&db_tx, &cmd.owner_id, cmd.to_account_id)
                .await?;
            let to_currency = model_currency(to.currency.as_str())?;
            ensure_account_currency(to_currency, cmd.amount.currency())?;
            self.check_meta(&db_tx, &cmd.owner_id, &cmd.meta).await?;

            self.apply_expense_in_tx(&db_tx, &from, cmd.amount.minor())
                .await?;
            let to_balance = to
                .balance_minor
                .checked_add(cmd.amount.minor())
                .ok_or_else(overflow)?;
            self.set_balance(&db_tx, to.id, to_balance).await?;

            let tx_id = self
                .insert_transaction(
                    &db_tx,
                    &cmd.owner_id,
                    cmd.amount,
                    cmd.meta,
                    TransactionDetail::Transfer {
                        from_account_id: cmd.from_account_id,
                        to_account_id: cmd.to_account_id,
                    },
                )
                .await?;

            info!(%tx_id, from = %cmd.from_account_id, to = %cmd.to_account_id, amount_minor = cmd.amount.minor(), "transfer recorded");
            Ok(tx_id)
        }
        .await)
    }

    /// Corrects an account's balance so its spendable figure becomes the
    /// requested target. Records an `adjustment` transaction carrying the
    /// signed delta for later reversal.
    pub async fn adjust_balance(&self, cmd: AdjustBalanceCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| async {
            let account = self
                .require_account(&db_tx, &cmd.owner_id, cmd.account_id)
                .await?;
            let currency = model_currency(account.currency.as_str())?;
            ensure_account_currency(currency, cmd.target_spendable.currency())?;

            if cmd.target_spendable.is_negative() {
                return Err(EngineError::NegativeTargetSpendable);
            }

            let reserved = self.total_reserved_minor(&db_tx, cmd.account_id).await?;
            let current_spendable = spendable_minor(account.balance_minor, reserved);
            let delta = cmd
                .target_spendable
                .minor()
                .checked_sub(current_spendable)
                .ok_or_else(overflow)?;
            if delta == 0 {
                return Err(EngineError::NoOpAdjustment);
            }
            if delta < 0 && delta.unsigned_abs() > current_spendable.unsigned_abs() {
                return Err(EngineError::AdjustmentExceedsSpendable(account.name));
            }

            let new_balance = account
                .balance_minor
                .checked_add(delta)
                .ok_or_else(overflow)?;
            self.set_balance(&db_tx, cmd.account_id, new_balance).await?;

            let meta = match cmd.note {
                Some(note) => TxMeta::new(cmd.created_at).note(note),
                None => TxMeta::new(cmd.created_at),
            };
            let tx_id = self
                .insert_transaction(
                    &db_tx,
                    &cmd.owner_id,
                    Money::new(delta.unsigned_abs() as i64, currency),
                    meta,
                    TransactionDetail::Adjustment {
                        to_account_id: cmd.account_id,
                        adjusted: Money::new(delta, currency),
                    },
                )
                .await?;

            info!(%tx_id, account_id = %cmd.account_id, delta_minor = delta, "balance adjusted");
            Ok(tx_id)
        }
        .await)
    }

    /// Spends more than the current spendable balance by first withdrawing
    /// from the named reservations, then applying the expense.
    ///
    /// Reservations and balance are separate ledgers; the expense never
    /// "borrows" from a reservation directly. The withdrawals free the
    /// funds, the expense consumes them, and the whole two-phase unit
    /// commits or rolls back together.
    pub async fn cover_shortfall_then_spend(
        &self,
        cmd: CoverShortfallCmd,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| async {
            let account = self
                .require_funded_account(&db_tx, &cmd.owner_id, cmd.from_account_id, cmd.amount)
                .await?;
            self.check_meta(&db_tx, &cmd.owner_id, &cmd.meta).await?;

            let reserved = self.total_reserved_minor(&db_tx, cmd.from_account_id).await?;
            let spendable = spendable_minor(account.balance_minor, reserved);
            let amount_needed = cmd.amount.minor().saturating_sub(spendable).max(0);

            let mut total_withdrawn = 0i64;
            for (category_id, amount) in &cmd.withdrawals {
                ensure_account_currency(cmd.amount.currency(), amount.currency())?;
                self.decrease_reservation_in_tx(
                    &db_tx,
                    &cmd.owner_id,
                    *category_id,
                    cmd.from_account_id,
                    *amount,
                )
                .await?;
                total_withdrawn = total_withdrawn
                    .checked_add(amount.minor())
                    .ok_or_else(overflow)?;
            }

            if total_withdrawn < amount_needed {
                return Err(EngineError::ShortfallNotCovered(format!(
                    "needed {amount_needed} minor units, withdrawals free only {total_withdrawn}"
                )));
            }

            self.apply_expense_in_tx(&db_tx, &account, cmd.amount.minor())
                .await?;

            let tx_id = self
                .insert_transaction(
                    &db_tx,
                    &cmd.owner_id,
                    cmd.amount,
                    cmd.meta,
                    TransactionDetail::Expense {
                        from_account_id: cmd.from_account_id,
                    },
                )
                .await?;

            info!(
                %tx_id,
                account_id = %cmd.from_account_id,
                amount_minor = cmd.amount.minor(),
                total_withdrawn,
                "shortfall covered and spent"
            );
            Ok(tx_id)
        }
        .await)
    }

    /// Deletes a transaction, reversing the balance effect it originally
    /// applied. The reversal is computed from the stored record, never from
    /// current state, and is rejected when undoing it would leave an account
    /// with less balance than its outstanding reservations.
    pub async fn delete_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| async {
            let model = self
                .require_transaction(&db_tx, owner_id, transaction_id)
                .await?;
            let tx = Transaction::try_from(model)?;
            let amount_minor = tx.amount.minor();

            match &tx.detail {
                TransactionDetail::Income { to_account_id } => {
                    self.remove_from_balance(&db_tx, owner_id, *to_account_id, amount_minor)
                        .await?;
                }
                TransactionDetail::Expense { from_account_id } => {
                    self.add_to_balance(&db_tx, owner_id, *from_account_id, amount_minor)
                        .await?;
                }
                TransactionDetail::Transfer {
                    from_account_id,
                    to_account_id,
                } => {
                    self.add_to_balance(&db_tx, owner_id, *from_account_id, amount_minor)
                        .await?;
                    self.remove_from_balance(&db_tx, owner_id, *to_account_id, amount_minor)
                        .await?;
                }
                TransactionDetail::Adjustment { to_account_id, adjusted } => {
                    if adjusted.is_positive() {
                        self.remove_from_balance(
                            &db_tx,
                            owner_id,
                            *to_account_id,
                            adjusted.minor(),
                        )
                        .await?;
                    } else {
                        self.add_to_balance(
                            &db_tx,
                            owner_id,
                            *to_account_id,
                            adjusted.minor().unsigned_abs() as i64,
                        )
                        .await?;
                    }
                }
            }

            transactions::Entity::delete_by_id(transaction_id)
                .exec(&db_tx)
                .await?;

            info!(%transaction_id, kind = tx.kind().as_str(), "transaction deleted");
            Ok(())
        }
        .await)
    }

    async fn add_to_balance(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        account_id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        let account = self.require_account(db, owner_id, account_id).await?;
        let new_balance = account
            .balance_minor
            .checked_add(amount_minor)
            .ok_or_else(overflow)?;
        self.set_balance(db, account_id, new_balance).await
    }

    /// Decreases a balance during reversal, keeping the reservation
    /// invariant intact: the account must still cover its reservations.
    async fn remove_from_balance(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        account_id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        let account = self.require_account(db, owner_id, account_id).await?;
        let new_balance = account
            .balance_minor
            .checked_sub(amount_minor)
            .ok_or_else(overflow)?;
        let reserved = self.total_reserved_minor(db, account_id).await?;
        if new_balance < reserved {
            return Err(EngineError::InsufficientUnallocatedBalance(account.name));
        }
        self.set_balance(db, account_id, new_balance).await
    }

    /// Returns an owned transaction as a domain value.
    pub async fn transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| async {
            let model = self
                .require_transaction(&db_tx, owner_id, transaction_id)
                .await?;
            Transaction::try_from(model)
        }
        .await)
    }

    /// Lists the most recent transactions touching an account (either leg),
    /// newest first.
    pub async fn list_transactions_for_account(
        &self,
        owner_id: &str,
        account_id: Uuid,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| async {
            self.require_account(&db_tx, owner_id, account_id).await?;

            let models: Vec<transactions::Model> = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id))
                .filter(
                    Condition::any()
                        .add(transactions::Column::FromAccountId.eq(account_id))
                        .add(transactions::Column::ToAccountId.eq(account_id)),
                )
                .order_by_desc(transactions::Column::CreatedAt)
                .limit(limit)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(Transaction::try_from(model)?);
            }
            Ok(out)
        }
        .await)
    }
}
