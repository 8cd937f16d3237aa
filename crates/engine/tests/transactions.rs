use chrono::{Duration, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AccountKind, AdjustBalanceCmd, CategoryKind, CoverShortfallCmd, Currency, Engine, EngineError,
    ExpenseCmd, IncomeCmd, Money, TransactionDetail, TransferCmd, TxMeta,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn eur(minor: i64) -> Money {
    Money::new(minor, Currency::Eur)
}

async fn checking(engine: &Engine, owner: &str, name: &str, opening: i64) -> Uuid {
    engine
        .new_account(owner, name, AccountKind::Checking, eur(opening))
        .await
        .unwrap()
}

async fn expense_category(engine: &Engine, owner: &str, name: &str) -> Uuid {
    engine
        .new_category(owner, name, CategoryKind::Expense, false, None)
        .await
        .unwrap()
}

#[tokio::test]
async fn income_then_expense_moves_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 0).await;

    engine
        .record_income(IncomeCmd::new("alice", account, eur(100_000), Utc::now()))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new("alice", account, eur(35_000), Utc::now()))
        .await
        .unwrap();

    let summary = engine.account_summary("alice", account).await.unwrap();
    assert_eq!(summary.balance, eur(65_000));
    assert_eq!(summary.spendable, eur(65_000));
}

#[tokio::test]
async fn amounts_are_strictly_positive() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 1_000).await;

    let err = engine
        .record_income(IncomeCmd::new("alice", account, eur(0), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .record_expense(ExpenseCmd::new("alice", account, eur(-5), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn reserved_funds_are_protected_from_ordinary_spending() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 10_000).await;
    let rent = expense_category(&engine, "alice", "Rent").await;

    engine
        .increase_reservation("alice", rent, account, eur(8_000))
        .await
        .unwrap();

    // Balance is 10 000 but only 2 000 is spendable.
    let err = engine
        .record_expense(ExpenseCmd::new("alice", account, eur(2_001), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientSpendable(_)));

    engine
        .record_expense(ExpenseCmd::new("alice", account, eur(2_000), Utc::now()))
        .await
        .unwrap();
    let summary = engine.account_summary("alice", account).await.unwrap();
    assert_eq!(summary.balance, eur(8_000));
    assert_eq!(summary.spendable, eur(0));
    assert_eq!(summary.reserved_total, eur(8_000));
}

#[tokio::test]
async fn cover_shortfall_withdraws_then_spends_atomically() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 10_000).await;
    let rent = expense_category(&engine, "alice", "Rent").await;

    engine
        .increase_reservation("alice", rent, account, eur(8_000))
        .await
        .unwrap();

    // Spendable is 2 000; spending 5 000 needs 3 000 from the rent fund.
    let tx_id = engine
        .cover_shortfall_then_spend(
            CoverShortfallCmd::new("alice", account, eur(5_000), Utc::now())
                .withdrawal(rent, eur(3_000)),
        )
        .await
        .unwrap();

    let summary = engine.account_summary("alice", account).await.unwrap();
    assert_eq!(summary.balance, eur(5_000));
    assert_eq!(summary.reserved_total, eur(5_000));
    assert_eq!(summary.spendable, eur(0));

    let tx = engine.transaction("alice", tx_id).await.unwrap();
    assert_eq!(
        tx.detail,
        TransactionDetail::Expense {
            from_account_id: account
        }
    );
}

#[tokio::test]
async fn uncovered_shortfall_rolls_everything_back() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 10_000).await;
    let rent = expense_category(&engine, "alice", "Rent").await;

    engine
        .increase_reservation("alice", rent, account, eur(8_000))
        .await
        .unwrap();

    // 2 000 withdrawn is not enough for a 5 000 expense over 2 000 spendable.
    let err = engine
        .cover_shortfall_then_spend(
            CoverShortfallCmd::new("alice", account, eur(5_000), Utc::now())
                .withdrawal(rent, eur(2_000)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ShortfallNotCovered(_)));

    // The withdrawal was rolled back with the rest.
    let summary = engine.account_summary("alice", account).await.unwrap();
    assert_eq!(summary.balance, eur(10_000));
    assert_eq!(summary.reserved_total, eur(8_000));
}

#[tokio::test]
async fn transfers_move_money_between_accounts() {
    let (engine, _db) = engine_with_db().await;
    let main = checking(&engine, "alice", "Main", 10_000).await;
    let savings = engine
        .new_account("alice", "Savings", AccountKind::Savings, eur(0))
        .await
        .unwrap();

    engine
        .record_transfer(TransferCmd::new("alice", main, savings, eur(4_000), Utc::now()))
        .await
        .unwrap();

    let main_summary = engine.account_summary("alice", main).await.unwrap();
    let savings_summary = engine.account_summary("alice", savings).await.unwrap();
    assert_eq!(main_summary.balance, eur(6_000));
    assert_eq!(savings_summary.balance, eur(4_000));

    let err = engine
        .record_transfer(TransferCmd::new("alice", main, main, eur(100), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // The source side obeys the spendable rule.
    let rent = expense_category(&engine, "alice", "Rent").await;
    engine
        .increase_reservation("alice", rent, main, eur(6_000))
        .await
        .unwrap();
    let err = engine
        .record_transfer(TransferCmd::new("alice", main, savings, eur(1), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientSpendable(_)));
}

#[tokio::test]
async fn adjustment_targets_the_spendable_figure() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 10_000).await;
    let rent = expense_category(&engine, "alice", "Rent").await;
    engine
        .increase_reservation("alice", rent, account, eur(4_000))
        .await
        .unwrap();

    // Spendable 6 000 -> 7 500: balance grows by 1 500.
    let tx_id = engine
        .adjust_balance(AdjustBalanceCmd::new("alice", account, eur(7_500), Utc::now()))
        .await
        .unwrap();
    let summary = engine.account_summary("alice", account).await.unwrap();
    assert_eq!(summary.balance, eur(11_500));
    assert_eq!(summary.spendable, eur(7_500));

    let tx = engine.transaction("alice", tx_id).await.unwrap();
    assert_eq!(tx.amount, eur(1_500));
    assert_eq!(
        tx.detail,
        TransactionDetail::Adjustment {
            to_account_id: account,
            adjusted: eur(1_500),
        }
    );

    // Spendable 7 500 -> 1 000: balance shrinks by 6 500, reservations stay.
    engine
        .adjust_balance(AdjustBalanceCmd::new("alice", account, eur(1_000), Utc::now()))
        .await
        .unwrap();
    let summary = engine.account_summary("alice", account).await.unwrap();
    assert_eq!(summary.balance, eur(5_000));
    assert_eq!(summary.reserved_total, eur(4_000));
}

#[tokio::test]
async fn adjustment_edge_cases() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 5_000).await;

    let err = engine
        .adjust_balance(AdjustBalanceCmd::new("alice", account, eur(5_000), Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NoOpAdjustment);

    let err = engine
        .adjust_balance(AdjustBalanceCmd::new("alice", account, eur(-1), Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NegativeTargetSpendable);
}

#[tokio::test]
async fn deleting_a_transaction_reverses_its_effect() {
    let (engine, _db) = engine_with_db().await;
    let main = checking(&engine, "alice", "Main", 0).await;
    let savings = engine
        .new_account("alice", "Savings", AccountKind::Savings, eur(0))
        .await
        .unwrap();

    let income = engine
        .record_income(IncomeCmd::new("alice", main, eur(10_000), Utc::now()))
        .await
        .unwrap();
    let expense = engine
        .record_expense(ExpenseCmd::new("alice", main, eur(3_000), Utc::now()))
        .await
        .unwrap();
    let transfer = engine
        .record_transfer(TransferCmd::new("alice", main, savings, eur(2_000), Utc::now()))
        .await
        .unwrap();
    let adjustment = engine
        .adjust_balance(AdjustBalanceCmd::new("alice", main, eur(6_000), Utc::now()))
        .await
        .unwrap();

    engine.delete_transaction("alice", adjustment).await.unwrap();
    engine.delete_transaction("alice", transfer).await.unwrap();
    engine.delete_transaction("alice", expense).await.unwrap();
    engine.delete_transaction("alice", income).await.unwrap();

    let summary = engine.account_summary("alice", main).await.unwrap();
    assert_eq!(summary.balance, eur(0));
    let summary = engine.account_summary("alice", savings).await.unwrap();
    assert_eq!(summary.balance, eur(0));

    let err = engine.transaction("alice", income).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn deletion_never_breaks_the_reservation_invariant() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 0).await;
    let rent = expense_category(&engine, "alice", "Rent").await;

    let income = engine
        .record_income(IncomeCmd::new("alice", account, eur(10_000), Utc::now()))
        .await
        .unwrap();
    engine
        .increase_reservation("alice", rent, account, eur(8_000))
        .await
        .unwrap();

    // Undoing the income would leave 0 balance against 8 000 reserved.
    let err = engine.delete_transaction("alice", income).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientUnallocatedBalance(_)));

    engine
        .decrease_reservation("alice", rent, account, eur(8_000))
        .await
        .unwrap();
    engine.delete_transaction("alice", income).await.unwrap();
}

#[tokio::test]
async fn accounts_with_history_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 0).await;

    let income = engine
        .record_income(IncomeCmd::new("alice", account, eur(1_000), Utc::now()))
        .await
        .unwrap();

    let err = engine.delete_account("alice", account).await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine.delete_transaction("alice", income).await.unwrap();
    engine.delete_account("alice", account).await.unwrap();
}

#[tokio::test]
async fn deleting_a_category_detaches_its_transactions() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 0).await;
    let groceries = expense_category(&engine, "alice", "Groceries").await;

    let tx_id = engine
        .record_income(
            IncomeCmd::new("alice", account, eur(1_000), Utc::now())
                .meta(TxMeta::new(Utc::now()).category_id(groceries)),
        )
        .await
        .unwrap();

    engine.delete_category("alice", groceries).await.unwrap();

    // The record survives without its category reference.
    let tx = engine.transaction("alice", tx_id).await.unwrap();
    assert_eq!(tx.category_id, None);
}

#[tokio::test]
async fn transactions_reject_unknown_categories() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 0).await;

    let err = engine
        .record_income(
            IncomeCmd::new("alice", account, eur(1_000), Utc::now())
                .meta(TxMeta::new(Utc::now()).category_id(Uuid::new_v4())),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn listing_returns_both_legs_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let main = checking(&engine, "alice", "Main", 10_000).await;
    let savings = engine
        .new_account("alice", "Savings", AccountKind::Savings, eur(0))
        .await
        .unwrap();

    let base = Utc::now();
    engine
        .record_income(IncomeCmd::new(
            "alice",
            main,
            eur(100),
            base - Duration::minutes(3),
        ))
        .await
        .unwrap();
    engine
        .record_transfer(TransferCmd::new(
            "alice",
            main,
            savings,
            eur(200),
            base - Duration::minutes(2),
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            "alice",
            main,
            eur(300),
            base - Duration::minutes(1),
        ))
        .await
        .unwrap();

    let listed = engine
        .list_transactions_for_account("alice", main, 10)
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].amount, eur(300));
    assert_eq!(listed[2].amount, eur(100));

    // The savings account only sees the incoming transfer leg.
    let listed = engine
        .list_transactions_for_account("alice", savings, 10)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].amount, eur(200));

    let listed = engine
        .list_transactions_for_account("alice", main, 2)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn owners_cannot_touch_foreign_records() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, "alice", "Main", 0).await;
    let tx_id = engine
        .record_income(IncomeCmd::new("alice", account, eur(1_000), Utc::now()))
        .await
        .unwrap();

    let err = engine.delete_transaction("mallory", tx_id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = engine
        .list_transactions_for_account("mallory", account, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
