//! PostgreSQL backend tests.
//!
//! These need a live database and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/ledger_test cargo test -- --ignored
//! ```
//!
//! Each test uses its own id range so they can share one database.

use std::time::Duration;

use futures::future::join_all;
use transfer_ledger::{
    Constraint, PgStore, Store, StoreError,
    db::{create_pool, run_migrations},
    models::account::CreateAccountParams,
    services::{account_service, transfer_service},
    store::AccountStore,
};

async fn store() -> PgStore {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&url, 10).await.unwrap();
    run_migrations(&pool).await.unwrap();
    PgStore::new(pool)
}

/// Remove leftovers from a previous run, then create fresh accounts.
async fn seed(store: &PgStore, accounts: &[(i64, i64)]) {
    let ids: Vec<i64> = accounts.iter().map(|(id, _)| *id).collect();
    sqlx::query(
        "DELETE FROM transactions \
         WHERE source_account_id = ANY($1) OR destination_account_id = ANY($1)",
    )
    .bind(&ids)
    .execute(store.pool())
    .await
    .unwrap();
    sqlx::query("DELETE FROM accounts WHERE id = ANY($1)")
        .bind(&ids)
        .execute(store.pool())
        .await
        .unwrap();

    for (id, balance) in accounts {
        account_service::create_account(
            store,
            CreateAccountParams {
                id: *id,
                currency: "USD".to_string(),
                balance: *balance,
            },
        )
        .await
        .unwrap();
    }
}

async fn balance(store: &PgStore, id: i64) -> i64 {
    account_service::get_account(store, id).await.unwrap().balance
}

async fn ledger_count(store: &PgStore, id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM transactions \
         WHERE source_account_id = $1 OR destination_account_id = $1",
    )
    .bind(id)
    .fetch_one(store.pool())
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn transfer_commits_record_and_balances() {
    let store = store().await;
    let (a, b) = (1_001, 1_002);
    seed(&store, &[(a, 1000), (b, 500)]).await;

    let result = transfer_service::transfer(&store, a, b, 10).await.unwrap();

    assert_eq!(result.from_account.balance, 990);
    assert_eq!(result.to_account.balance, 510);
    assert_eq!(balance(&store, a).await, 990);
    assert_eq!(balance(&store, b).await, 510);
    assert_eq!(
        transfer_service::get_transaction(&store, result.transaction.id)
            .await
            .unwrap(),
        result.transaction
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn constraint_failures_roll_back() {
    let store = store().await;
    let (a, b) = (2_001, 2_002);
    seed(&store, &[(a, 5), (b, 500)]).await;

    assert_eq!(
        transfer_service::transfer(&store, a, b, 10).await.unwrap_err(),
        StoreError::ConstraintViolation(Constraint::NegativeBalance)
    );
    assert_eq!(
        transfer_service::transfer(&store, a, b, 0).await.unwrap_err(),
        StoreError::ConstraintViolation(Constraint::NonPositiveAmount)
    );
    assert_eq!(
        transfer_service::transfer(&store, a, a, 1).await.unwrap_err(),
        StoreError::ConstraintViolation(Constraint::SameAccount)
    );
    assert_eq!(
        transfer_service::transfer(&store, a, 2_999, 1).await.unwrap_err(),
        StoreError::NotFound
    );

    assert_eq!(balance(&store, a).await, 5);
    assert_eq!(balance(&store, b).await, 500);
    assert_eq!(ledger_count(&store, a).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn account_constraints_are_named() {
    let store = store().await;
    seed(&store, &[(3_001, 0)]).await;

    let duplicate = account_service::create_account(
        &store,
        CreateAccountParams {
            id: 3_001,
            currency: "USD".to_string(),
            balance: 0,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        duplicate,
        StoreError::ConstraintViolation(Constraint::DuplicateAccount)
    );

    let mut tx = store.begin().await.unwrap();
    assert_eq!(
        tx.add_account_balance(3_001, i64::MAX).await.map(|a| a.balance),
        Ok(i64::MAX)
    );
    assert!(matches!(
        tx.add_account_balance(3_001, 1).await,
        Err(StoreError::ConstraintViolation(Constraint::Other(_)))
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn opposite_direction_transfers_do_not_deadlock() {
    let store = store().await;
    let (a, b) = (4_001, 4_002);
    seed(&store, &[(a, 10_000), (b, 10_000)]).await;

    let tasks = (0..40).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            transfer_service::transfer(&store, from, to, 10).await
        })
    });
    let results = tokio::time::timeout(Duration::from_secs(30), join_all(tasks))
        .await
        .expect("transfers did not finish");

    for result in results {
        result.unwrap().unwrap();
    }
    assert_eq!(balance(&store, a).await + balance(&store, b).await, 20_000);
    assert_eq!(balance(&store, a).await, 10_000);
    assert_eq!(ledger_count(&store, a).await, 40);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_debits_never_overdraw() {
    let store = store().await;
    let (a, b) = (5_001, 5_002);
    seed(&store, &[(a, 100), (b, 0)]).await;

    let tasks = (0..20).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { transfer_service::transfer(&store, a, b, 10).await })
    });
    let results = join_all(tasks).await;

    let succeeded = results
        .into_iter()
        .filter(|result| matches!(result, Ok(Ok(_))))
        .count();
    assert_eq!(succeeded, 10);
    assert_eq!(balance(&store, a).await, 0);
    assert_eq!(balance(&store, b).await, 100);
}
