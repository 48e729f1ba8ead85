//! PostgreSQL store.
//!
//! Queries are free functions over a `PgConnection`; `PgTx` hands them the
//! connection owned by its open transaction.
//!
//! # Atomicity Guarantees
//!
//! `PgTx` wraps a `sqlx::Transaction`. Dropping it without `commit` makes
//! sqlx issue a `ROLLBACK` when the connection goes back to the pool.

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres};

use super::{AccountStore, Store, TransactionLogStore, UnitOfWork};
use crate::{
    db::DbPool,
    error::{Constraint, StoreError},
    models::{
        account::{Account, CreateAccountParams, ListAccountsParams},
        transaction::{CreateTransactionParams, Transaction},
    },
};

/// PostgreSQL implementation of [`Store`].
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One open PostgreSQL transaction.
pub struct PgTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl AccountStore for PgTx {
    async fn create_account(&mut self, params: CreateAccountParams) -> Result<Account, StoreError> {
        create_account(&mut *self.tx, params).await
    }

    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError> {
        get_account(&mut *self.tx, id).await
    }

    async fn list_accounts(&mut self, params: ListAccountsParams) -> Result<Vec<Account>, StoreError> {
        list_accounts(&mut *self.tx, params).await
    }

    async fn add_account_balance(&mut self, id: i64, delta: i64) -> Result<Account, StoreError> {
        add_account_balance(&mut *self.tx, id, delta).await
    }
}

#[async_trait]
impl TransactionLogStore for PgTx {
    async fn create_transaction(
        &mut self,
        params: CreateTransactionParams,
    ) -> Result<Transaction, StoreError> {
        create_transaction(&mut *self.tx, params).await
    }

    async fn get_transaction(&mut self, id: i64) -> Result<Transaction, StoreError> {
        get_transaction(&mut *self.tx, id).await
    }
}

#[async_trait]
impl UnitOfWork for PgTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

async fn create_account(
    conn: &mut PgConnection,
    params: CreateAccountParams,
) -> Result<Account, StoreError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (id, currency, balance)
        VALUES ($1, $2, $3)
        RETURNING id, currency, balance, created_at
        "#,
    )
    .bind(params.id)
    .bind(params.currency)
    .bind(params.balance)
    .fetch_one(conn)
    .await?;

    Ok(account)
}

async fn get_account(conn: &mut PgConnection, id: i64) -> Result<Account, StoreError> {
    sqlx::query_as::<_, Account>(
        "SELECT id, currency, balance, created_at FROM accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(StoreError::NotFound)
}

async fn list_accounts(
    conn: &mut PgConnection,
    params: ListAccountsParams,
) -> Result<Vec<Account>, StoreError> {
    if !params.is_valid() {
        return Err(StoreError::constraint(Constraint::InvalidPage));
    }

    let accounts = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, currency, balance, created_at
        FROM accounts
        ORDER BY id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(conn)
    .await?;

    Ok(accounts)
}

/// `balance = balance + delta` evaluated by the database.
///
/// The `UPDATE` takes the row lock and holds it until the surrounding
/// transaction ends. The `accounts_balance_check` constraint rejects a
/// negative result.
async fn add_account_balance(
    conn: &mut PgConnection,
    id: i64,
    delta: i64,
) -> Result<Account, StoreError> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET balance = balance + $1
        WHERE id = $2
        RETURNING id, currency, balance, created_at
        "#,
    )
    .bind(delta)
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(StoreError::NotFound)
}

async fn create_transaction(
    conn: &mut PgConnection,
    params: CreateTransactionParams,
) -> Result<Transaction, StoreError> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (source_account_id, destination_account_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id, source_account_id, destination_account_id, amount, created_at
        "#,
    )
    .bind(params.source_account_id)
    .bind(params.destination_account_id)
    .bind(params.amount)
    .fetch_one(conn)
    .await?;

    Ok(transaction)
}

async fn get_transaction(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Transaction, StoreError> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, source_account_id, destination_account_id, amount, created_at
        FROM transactions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(StoreError::NotFound)
}
