//! Storage contract for the ledger core.
//!
//! The core never talks to a database directly. It goes through these traits:
//!
//! - [`AccountStore`] and [`TransactionLogStore`]: the row-level operations
//! - [`UnitOfWork`]: a handle bound to one open transaction, exposing both stores
//! - [`Store`]: something that can open a unit of work
//!
//! [`run_atomic`] is the transaction boundary: it opens a unit of work, runs a
//! closure against it and commits or rolls back.
//!
//! Two backends implement the contract: [`postgres::PgStore`] and
//! [`memory::MemoryStore`]. Both enforce the same invariants.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::{
    error::StoreError,
    models::{
        account::{Account, CreateAccountParams, ListAccountsParams},
        transaction::{CreateTransactionParams, Transaction},
    },
};

/// Access to account rows.
#[async_trait]
pub trait AccountStore: Send {
    /// Insert a new account.
    ///
    /// Fails with `ConstraintViolation` on a negative initial balance or a
    /// duplicate id.
    async fn create_account(&mut self, params: CreateAccountParams) -> Result<Account, StoreError>;

    /// Fetch one account, `NotFound` if absent.
    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError>;

    /// Page through accounts ordered by id ascending.
    async fn list_accounts(&mut self, params: ListAccountsParams) -> Result<Vec<Account>, StoreError>;

    /// Apply `delta` to the balance as one read-modify-write inside the store.
    ///
    /// Takes the row lock for the rest of the unit of work. Fails with
    /// `ConstraintViolation` if the balance would go negative and `NotFound`
    /// if the account does not exist.
    async fn add_account_balance(&mut self, id: i64, delta: i64) -> Result<Account, StoreError>;
}

/// Append-only log of completed transfers.
#[async_trait]
pub trait TransactionLogStore: Send {
    /// Append a record.
    ///
    /// Fails with `ConstraintViolation` if `amount <= 0` or the two accounts
    /// are the same, and with `NotFound` if either account does not exist.
    async fn create_transaction(
        &mut self,
        params: CreateTransactionParams,
    ) -> Result<Transaction, StoreError>;

    /// Fetch one record, `NotFound` if absent.
    async fn get_transaction(&mut self, id: i64) -> Result<Transaction, StoreError>;
}

/// A handle bound to one open transaction.
///
/// Dropping the handle without calling `commit` rolls the transaction back,
/// so panics and cancelled futures never leave partial writes behind.
#[async_trait]
pub trait UnitOfWork: AccountStore + TransactionLogStore {
    /// Make every write done through this handle visible at once.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discard every write done through this handle.
    async fn rollback(self) -> Result<(), StoreError>;
}

/// Something that can open a unit of work.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: UnitOfWork + 'static;

    /// Open a new transaction. Fails with `Unavailable` if no connection
    /// could be acquired.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Run `f` inside one atomic unit of work.
///
/// - `f` succeeds → commit; a commit failure is returned as the error of the
///   whole call
/// - `f` fails → rollback, then the original error is returned
/// - `f` panics or the returned future is dropped → the handle is dropped,
///   which rolls the transaction back
pub async fn run_atomic<S, T, F>(store: &S, f: F) -> Result<T, StoreError>
where
    S: Store + ?Sized,
    T: Send,
    F: for<'a> FnOnce(&'a mut S::Tx) -> BoxFuture<'a, Result<T, StoreError>> + Send,
{
    let mut tx = store.begin().await?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await.inspect_err(|e| {
                tracing::error!("Commit failed: {}", e);
            })?;
            Ok(value)
        }
        Err(err) => {
            tracing::debug!("Rolling back unit of work: {}", err);
            if let Err(rollback_err) = tx.rollback().await {
                // The connection is discarded either way; keep the original cause.
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}
