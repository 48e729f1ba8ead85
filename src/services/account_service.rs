//! Account service - create, fetch and page through accounts.
//!
//! Each call runs in its own short unit of work. Reads never take row locks,
//! so they do not wait behind an in-flight transfer.

use crate::{
    error::{Constraint, StoreError},
    models::account::{Account, CreateAccountParams, ListAccountsParams},
    store::{AccountStore, Store, run_atomic},
};

/// Insert a new account.
///
/// # Errors
///
/// - `ConstraintViolation`: negative initial balance or duplicate id
/// - `Unavailable`: the store could not be reached
pub async fn create_account<S: Store + ?Sized>(
    store: &S,
    params: CreateAccountParams,
) -> Result<Account, StoreError> {
    let account = run_atomic(store, move |tx| tx.create_account(params)).await?;
    tracing::info!(account_id = account.id, currency = %account.currency, "Account created");
    Ok(account)
}

/// Fetch one account by id.
pub async fn get_account<S: Store + ?Sized>(store: &S, id: i64) -> Result<Account, StoreError> {
    run_atomic(store, move |tx| tx.get_account(id)).await
}

/// Page through accounts ordered by id ascending.
///
/// Rejects out-of-range pagination with `ConstraintViolation` before
/// opening a unit of work.
pub async fn list_accounts<S: Store + ?Sized>(
    store: &S,
    params: ListAccountsParams,
) -> Result<Vec<Account>, StoreError> {
    if !params.is_valid() {
        return Err(StoreError::constraint(Constraint::InvalidPage));
    }

    run_atomic(store, move |tx| tx.list_accounts(params)).await
}
