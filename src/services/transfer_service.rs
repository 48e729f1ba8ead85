//! Transfer service - the atomic money transfer between two accounts.
//!
//! A transfer is three steps inside one unit of work:
//!
//! 1. Append the ledger record (the transactions table constraints reject a
//!    non-positive amount or identical accounts before anything else happens)
//! 2. Apply both balance deltas in lock order (see [`lock_order`])
//! 3. Re-read both accounts for the result
//!
//! # Atomicity Guarantees
//!
//! All three steps run in the same database transaction via
//! [`run_atomic`]. Any failure rolls everything back; nothing is retried.
//!
//! # Deadlock Avoidance
//!
//! Each balance update takes a row lock held until commit. Two transfers
//! between the same pair in opposite directions would lock the rows in
//! opposite order and wait on each other forever. Locking the smaller id
//! first makes every transfer acquire locks in the same global order.

use futures::FutureExt;

use crate::{
    error::StoreError,
    models::transaction::{CreateTransactionParams, Transaction, TransferResult},
    store::{AccountStore, Store, TransactionLogStore, run_atomic},
};

/// One balance change: `(account_id, delta)`.
pub type BalanceDelta = (i64, i64);

/// The two balance changes of a transfer, in the order they must be applied.
///
/// The account with the smaller id always comes first, whatever the
/// direction of the transfer.
pub fn lock_order(from_account_id: i64, to_account_id: i64, amount: i64) -> [BalanceDelta; 2] {
    let debit = (from_account_id, -amount);
    let credit = (to_account_id, amount);

    if from_account_id < to_account_id {
        [debit, credit]
    } else {
        [credit, debit]
    }
}

/// Execute a transfer in its own unit of work.
///
/// # Errors
///
/// - `ConstraintViolation`: amount <= 0, same account, or insufficient funds
/// - `NotFound`: either account does not exist
/// - `Unavailable`: the unit of work could not begin or commit
pub async fn transfer<S: Store + ?Sized>(
    store: &S,
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
) -> Result<TransferResult, StoreError> {
    let result = run_atomic(store, move |tx| {
        transfer_in(tx, from_account_id, to_account_id, amount).boxed()
    })
    .await;

    match &result {
        Ok(transfer) => tracing::info!(
            transaction_id = transfer.transaction.id,
            from_account_id,
            to_account_id,
            amount,
            "Transfer committed"
        ),
        Err(e) => tracing::warn!(
            from_account_id,
            to_account_id,
            amount,
            error = %e,
            "Transfer failed"
        ),
    }

    result
}

/// The body of a transfer, run against an already open unit of work.
///
/// Does not commit or roll back; the caller owns the boundary.
pub async fn transfer_in<Q>(
    tx: &mut Q,
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
) -> Result<TransferResult, StoreError>
where
    Q: AccountStore + TransactionLogStore + ?Sized,
{
    let transaction = tx
        .create_transaction(CreateTransactionParams {
            source_account_id: from_account_id,
            destination_account_id: to_account_id,
            amount,
        })
        .await?;

    for (account_id, delta) in lock_order(from_account_id, to_account_id, amount) {
        tx.add_account_balance(account_id, delta).await?;
    }

    let from_account = tx.get_account(from_account_id).await?;
    let to_account = tx.get_account(to_account_id).await?;

    Ok(TransferResult {
        transaction,
        from_account,
        to_account,
    })
}

/// Get a ledger record by id.
pub async fn get_transaction<S: Store + ?Sized>(
    store: &S,
    transaction_id: i64,
) -> Result<Transaction, StoreError> {
    run_atomic(store, move |tx| tx.get_transaction(transaction_id)).await
}
