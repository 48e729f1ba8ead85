//! Transfer HTTP handlers.
//!
//! This module implements the transfer-related API endpoints:
//! - POST /api/v1/transfers - Move money between two accounts
//! - GET /api/v1/transactions/{id} - Get a ledger record

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    error::AppError,
    models::{
        account::{Account, is_supported_currency},
        transaction::{Transaction, TransferRequest, TransferResult},
    },
    services::{account_service, transfer_service},
    store::Store,
};

/// Transfer money between accounts.
///
/// # Request Body
///
/// ```json
/// {
///   "from_account_id": 1,
///   "to_account_id": 2,
///   "amount": 10,
///   "currency": "USD"
/// }
/// ```
///
/// # Validation
///
/// - Both ids must be >= 1 and the amount must be positive
/// - Both accounts must exist and hold the request currency
///
/// Same-account transfers and insufficient funds are left to the ledger,
/// which rejects them with 403.
///
/// # Atomicity
///
/// The ledger record and both balances are written in a single database
/// transaction. Either all of it happens or none of it does.
pub async fn create_transfer<S: Store + Clone>(
    State(store): State<S>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResult>, AppError> {
    let Json(request) = payload?;

    if request.from_account_id < 1 || request.to_account_id < 1 {
        return Err(AppError::InvalidRequest(
            "Account ids must be positive".to_string(),
        ));
    }
    if request.amount <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }
    if !is_supported_currency(&request.currency) {
        return Err(AppError::InvalidRequest(format!(
            "Unsupported currency: {}",
            request.currency
        )));
    }

    valid_account(&store, request.from_account_id, &request.currency).await?;
    valid_account(&store, request.to_account_id, &request.currency).await?;

    let result = transfer_service::transfer(
        &store,
        request.from_account_id,
        request.to_account_id,
        request.amount,
    )
    .await?;

    Ok(Json(result))
}

/// Get a ledger record by ID.
pub async fn get_transaction<S: Store + Clone>(
    State(store): State<S>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Transaction>, AppError> {
    let Path(transaction_id) = path?;

    if transaction_id < 1 {
        return Err(AppError::InvalidRequest(
            "Transaction id must be positive".to_string(),
        ));
    }

    let transaction = transfer_service::get_transaction(&store, transaction_id).await?;

    Ok(Json(transaction))
}

/// Check that an account exists and is held in `currency`.
async fn valid_account<S: Store>(
    store: &S,
    account_id: i64,
    currency: &str,
) -> Result<Account, AppError> {
    let account = account_service::get_account(store, account_id).await?;

    if account.currency != currency {
        return Err(AppError::InvalidRequest(format!(
            "Account {} currency mismatch: {} vs {}",
            account.id, account.currency, currency
        )));
    }

    Ok(account)
}
