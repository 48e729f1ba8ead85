//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/v1/accounts - Create new account
//! - GET /api/v1/accounts/{id} - Get account by ID
//! - GET /api/v1/accounts?page_id=&page_size= - List accounts by id

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};

use crate::{
    error::AppError,
    models::account::{
        Account, CreateAccountRequest, ListAccountsParams, ListAccountsQuery, MAX_PAGE_LIMIT,
        is_supported_currency,
    },
    services::account_service,
    store::Store,
};

/// Smallest `page_size` the list endpoint accepts.
const MIN_PAGE_SIZE: i64 = 5;

/// Create a new account.
///
/// # Request Body
///
/// ```json
/// {
///   "id": 42,
///   "currency": "USD",
///   "balance": 1000
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: Returns the created account
/// - **Error (400)**: Malformed body, id < 1, or unsupported currency
/// - **Error (403)**: Duplicate id or negative balance
pub async fn create_account<S: Store + Clone>(
    State(store): State<S>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let Json(request) = payload?;

    if request.id < 1 {
        return Err(AppError::InvalidRequest(
            "Account id must be positive".to_string(),
        ));
    }
    if !is_supported_currency(&request.currency) {
        return Err(AppError::InvalidRequest(format!(
            "Unsupported currency: {}",
            request.currency
        )));
    }

    let account = account_service::create_account(&store, request.into()).await?;

    Ok(Json(account))
}

/// Get a specific account by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns account details
/// - **Error (400)**: id is not a positive integer
/// - **Error (404)**: Account not found
pub async fn get_account<S: Store + Clone>(
    State(store): State<S>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Account>, AppError> {
    let Path(account_id) = path?;

    if account_id < 1 {
        return Err(AppError::InvalidRequest(
            "Account id must be positive".to_string(),
        ));
    }

    let account = account_service::get_account(&store, account_id).await?;

    Ok(Json(account))
}

/// List accounts, one page at a time.
///
/// # Query Parameters
///
/// - `page_id`: 1-based page number, required, >= 1
/// - `page_size`: accounts per page, required, between 5 and 10
///
/// # Ordering
///
/// Accounts are returned in ascending id order.
pub async fn list_accounts<S: Store + Clone>(
    State(store): State<S>,
    query: Result<Query<ListAccountsQuery>, QueryRejection>,
) -> Result<Json<Vec<Account>>, AppError> {
    let Query(query) = query?;

    if query.page_id < 1 {
        return Err(AppError::InvalidRequest(
            "page_id must be at least 1".to_string(),
        ));
    }
    if !(MIN_PAGE_SIZE..=MAX_PAGE_LIMIT).contains(&query.page_size) {
        return Err(AppError::InvalidRequest(
            "page_size must be between 5 and 10".to_string(),
        ));
    }

    let offset = (query.page_id - 1)
        .checked_mul(query.page_size)
        .ok_or_else(|| AppError::InvalidRequest("page_id is too large".to_string()))?;
    let params = ListAccountsParams {
        limit: query.page_size,
        offset,
    };
    let accounts = account_service::list_accounts(&store, params).await?;

    Ok(Json(accounts))
}
