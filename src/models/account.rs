//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing an account
//! - `CreateAccountParams` / `ListAccountsParams`: store-level arguments
//! - `CreateAccountRequest` / `ListAccountsQuery`: HTTP request shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest page a single `list_accounts` call may return.
pub const MAX_PAGE_LIMIT: i64 = 10;

/// Currency codes accepted when creating accounts and transfers.
pub const SUPPORTED_CURRENCIES: [&str; 5] = ["USD", "EUR", "CAD", "GBP", "JPY"];

pub fn is_supported_currency(currency: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&currency)
}

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. The identifier is supplied by the caller
/// at creation time, the currency never changes afterwards, and the balance
/// only moves through `add_account_balance` inside a transfer.
///
/// # Balance Storage
///
/// Balances are stored as `i64` minor units (cents) to avoid floating-point
/// errors. Must be >= 0 (enforced by the `accounts_balance_check` constraint).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Account {
    /// Externally supplied unique identifier
    pub id: i64,

    /// Currency code (ISO 4217, 3 letters), fixed at creation
    pub currency: String,

    /// Current balance in minor units
    pub balance: i64,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,
}

/// Arguments for inserting a new account row.
#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub id: i64,
    pub currency: String,
    pub balance: i64,
}

/// Pagination window for listing accounts, ordered by id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAccountsParams {
    pub limit: i64,
    pub offset: i64,
}

impl ListAccountsParams {
    /// Whether the window is inside the allowed bounds
    /// (`1 <= limit <= MAX_PAGE_LIMIT`, `offset >= 0`).
    pub fn is_valid(&self) -> bool {
        (1..=MAX_PAGE_LIMIT).contains(&self.limit) && self.offset >= 0
    }
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 42,
///   "currency": "USD",
///   "balance": 10000
/// }
/// ```
///
/// # Validation
///
/// - `id`: Required, must be >= 1
/// - `currency`: Required, one of the supported currency codes
/// - `balance`: Optional, defaults to 0; negative values are rejected by the store
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub id: i64,

    pub currency: String,

    #[serde(default)]
    pub balance: i64,
}

impl From<CreateAccountRequest> for CreateAccountParams {
    fn from(request: CreateAccountRequest) -> Self {
        Self {
            id: request.id,
            currency: request.currency,
            balance: request.balance,
        }
    }
}

/// Query string for `GET /api/v1/accounts`.
///
/// Pages are 1-based: `page_id=1&page_size=5` returns the first five accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    pub page_id: i64,
    pub page_size: i64,
}
