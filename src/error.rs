//! Error types and HTTP error response handling.
//!
//! This module defines two layers of errors:
//! - `StoreError`: what the ledger core and its stores return
//! - `AppError`: what HTTP handlers return, converted into JSON responses

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::error::ErrorKind;

/// Constraint names used by the relational schema.
///
/// The in-memory store reports the same names so both backends are
/// indistinguishable to callers.
pub mod constraint {
    pub const ACCOUNTS_PKEY: &str = "accounts_pkey";
    pub const ACCOUNTS_BALANCE_CHECK: &str = "accounts_balance_check";
    pub const TRANSACTIONS_AMOUNT_CHECK: &str = "transactions_amount_check";
    pub const TRANSACTIONS_DISTINCT_ACCOUNTS_CHECK: &str = "transactions_distinct_accounts_check";
}

/// Which invariant a write broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A balance would have gone below zero.
    NegativeBalance,

    /// A transfer amount was zero or negative.
    NonPositiveAmount,

    /// Source and destination of a transfer are the same account.
    SameAccount,

    /// An account with this identifier already exists.
    DuplicateAccount,

    /// Pagination arguments are outside the allowed range.
    InvalidPage,

    /// Any other named constraint (e.g. a NOT NULL column).
    Other(String),
}

impl Constraint {
    /// Map a schema constraint name to the invariant it guards.
    pub fn from_name(name: &str) -> Self {
        match name {
            constraint::ACCOUNTS_PKEY => Constraint::DuplicateAccount,
            constraint::ACCOUNTS_BALANCE_CHECK => Constraint::NegativeBalance,
            constraint::TRANSACTIONS_AMOUNT_CHECK => Constraint::NonPositiveAmount,
            constraint::TRANSACTIONS_DISTINCT_ACCOUNTS_CHECK => Constraint::SameAccount,
            other => Constraint::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::NegativeBalance => write!(f, "balance cannot be negative"),
            Constraint::NonPositiveAmount => write!(f, "amount must be positive"),
            Constraint::SameAccount => write!(f, "source and destination must differ"),
            Constraint::DuplicateAccount => write!(f, "account already exists"),
            Constraint::InvalidPage => write!(f, "invalid page bounds"),
            Constraint::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Errors surfaced by the ledger core.
///
/// Every store operation, the transaction boundary and the transfer
/// orchestrator return one of these three kinds and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Referenced account or transaction does not exist.
    #[error("not found")]
    NotFound,

    /// An invariant was broken. Caused by bad input or a race the invariant caught.
    #[error("constraint violation: {0}")]
    ConstraintViolation(Constraint),

    /// The store could not begin, run or commit the unit of work.
    ///
    /// Transient: the caller may retry the whole operation. A retry after a
    /// failed commit may double-apply if the commit actually succeeded.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn constraint(c: Constraint) -> Self {
        StoreError::ConstraintViolation(c)
    }

    /// Whether retrying the whole operation could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Postgres SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// Postgres SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Classify a sqlx error into the ledger taxonomy.
///
/// - `RowNotFound` → `NotFound`
/// - unique / check / not-null violations → `ConstraintViolation`
/// - foreign key violations → `NotFound` (a referenced account is missing)
/// - integer overflow of a balance → `ConstraintViolation`
/// - everything else (connection, pool, deadlock, serialization) → `Unavailable`
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) => {
                let name = db_err.constraint().unwrap_or_default();
                match db_err.kind() {
                    ErrorKind::ForeignKeyViolation => StoreError::NotFound,
                    ErrorKind::UniqueViolation
                    | ErrorKind::CheckViolation
                    | ErrorKind::NotNullViolation => {
                        StoreError::ConstraintViolation(Constraint::from_name(name))
                    }
                    _ => match db_err.code().as_deref() {
                        Some(NUMERIC_OUT_OF_RANGE) => StoreError::ConstraintViolation(
                            Constraint::Other("bigint out of range".to_string()),
                        ),
                        Some(DEADLOCK_DETECTED) => {
                            tracing::warn!("Deadlock detected by database: {}", db_err);
                            StoreError::Unavailable(err.to_string())
                        }
                        _ => StoreError::Unavailable(err.to_string()),
                    },
                }
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Application-wide error type for HTTP handlers.
///
/// # Status Code Mapping
///
/// - `InvalidRequest` → 400 Bad Request
/// - `Store(NotFound)` → 404 Not Found
/// - `Store(ConstraintViolation)` → 403 Forbidden
/// - `Store(Unavailable)` → 503 Service Unavailable (hides details from client)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body or parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Error from the ledger core.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Extractor rejections (malformed JSON, bad query string, non-numeric path
// segment) are all reported as 400 with axum's explanation.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::Store(StoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Resource not found".to_string(),
            ),
            AppError::Store(StoreError::ConstraintViolation(c)) => {
                (StatusCode::FORBIDDEN, "constraint_violation", c.to_string())
            }
            AppError::Store(StoreError::Unavailable(detail)) => {
                tracing::error!("Store unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "The ledger is temporarily unavailable".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
