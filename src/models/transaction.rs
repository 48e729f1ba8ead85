//! Ledger record and transfer data models.
//!
//! This module defines:
//! - `Transaction`: Database entity representing one completed transfer
//! - `CreateTransactionParams`: arguments for appending a ledger record
//! - `TransferRequest`: Request body for the transfer endpoint
//! - `TransferResult`: What a successful transfer returns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::Account;

/// Represents a ledger record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Records are append-only: there is no
/// update or delete path. The id comes from a sequence, so ids increase
/// monotonically but may have gaps after rolled-back transfers.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned identifier
    pub id: i64,

    /// Account the money left
    pub source_account_id: i64,

    /// Account the money arrived at (never equal to the source)
    pub destination_account_id: i64,

    /// Amount in minor units (always > 0)
    pub amount: i64,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

/// Arguments for appending a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransactionParams {
    pub source_account_id: i64,
    pub destination_account_id: i64,
    pub amount: i64,
}

/// Request to transfer money between accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_account_id": 1,
///   "to_account_id": 2,
///   "amount": 25000,
///   "currency": "USD"
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// The ledger record and BOTH balance changes are written in the same
/// database transaction. If any step fails, nothing is persisted.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub currency: String,
}

/// Result of a committed transfer.
///
/// Holds the ledger record plus both accounts as they were right after the
/// balance changes, read inside the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transaction: Transaction,
    pub from_account: Account,
    pub to_account: Account,
}
