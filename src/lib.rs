//! Transfer ledger.
//!
//! Accounts, an append-only ledger of transfers, and an atomic transfer
//! operation that is safe under concurrent transfers between the same
//! accounts.
//!
//! # Layout
//!
//! - [`store`]: storage traits, the transaction boundary, PostgreSQL and
//!   in-memory backends
//! - [`services`]: the transfer orchestrator and account operations
//! - [`handlers`]: the axum HTTP surface
//! - [`config`], [`db`]: environment configuration and pool/migrations

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

pub use error::{AppError, Constraint, StoreError};
pub use models::{
    account::Account,
    transaction::{Transaction, TransferResult},
};
pub use services::transfer_service::transfer;
pub use store::{Store, memory::MemoryStore, postgres::PgStore, run_atomic};
