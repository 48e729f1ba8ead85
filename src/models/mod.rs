//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request and response bodies built on top of them.

/// Account model
pub mod account;
/// Ledger record and transfer models
pub mod transaction;
