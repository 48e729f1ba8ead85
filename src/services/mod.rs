//! Business logic services.
//!
//! Services contain the ledger logic separated from HTTP handlers. Each one
//! receives the store it works against as an argument.

pub mod account_service;
pub mod transfer_service;
