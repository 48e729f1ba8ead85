//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Validates it and calls into the ledger services
//! 3. Returns HTTP response (JSON, status code)
//!
//! Handlers are generic over the [`Store`] so the same router runs against
//! PostgreSQL in production and the in-memory store in tests.

/// Account management endpoints
pub mod accounts;
/// Health check endpoint
pub mod health;
/// Transfer and ledger record endpoints
pub mod transactions;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::store::Store;

/// Build the HTTP router around a store.
pub fn router<S: Store + Clone>(store: S) -> Router {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check::<S>))
        // Account management routes
        .route(
            "/api/v1/accounts",
            post(accounts::create_account::<S>).get(accounts::list_accounts::<S>),
        )
        .route("/api/v1/accounts/{id}", get(accounts::get_account::<S>))
        // Transfer routes
        .route(
            "/api/v1/transfers",
            post(transactions::create_transfer::<S>),
        )
        .route(
            "/api/v1/transactions/{id}",
            get(transactions::get_transaction::<S>),
        )
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share the store with all handlers via State extraction
        .with_state(store)
}
