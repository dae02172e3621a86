//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes, DTOs, and the subscription guard
//! - `postgres` - sqlx-backed ledger store
//! - `memory` - in-memory ledger store for tests

pub mod http;
pub mod memory;
pub mod postgres;
