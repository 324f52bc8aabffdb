//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session validators (JWT, mock)
//! - `http` - REST API (axum)
//! - `ledger` - Ledger clients (Horizon, mock)
//! - `memory` - In-memory stores for tests and local development
//! - `notify` - Renewal notifiers
//! - `postgres` - PostgreSQL repositories
//! - `scheduler` - Periodic renewal sweeps

pub mod auth;
pub mod http;
pub mod ledger;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod scheduler;
