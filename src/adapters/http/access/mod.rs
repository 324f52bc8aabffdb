//! HTTP adapter for the access gate.

pub mod dto;
mod handlers;
mod routes;

pub use dto::{AccessResponse, SignalAccessParams, SignalAccessResponse};
pub use routes::access_routes;
