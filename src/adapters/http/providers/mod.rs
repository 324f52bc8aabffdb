//! HTTP adapter for provider listings and revenue reporting.

mod handlers;
mod routes;

pub use routes::provider_routes;
