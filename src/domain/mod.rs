//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, money, errors)
//! - `subscription` - Tiers, subscription lifecycle, revenue split, payment evaluation

pub mod foundation;
pub mod subscription;
