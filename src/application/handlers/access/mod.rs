//! Access gating.
//!
//! Downstream content systems ask the `AccessGate` whether a user may see a
//! provider's signals.

mod access_gate;

pub use access_gate::{AccessDecision, AccessGate};
