//! Ledger client adapters.
//!
//! - `HorizonLedgerClient` - production client for Horizon-compatible APIs
//! - `MockLedgerClient` - fixed transactions for tests

mod horizon;
mod mock;

pub use horizon::{HorizonConfig, HorizonLedgerClient};
pub use mock::MockLedgerClient;
