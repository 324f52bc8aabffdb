//! In-memory adapters for tests and local development.

mod ledger_store;
mod wallet_directory;

pub use ledger_store::InMemoryLedgerStore;
pub use wallet_directory::InMemoryWalletDirectory;
