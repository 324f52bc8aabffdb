//! Wallet directory port.
//!
//! Resolves a user's registered ledger wallet. Providers must have one before
//! they can be paid; the address is snapshotted onto each subscription.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait WalletDirectory: Send + Sync {
    /// The user's wallet address, or `None` if none is registered.
    async fn wallet_for(&self, user_id: &UserId) -> Result<Option<String>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_directory_is_object_safe() {
        fn _accepts_dyn(_directory: &dyn WalletDirectory) {}
    }
}
