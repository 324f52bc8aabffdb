//! In-memory wallet directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::WalletDirectory;

/// Wallet addresses keyed by user, for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWalletDirectory {
    wallets: Arc<RwLock<HashMap<UserId, String>>>,
}

impl InMemoryWalletDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `register`.
    pub fn with_wallet(self, user_id: UserId, address: impl Into<String>) -> Self {
        // A freshly built directory has no other handle to contend with.
        if let Ok(mut wallets) = self.wallets.try_write() {
            wallets.insert(user_id, address.into());
        }
        self
    }

    pub async fn register(&self, user_id: UserId, address: impl Into<String>) {
        self.wallets.write().await.insert(user_id, address.into());
    }
}

#[async_trait]
impl WalletDirectory for InMemoryWalletDirectory {
    async fn wallet_for(&self, user_id: &UserId) -> Result<Option<String>, DomainError> {
        Ok(self.wallets.read().await.get(user_id).cloned())
    }
}
