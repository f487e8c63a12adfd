//! Bearer token and display name held in client-local storage.

use std::sync::Arc;

use crate::storage::{ClientStorage, StorageKey, StorageResult};

/// Owner of the AuthToken lifecycle
///
/// Set on login, cleared on logout or when the gateway sees a 401. Storage
/// failures read as "signed out" rather than erroring.
#[derive(Clone)]
pub struct AuthSession {
    storage: Arc<dyn ClientStorage>,
}

impl AuthSession {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    pub fn token(&self) -> Option<String> {
        match self.storage.get(StorageKey::AuthToken) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, storage = self.storage.name(), "Failed to read auth token");
                None
            }
        }
    }

    pub fn username(&self) -> Option<String> {
        self.storage.get(StorageKey::Username).ok().flatten()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persists a fresh login. The stored name drops any email domain.
    ///
    /// Fails only when the token itself cannot be stored; a lost display
    /// name is logged and ignored.
    pub fn store_login(&self, token: &str, login_name: &str) -> StorageResult<()> {
        let display_name = display_name(login_name);
        if let Err(e) = self.storage.set(StorageKey::AuthToken, token) {
            tracing::error!(error = %e, storage = self.storage.name(), "Failed to persist auth token");
            return Err(e);
        }
        if let Err(e) = self.storage.set(StorageKey::Username, display_name) {
            tracing::warn!(error = %e, "Failed to persist username");
        }
        tracing::info!(user = %display_name, "Signed in");
        Ok(())
    }

    pub fn clear_token(&self) {
        if let Err(e) = self.storage.remove(StorageKey::AuthToken) {
            tracing::error!(error = %e, "Failed to clear auth token");
        }
    }

    pub fn logout(&self) {
        self.clear_token();
        if let Err(e) = self.storage.remove(StorageKey::Username) {
            tracing::warn!(error = %e, "Failed to clear username");
        }
        tracing::info!("Signed out");
    }
}

fn display_name(login_name: &str) -> &str {
    match login_name.split_once('@') {
        Some((local, _)) => local,
        None => login_name,
    }
}
