use std::sync::Arc;

use crate::{
    auth::AuthSession,
    config::Config,
    services::session::SessionManager,
    storage::{ClientStorage, FileStorage, MemoryStorage},
};

/// Shared client state
///
/// Bundles configuration with the only cross-request state the client owns:
/// the auth token and the recommendation session id. Cloning is cheap and
/// every clone sees the same storage.
#[derive(Clone)]
pub struct ClientContext {
    pub config: Arc<Config>,
    pub storage: Arc<dyn ClientStorage>,
    pub auth: AuthSession,
    pub sessions: Arc<SessionManager>,
}

impl ClientContext {
    /// Creates a context over an explicit storage backend
    pub fn new(config: Config, storage: Arc<dyn ClientStorage>) -> Self {
        let sessions = Arc::new(SessionManager::new(storage.clone(), config.session_ttl()));
        Self {
            auth: AuthSession::new(storage.clone()),
            config: Arc::new(config),
            storage,
            sessions,
        }
    }

    /// Context persisting to the configured storage file
    pub fn with_file_storage(config: Config) -> Self {
        let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
        tracing::debug!(path = %storage.path().display(), "Using file storage");
        Self::new(config, storage)
    }

    /// Context that keeps everything in memory
    pub fn in_memory(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryStorage::new()))
    }
}
