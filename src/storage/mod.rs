/// Client-local durable storage
///
/// Holds the handful of strings the client keeps between runs: the bearer
/// token, the display username and the recommendation session id. Backends
/// are pluggable so the gateway and orchestrator can be exercised without
/// touching disk.
use std::fmt::Display;

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AuthToken,
    Username,
    SessionId,
    SessionCreatedAt,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AuthToken => "token",
            StorageKey::Username => "user",
            StorageKey::SessionId => "moodbinge_session_id",
            StorageKey::SessionCreatedAt => "moodbinge_session_created_at",
        }
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value capability backing auth and session state
///
/// Calls are short and synchronous, mirroring browser local storage.
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: StorageKey) -> StorageResult<Option<String>>;

    fn set(&self, key: StorageKey, value: &str) -> StorageResult<()>;

    fn remove(&self, key: StorageKey) -> StorageResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
