use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use crate::{
    models::SessionId,
    storage::{ClientStorage, StorageKey},
};

/// A session id together with the moment it was minted
#[derive(Debug, Clone, PartialEq)]
struct SessionRecord {
    id: SessionId,
    created_at: DateTime<Utc>,
}

/// Creates, persists and rotates the client session id
///
/// Exactly one id is current per storage profile. When storage misbehaves the
/// manager keeps the id in process memory for the rest of the run instead of
/// failing, so recommendation fetches are never blocked on disk.
/// In-memory state that overrides storage after a failed write
#[derive(Debug, Clone, PartialEq, Default)]
enum Fallback {
    /// Storage is authoritative
    #[default]
    Persisted,
    /// Minted but not persisted
    Record(SessionRecord),
    /// Forgotten but still on disk
    Cleared,
}

pub struct SessionManager {
    storage: Arc<dyn ClientStorage>,
    ttl: chrono::Duration,
    fallback: Mutex<Fallback>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn ClientStorage>, ttl: chrono::Duration) -> Self {
        Self {
            storage,
            ttl,
            fallback: Mutex::new(Fallback::Persisted),
        }
    }

    /// Returns the current session id, creating and persisting one if needed
    ///
    /// Repeated calls return the same id until it is rotated or outlives the
    /// configured TTL.
    pub fn resolve_session(&self) -> SessionId {
        self.resolve_at(Utc::now())
    }

    /// Discards the current id and persists a brand new one
    pub fn rotate_session(&self) -> SessionId {
        self.rotate_at(Utc::now())
    }

    /// Current id without creating one
    pub fn current(&self) -> Option<SessionId> {
        self.load_record(Utc::now()).map(|r| r.id)
    }

    /// Forgets the current id without minting a replacement
    pub fn clear(&self) {
        self.forget();
        tracing::info!("Session cleared");
    }

    pub(crate) fn resolve_at(&self, now: DateTime<Utc>) -> SessionId {
        if let Some(record) = self.load_record(now) {
            if !self.is_expired(&record, now) {
                return record.id;
            }
            tracing::info!(
                session_id = %record.id,
                created_at = %record.created_at,
                "Session expired, creating a new one"
            );
            self.forget();
        }

        let record = self.mint(now);
        tracing::info!(session_id = %record.id, "New MoodBinge session created");
        record.id
    }

    pub(crate) fn rotate_at(&self, now: DateTime<Utc>) -> SessionId {
        let old = self.load_record(now).map(|r| r.id);
        self.forget();
        let record = self.mint(now);
        tracing::info!(
            old = old.as_ref().map(|id| id.as_str()).unwrap_or("none"),
            new = %record.id,
            "Session refreshed"
        );
        record.id
    }

    fn is_expired(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.created_at) > self.ttl
    }

    /// Reads the current record. An in-memory override left by a failed
    /// write wins over whatever storage still holds.
    fn load_record(&self, now: DateTime<Utc>) -> Option<SessionRecord> {
        match self.fallback() {
            Fallback::Record(record) => return Some(record),
            Fallback::Cleared => return None,
            Fallback::Persisted => {}
        }

        match self.storage.get(StorageKey::SessionId) {
            Ok(Some(raw)) if !raw.is_empty() => {
                let id = SessionId::from(raw);
                let created_at = self.load_created_at(&id, now);
                Some(SessionRecord { id, created_at })
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, storage = self.storage.name(), "Session storage unreadable, using in-memory session");
                None
            }
        }
    }

    /// Creation time of a stored id. Ids persisted without a stamp are
    /// adopted as of now and stamped so their age starts counting.
    fn load_created_at(&self, id: &SessionId, now: DateTime<Utc>) -> DateTime<Utc> {
        let stored = self
            .storage
            .get(StorageKey::SessionCreatedAt)
            .ok()
            .flatten()
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        match stored {
            Some(created_at) => created_at,
            None => {
                let created_at = id.embedded_timestamp().unwrap_or(now);
                if let Err(e) = self
                    .storage
                    .set(StorageKey::SessionCreatedAt, &created_at.to_rfc3339())
                {
                    tracing::debug!(error = %e, "Could not stamp legacy session");
                }
                created_at
            }
        }
    }

    fn mint(&self, now: DateTime<Utc>) -> SessionRecord {
        let record = SessionRecord {
            id: SessionId::generate(now),
            created_at: now,
        };

        let persisted = self
            .storage
            .set(StorageKey::SessionId, record.id.as_str())
            .and_then(|_| {
                self.storage
                    .set(StorageKey::SessionCreatedAt, &record.created_at.to_rfc3339())
            });

        match persisted {
            Ok(()) => self.set_fallback(Fallback::Persisted),
            Err(e) => {
                tracing::warn!(error = %e, session_id = %record.id, "Failed to persist session, keeping it in memory");
                self.set_fallback(Fallback::Record(record.clone()));
            }
        }

        record
    }

    fn forget(&self) {
        let mut removed = true;
        for key in [StorageKey::SessionId, StorageKey::SessionCreatedAt] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(error = %e, key = %key, "Failed to remove session key");
                removed = false;
            }
        }
        self.set_fallback(if removed {
            Fallback::Persisted
        } else {
            Fallback::Cleared
        });
    }

    fn fallback(&self) -> Fallback {
        match self.fallback.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_fallback(&self, state: Fallback) {
        match self.fallback.lock() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}
