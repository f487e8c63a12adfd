use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const SESSION_PREFIX: &str = "session_";
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 11;

/// Opaque client session identifier scoping "no-repeat" recommendations
///
/// Format: `session_<unix millis>_<base36 suffix>`. The server never
/// validates the shape; values read back from storage are accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh id stamped with `now`
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..RANDOM_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!(
            "{}{}_{}",
            SESSION_PREFIX,
            now.timestamp_millis(),
            suffix
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creation time encoded in the id, when it follows the generated format
    pub fn embedded_timestamp(&self) -> Option<DateTime<Utc>> {
        let rest = self.0.strip_prefix(SESSION_PREFIX)?;
        let (millis, _) = rest.split_once('_')?;
        DateTime::from_timestamp_millis(millis.parse().ok()?)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters of a single recommendation fetch; never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub mood: String,
    pub limit: u32,
    pub session_id: Option<SessionId>,
    pub enhanced: bool,
}

impl RecommendationRequest {
    /// Stateless request: no session scoping
    pub fn stateless(mood: impl Into<String>, limit: u32) -> Self {
        Self {
            mood: mood.into(),
            limit,
            session_id: None,
            enhanced: false,
        }
    }

    /// Session-scoped, dedup-aware request
    pub fn enhanced(mood: impl Into<String>, limit: u32, session_id: SessionId) -> Self {
        Self {
            mood: mood.into(),
            limit,
            session_id: Some(session_id),
            enhanced: true,
        }
    }

    /// Query pairs sent to `/recommendations/{mood}`
    ///
    /// `session_id` is only attached for enhanced requests.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", self.limit.to_string())];
        if let (true, Some(session_id)) = (self.enhanced, &self.session_id) {
            params.push(("session_id", session_id.to_string()));
        }
        params
    }
}

/// Server-reported aggregate for one session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub session_found: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub total_movies_seen: u64,
    #[serde(default)]
    pub moods_requested: Vec<String>,
    #[serde(default)]
    pub last_activity: Option<String>,
}

/// Acknowledgement of `DELETE /session/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClearAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}
