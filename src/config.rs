use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration loaded from `MOODBINGE_*` environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the MoodBinge movies API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Deadline for general API calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Deadline for the recommendation fetch path, in seconds
    #[serde(default = "default_recommendation_timeout_secs")]
    pub recommendation_timeout_secs: u64,

    /// Location of the durable client-local storage file
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Age after which a client session id is replaced
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,

    /// Number of recommendations requested when the caller does not say
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

fn default_api_url() -> String {
    "https://anushkah39.pythonanywhere.com/api/v1/movies".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_recommendation_timeout_secs() -> u64 {
    15
}

fn default_storage_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("moodbinge")
        .join("storage.json")
}

fn default_session_ttl_hours() -> u64 {
    24
}

fn default_limit() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            recommendation_timeout_secs: default_recommendation_timeout_secs(),
            storage_path: default_storage_path(),
            session_ttl_hours: default_session_ttl_hours(),
            default_limit: default_limit(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("MOODBINGE_")
            .from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Config pointing at a specific backend, defaults elsewhere
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn recommendation_timeout(&self) -> Duration {
        Duration::from_secs(self.recommendation_timeout_secs)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours as i64)
    }
}
