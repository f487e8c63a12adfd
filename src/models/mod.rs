use serde::{Deserialize, Serialize};

pub mod movie;
pub mod session;

pub use movie::{Movie, MovieId};
pub use session::{RecommendationRequest, SessionClearAck, SessionId, SessionStats};

// ============================================================================
// Moods
// ============================================================================

/// Mood category offered by `GET /moods`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mood {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub primary_genres: Vec<String>,
}

impl Mood {
    /// Human-readable form of a mood id: "euphoria_wave" -> "Euphoria Wave"
    pub fn display_name(id: &str) -> String {
        id.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of `POST /analyze-mood`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodAnalysis {
    pub mood: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mood_details: Option<Mood>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Health & feature flags
// ============================================================================

/// Raw `GET /health` payload
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub features: Option<HealthFeatures>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HealthFeatures {
    #[serde(default)]
    pub enhanced_features_available: bool,
    #[serde(default)]
    pub enhanced_features_enabled: bool,
}

/// Enhanced-recommendation capability, derived from one health probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub available: bool,
    pub enabled: bool,
    pub version: String,
}

impl FeatureFlags {
    /// Stateless mode; used whenever the probe cannot be trusted
    pub fn disabled() -> Self {
        Self {
            available: false,
            enabled: false,
            version: "Unknown".to_string(),
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::disabled()
    }
}

impl From<HealthResponse> for FeatureFlags {
    fn from(health: HealthResponse) -> Self {
        let features = health.features.unwrap_or_default();
        Self {
            available: features.enhanced_features_available,
            enabled: features.enhanced_features_enabled,
            version: health.version.unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

// ============================================================================
// Auth payloads
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

// ============================================================================
// Comparison
// ============================================================================

/// `GET /compare/{mood}` payload: original and enhanced systems side by side
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comparison {
    pub mood: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub original_system: SystemRecommendations,
    pub enhanced_system: SystemRecommendations,
    pub comparison: ComparisonMetrics,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemRecommendations {
    #[serde(default)]
    pub recommendations: Vec<Movie>,
    #[serde(default)]
    pub count: usize,
    /// Only reported for the enhanced system
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ComparisonMetrics {
    #[serde(default)]
    pub overlap_count: usize,
    #[serde(default)]
    pub overlap_percentage: f64,
    #[serde(default)]
    pub unique_to_original: usize,
    #[serde(default)]
    pub unique_to_enhanced: usize,
    #[serde(default)]
    pub variety_improvement: bool,
}
