/// Recommendation backend abstraction
///
/// The orchestrator and detail loaders only see this trait, which keeps the
/// view logic testable without HTTP. `MoodBingeApi` is the production
/// implementation over the gateway.
use crate::{
    error::AppResult,
    models::{FeatureFlags, Movie, RecommendationRequest, SessionId, SessionStats},
};

pub mod moodbinge;

pub use moodbinge::MoodBingeApi;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationBackend: Send + Sync {
    /// Probe the backend for enhanced (session-aware) recommendations
    ///
    /// Errors are returned as-is; callers decide how to degrade.
    async fn feature_flags(&self) -> AppResult<FeatureFlags>;

    /// Fetch recommendations for a mood
    ///
    /// `session_id` is sent only when the request is enhanced.
    async fn recommendations(&self, request: &RecommendationRequest) -> AppResult<Vec<Movie>>;

    /// Server-side statistics for one session
    async fn session_stats(&self, session_id: &SessionId) -> AppResult<SessionStats>;

    /// Full detail for one movie
    async fn movie_details(&self, movie_id: &str) -> AppResult<Movie>;

    /// Movies similar to the given one
    async fn similar_movies(&self, movie_id: &str, limit: u32) -> AppResult<Vec<Movie>>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}
