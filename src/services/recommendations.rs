use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{FeatureFlags, Movie, RecommendationRequest, SessionId, SessionStats},
    services::{best_effort, providers::RecommendationBackend, session::SessionManager},
};

/// Why a recommendation view failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Network,
    Server,
    Unknown,
}

impl FailureKind {
    pub fn from_error(error: &AppError) -> Self {
        match error {
            AppError::Timeout(_) => FailureKind::Timeout,
            AppError::Network(_) => FailureKind::Network,
            AppError::Server { .. } => FailureKind::Server,
            _ => FailureKind::Unknown,
        }
    }

    /// Text shown next to the retry affordance
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "Request timed out. Please check your connection and try again.",
            FailureKind::Network => "Could not reach MoodBinge. Please check your connection and try again.",
            FailureKind::Server | FailureKind::Unknown => {
                "Failed to load recommendations. Please try again later."
            }
        }
    }
}

/// A successfully loaded list and what produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSet {
    pub mood: String,
    pub movies: Vec<Movie>,
    /// Session the request was scoped to; `None` in stateless mode
    pub session_id: Option<SessionId>,
    pub enhanced: bool,
    /// Best-effort; absent when stats were not requested or failed
    pub stats: Option<SessionStats>,
}

/// Presentation state of one recommendation view
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Loaded(RecommendationSet),
    /// The backend answered with no movies for the mood
    Empty,
    Failed(FailureKind),
}

impl ViewState {
    pub fn movies(&self) -> &[Movie] {
        match self {
            ViewState::Loaded(set) => &set.movies,
            _ => &[],
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            ViewState::Empty => Some("No movies found for this mood. Please try a different mood."),
            ViewState::Failed(kind) => Some(kind.message()),
            _ => None,
        }
    }
}

/// Page-level logic behind one recommendation view
///
/// Every `load`/`refresh` starts a new generation and replaces the state
/// wholesale. A result is only applied while its generation is still the
/// latest and the view is mounted, so a superseded or timed-out fetch can
/// never overwrite newer state.
pub struct RecommendationOrchestrator {
    backend: Arc<dyn RecommendationBackend>,
    sessions: Arc<SessionManager>,
    recommendation_timeout: Duration,
    state: Arc<RwLock<ViewState>>,
    features: RwLock<Option<FeatureFlags>>,
    generation: AtomicU64,
    mounted: AtomicBool,
}

impl RecommendationOrchestrator {
    pub fn new(
        backend: Arc<dyn RecommendationBackend>,
        sessions: Arc<SessionManager>,
        recommendation_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            sessions,
            recommendation_timeout,
            state: Arc::new(RwLock::new(ViewState::Idle)),
            features: RwLock::new(None),
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    /// Current view state
    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Flags from the most recent probe of this view
    pub async fn features(&self) -> Option<FeatureFlags> {
        self.features.read().await.clone()
    }

    /// Stops applying results; in-flight fetches resolve into the void
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Initial load for a mood
    ///
    /// Probes feature flags (falling back to stateless mode if the probe
    /// fails), scopes the request to the current session only when enhanced
    /// features are enabled, and fetches session stats best-effort after a
    /// non-empty result.
    pub async fn load_recommendations(&self, mood: &str, limit: u32) -> ViewState {
        let generation = self.begin().await;

        let features = self.probe_features().await;
        let request = if features.enabled {
            RecommendationRequest::enhanced(mood, limit, self.sessions.resolve_session())
        } else {
            RecommendationRequest::stateless(mood, limit)
        };

        let outcome = self.fetch(generation, request).await;
        self.finish(generation, outcome).await
    }

    /// "Show different movies": rotates the session and refetches with it
    ///
    /// Reuses the flags of the last probe, probing first if there were none.
    /// Without enhanced features there is no session to rotate and the
    /// refresh is a plain stateless refetch.
    pub async fn refresh_recommendations(&self, mood: &str, limit: u32) -> ViewState {
        let generation = self.begin().await;

        let features = match self.features().await {
            Some(features) => features,
            None => self.probe_features().await,
        };
        let request = if features.enabled {
            RecommendationRequest::enhanced(mood, limit, self.sessions.rotate_session())
        } else {
            tracing::info!(mood = mood, "Enhanced features disabled, refreshing without a session");
            RecommendationRequest::stateless(mood, limit)
        };

        let outcome = self.fetch(generation, request).await;
        self.finish(generation, outcome).await
    }

    /// Starts a new generation. The counter only moves while the state lock
    /// is held, so a generation checked under that lock cannot go stale
    /// before the write lands.
    async fn begin(&self) -> u64 {
        let mut state = self.state.write().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.is_mounted() {
            *state = ViewState::Loading;
        }
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation && self.is_mounted()
    }

    async fn probe_features(&self) -> FeatureFlags {
        let flags = match self.backend.feature_flags().await {
            Ok(flags) => flags,
            Err(e) => {
                tracing::warn!(error = %e, backend = self.backend.name(), "Feature probe failed, using stateless recommendations");
                FeatureFlags::disabled()
            }
        };
        *self.features.write().await = Some(flags.clone());
        flags
    }

    async fn fetch(&self, generation: u64, request: RecommendationRequest) -> ViewState {
        let result = self.fetch_with_deadline(&request).await;

        match result {
            Ok(movies) if movies.is_empty() => {
                tracing::info!(mood = %request.mood, "No movies for this mood");
                ViewState::Empty
            }
            Ok(movies) => {
                let stats = match (&request.session_id, request.enhanced) {
                    (Some(session_id), true) if self.is_current(generation) => {
                        best_effort("session_stats", self.backend.session_stats(session_id)).await
                    }
                    _ => None,
                };

                ViewState::Loaded(RecommendationSet {
                    mood: request.mood,
                    movies,
                    session_id: request.session_id,
                    enhanced: request.enhanced,
                    stats,
                })
            }
            Err(AppError::Unauthorized) => {
                // The gateway has already signed out and notified the host
                ViewState::Idle
            }
            Err(e) => {
                let kind = FailureKind::from_error(&e);
                tracing::error!(error = %e, mood = %request.mood, kind = ?kind, "Failed to load recommendations");
                ViewState::Failed(kind)
            }
        }
    }

    async fn fetch_with_deadline(&self, request: &RecommendationRequest) -> AppResult<Vec<Movie>> {
        match tokio::time::timeout(
            self.recommendation_timeout,
            self.backend.recommendations(request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.recommendation_timeout)),
        }
    }

    async fn finish(&self, generation: u64, outcome: ViewState) -> ViewState {
        let mut state = self.state.write().await;
        if self.is_current(generation) {
            if let ViewState::Loaded(set) = &outcome {
                tracing::info!(
                    mood = %set.mood,
                    movies = set.movies.len(),
                    enhanced = set.enhanced,
                    "Recommendations loaded"
                );
            }
            *state = outcome.clone();
        } else {
            tracing::debug!(generation, "Discarding stale recommendation result");
        }
        outcome
    }
}
