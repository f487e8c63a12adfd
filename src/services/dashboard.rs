use crate::{
    models::{HealthResponse, Movie, RecommendationRequest, SessionId, SessionStats},
    services::{best_effort, providers::{MoodBingeApi, RecommendationBackend}},
};

/// Aggregate view for one mood
///
/// Each part is settled on its own: a failing call leaves its slot empty and
/// never blocks the others.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub mood: String,
    pub session_id: SessionId,
    pub recommendations: Vec<Movie>,
    pub session_stats: Option<SessionStats>,
    pub health: Option<HealthResponse>,
}

impl Dashboard {
    pub fn is_degraded(&self) -> bool {
        self.session_stats.is_none() || self.health.is_none()
    }
}

pub async fn load_dashboard(api: &MoodBingeApi, mood: &str, limit: u32) -> Dashboard {
    let session_id = api.context().sessions.resolve_session();
    let request = RecommendationRequest::enhanced(mood, limit, session_id.clone());

    let (recommendations, session_stats, health) = tokio::join!(
        best_effort("recommendations", api.recommendations(&request)),
        best_effort("session_stats", api.session_stats(&session_id)),
        best_effort("health", api.health()),
    );

    let dashboard = Dashboard {
        mood: mood.to_string(),
        session_id,
        recommendations: recommendations.unwrap_or_default(),
        session_stats,
        health,
    };

    tracing::info!(
        mood = %dashboard.mood,
        movies = dashboard.recommendations.len(),
        degraded = dashboard.is_degraded(),
        "Dashboard loaded"
    );
    dashboard
}
