use std::future::Future;

use crate::error::AppResult;

pub mod dashboard;
pub mod movie_detail;
pub mod providers;
pub mod recommendations;
pub mod session;

pub use dashboard::{load_dashboard, Dashboard};
pub use movie_detail::{load_movie_detail, MovieDetail};
pub use recommendations::{FailureKind, RecommendationOrchestrator, RecommendationSet, ViewState};
pub use session::SessionManager;

/// Runs a secondary call whose failure must never reach the primary view
///
/// Failures are logged and collapse to `None`.
pub async fn best_effort<T, F>(call: &'static str, future: F) -> Option<T>
where
    F: Future<Output = AppResult<T>>,
{
    match future.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(call = call, error = %e, "Best-effort call failed");
            None
        }
    }
}
