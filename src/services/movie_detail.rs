use crate::{
    error::AppResult,
    models::Movie,
    services::{best_effort, providers::RecommendationBackend},
};

const SIMILAR_LIMIT: u32 = 5;

/// Everything the movie detail view shows
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub movie: Movie,
    /// Empty when the similar-movies call failed
    pub similar: Vec<Movie>,
}

/// Loads one movie and, best-effort, a handful of similar ones
///
/// A missing movie surfaces as `AppError::NotFound`; a failing similar-movies
/// call only empties the `similar` list.
pub async fn load_movie_detail(
    backend: &dyn RecommendationBackend,
    movie_id: &str,
) -> AppResult<MovieDetail> {
    let movie = backend.movie_details(movie_id).await?;

    let similar = best_effort(
        "similar_movies",
        backend.similar_movies(movie_id, SIMILAR_LIMIT),
    )
    .await
    .unwrap_or_default();

    tracing::debug!(
        movie_id = movie_id,
        title = %movie.clean_title(),
        similar = similar.len(),
        "Movie detail loaded"
    );

    Ok(MovieDetail { movie, similar })
}
