/// MoodBinge REST API provider
///
/// Thin typed wrappers over the gateway for every backend endpoint. Paths are
/// relative to the configured base URL:
///
/// - `POST /auth/token` (form) and `POST /auth/register` (JSON)
/// - `GET /moods`, `POST /analyze-mood`, `GET /health`
/// - `GET /recommendations/{mood}`, `GET /recommendations/original/{mood}`,
///   `GET /compare/{mood}`
/// - `GET /session/{id}/stats`, `DELETE /session/{id}`
/// - `GET /movie/{id}`, `GET /similar/{id}`
use serde_json::{json, Value};

use crate::{
    api::{gateway::HttpGateway, state::ClientContext},
    error::{AppError, AppResult},
    models::{
        Comparison, Credentials, FeatureFlags, HealthResponse, Mood, MoodAnalysis, Movie,
        RecommendationRequest, Registration, SessionClearAck, SessionId, SessionStats,
        TokenResponse,
    },
    services::providers::RecommendationBackend,
};

const DEFAULT_SIMILAR_LIMIT: u32 = 5;

#[derive(Clone)]
pub struct MoodBingeApi {
    gateway: HttpGateway,
    context: ClientContext,
}

impl MoodBingeApi {
    pub fn new(context: ClientContext) -> Self {
        Self {
            gateway: HttpGateway::new(&context),
            context,
        }
    }

    pub fn gateway(&self) -> &HttpGateway {
        &self.gateway
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    /// Exchanges credentials for an access token and stores it
    ///
    /// A token that cannot be persisted fails the login with
    /// `AppError::Storage`.
    pub async fn login(&self, credentials: &Credentials) -> AppResult<TokenResponse> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Username and password are required".to_string(),
            ));
        }

        let token: TokenResponse = self.gateway.post_form("/auth/token", credentials).await?;
        self.context
            .auth
            .store_login(&token.access_token, &credentials.username)?;
        Ok(token)
    }

    /// Creates an account. No token is issued; callers log in afterwards.
    pub async fn register(&self, registration: &Registration) -> AppResult<()> {
        let _: Value = self
            .gateway
            .post_json("/auth/register", registration)
            .await?;
        tracing::info!(username = %registration.username, "Registration succeeded");
        Ok(())
    }

    pub fn logout(&self) {
        self.context.auth.logout();
    }

    // ------------------------------------------------------------------------
    // Moods
    // ------------------------------------------------------------------------

    pub async fn moods(&self) -> AppResult<Vec<Mood>> {
        self.gateway.get("/moods", &[]).await
    }

    /// Infers a mood from free text. A 422 carries the backend's issues and
    /// suggestions in `AppError::Validation`.
    pub async fn analyze_mood(&self, text: &str) -> AppResult<MoodAnalysis> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Please describe how you're feeling".to_string(),
            ));
        }

        let analysis: MoodAnalysis = self
            .gateway
            .post_json("/analyze-mood", &json!({ "text": text }))
            .await?;

        tracing::info!(
            mood = %analysis.mood,
            confidence = analysis.confidence,
            "Mood analysis completed"
        );
        Ok(analysis)
    }

    // ------------------------------------------------------------------------
    // Recommendations
    // ------------------------------------------------------------------------

    /// Recommendations from the original, session-less system
    pub async fn original_recommendations(&self, mood: &str, limit: u32) -> AppResult<Vec<Movie>> {
        let path = format!("/recommendations/original/{}", segment(mood)?);
        self.gateway
            .get(&path, &[("limit", limit.to_string())])
            .await
    }

    /// Both systems side by side, scoped to the current session
    pub async fn compare(&self, mood: &str, limit: u32) -> AppResult<Comparison> {
        let session_id = self.context.sessions.resolve_session();
        let path = format!("/compare/{}", segment(mood)?);
        self.gateway
            .get(
                &path,
                &[
                    ("limit", limit.to_string()),
                    ("session_id", session_id.to_string()),
                ],
            )
            .await
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    /// Stats for the current session, creating one if none exists
    pub async fn current_session_stats(&self) -> AppResult<SessionStats> {
        let session_id = self.context.sessions.resolve_session();
        self.session_stats(&session_id).await
    }

    /// Resets the server-side history for a session (current one by default)
    pub async fn clear_server_session(
        &self,
        session_id: Option<&SessionId>,
    ) -> AppResult<SessionClearAck> {
        let session_id = match session_id {
            Some(id) => id.clone(),
            None => self.context.sessions.resolve_session(),
        };
        let path = format!("/session/{}", segment(session_id.as_str())?);
        let ack: SessionClearAck = self.gateway.delete(&path).await?;
        tracing::info!(session_id = %session_id, "Server session cleared");
        Ok(ack)
    }

    // ------------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------------

    pub async fn health(&self) -> AppResult<HealthResponse> {
        self.gateway.get("/health", &[]).await
    }
}

#[async_trait::async_trait]
impl RecommendationBackend for MoodBingeApi {
    async fn feature_flags(&self) -> AppResult<FeatureFlags> {
        let flags = FeatureFlags::from(self.health().await?);
        tracing::debug!(
            available = flags.available,
            enabled = flags.enabled,
            version = %flags.version,
            "Feature flags probed"
        );
        Ok(flags)
    }

    async fn recommendations(&self, request: &RecommendationRequest) -> AppResult<Vec<Movie>> {
        let path = format!("/recommendations/{}", segment(&request.mood)?);

        tracing::info!(
            mood = %request.mood,
            limit = request.limit,
            enhanced = request.enhanced,
            session_id = request.session_id.as_ref().map(|id| id.as_str()).unwrap_or("none"),
            "Fetching recommendations"
        );

        let movies: Vec<Movie> = self
            .gateway
            .get_with_timeout(
                &path,
                &request.query(),
                self.context.config.recommendation_timeout(),
            )
            .await?;

        tracing::info!(
            mood = %request.mood,
            results = movies.len(),
            provider = self.name(),
            "Recommendations received"
        );
        Ok(movies)
    }

    async fn session_stats(&self, session_id: &SessionId) -> AppResult<SessionStats> {
        let path = format!("/session/{}/stats", segment(session_id.as_str())?);
        self.gateway.get(&path, &[]).await
    }

    async fn movie_details(&self, movie_id: &str) -> AppResult<Movie> {
        let path = format!("/movie/{}", segment(movie_id)?);
        self.gateway.get(&path, &[]).await
    }

    async fn similar_movies(&self, movie_id: &str, limit: u32) -> AppResult<Vec<Movie>> {
        let limit = if limit == 0 { DEFAULT_SIMILAR_LIMIT } else { limit };
        let path = format!("/similar/{}", segment(movie_id)?);
        self.gateway
            .get(&path, &[("limit", limit.to_string())])
            .await
    }

    fn name(&self) -> &'static str {
        "moodbinge"
    }
}

/// Validates a value used as a single path segment
fn segment(value: &str) -> AppResult<&str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(
            "Path parameter cannot be empty".to_string(),
        ));
    }
    if value.contains(['/', '?', '#']) {
        return Err(AppError::InvalidInput(format!(
            "Invalid path parameter: {}",
            value
        )));
    }
    Ok(value)
}
