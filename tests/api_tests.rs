use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{
    body_string_contains, header, method, path, path_regex, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use moodbinge_client::{
    models::{Credentials, Registration, SessionId},
    services::{load_dashboard, load_movie_detail, FailureKind, RecommendationOrchestrator, ViewState},
    storage::{ClientStorage, MemoryStorage, StorageError, StorageKey, StorageResult},
    AppError, ClientContext, Config, GatewayEvent, MoodBingeApi,
};

const BASE: &str = "/api/v1/movies";

fn route(suffix: &str) -> String {
    format!("{}{}", BASE, suffix)
}

fn create_test_client(server: &MockServer) -> (MoodBingeApi, ClientContext) {
    create_test_client_with(server, |_| {})
}

fn create_test_client_with(
    server: &MockServer,
    adjust: impl FnOnce(&mut Config),
) -> (MoodBingeApi, ClientContext) {
    let mut config = Config::with_api_url(format!("{}{}", server.uri(), BASE));
    adjust(&mut config);
    let context = ClientContext::in_memory(config);
    (MoodBingeApi::new(context.clone()), context)
}

fn health(enabled: bool) -> serde_json::Value {
    json!({
        "status": "healthy",
        "version": "2.0.0",
        "features": {
            "enhanced_features_available": enabled,
            "enhanced_features_enabled": enabled
        }
    })
}

fn movies(count: usize) -> serde_json::Value {
    let items: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "movieId": 100 + i,
                "title": format!("Movie {} (1999)", i),
                "genres": "Comedy|Drama",
                "rating": 7.5
            })
        })
        .collect();
    json!(items)
}

fn seed_session(context: &ClientContext, id: &str) {
    context.storage.set(StorageKey::SessionId, id).unwrap();
    context
        .storage
        .set(StorageKey::SessionCreatedAt, &chrono::Utc::now().to_rfc3339())
        .unwrap();
}

fn orchestrator(api: &MoodBingeApi, context: &ClientContext) -> RecommendationOrchestrator {
    RecommendationOrchestrator::new(
        Arc::new(api.clone()),
        context.sessions.clone(),
        context.config.recommendation_timeout(),
    )
}

#[tokio::test]
async fn test_bearer_token_attached_when_signed_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/moods")))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "euphoria_wave", "name": "Euphoria Wave", "emoji": "🌊",
             "color": "#FFD700", "description": "Pure joy", "primary_genres": ["Comedy"]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    context.auth.store_login("tok-123", "ada").unwrap();

    let moods = api.moods().await.unwrap();

    assert_eq!(moods.len(), 1);
    assert_eq!(moods[0].id, "euphoria_wave");
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/moods")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (api, _) = create_test_client(&server);
    api.moods().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(requests[0].headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/moods")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    context.auth.store_login("expired", "ada@example.com").unwrap();
    let mut events = api.gateway().subscribe();

    let first = api.moods().await;
    assert!(matches!(first, Err(AppError::Unauthorized)));
    assert_eq!(context.auth.token(), None);
    assert_eq!(
        events.recv().await.unwrap(),
        GatewayEvent::Unauthorized {
            path: "/moods".to_string()
        }
    );

    let _ = api.moods().await;
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_some());
    assert!(requests[1].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_posts_form_and_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(route("/auth/token")))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=ada%40example.com"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    let token = api
        .login(&Credentials {
            username: "ada@example.com".to_string(),
            password: "s3cret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(token.access_token, "fresh-token");
    assert_eq!(context.auth.token(), Some("fresh-token".to_string()));
    assert_eq!(context.auth.username(), Some("ada".to_string()));
}

#[tokio::test]
async fn test_wrong_password_is_not_a_session_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(route("/auth/token")))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect username or password"})),
        )
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    context.auth.store_login("still-valid", "ada").unwrap();
    let mut events = api.gateway().subscribe();

    let result = api
        .login(&Credentials {
            username: "ada".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
    assert_eq!(context.auth.token(), Some("still-valid".to_string()));
    assert!(events.try_recv().is_err());
}

/// Storage that reads normally but refuses every write
struct WriteProtectedStorage(MemoryStorage);

impl ClientStorage for WriteProtectedStorage {
    fn get(&self, key: StorageKey) -> StorageResult<Option<String>> {
        self.0.get(key)
    }
    fn set(&self, _key: StorageKey, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("read-only profile".into()))
    }
    fn remove(&self, _key: StorageKey) -> StorageResult<()> {
        Err(StorageError::Unavailable("read-only profile".into()))
    }
    fn name(&self) -> &'static str {
        "write-protected"
    }
}

#[tokio::test]
async fn test_login_fails_when_token_cannot_be_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(route("/auth/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "token_type": "bearer"
        })))
        .mount(&server)
        .await;

    let config = Config::with_api_url(format!("{}{}", server.uri(), BASE));
    let context = ClientContext::new(config, Arc::new(WriteProtectedStorage(MemoryStorage::new())));
    let api = MoodBingeApi::new(context.clone());

    let result = api
        .login(&Credentials {
            username: "ada".to_string(),
            password: "s3cret".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AppError::Storage(_))));
    assert!(!context.auth.is_authenticated());
}

#[tokio::test]
async fn test_refresh_on_write_protected_profile_moves_to_new_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(health(true)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/recommendations/euphoria_wave")))
        .respond_with(ResponseTemplate::new(200).set_body_json(movies(2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(format!("^{}/session/.+/stats$", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"session_found": true})))
        .mount(&server)
        .await;

    let inner = MemoryStorage::new();
    inner.set(StorageKey::SessionId, "session_1_old").unwrap();
    inner
        .set(StorageKey::SessionCreatedAt, &chrono::Utc::now().to_rfc3339())
        .unwrap();
    let config = Config::with_api_url(format!("{}{}", server.uri(), BASE));
    let context = ClientContext::new(config, Arc::new(WriteProtectedStorage(inner)));
    let api = MoodBingeApi::new(context.clone());
    let view = orchestrator(&api, &context);

    let refreshed = match view.refresh_recommendations("euphoria_wave", 10).await {
        ViewState::Loaded(set) => set.session_id.expect("enhanced refresh carries a session"),
        other => panic!("expected Loaded, got {:?}", other),
    };
    assert_ne!(refreshed.as_str(), "session_1_old");

    match view.load_recommendations("euphoria_wave", 10).await {
        ViewState::Loaded(set) => assert_eq!(set.session_id, Some(refreshed)),
        other => panic!("expected Loaded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_rejects_blank_credentials_locally() {
    let server = MockServer::start().await;
    let (api, _) = create_test_client(&server);

    let result = api
        .login(&Credentials {
            username: " ".to_string(),
            password: "x".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_validation_error_is_structured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(route("/auth/register")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error.email"}
            ]
        })))
        .mount(&server)
        .await;

    let (api, _) = create_test_client(&server);
    let result = api
        .register(&Registration {
            email: "not-an-email".to_string(),
            username: "ada".to_string(),
            password: "s3cret".to_string(),
        })
        .await;

    match result {
        Err(AppError::Validation(validation)) => {
            let email = validation.field("email").expect("email field error");
            assert_eq!(email.message, "value is not a valid email address");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_analyze_mood_validation_carries_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(route("/analyze-mood")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": {
                "message": "Could not detect a mood",
                "issues": ["Text is too short"],
                "suggestions": ["Describe how your day went"]
            }
        })))
        .mount(&server)
        .await;

    let (api, _) = create_test_client(&server);
    let result = api.analyze_mood("meh").await;

    match result {
        Err(AppError::Validation(validation)) => {
            assert_eq!(validation.message.as_deref(), Some("Could not detect a mood"));
            assert_eq!(validation.issues, vec!["Text is too short".to_string()]);
            assert_eq!(validation.suggestions.len(), 1);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_enhanced_load_sends_session_and_fetches_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(health(true)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/recommendations/euphoria_wave")))
        .and(query_param("limit", "10"))
        .and(query_param("session_id", "session_A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movies(5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/session/session_A/stats")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_found": true,
            "session_id": "session_A",
            "total_movies_seen": 5,
            "moods_requested": ["euphoria_wave"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    seed_session(&context, "session_A");

    let state = orchestrator(&api, &context)
        .load_recommendations("euphoria_wave", 10)
        .await;

    match state {
        ViewState::Loaded(set) => {
            assert_eq!(set.movies.len(), 5);
            assert_eq!(set.session_id, Some(SessionId::from("session_A")));
            assert_eq!(set.stats.map(|s| s.total_movies_seen), Some(5));
        }
        other => panic!("expected Loaded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_disabled_features_send_no_session_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(health(false)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/recommendations/tranquil_haven")))
        .and(query_param("limit", "10"))
        .and(query_param_is_missing("session_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movies(3)))
        .expect(1)
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    let state = orchestrator(&api, &context)
        .load_recommendations("tranquil_haven", 10)
        .await;

    assert_eq!(state.movies().len(), 3);
    assert_eq!(context.sessions.current(), None);
}

#[tokio::test]
async fn test_unreachable_health_degrades_to_stateless() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/recommendations/wonder_hunt")))
        .and(query_param_is_missing("session_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movies(2)))
        .expect(1)
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    let state = orchestrator(&api, &context)
        .load_recommendations("wonder_hunt", 10)
        .await;

    assert_eq!(state.movies().len(), 2);
}

#[tokio::test]
async fn test_slow_recommendations_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(health(false)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/recommendations/phantom_fear")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(movies(5))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (api, context) = create_test_client_with(&server, |config| {
        config.recommendation_timeout_secs = 1;
    });
    let view = orchestrator(&api, &context);

    let state = view.load_recommendations("phantom_fear", 10).await;

    assert_eq!(state, ViewState::Failed(FailureKind::Timeout));
    assert_eq!(view.state().await, ViewState::Failed(FailureKind::Timeout));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let context = ClientContext::in_memory(Config::with_api_url("http://127.0.0.1:1/api/v1/movies"));
    let api = MoodBingeApi::new(context);

    let result = api.moods().await;

    assert!(matches!(result, Err(AppError::Network(_))));
}

#[tokio::test]
async fn test_server_error_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "database unavailable"})))
        .mount(&server)
        .await;

    let (api, _) = create_test_client(&server);

    match api.health().await {
        Err(AppError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_movie_detail_not_found_and_similar_best_effort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/movie/862")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "movieId": 862, "title": "Toy Story (1995)", "genres": "Animation|Comedy"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/similar/862")))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/movie/999999")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Movie not found"})))
        .mount(&server)
        .await;

    let (api, _) = create_test_client(&server);

    let detail = load_movie_detail(&api, "862").await.unwrap();
    assert_eq!(detail.movie.clean_title(), "Toy Story");
    assert!(detail.similar.is_empty());

    let missing = load_movie_detail(&api, "999999").await;
    assert!(matches!(missing, Err(AppError::NotFound(msg)) if msg == "Movie not found"));
}

#[tokio::test]
async fn test_dashboard_settles_parts_independently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/recommendations/victory_high")))
        .respond_with(ResponseTemplate::new(200).set_body_json(movies(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/session/session_D/stats")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(health(true)))
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    seed_session(&context, "session_D");

    let dashboard = load_dashboard(&api, "victory_high", 10).await;

    assert_eq!(dashboard.recommendations.len(), 4);
    assert!(dashboard.session_stats.is_none());
    assert!(dashboard.health.is_some());
    assert!(dashboard.is_degraded());
}

#[tokio::test]
async fn test_clear_server_session_targets_current_session() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(route("/session/session_C")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Session cleared",
            "session_id": "session_C"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    seed_session(&context, "session_C");

    let ack = api.clear_server_session(None).await.unwrap();

    assert_eq!(ack.message, "Session cleared");
}

#[tokio::test]
async fn test_compare_uses_resolved_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route("/compare/euphoria_wave")))
        .and(query_param("session_id", "session_X"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mood": "euphoria_wave",
            "session_id": "session_X",
            "original_system": {"recommendations": [], "count": 10},
            "enhanced_system": {"recommendations": [], "count": 10, "enabled": true},
            "comparison": {
                "overlap_count": 3,
                "overlap_percentage": 30.0,
                "unique_to_original": 7,
                "unique_to_enhanced": 7,
                "variety_improvement": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, context) = create_test_client(&server);
    seed_session(&context, "session_X");

    let comparison = api.compare("euphoria_wave", 10).await.unwrap();

    assert_eq!(comparison.comparison.overlap_count, 3);
    assert!(comparison.comparison.variety_improvement);
}
