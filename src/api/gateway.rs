/// HTTP gateway to the MoodBinge backend
///
/// Every call goes through one pipeline:
/// 1. Attach `Authorization: Bearer <token>` when a token is stored, plus an
///    `x-request-id` correlation header.
/// 2. Enforce a per-call deadline. The in-flight future is dropped when it
///    expires, so a late response can never be applied.
/// 3. Classify failures into the `AppError` taxonomy. A 401 additionally
///    clears the stored token and publishes `GatewayEvent::Unauthorized`;
///    the host decides where to navigate. A 401 from the `auth/` endpoints
///    means rejected credentials and has no side effects.
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::{
    api::state::ClientContext,
    auth::AuthSession,
    error::{AppError, AppResult, ValidationError},
    middleware::{make_span_with_request_id, RequestId},
};

const EVENT_CHANNEL_CAPACITY: usize = 16;
const MAX_LOGGED_BODY: usize = 512;

/// Notifications the gateway emits for the hosting application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The backend rejected our credentials; the token has been cleared
    Unauthorized { path: String },
}

#[derive(Clone)]
pub struct HttpGateway {
    http_client: HttpClient,
    base_url: String,
    default_timeout: Duration,
    auth: AuthSession,
    events: broadcast::Sender<GatewayEvent>,
}

impl HttpGateway {
    pub fn new(context: &ClientContext) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http_client: HttpClient::new(),
            base_url: context.config.api_url.trim_end_matches('/').to_string(),
            default_timeout: context.config.request_timeout(),
            auth: context.auth.clone(),
            events,
        }
    }

    /// Subscribes to gateway events (e.g. forced sign-out)
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        self.get_with_timeout(path, query, self.default_timeout)
            .await
    }

    pub async fn get_with_timeout<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> AppResult<T> {
        self.execute(Method::GET, path, timeout, |request| request.query(query))
            .await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, self.default_timeout, |request| {
            request.json(body)
        })
        .await
    }

    /// POST as `application/x-www-form-urlencoded`
    pub async fn post_form<B, T>(&self, path: &str, form: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, self.default_timeout, |request| {
            request.form(form)
        })
        .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute(Method::DELETE, path, self.default_timeout, |request| request)
            .await
    }

    async fn execute<T, F>(
        &self,
        method: Method,
        path: &str,
        deadline: Duration,
        build: F,
    ) -> AppResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let request_id = RequestId::new();
        let span = make_span_with_request_id(&method, path, &request_id);

        let mut request = build(self.http_client.request(method, self.url(path)));
        request = request_id.attach(request);
        if let Some(token) = self.auth.token() {
            request = request.bearer_auth(token);
        }

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| AppError::from_transport(e, deadline))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| AppError::from_transport(e, deadline))?;
            Ok::<_, AppError>((status, body))
        };

        let outcome = tokio::time::timeout(deadline, exchange)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        let (status, body) = match outcome {
            Ok(Ok(exchange)) => exchange,
            Ok(Err(e)) => {
                if let AppError::Timeout(_) = e {
                    tracing::warn!(timeout = ?deadline, "Request timed out");
                } else {
                    tracing::error!(error = %e, "Request failed before a response arrived");
                }
                return Err(e);
            }
            Err(_) => {
                tracing::warn!(timeout = ?deadline, "Request timed out");
                return Err(AppError::Timeout(deadline));
            }
        };

        if !status.is_success() {
            return Err(self.classify(path, status, &body));
        }

        tracing::debug!(status = status.as_u16(), response = %truncate(&body), "Response received");

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, response = %truncate(&body), "Failed to deserialize response");
            AppError::Decode(e.to_string())
        })
    }

    /// Maps a non-success response onto the error taxonomy, running the
    /// side effects attached to each class
    fn classify(&self, path: &str, status: StatusCode, body: &str) -> AppError {
        match status {
            StatusCode::UNAUTHORIZED if is_sign_in(path) => {
                // Rejected credentials, not an expired session
                tracing::warn!("Sign-in rejected");
                AppError::Unauthorized
            }
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Unauthorized response, clearing auth token");
                self.auth.clear_token();
                // No subscribers is fine; the token is already gone
                let _ = self.events.send(GatewayEvent::Unauthorized {
                    path: path.to_string(),
                });
                AppError::Unauthorized
            }
            StatusCode::NOT_FOUND => {
                let message = detail_message(body).unwrap_or_else(|| path.to_string());
                tracing::debug!(detail = %message, "Resource not found");
                AppError::NotFound(message)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let validation = ValidationError::from_body(body);
                tracing::warn!(detail = %validation, "Validation error");
                AppError::Validation(validation)
            }
            s if s.is_server_error() => {
                let message = detail_message(body).unwrap_or_else(|| truncate(body).to_string());
                tracing::error!(status = s.as_u16(), detail = %message, "Server error");
                AppError::Server {
                    status: s.as_u16(),
                    message,
                }
            }
            s => {
                tracing::error!(status = s.as_u16(), response = %truncate(body), "API error");
                AppError::Api {
                    status: s.as_u16(),
                    body: body.to_string(),
                }
            }
        }
    }
}

fn is_sign_in(path: &str) -> bool {
    path.trim_start_matches('/').starts_with("auth/")
}

/// Pulls a human-readable message out of a FastAPI error body
fn detail_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(detail) => detail
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_LOGGED_BODY {
        return body;
    }
    let mut end = MAX_LOGGED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
