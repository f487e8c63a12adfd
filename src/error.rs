use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Client-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: credentials are missing, invalid or expired")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Coarse error categories a view can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Validation,
    Server,
    Network,
    Timeout,
    NotFound,
    Other,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized => ErrorKind::Auth,
            AppError::Validation(_) | AppError::InvalidInput(_) => ErrorKind::Validation,
            AppError::Server { .. } => ErrorKind::Server,
            AppError::Network(_) => ErrorKind::Network,
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Api { .. }
            | AppError::Decode(_)
            | AppError::Storage(_) => ErrorKind::Other,
        }
    }

    /// Maps a transport failure from reqwest. Anything that never produced a
    /// response is a network error unless reqwest itself reports a timeout.
    pub fn from_transport(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            AppError::Timeout(deadline)
        } else if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

/// Single field-level problem reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Structured 422 payload
///
/// The backend reports two shapes under `detail`: a list of
/// `{loc, msg, type}` entries (request schema validation) or an object with
/// `message`, `issues` and `suggestions` (semantic validation, e.g. mood text).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: Option<String>,
    pub fields: Vec<FieldError>,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub raw: Value,
}

impl ValidationError {
    pub fn from_body(body: &str) -> Self {
        let raw: Value = serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.into()));
        let mut error = ValidationError {
            raw: raw.clone(),
            ..Default::default()
        };

        match raw.get("detail") {
            Some(Value::Array(entries)) => {
                error.fields = entries.iter().filter_map(field_error_from_entry).collect();
            }
            Some(Value::Object(detail)) => {
                error.message = detail
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                error.issues = string_list(detail.get("issues"));
                error.suggestions = string_list(detail.get("suggestions"));
            }
            Some(Value::String(message)) => error.message = Some(message.clone()),
            _ => {
                if let Value::String(text) = &raw {
                    if !text.is_empty() {
                        error.message = Some(text.clone());
                    }
                }
            }
        }

        error
    }

    pub fn field(&self, name: &str) -> Option<&FieldError> {
        self.fields.iter().find(|f| f.field == name)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(message) = &self.message {
            return write!(f, "{}", message);
        }
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        if fields.is_empty() {
            write!(f, "request rejected")
        } else {
            write!(f, "{}", fields.join("; "))
        }
    }
}

fn field_error_from_entry(entry: &Value) -> Option<FieldError> {
    let message = entry.get("msg")?.as_str()?.to_string();
    // `loc` looks like ["body", "email"]; the last segment names the field
    let field = entry
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|segment| match segment {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    Some(FieldError { field, message })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub type AppResult<T> = Result<T, AppError>;
