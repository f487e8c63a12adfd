//! Client-side logic for the MoodBinge movie recommendation service
//!
//! The [`api`] layer owns transport (auth headers, deadlines, error
//! classification); [`services`] hold the session manager, the backend
//! provider and the view-level orchestration built on top of it.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;

pub use api::{ClientContext, GatewayEvent, HttpGateway};
pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind};
pub use services::providers::{MoodBingeApi, RecommendationBackend};
