//! API Handlers
//!
//! The three user endpoints. Each handler records a business event through
//! the exporter after its domain action; metrics recording is best-effort
//! and never influences the response.

use super::types::{CredentialsRequest, MsgResponse, UserListResponse};
use crate::exporter::MetricsExporter;
use crate::store::UserStore;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub exporter: Arc<MetricsExporter>,
}

/// Validate credentials and record a "login" event on success.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> (StatusCode, Json<MsgResponse>) {
    let Ok(Json(request)) = payload else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(MsgResponse::new("invalid JSON payload")),
        );
    };

    if !state
        .store
        .validate_credentials(&request.username, &request.password)
    {
        warn!(username = %request.username, "Rejected login attempt");
        return (
            StatusCode::BAD_REQUEST,
            Json(MsgResponse::new("invalid username or password")),
        );
    }

    state.exporter.record_business_event("login", &request.username);
    info!(username = %request.username, "User logged in");

    (
        StatusCode::OK,
        Json(MsgResponse::new(format!(
            "{} logged in successfully",
            request.username
        ))),
    )
}

/// Create a new user and record a "register" event.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> (StatusCode, Json<MsgResponse>) {
    let Ok(Json(request)) = payload else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(MsgResponse::new("invalid JSON payload")),
        );
    };

    if request.username.is_empty() || request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(MsgResponse::new("username and password must not be empty")),
        );
    }

    if let Err(e) = state.store.insert(&request.username, &request.password) {
        warn!(username = %request.username, error = %e, "Registration failed");
        return (
            StatusCode::BAD_REQUEST,
            Json(MsgResponse::new("username is already taken")),
        );
    }

    state
        .exporter
        .record_business_event("register", &request.username);
    info!(username = %request.username, "User registered");

    (
        StatusCode::OK,
        Json(MsgResponse::new(format!(
            "{} registered successfully",
            request.username
        ))),
    )
}

/// List all usernames and record a "get_users" event for the system
/// principal.
pub async fn get_users(State(state): State<AppState>) -> (StatusCode, Json<UserListResponse>) {
    let data = state.store.list_usernames();

    state.exporter.record_business_event("get_users", "system");

    (StatusCode::OK, Json(UserListResponse { data }))
}
