// REST API endpoints for the activity roster

mod error;

pub use error::ApiError;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::roster::ActivityList;
use crate::types::{ActivityName, Email, SessionToken, Username};

pub type AppState = Arc<AppContext>;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth/session", get(session_status))
        .route("/activities", get(list_activities))
        .route("/activities/{name}/signup", post(signup))
        .route("/activities/{name}/unregister", delete(unregister))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: SessionToken,
    pub username: Username,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub username: Option<Username>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Email,
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = state
        .guard()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        username: Username::new(payload.username),
    }))
}

/// Always succeeds, whether or not the token named a live session.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    state.guard().logout(authorization(&headers)).await;
    Json(json!({ "message": "Logged out" }))
}

async fn session_status(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionStatus> {
    let username = state.guard().identify(authorization(&headers)).await;
    Json(SessionStatus {
        authenticated: username.is_some(),
        username,
    })
}

async fn list_activities(State(state): State<AppState>) -> Json<ActivityList> {
    Json(state.catalog().snapshot().await)
}

async fn signup(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<EmailQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let activity = ActivityName::new(name);
    let message = format!("Signed up {} for {}", query.email, activity);

    state
        .roster()
        .signup(authorization(&headers), &activity, query.email)
        .await?;

    Ok(Json(json!({ "message": message })))
}

async fn unregister(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<EmailQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let activity = ActivityName::new(name);

    state
        .roster()
        .unregister(authorization(&headers), &activity, &query.email)
        .await?;

    Ok(Json(json!({
        "message": format!("Unregistered {} from {}", query.email, activity)
    })))
}
