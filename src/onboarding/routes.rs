//! REST endpoints driving the onboarding controller.
//!
//! Every state-changing endpoint answers with the post-transition snapshot.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer};
use tower_http::cors::CorsLayer;

use super::controller::OnboardingController;
use super::model::{StepId, TriState};

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub controller: Arc<OnboardingController>,
}

/// Body of `POST /api/onboarding/enter`.
#[derive(Debug, Default, Deserialize)]
struct EnterRequest {
    #[serde(default)]
    location: Option<String>,
}

/// Body of `PATCH /api/onboarding/answers`. Absent fields are left alone;
/// `null` resets a yes/no answer to unset.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswersPatch {
    #[serde(default, deserialize_with = "present")]
    git_configured: Option<TriState>,
    #[serde(default, deserialize_with = "present")]
    cli_familiar: Option<TriState>,
    #[serde(default, deserialize_with = "present")]
    community_joined: Option<TriState>,
    #[serde(default)]
    practice_site_handle: Option<String>,
    #[serde(default)]
    network_handle: Option<String>,
}

/// Distinguish a present `null` from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn error_body(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "devsetup-onboarding"
    }))
}

/// GET /api/onboarding
async fn get_snapshot(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.controller.snapshot().await)
}

/// POST /api/onboarding/enter
///
/// Re-enter the flow as a page load would, optionally from a deep link.
async fn enter(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<EnterRequest>,
) -> impl IntoResponse {
    let outcome = state.controller.enter(req.location.as_deref()).await;
    let snapshot = state.controller.snapshot().await;
    Json(serde_json::json!({
        "location": outcome.location,
        "state": snapshot,
    }))
}

async fn start(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    state.controller.start().await;
    Json(state.controller.snapshot().await)
}

async fn next(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    state.controller.next().await;
    Json(state.controller.snapshot().await)
}

async fn back(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    state.controller.back().await;
    Json(state.controller.snapshot().await)
}

/// POST /api/onboarding/jump/{step}
async fn jump(
    State(state): State<OnboardingRouteState>,
    Path(step): Path<i64>,
) -> impl IntoResponse {
    state.controller.jump_to(step).await;
    Json(state.controller.snapshot().await)
}

/// POST /api/onboarding/complete/{step}
async fn complete(
    State(state): State<OnboardingRouteState>,
    Path(step): Path<String>,
) -> axum::response::Response {
    let step = match step.parse::<StepId>() {
        Ok(step) => step,
        Err(e) => return error_body(StatusCode::NOT_FOUND, e.to_string()),
    };
    state.controller.complete_step(step).await;
    Json(state.controller.snapshot().await).into_response()
}

/// PATCH /api/onboarding/answers
async fn update_answers(
    State(state): State<OnboardingRouteState>,
    Json(patch): Json<AnswersPatch>,
) -> impl IntoResponse {
    let controller = &state.controller;
    if let Some(value) = patch.git_configured {
        controller.set_git_configured(value).await;
    }
    if let Some(value) = patch.cli_familiar {
        controller.set_cli_familiar(value).await;
    }
    if let Some(value) = patch.community_joined {
        controller.set_community_joined(value).await;
    }
    if let Some(handle) = patch.practice_site_handle {
        controller.set_practice_site_handle(handle).await;
    }
    if let Some(handle) = patch.network_handle {
        controller.set_network_handle(handle).await;
    }
    Json(controller.snapshot().await)
}

/// POST /api/onboarding/help/{section}/toggle
async fn toggle_help(
    State(state): State<OnboardingRouteState>,
    Path(section): Path<String>,
) -> impl IntoResponse {
    let expanded = state.controller.toggle_help_section(&section).await;
    Json(serde_json::json!({ "section": section, "expanded": expanded }))
}

/// POST /api/onboarding/reset
///
/// Completion-screen primary action. 409 anywhere else.
async fn reset(State(state): State<OnboardingRouteState>) -> axum::response::Response {
    match state.controller.reset_and_exit().await {
        Ok(handoff) => Json(handoff).into_response(),
        Err(e) => error_body(StatusCode::CONFLICT, e.to_string()),
    }
}

/// POST /api/onboarding/home
async fn home(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.controller.back_to_home().await)
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding", get(get_snapshot))
        .route("/api/onboarding/enter", post(enter))
        .route("/api/onboarding/start", post(start))
        .route("/api/onboarding/next", post(next))
        .route("/api/onboarding/back", post(back))
        .route("/api/onboarding/jump/{step}", post(jump))
        .route("/api/onboarding/complete/{step}", post(complete))
        .route("/api/onboarding/answers", patch(update_answers))
        .route("/api/onboarding/help/{section}/toggle", post(toggle_help))
        .route("/api/onboarding/reset", post(reset))
        .route("/api/onboarding/home", post(home))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
