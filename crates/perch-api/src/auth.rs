use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use perch_presence::service::run_blocking;
use perch_types::api::SetAuthRequest;

use crate::AppState;
use crate::error::ApiError;

pub async fn get_auth_state(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let svc = state.presence.clone();
    let auth = run_blocking(move || svc.get_auth_state()).await?;
    Ok(Json(auth))
}

pub async fn set_auth_state(
    State(state): State<AppState>,
    Json(req): Json<SetAuthRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.presence.clone();
    run_blocking(move || {
        svc.set_auth_state(&req.access_token, &req.refresh_token, &req.user_id, req.expires_in)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_auth_state(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let svc = state.presence.clone();
    run_blocking(move || svc.clear_auth_state()).await?;
    Ok(StatusCode::NO_CONTENT)
}
