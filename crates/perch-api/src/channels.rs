use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use perch_presence::service::run_blocking;
use perch_types::api::{
    ReorderFavoritesRequest, SetFavoriteRequest, SyncChannelsRequest, ToggleFavoriteResponse,
};
use serde_json::json;

use crate::AppState;
use crate::error::ApiError;

pub async fn sync_channels(
    State(state): State<AppState>,
    Json(req): Json<SyncChannelsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.presence.clone();
    let (synced, removed) = run_blocking(move || svc.sync_follows(&req.channels)).await?;
    Ok(Json(json!({ "synced": synced, "removed": removed })))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.presence.clone();
    let is_favorite = run_blocking(move || svc.toggle_favorite(&channel_id)).await?;
    Ok(Json(ToggleFavoriteResponse { is_favorite }))
}

pub async fn set_favorite(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(req): Json<SetFavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.presence.clone();
    let is_favorite =
        run_blocking(move || svc.set_favorite(&channel_id, req.is_favorite)).await?;
    Ok(Json(ToggleFavoriteResponse { is_favorite }))
}

pub async fn reorder_favorites(
    State(state): State<AppState>,
    Json(req): Json<ReorderFavoritesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.presence.clone();
    run_blocking(move || svc.reorder_favorites(&req.channel_ids)).await?;
    Ok(StatusCode::NO_CONTENT)
}
