use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;
use crate::error::ApiError;

pub async fn get_presence(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let channels = state.presence.get_presence_list().await?;
    Ok(Json(channels))
}
