use serde::{Deserialize, Serialize};

use crate::models::ChannelIdentity;

// -- Auth --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStateResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetAuthRequest {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub expires_in: Option<i64>,
}

// -- Channels --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncChannelsRequest {
    pub channels: Vec<ChannelIdentity>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleFavoriteResponse {
    pub is_favorite: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetFavoriteRequest {
    pub is_favorite: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderFavoritesRequest {
    pub channel_ids: Vec<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
