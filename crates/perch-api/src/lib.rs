pub mod auth;
pub mod channels;
pub mod error;
pub mod helix;
pub mod presence;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use perch_presence::PresenceService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub presence: PresenceService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/presence", get(presence::get_presence))
        .route("/channels", put(channels::sync_channels))
        .route("/channels/{channel_id}/favorite", put(channels::set_favorite))
        .route("/channels/{channel_id}/favorite/toggle", post(channels::toggle_favorite))
        .route("/favorites/order", put(channels::reorder_favorites))
        .route(
            "/auth",
            get(auth::get_auth_state)
                .put(auth::set_auth_state)
                .delete(auth::clear_auth_state),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use perch_crypto::keys::generate_token_key;
    use perch_db::Database;
    use perch_presence::{LiveStreamProvider, PresenceService};
    use perch_types::models::LiveSnapshotEntry;
    use tower::ServiceExt;

    use crate::{AppStateInner, router};

    /// Always reports the same set of live channels.
    #[derive(Default)]
    pub struct FixedProvider {
        pub live: Mutex<Vec<LiveSnapshotEntry>>,
    }

    #[async_trait]
    impl LiveStreamProvider for FixedProvider {
        async fn fetch_live_streams(
            &self,
            _user_id: &str,
            _access_token: &str,
        ) -> anyhow::Result<Vec<LiveSnapshotEntry>> {
            Ok(self.live.lock().unwrap().clone())
        }
    }

    pub fn app() -> (axum::Router, Arc<FixedProvider>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let provider = Arc::new(FixedProvider::default());
        let presence = PresenceService::new(db, generate_token_key(), provider.clone());
        (router(Arc::new(AppStateInner { presence })), provider)
    }

    pub async fn send(
        app: &axum::Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into())
            })
        };
        (status, json)
    }
}
