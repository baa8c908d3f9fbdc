use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use perch_presence::LiveStreamProvider;
use perch_types::models::LiveSnapshotEntry;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.twitch.tv/helix";

/// Helix caps a page at 100; later pages are not fetched.
const PAGE_SIZE: &str = "100";

/// Twitch Helix client for the followed-and-live stream list.
pub struct HelixClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct StreamsPage {
    data: Vec<HelixStream>,
}

#[derive(Debug, Deserialize)]
struct HelixStream {
    user_id: String,
    viewer_count: u64,
    #[serde(default)]
    game_name: String,
}

impl HelixClient {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        })
    }
}

#[async_trait]
impl LiveStreamProvider for HelixClient {
    async fn fetch_live_streams(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<Vec<LiveSnapshotEntry>> {
        let url = format!("{}/streams/followed", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("user_id", user_id), ("first", PAGE_SIZE)])
            .bearer_auth(access_token)
            .header("Client-Id", &self.client_id)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Helix returned {}: {}", status, body);
        }

        let page: StreamsPage = resp.json().await?;
        debug!("Helix reports {} live followed channel(s)", page.data.len());

        Ok(page
            .data
            .into_iter()
            .map(|s| LiveSnapshotEntry {
                channel_id: s.user_id,
                viewer_count: s.viewer_count,
                game_name: s.game_name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde_json::json;
    use std::collections::HashMap;

    async fn fake_followed(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        let authorized = headers.get("authorization").and_then(|v| v.to_str().ok())
            == Some("Bearer good-token")
            && headers.get("client-id").and_then(|v| v.to_str().ok()) == Some("client-abc");
        if !authorized {
            return Err(StatusCode::UNAUTHORIZED);
        }
        assert_eq!(params.get("user_id").map(String::as_str), Some("777"));
        assert_eq!(params.get("first").map(String::as_str), Some("100"));

        Ok(Json(json!({
            "data": [
                { "user_id": "1", "user_name": "Ann", "viewer_count": 42, "game_name": "Chess", "type": "live" },
                { "user_id": "2", "user_name": "Bob", "viewer_count": 7 }
            ],
            "pagination": { "cursor": "abc" }
        })))
    }

    async fn serve() -> String {
        let app = Router::new().route("/helix/streams/followed", get(fake_followed));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/helix/", addr)
    }

    #[tokio::test]
    async fn maps_followed_streams() {
        let client = HelixClient::new(serve().await, "client-abc").unwrap();
        let live = client.fetch_live_streams("777", "good-token").await.unwrap();

        assert_eq!(
            live,
            vec![
                LiveSnapshotEntry {
                    channel_id: "1".into(),
                    viewer_count: 42,
                    game_name: "Chess".into(),
                },
                LiveSnapshotEntry {
                    channel_id: "2".into(),
                    viewer_count: 7,
                    game_name: String::new(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn rejected_token_is_an_error() {
        let client = HelixClient::new(serve().await, "client-abc").unwrap();
        let err = client.fetch_live_streams("777", "stale").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
