use async_trait::async_trait;
use perch_types::models::LiveSnapshotEntry;

/// Source of live snapshots. The engine never caches what this returns.
#[async_trait]
pub trait LiveStreamProvider: Send + Sync {
    /// Channels followed by `user_id` that are live right now.
    async fn fetch_live_streams(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> anyhow::Result<Vec<LiveSnapshotEntry>>;
}
