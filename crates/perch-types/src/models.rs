use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a followed channel as reported by the follow-list sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelIdentity {
    pub channel_id: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// One currently-live channel from a single provider poll. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSnapshotEntry {
    pub channel_id: String,
    pub viewer_count: u64,
    pub game_name: String,
}

/// A ledger row merged with the live snapshot, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledChannel {
    pub channel_id: String,
    pub display_name: String,
    pub profile_image_url: String,
    pub is_favorite: bool,
    pub is_live: bool,
    pub viewer_count: Option<u64>,
    pub game_name: Option<String>,
    /// Always `None` while the channel is live.
    pub last_seen_at: Option<DateTime<Utc>>,
}
