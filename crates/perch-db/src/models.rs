//! Database row types. These map directly to SQLite rows and stay
//! distinct from the perch-types API models.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRow {
    pub channel_id: String,
    pub display_name: String,
    pub profile_image_url: String,
    pub is_favorite: bool,
    pub favorite_order: Option<i64>,
    /// Epoch milliseconds.
    pub last_seen_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRow {
    pub access_token: Option<Vec<u8>>,
    pub refresh_token: Option<Vec<u8>>,
    pub user_id: Option<String>,
    /// Epoch seconds.
    pub expires_at: Option<i64>,
}

/// The identity columns of a channel row, as supplied by follow-list sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRow {
    pub channel_id: String,
    pub display_name: String,
    pub profile_image_url: String,
}
