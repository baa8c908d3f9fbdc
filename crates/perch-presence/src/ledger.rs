use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use perch_db::Database;
use perch_db::models::{ChannelRow, IdentityRow};
use perch_types::models::ChannelIdentity;
use tracing::{debug, info, warn};

use crate::error::{PresenceError, Result};

/// One followed channel as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub display_name: String,
    pub profile_image_url: String,
    pub is_favorite: bool,
    /// Only set while `is_favorite`.
    pub favorite_order: Option<i64>,
    /// Last observed live -> offline transition.
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl From<ChannelRow> for ChannelRecord {
    fn from(row: ChannelRow) -> Self {
        let last_seen_at = row.last_seen_at.and_then(|ms| {
            let parsed = DateTime::from_timestamp_millis(ms);
            if parsed.is_none() {
                warn!("Corrupt last_seen_at {} on channel '{}'", ms, row.channel_id);
            }
            parsed
        });

        Self {
            channel_id: row.channel_id,
            display_name: row.display_name,
            profile_image_url: row.profile_image_url,
            is_favorite: row.is_favorite,
            favorite_order: row.favorite_order,
            last_seen_at,
        }
    }
}

fn identity_row(identity: &ChannelIdentity) -> IdentityRow {
    IdentityRow {
        channel_id: identity.channel_id.clone(),
        display_name: identity.display_name.clone(),
        profile_image_url: identity.profile_image_url.clone(),
    }
}

/// Per-channel records: identity, favorite flag and order, watermark.
#[derive(Clone)]
pub struct ChannelLedger {
    db: Arc<Database>,
}

impl ChannelLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Unknown channels are not favorites.
    pub fn is_favorite(&self, channel_id: &str) -> Result<bool> {
        Ok(self.db.is_favorite(channel_id)?.unwrap_or(false))
    }

    /// Insert or mark as favorite at the end of the order. Adding an existing
    /// favorite is a successful no-op.
    pub fn add_favorite(&self, identity: &ChannelIdentity) -> Result<()> {
        validate_identity(identity)?;
        if self.db.add_favorite(&identity_row(identity))? {
            info!("Added favorite {}", identity.channel_id);
        }
        Ok(())
    }

    pub fn remove_favorite(&self, channel_id: &str) -> Result<()> {
        if self.db.remove_favorite(channel_id)? {
            info!("Removed favorite {}", channel_id);
        }
        Ok(())
    }

    /// Flip the favorite flag of a channel already in the ledger.
    pub fn toggle_favorite(&self, channel_id: &str) -> Result<bool> {
        self.db
            .toggle_favorite(channel_id)?
            .ok_or_else(|| PresenceError::NotFound(format!("channel {}", channel_id)))
    }

    pub fn set_favorite(&self, channel_id: &str, favorite: bool) -> Result<bool> {
        self.db
            .set_favorite(channel_id, favorite)?
            .ok_or_else(|| PresenceError::NotFound(format!("channel {}", channel_id)))
    }

    /// Assign `favorite_order = index` along `ordered_ids`. All or nothing:
    /// duplicates or ids that are not current favorites reject the whole call.
    pub fn reorder(&self, ordered_ids: &[String]) -> Result<()> {
        let mut seen = HashSet::with_capacity(ordered_ids.len());
        if let Some(dup) = ordered_ids.iter().find(|id| !seen.insert(id.as_str())) {
            debug!("Reorder rejected: duplicate {}", dup);
            return Err(PresenceError::Validation(format!(
                "channel {} listed more than once",
                dup
            )));
        }

        let rejected = self.db.reorder_favorites(ordered_ids)?;
        if !rejected.is_empty() {
            debug!("Reorder rejected: not favorites {:?}", rejected);
            return Err(PresenceError::Validation(format!(
                "not favorites: {}",
                rejected.join(", ")
            )));
        }
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<ChannelRecord>> {
        Ok(self
            .db
            .list_channels()?
            .into_iter()
            .map(ChannelRecord::from)
            .collect())
    }

    pub fn upsert_identity(&self, identity: &ChannelIdentity) -> Result<()> {
        validate_identity(identity)?;
        self.db.upsert_channel(&identity_row(identity))?;
        Ok(())
    }

    /// Make the ledger match the followed set. Unfollowed rows are deleted,
    /// surviving rows keep their favorite state and watermark.
    pub fn sync_follows(&self, identities: &[ChannelIdentity]) -> Result<(usize, usize)> {
        for identity in identities {
            validate_identity(identity)?;
        }
        let rows: Vec<IdentityRow> = identities.iter().map(identity_row).collect();
        let (upserted, removed) = self.db.sync_channels(&rows)?;
        info!("Follow sync: {} channels, {} unfollowed", upserted, removed);
        Ok((upserted, removed))
    }
}

fn validate_identity(identity: &ChannelIdentity) -> Result<()> {
    if identity.channel_id.trim().is_empty() {
        return Err(PresenceError::Validation("channel_id must not be empty".into()));
    }
    Ok(())
}
