use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use perch_db::Database;
use perch_types::models::LiveSnapshotEntry;
use tracing::debug;

use crate::error::Result;

/// Advances `last_seen_at` when a channel drops out of the live snapshot.
///
/// The only memory of earlier polls is the id set of the previous snapshot,
/// held in process. After a restart the first call has nothing to diff
/// against and records no transitions, so one "went offline" stamp can be
/// missed, at most one poll interval stale.
pub struct PresenceReconciler {
    db: Arc<Database>,
    previous: Mutex<Option<HashSet<String>>>,
}

impl PresenceReconciler {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            previous: Mutex::new(None),
        }
    }

    pub fn reconcile(&self, snapshot: &[LiveSnapshotEntry]) -> Result<usize> {
        self.reconcile_at(snapshot, Utc::now())
    }

    /// Stamp `now` on every channel live in the previous snapshot and absent
    /// from this one. Returns how many channels went offline.
    ///
    /// The lock is held across the write. The new snapshot only replaces the
    /// previous one once the write succeeded, so a failed write is retried by
    /// the next call.
    pub fn reconcile_at(&self, snapshot: &[LiveSnapshotEntry], now: DateTime<Utc>) -> Result<usize> {
        let live: HashSet<String> = snapshot.iter().map(|e| e.channel_id.clone()).collect();

        // The set is replaced wholesale, a panicking holder cannot leave it half-written
        let mut previous = self.previous.lock().unwrap_or_else(|e| e.into_inner());

        let went_offline: Vec<String> = match previous.as_ref() {
            Some(prev) => prev.difference(&live).cloned().collect(),
            None => {
                debug!("First reconcile since startup, {} live, no transitions", live.len());
                Vec::new()
            }
        };

        if !went_offline.is_empty() {
            let updated = self.db.mark_last_seen(&went_offline, now.timestamp_millis())?;
            debug!(
                "{} channel(s) went offline at {}: {:?} ({} tracked)",
                went_offline.len(),
                now,
                went_offline,
                updated
            );
        }

        *previous = Some(live);
        Ok(went_offline.len())
    }
}
