use std::collections::HashSet;

use crate::models::{ChannelRow, CredentialRow, IdentityRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

const CHANNEL_COLUMNS: &str =
    "channel_id, display_name, profile_image_url, is_favorite, favorite_order, last_seen_at";

impl Database {
    // -- Channels --

    /// Insert a channel or refresh its identity. Favorite and watermark
    /// columns are never touched here.
    pub fn upsert_channel(&self, identity: &IdentityRow) -> Result<()> {
        self.with_conn(|conn| upsert_identity(conn, identity))
    }

    /// Replace the followed set: upsert every identity, delete every row not
    /// in `identities`. Returns (upserted, removed).
    pub fn sync_channels(&self, identities: &[IdentityRow]) -> Result<(usize, usize)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            for identity in identities {
                upsert_identity(&tx, identity)?;
            }

            let keep: HashSet<&str> = identities.iter().map(|i| i.channel_id.as_str()).collect();
            let existing = query_channel_ids(&tx)?;
            let mut removed = 0;
            for id in existing.iter().filter(|id| !keep.contains(id.as_str())) {
                removed += tx.execute("DELETE FROM channels WHERE channel_id = ?1", [id])?;
            }

            tx.commit()?;
            Ok((identities.len(), removed))
        })
    }

    pub fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| query_channel(conn, channel_id))
    }

    pub fn list_channels(&self) -> Result<Vec<ChannelRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY channel_id"
            ))?;
            let rows = stmt
                .query_map([], map_channel)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Favorite ids in their stored order.
    pub fn list_favorite_ids(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| query_favorite_ids(conn))
    }

    /// Upsert the identity and mark it favorite at the end of the order.
    /// Returns false if it already was a favorite.
    pub fn add_favorite(&self, identity: &IdentityRow) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            upsert_identity(&tx, identity)?;
            let added = mark_favorite(&tx, &identity.channel_id)?;
            tx.commit()?;
            Ok(added)
        })
    }

    /// Clear the favorite flag and order. The row and its watermark stay.
    /// Returns false if the channel was not a favorite.
    pub fn remove_favorite(&self, channel_id: &str) -> Result<bool> {
        self.with_conn(|conn| unmark_favorite(conn, channel_id))
    }

    /// Set the favorite flag on a known channel.
    /// Returns `None` when the channel is not in the ledger.
    pub fn set_favorite(&self, channel_id: &str, favorite: bool) -> Result<Option<bool>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if query_is_favorite(&tx, channel_id)?.is_none() {
                return Ok(None);
            }
            apply_favorite(&tx, channel_id, favorite)?;
            tx.commit()?;
            Ok(Some(favorite))
        })
    }

    /// Flip the favorite flag. Read and write share one immediate
    /// transaction, so two toggles can never pick the same order slot.
    /// Returns the new state, or `None` when the channel is unknown.
    pub fn toggle_favorite(&self, channel_id: &str) -> Result<Option<bool>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(current) = query_is_favorite(&tx, channel_id)? else {
                return Ok(None);
            };
            apply_favorite(&tx, channel_id, !current)?;
            tx.commit()?;
            Ok(Some(!current))
        })
    }

    pub fn is_favorite(&self, channel_id: &str) -> Result<Option<bool>> {
        self.with_conn(|conn| query_is_favorite(conn, channel_id))
    }

    /// Rewrite `favorite_order` as 0..n-1 following `ordered`; favorites the
    /// caller left out keep their relative order after the listed ones.
    ///
    /// Returns the ids of `ordered` that are not current favorites. When that
    /// list is non-empty nothing has been written.
    pub fn reorder_favorites(&self, ordered: &[String]) -> Result<Vec<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = query_favorite_ids(&tx)?;
            let favorites: HashSet<&str> = current.iter().map(String::as_str).collect();
            let unknown: Vec<String> = ordered
                .iter()
                .filter(|id| !favorites.contains(id.as_str()))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Ok(unknown);
            }

            let listed: HashSet<&str> = ordered.iter().map(String::as_str).collect();
            let full_order = ordered
                .iter()
                .chain(current.iter().filter(|id| !listed.contains(id.as_str())));

            // Park every slot first so the unique index never sees a collision
            tx.execute("UPDATE channels SET favorite_order = NULL WHERE is_favorite = 1", [])?;
            {
                let mut stmt =
                    tx.prepare("UPDATE channels SET favorite_order = ?1 WHERE channel_id = ?2")?;
                for (index, id) in full_order.enumerate() {
                    stmt.execute(rusqlite::params![index as i64, id])?;
                }
            }

            tx.commit()?;
            Ok(Vec::new())
        })
    }

    /// Stamp `last_seen_at` on every listed channel in one transaction.
    /// Ids no longer in the ledger are skipped. Returns rows updated.
    pub fn mark_last_seen(&self, channel_ids: &[String], seen_at_ms: i64) -> Result<usize> {
        if channel_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut updated = 0;
            {
                let mut stmt =
                    tx.prepare("UPDATE channels SET last_seen_at = ?1 WHERE channel_id = ?2")?;
                for id in channel_ids {
                    updated += stmt.execute(rusqlite::params![seen_at_ms, id])?;
                }
            }
            tx.commit()?;
            Ok(updated)
        })
    }

    // -- Credentials --

    /// Read the singleton, creating it first if this is the first touch.
    pub fn get_credentials(&self) -> Result<CredentialRow> {
        self.with_conn(|conn| {
            ensure_credentials(conn)?;
            let row = conn.query_row(
                "SELECT access_token, refresh_token, user_id, expires_at FROM credentials WHERE id = 1",
                [],
                |row| {
                    Ok(CredentialRow {
                        access_token: row.get(0)?,
                        refresh_token: row.get(1)?,
                        user_id: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )?;
            Ok(row)
        })
    }

    /// Overwrite the singleton unconditionally.
    pub fn set_credentials(&self, creds: &CredentialRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            ensure_credentials(&tx)?;
            tx.execute(
                "UPDATE credentials
                 SET access_token = ?1, refresh_token = ?2, user_id = ?3, expires_at = ?4
                 WHERE id = 1",
                rusqlite::params![
                    creds.access_token,
                    creds.refresh_token,
                    creds.user_id,
                    creds.expires_at
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn clear_credentials(&self) -> Result<()> {
        self.set_credentials(&CredentialRow::default())
    }
}

/// `INSERT OR IGNORE` against the pinned primary key: concurrent first
/// touches collapse into one row without any application lock.
fn ensure_credentials(conn: &Connection) -> Result<()> {
    conn.execute("INSERT OR IGNORE INTO credentials (id) VALUES (1)", [])?;
    Ok(())
}

fn upsert_identity(conn: &Connection, identity: &IdentityRow) -> Result<()> {
    conn.execute(
        "INSERT INTO channels (channel_id, display_name, profile_image_url) VALUES (?1, ?2, ?3)
         ON CONFLICT(channel_id) DO UPDATE SET
            display_name = excluded.display_name,
            profile_image_url = excluded.profile_image_url",
        (
            &identity.channel_id,
            &identity.display_name,
            &identity.profile_image_url,
        ),
    )?;
    Ok(())
}

fn apply_favorite(tx: &Transaction<'_>, channel_id: &str, favorite: bool) -> Result<bool> {
    if favorite {
        mark_favorite(tx, channel_id)
    } else {
        unmark_favorite(tx, channel_id)
    }
}

fn mark_favorite(tx: &Transaction<'_>, channel_id: &str) -> Result<bool> {
    if query_is_favorite(tx, channel_id)? == Some(true) {
        return Ok(false);
    }

    let next: i64 = tx.query_row(
        "SELECT COALESCE(MAX(favorite_order) + 1, 0) FROM channels WHERE is_favorite = 1",
        [],
        |r| r.get(0),
    )?;
    let changed = tx.execute(
        "UPDATE channels SET is_favorite = 1, favorite_order = ?1 WHERE channel_id = ?2",
        rusqlite::params![next, channel_id],
    )?;
    debug!("Favorite {} at position {}", channel_id, next);
    Ok(changed > 0)
}

fn unmark_favorite(conn: &Connection, channel_id: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE channels SET is_favorite = 0, favorite_order = NULL
         WHERE channel_id = ?1 AND is_favorite = 1",
        [channel_id],
    )?;
    Ok(changed > 0)
}

fn query_is_favorite(conn: &Connection, channel_id: &str) -> Result<Option<bool>> {
    conn.query_row(
        "SELECT is_favorite FROM channels WHERE channel_id = ?1",
        [channel_id],
        |row| row.get(0),
    )
    .optional()
}

fn query_channel(conn: &Connection, channel_id: &str) -> Result<Option<ChannelRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM channels WHERE channel_id = ?1"
    ))?;

    stmt.query_row([channel_id], map_channel).optional()
}

fn query_channel_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT channel_id FROM channels")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn query_favorite_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT channel_id FROM channels WHERE is_favorite = 1
         ORDER BY favorite_order, channel_id",
    )?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn map_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelRow> {
    Ok(ChannelRow {
        channel_id: row.get(0)?,
        display_name: row.get(1)?,
        profile_image_url: row.get(2)?,
        is_favorite: row.get(3)?,
        favorite_order: row.get(4)?,
        last_seen_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
