use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (channel ledger + credentials)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE channels (
                channel_id          TEXT PRIMARY KEY,
                display_name        TEXT NOT NULL,
                profile_image_url   TEXT NOT NULL DEFAULT '',
                is_favorite         INTEGER NOT NULL DEFAULT 0,
                favorite_order      INTEGER,
                last_seen_at        INTEGER,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Two favorites can never share a position
            CREATE UNIQUE INDEX idx_channels_favorite_order
                ON channels(favorite_order) WHERE is_favorite = 1;

            -- Singleton: the CHECK pins the only legal key
            CREATE TABLE credentials (
                id              INTEGER PRIMARY KEY CHECK (id = 1),
                access_token    BLOB,
                refresh_token   BLOB,
                user_id         TEXT,
                expires_at      INTEGER
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn credentials_key_is_pinned() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        conn.execute("INSERT INTO credentials (id) VALUES (1)", []).unwrap();
        assert!(conn.execute("INSERT INTO credentials (id) VALUES (2)", []).is_err());
        assert!(conn.execute("INSERT INTO credentials (id) VALUES (1)", []).is_err());
    }
}
