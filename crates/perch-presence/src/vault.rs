use std::sync::Arc;

use chrono::Utc;
use perch_crypto::encrypt::{decrypt_token, encrypt_token};
use perch_db::Database;
use perch_db::models::CredentialRow;
use tracing::{info, warn};

use crate::error::{PresenceError, Result};

/// Decrypted view of the credential singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
    /// Epoch seconds.
    pub expires_at: Option<i64>,
}

impl Credentials {
    /// Refresh token and expiry play no part here.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.user_id.is_some()
    }
}

/// Encrypted single-row store for the provider token pair.
#[derive(Clone)]
pub struct CredentialVault {
    db: Arc<Database>,
    key: [u8; 32],
}

impl CredentialVault {
    pub fn new(db: Arc<Database>, key: [u8; 32]) -> Self {
        Self { db, key }
    }

    /// Read and decrypt the singleton. A field that fails to decrypt comes
    /// back as `None`; only storage errors fail the call.
    pub fn get(&self) -> Result<Credentials> {
        let row = self.db.get_credentials()?;

        Ok(Credentials {
            access_token: self.open_field("access_token", row.access_token.as_deref()),
            refresh_token: self.open_field("refresh_token", row.refresh_token.as_deref()),
            user_id: row.user_id,
            expires_at: row.expires_at,
        })
    }

    pub fn set(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: &str,
        expires_in_seconds: Option<i64>,
    ) -> Result<()> {
        let expires_at = match expires_in_seconds {
            Some(secs) => Some(Utc::now().timestamp().checked_add(secs).ok_or_else(|| {
                PresenceError::Validation(format!("expires_in {} is out of range", secs))
            })?),
            None => None,
        };

        let row = CredentialRow {
            access_token: Some(encrypt_token(&self.key, access_token)?),
            refresh_token: Some(encrypt_token(&self.key, refresh_token)?),
            user_id: Some(user_id.to_string()),
            expires_at,
        };
        self.db.set_credentials(&row)?;

        info!("Stored credentials for user {}", user_id);
        Ok(())
    }

    /// Null every field; the row itself stays.
    pub fn clear(&self) -> Result<()> {
        self.db.clear_credentials()?;
        info!("Cleared stored credentials");
        Ok(())
    }

    fn open_field(&self, field: &'static str, sealed: Option<&[u8]>) -> Option<String> {
        let sealed = sealed?;
        match self.decrypt_field(field, sealed) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Treating stored token as absent: {}", e);
                None
            }
        }
    }

    fn decrypt_field(&self, field: &'static str, sealed: &[u8]) -> Result<String> {
        decrypt_token(&self.key, sealed).map_err(|_| PresenceError::Decryption { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_crypto::keys::generate_token_key;

    fn vault() -> CredentialVault {
        let db = Arc::new(Database::open_in_memory().unwrap());
        CredentialVault::new(db, generate_token_key())
    }

    #[test]
    fn first_touch_is_unauthenticated() {
        let vault = vault();
        let creds = vault.get().unwrap();
        assert_eq!(creds, Credentials::default());
        assert!(!creds.is_authenticated());
    }

    #[test]
    fn set_then_get() {
        let vault = vault();
        let before = Utc::now().timestamp();
        vault.set("access", "refresh", "user-1", Some(3600)).unwrap();

        let creds = vault.get().unwrap();
        assert_eq!(creds.access_token.as_deref(), Some("access"));
        assert_eq!(creds.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(creds.user_id.as_deref(), Some("user-1"));
        let expires_at = creds.expires_at.unwrap();
        assert!(expires_at >= before + 3600 && expires_at <= Utc::now().timestamp() + 3600);
        assert!(creds.is_authenticated());
    }

    #[test]
    fn huge_expiry_is_rejected_and_keeps_old_row() {
        let vault = vault();
        vault.set("access", "refresh", "user-1", Some(60)).unwrap();

        let err = vault.set("a", "r", "u", Some(i64::MAX)).unwrap_err();
        assert!(matches!(err, PresenceError::Validation(_)));
        assert_eq!(vault.get().unwrap().user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn tokens_are_not_stored_in_plaintext() {
        let vault = vault();
        vault.set("plain-access", "plain-refresh", "u", None).unwrap();

        let row = vault.db.get_credentials().unwrap();
        let stored = row.access_token.unwrap();
        assert!(!stored.windows(12).any(|w| w == b"plain-access"));
        assert_eq!(row.expires_at, None);
    }

    #[test]
    fn corrupt_refresh_token_is_isolated() {
        let vault = vault();
        vault.set("access", "refresh", "user-1", None).unwrap();
        vault
            .db
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE credentials SET refresh_token = X'DEADBEEF00112233445566778899' WHERE id = 1",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let creds = vault.get().unwrap();
        assert_eq!(creds.access_token.as_deref(), Some("access"));
        assert_eq!(creds.refresh_token, None);
        assert_eq!(creds.user_id.as_deref(), Some("user-1"));
        assert!(creds.is_authenticated());
    }

    #[test]
    fn rotated_key_reads_as_unauthenticated() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        CredentialVault::new(db.clone(), generate_token_key())
            .set("access", "refresh", "user-1", None)
            .unwrap();

        let creds = CredentialVault::new(db, generate_token_key()).get().unwrap();
        assert_eq!(creds.access_token, None);
        assert_eq!(creds.user_id.as_deref(), Some("user-1"));
        assert!(!creds.is_authenticated());
    }

    #[test]
    fn clear_resets_all_fields() {
        let vault = vault();
        vault.set("access", "refresh", "user-1", Some(60)).unwrap();
        vault.clear().unwrap();
        assert_eq!(vault.get().unwrap(), Credentials::default());
    }
}
