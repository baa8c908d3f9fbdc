use std::path::PathBuf;

use anyhow::{Context, Result};
use perch_api::helix::DEFAULT_API_BASE;
use perch_crypto::keys::{generate_token_key, key_from_base64, key_to_base64};
use tracing::warn;

pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_key: [u8; 32],
    pub twitch_client_id: String,
    pub twitch_api_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path: PathBuf = std::env::var("PERCH_DB_PATH")
            .unwrap_or_else(|_| "perch.db".into())
            .into();
        let host = std::env::var("PERCH_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("PERCH_PORT")
            .unwrap_or_else(|_| "3400".into())
            .parse()
            .context("PERCH_PORT is not a port number")?;

        let token_key = match std::env::var("PERCH_TOKEN_KEY") {
            Ok(encoded) => key_from_base64(&encoded).context("PERCH_TOKEN_KEY is not a base64 32-byte key")?,
            Err(_) => {
                let key = generate_token_key();
                warn!("PERCH_TOKEN_KEY unset: using a throwaway key, stored tokens will not survive a restart");
                warn!("To keep this key, set PERCH_TOKEN_KEY={}", key_to_base64(&key));
                key
            }
        };

        let twitch_client_id = std::env::var("PERCH_TWITCH_CLIENT_ID").unwrap_or_default();
        if twitch_client_id.is_empty() {
            warn!("PERCH_TWITCH_CLIENT_ID unset: Helix requests will be rejected");
        }
        let twitch_api_base =
            std::env::var("PERCH_TWITCH_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());

        Ok(Self {
            db_path,
            host,
            port,
            token_key,
            twitch_client_id,
            twitch_api_base,
        })
    }
}
