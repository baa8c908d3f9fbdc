use std::sync::Arc;

use perch_db::Database;
use perch_types::api::AuthStateResponse;
use perch_types::models::{AssembledChannel, ChannelIdentity, LiveSnapshotEntry};
use tracing::error;

use crate::assembler::assemble;
use crate::error::{PresenceError, Result};
use crate::ledger::ChannelLedger;
use crate::provider::LiveStreamProvider;
use crate::reconciler::PresenceReconciler;
use crate::vault::CredentialVault;

/// Everything request handlers call into. Cheap to clone.
#[derive(Clone)]
pub struct PresenceService {
    vault: CredentialVault,
    ledger: ChannelLedger,
    reconciler: Arc<PresenceReconciler>,
    provider: Arc<dyn LiveStreamProvider>,
}

impl PresenceService {
    pub fn new(db: Arc<Database>, token_key: [u8; 32], provider: Arc<dyn LiveStreamProvider>) -> Self {
        Self {
            vault: CredentialVault::new(db.clone(), token_key),
            ledger: ChannelLedger::new(db.clone()),
            reconciler: Arc::new(PresenceReconciler::new(db)),
            provider,
        }
    }

    /// Vault check, provider fetch, reconcile, assemble. The stored user id
    /// is the identity the snapshot is fetched for.
    pub async fn get_presence_list(&self) -> Result<Vec<AssembledChannel>> {
        let svc = self.clone();
        let creds = run_blocking(move || svc.vault.get()).await?;
        let (Some(user_id), Some(access_token)) = (creds.user_id, creds.access_token) else {
            return Err(PresenceError::Unauthenticated);
        };

        let snapshot = self
            .provider
            .fetch_live_streams(&user_id, &access_token)
            .await
            .map_err(|e| {
                error!("Live-stream fetch for {} failed: {:#}", user_id, e);
                PresenceError::Provider(e.to_string())
            })?;

        let svc = self.clone();
        run_blocking(move || svc.presence_list(&snapshot)).await
    }

    /// Reconcile then assemble against one snapshot. A failed watermark write
    /// is logged and assembly goes ahead with whatever is persisted.
    pub fn presence_list(&self, snapshot: &[LiveSnapshotEntry]) -> Result<Vec<AssembledChannel>> {
        if let Err(e) = self.reconciler.reconcile(snapshot) {
            error!("Reconcile failed, assembling with stored watermarks: {}", e);
        }
        let records = self.ledger.list_all()?;
        Ok(assemble(&records, snapshot))
    }

    pub fn toggle_favorite(&self, channel_id: &str) -> Result<bool> {
        self.ledger.toggle_favorite(channel_id)
    }

    pub fn set_favorite(&self, channel_id: &str, favorite: bool) -> Result<bool> {
        self.ledger.set_favorite(channel_id, favorite)
    }

    pub fn reorder_favorites(&self, ordered_ids: &[String]) -> Result<()> {
        self.ledger.reorder(ordered_ids)
    }

    pub fn sync_follows(&self, identities: &[ChannelIdentity]) -> Result<(usize, usize)> {
        self.ledger.sync_follows(identities)
    }

    pub fn get_auth_state(&self) -> Result<AuthStateResponse> {
        let creds = self.vault.get()?;
        let authenticated = creds.is_authenticated();
        Ok(AuthStateResponse {
            authenticated,
            user_id: if authenticated { creds.user_id } else { None },
        })
    }

    pub fn set_auth_state(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: &str,
        expires_in_seconds: Option<i64>,
    ) -> Result<()> {
        if access_token.is_empty() || user_id.is_empty() {
            return Err(PresenceError::Validation(
                "access_token and user_id are required".into(),
            ));
        }
        if expires_in_seconds.is_some_and(|secs| secs < 0) {
            return Err(PresenceError::Validation("expires_in must not be negative".into()));
        }
        self.vault.set(access_token, refresh_token, user_id, expires_in_seconds)
    }

    pub fn clear_auth_state(&self) -> Result<()> {
        self.vault.clear()
    }
}

/// Run blocking DB work off the async runtime.
pub async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        PresenceError::Persistence(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}
