use thiserror::Error;

pub type Result<T> = std::result::Result<T, PresenceError>;

#[derive(Debug, Error)]
pub enum PresenceError {
    /// Storage read or write failed. Never retried internally.
    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),

    /// A single stored token could not be decrypted. The vault degrades this
    /// to "absent"; it does not escape `CredentialVault::get`.
    #[error("could not decrypt {field}")]
    Decryption { field: &'static str },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("live-stream provider failed: {0}")]
    Provider(String),

    #[error("not authenticated")]
    Unauthenticated,
}
