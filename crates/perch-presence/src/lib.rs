//! Presence reconciliation and favorites ordering.
//!
//! The pieces, leaves first: [`vault::CredentialVault`] guards the provider
//! tokens, [`ledger::ChannelLedger`] owns favorites, [`reconciler::PresenceReconciler`]
//! advances last-seen watermarks, and [`assembler::assemble`] builds the
//! ordered list. [`service::PresenceService`] wires them together.

pub mod assembler;
pub mod collation;
pub mod error;
pub mod ledger;
pub mod provider;
pub mod reconciler;
pub mod service;
pub mod vault;

pub use error::{PresenceError, Result};
pub use provider::LiveStreamProvider;
pub use service::PresenceService;
