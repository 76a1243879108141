//! Provider adapter seam
//!
//! The wallet-connect SDK is an opaque collaborator. It performs the
//! handshake, switches chains, tears sessions down, and pushes account/chain
//! events. Capabilities are declared once at connect time rather than probed
//! per call.
//!
//! ```text
//! ProviderAdapter ──events()──▶ broadcast::Receiver<AdapterEvent>
//!        ▲                                  │
//!        │ connect / disconnect /           ▼
//!        │ switch_chain / restore     WalletController ──▶ SessionStore
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::broadcast;

use crate::wallet::error::AdapterError;
use crate::wallet::types::{ConnectOptions, ProviderType};

/// What the connected wallet declared it can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    pub switch_chain: bool,
    pub restore_session: bool,
    /// Chains the wallet can operate on. `None` when not advertised.
    #[serde(default)]
    pub chains: Option<BTreeSet<u64>>,
}

impl Default for ProviderCapabilities {
    fn default() -> Self { Self { switch_chain: true, restore_session: true, chains: None } }
}

impl ProviderCapabilities {
    pub fn without_switch_chain(mut self) -> Self { self.switch_chain = false; self }
    pub fn without_restore(mut self) -> Self { self.restore_session = false; self }
    pub fn with_chains(mut self, chains: impl IntoIterator<Item = u64>) -> Self {
        self.chains = Some(chains.into_iter().collect());
        self
    }

    /// Unknown chain lists are assumed reachable.
    pub fn can_reach(&self, chain_id: u64) -> bool {
        self.chains.as_ref().map_or(true, |chains| chains.contains(&chain_id))
    }
}

/// Result of a successful handshake or session restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConnection {
    pub address: String,
    pub chain_id: u64,
    pub provider_type: ProviderType,
    #[serde(default)]
    pub capabilities: ProviderCapabilities,
}

impl AdapterConnection {
    pub fn new(address: impl Into<String>, chain_id: u64, provider_type: ProviderType) -> Self {
        Self { address: address.into(), chain_id, provider_type, capabilities: ProviderCapabilities::default() }
    }

    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Events pushed by the adapter, applied in receive order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterEvent {
    AccountChanged(String),
    ChainChanged(u64),
    SessionDropped,
    SessionResumed { address: String, chain_id: u64 },
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn connect(&self, options: &ConnectOptions) -> Result<AdapterConnection, AdapterError>;

    async fn disconnect(&self) -> Result<(), AdapterError>;

    async fn switch_chain(&self, chain_id: u64) -> Result<(), AdapterError>;

    /// Try to bring a dropped session back. `Ok(None)` means nothing to
    /// restore yet; the adapter may still emit `SessionResumed` on its own.
    async fn restore_session(&self) -> Result<Option<AdapterConnection>, AdapterError> {
        Ok(None)
    }

    fn events(&self) -> broadcast::Receiver<AdapterEvent>;
}
