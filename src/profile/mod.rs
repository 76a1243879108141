//! Profile linking - keep the user profile's wallet address in sync
//!
//! ```text
//! SessionStore ──watch──┐
//!                       ├──▶ ProfileLinkWorker ──▶ ProfileLinker::evaluate
//! ProfileStore ──watch──┘            │
//!                                    └──▶ ProfileStore::update_wallet_address
//! ```
//!
//! The linker remembers the last address it pushed, so a profile update that
//! re-emits the same address does not trigger another write.

mod linker;
mod memory;
mod worker;

pub use linker::{LinkAction, LinkInputs, ProfileLinker};
pub use memory::MemoryProfiles;
pub use worker::ProfileLinkWorker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// User profile fields the linker reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub wallet_address: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self { Self { id: id.into(), wallet_address: None } }
    pub fn with_wallet(mut self, address: impl Into<String>) -> Self { self.wallet_address = Some(address.into()); self }
}

/// User-profile collaborator
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Current profile and its changes. `None` until a profile is loaded.
    fn subscribe(&self) -> watch::Receiver<Option<UserProfile>>;

    async fn update_wallet_address(&self, address: &str) -> anyhow::Result<()>;
}
