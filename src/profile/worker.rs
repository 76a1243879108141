//! ProfileLinkWorker - drives the linker from wallet and profile changes.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::core::address;
use crate::profile::{LinkAction, LinkInputs, ProfileLinker, ProfileStore, UserProfile};
use crate::wallet::WalletState;

pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ProfileLinkWorker {
    wallet: watch::Receiver<WalletState>,
    profile: watch::Receiver<Option<UserProfile>>,
    profiles: Arc<dyn ProfileStore>,
    linker: ProfileLinker,
    update_timeout: Duration,
}

impl ProfileLinkWorker {
    pub fn new(wallet: watch::Receiver<WalletState>, profiles: Arc<dyn ProfileStore>) -> Self {
        let profile = profiles.subscribe();
        Self { wallet, profile, profiles, linker: ProfileLinker::new(), update_timeout: DEFAULT_UPDATE_TIMEOUT }
    }

    /// Bound each profile write. A write that outlives the limit is rolled back.
    pub fn with_update_timeout(mut self, limit: Duration) -> Self {
        self.update_timeout = limit;
        self
    }

    pub fn linker(&self) -> &ProfileLinker { &self.linker }

    /// Evaluate the latest inputs once. Update failures are logged and rolled
    /// back, never returned.
    pub async fn step(&mut self) -> LinkAction {
        let state = self.wallet.borrow_and_update().clone();
        let profile = self.profile.borrow_and_update().clone();
        let action = self.linker.evaluate(LinkInputs::new(&state, profile.as_ref()));

        match &action {
            LinkAction::Push(address) => {
                info!(address = %address::shorten(address), "linking wallet to profile");
                match tokio::time::timeout(self.update_timeout, self.profiles.update_wallet_address(address)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        warn!(error = %err, "profile wallet update failed, retrying on next change");
                        self.linker.rollback(address);
                    }
                    Err(_) => {
                        warn!(timeout_ms = self.update_timeout.as_millis() as u64, "profile wallet update timed out, retrying on next change");
                        self.linker.rollback(address);
                    }
                }
            }
            LinkAction::Reset => debug!("wallet disconnected, profile link marker cleared"),
            LinkAction::None => {}
        }
        action
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = self.step() => {}
            }
            tokio::select! {
                _ = shutdown.recv() => break,
                changed = self.wallet.changed() => if changed.is_err() { break },
                changed = self.profile.changed() => if changed.is_err() { break },
            }
        }
        debug!("profile link worker stopped");
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
