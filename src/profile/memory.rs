//! MemoryProfiles - in-process profile store for tests and the replay CLI.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::watch;

use crate::profile::{ProfileStore, UserProfile};

pub struct MemoryProfiles {
    profile: watch::Sender<Option<UserProfile>>,
    updates: Mutex<Vec<String>>,
    fail_next: Mutex<u32>,
}

impl MemoryProfiles {
    pub fn new(profile: Option<UserProfile>) -> Self {
        let (tx, _) = watch::channel(profile);
        Self { profile: tx, updates: Mutex::new(Vec::new()), fail_next: Mutex::new(0) }
    }

    /// Make the next `count` updates fail.
    pub fn fail_next(&self, count: u32) {
        *self.fail_next.lock().unwrap_or_else(|p| p.into_inner()) = count;
    }

    pub fn set_profile(&self, profile: Option<UserProfile>) { self.profile.send_replace(profile); }

    pub fn profile(&self) -> Option<UserProfile> { self.profile.borrow().clone() }

    /// Every address successfully written, in order.
    pub fn updates(&self) -> Vec<String> { self.updates.lock().unwrap_or_else(|p| p.into_inner()).clone() }
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
    fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> { self.profile.subscribe() }

    async fn update_wallet_address(&self, address: &str) -> anyhow::Result<()> {
        {
            let mut fail_next = self.fail_next.lock().unwrap_or_else(|p| p.into_inner());
            if *fail_next > 0 {
                *fail_next -= 1;
                anyhow::bail!("profile service unavailable");
            }
        }
        let stored = self.profile.send_if_modified(|profile| match profile {
            Some(profile) => {
                profile.wallet_address = Some(address.to_string());
                true
            }
            None => false,
        });
        if !stored {
            anyhow::bail!("no profile loaded");
        }
        self.updates.lock().unwrap_or_else(|p| p.into_inner()).push(address.to_string());
        Ok(())
    }
}
