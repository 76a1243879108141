//! ProfileLinker - loop-guarded push decision as a pure state machine.

use crate::core::address::same_address;
use crate::profile::UserProfile;
use crate::wallet::WalletState;

#[derive(Debug, Clone, Copy)]
pub struct LinkInputs<'a> {
    pub address: Option<&'a str>,
    pub is_connected: bool,
    pub profile: Option<&'a UserProfile>,
}

impl<'a> LinkInputs<'a> {
    pub fn new(state: &'a WalletState, profile: Option<&'a UserProfile>) -> Self {
        Self { address: state.address(), is_connected: state.is_connected, profile }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    None,
    /// Write this address to the profile
    Push(String),
    /// Marker cleared after disconnect
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileLinker {
    last_pushed: Option<String>,
}

impl ProfileLinker {
    pub fn new() -> Self { Self::default() }

    pub fn last_pushed(&self) -> Option<&str> { self.last_pushed.as_deref() }

    pub fn evaluate(&mut self, inputs: LinkInputs<'_>) -> LinkAction {
        if !inputs.is_connected {
            return match self.last_pushed.take() {
                Some(_) => LinkAction::Reset,
                None => LinkAction::None,
            };
        }
        let (Some(address), Some(profile)) = (inputs.address, inputs.profile) else {
            return LinkAction::None;
        };
        if profile.wallet_address.as_deref().is_some_and(|stored| same_address(stored, address)) {
            return LinkAction::None;
        }
        if self.last_pushed.as_deref().is_some_and(|pushed| same_address(pushed, address)) {
            return LinkAction::None;
        }
        self.last_pushed = Some(address.to_string());
        LinkAction::Push(address.to_string())
    }

    /// Forget a failed push so the next relevant change retries it.
    pub fn rollback(&mut self, address: &str) {
        if self.last_pushed.as_deref().is_some_and(|pushed| same_address(pushed, address)) {
            self.last_pushed = None;
        }
    }
}
