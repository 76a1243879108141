use serde::Serialize;

use crate::core::address;
use crate::core::chains::chain_name;
use crate::wallet::{ConnectionState, NetworkState, WalletState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Success,
    Warning,
    Error,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub is_ready: bool,
    pub can_transact: bool,
    pub label: String,
    pub color: StatusColor,
    pub short_address: String,
    pub network_name: Option<&'static str>,
}

impl WalletStatus {
    pub fn label(state: &WalletState) -> &'static str {
        match (state.connection_state, state.network_state) {
            (ConnectionState::Disconnected, _) => "Not connected",
            (ConnectionState::Connecting, _) => "Connecting...",
            (ConnectionState::Reconnecting, _) => "Reconnecting...",
            (ConnectionState::Connected, NetworkState::Correct) => "Connected",
            (ConnectionState::Connected, NetworkState::WrongNetwork) => "Wrong network",
            (ConnectionState::Connected, NetworkState::UnsupportedNetwork) => "Unsupported network",
        }
    }

    pub fn color(state: &WalletState) -> StatusColor {
        match (state.connection_state, state.network_state) {
            (ConnectionState::Disconnected, _) => StatusColor::Muted,
            (ConnectionState::Connecting | ConnectionState::Reconnecting, _) => StatusColor::Warning,
            (ConnectionState::Connected, NetworkState::Correct) => StatusColor::Success,
            (ConnectionState::Connected, NetworkState::WrongNetwork) => StatusColor::Warning,
            (ConnectionState::Connected, NetworkState::UnsupportedNetwork) => StatusColor::Error,
        }
    }

    pub fn is_ready(state: &WalletState) -> bool { state.is_connected && !state.is_wrong_network }

    pub fn can_transact(state: &WalletState) -> bool { Self::is_ready(state) && state.address().is_some() }
}

impl From<&WalletState> for WalletStatus {
    fn from(state: &WalletState) -> Self {
        Self {
            is_ready: Self::is_ready(state),
            can_transact: Self::can_transact(state),
            label: Self::label(state).to_string(),
            color: Self::color(state),
            short_address: address::display(state.address()),
            network_name: state.chain_id().map(chain_name),
        }
    }
}
