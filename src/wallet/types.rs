//! Session data model: `WalletSession`, `WalletState`, connect options.

use serde::{Deserialize, Serialize};

use crate::core::chains::SupportedChains;
use crate::wallet::adapter::ProviderCapabilities;

/// Wallet-connect SDK that produced the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Reown,
    WalletConnect,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Reown => "reown",
            ProviderType::WalletConnect => "walletconnect",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reown" | "appkit" => Some(ProviderType::Reown),
            "walletconnect" | "wc" => Some(ProviderType::WalletConnect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    /// States in which a handshake is in flight or a session exists.
    pub fn is_active(&self) -> bool { !matches!(self, ConnectionState::Disconnected) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    #[default]
    Correct,
    WrongNetwork,
    UnsupportedNetwork,
}

impl NetworkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkState::Correct => "correct",
            NetworkState::WrongNetwork => "wrong_network",
            NetworkState::UnsupportedNetwork => "unsupported_network",
        }
    }

    /// Classify `chain_id` against the allow-list. A wallet whose advertised
    /// chains exclude the target cannot be switched there.
    pub fn classify(chain_id: Option<u64>, chains: &SupportedChains, capabilities: Option<&ProviderCapabilities>) -> Self {
        match chain_id {
            None => NetworkState::Correct,
            Some(id) if chains.is_supported(id) => NetworkState::Correct,
            Some(_) => match capabilities {
                Some(caps) if !caps.can_reach(chains.target()) => NetworkState::UnsupportedNetwork,
                _ => NetworkState::WrongNetwork,
            },
        }
    }
}

/// Raw session fields. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub address: Option<String>,
    pub chain_id: Option<u64>,
    pub provider_type: Option<ProviderType>,
    /// Epoch milliseconds
    pub connected_at: Option<i64>,
    #[serde(default)]
    pub session_expiry_ms: Option<i64>,
}

/// Canonical wallet state. Derived flags are recomputed by the session store
/// after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    #[serde(flatten)]
    pub session: WalletSession,
    pub connection_state: ConnectionState,
    pub network_state: NetworkState,
    pub is_connected: bool,
    pub is_connecting: bool,
    pub is_wrong_network: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<ProviderCapabilities>,
}

impl WalletState {
    pub fn address(&self) -> Option<&str> { self.session.address.as_deref() }

    pub fn chain_id(&self) -> Option<u64> { self.session.chain_id }

    /// Recompute network classification and derived flags.
    pub(crate) fn refresh(&mut self, chains: &SupportedChains) {
        self.network_state = NetworkState::classify(self.session.chain_id, chains, self.capabilities.as_ref());
        self.is_connected = self.connection_state == ConnectionState::Connected;
        self.is_connecting = self.connection_state == ConnectionState::Connecting;
        self.is_wrong_network = self.is_connected && self.network_state != NetworkState::Correct;
    }

    /// Drop every session field and return to `disconnected`.
    pub(crate) fn clear(&mut self) {
        self.session = WalletSession::default();
        self.capabilities = None;
        self.connection_state = ConnectionState::Disconnected;
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.session.session_expiry_ms.is_some_and(|expiry| now_ms >= expiry)
    }
}

/// Options for `connect`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    #[serde(default)]
    pub preferred_provider: Option<ProviderType>,
    /// Chain to request right after the handshake
    #[serde(default)]
    pub chain_id: Option<u64>,
}

impl ConnectOptions {
    pub fn new() -> Self { Self::default() }
    pub fn with_provider(mut self, provider: ProviderType) -> Self { self.preferred_provider = Some(provider); self }
    pub fn with_chain(mut self, chain_id: u64) -> Self { self.chain_id = Some(chain_id); self }
}
