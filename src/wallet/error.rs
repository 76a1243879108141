//! Wallet error taxonomy
//!
//! Every failure that leaves the controller is a [`WalletError`] carrying one of
//! six codes. Provider adapters report [`AdapterError`], which the controller
//! classifies into a code before surfacing it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Stable error codes, serialized as `USER_REJECTED`, `TIMEOUT`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletErrorCode {
    UserRejected,
    Timeout,
    UnsupportedMethod,
    SessionLost,
    NetworkError,
    Unknown,
}

impl WalletErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletErrorCode::UserRejected => "USER_REJECTED",
            WalletErrorCode::Timeout => "TIMEOUT",
            WalletErrorCode::UnsupportedMethod => "UNSUPPORTED_METHOD",
            WalletErrorCode::SessionLost => "SESSION_LOST",
            WalletErrorCode::NetworkError => "NETWORK_ERROR",
            WalletErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Whether retrying the same action without changing provider can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, WalletErrorCode::UnsupportedMethod)
    }

    /// Short user-facing message for this code.
    pub fn user_message(&self) -> &'static str {
        match self {
            WalletErrorCode::UserRejected => "Request was rejected in your wallet.",
            WalletErrorCode::Timeout => "Your wallet did not respond in time. Please try again.",
            WalletErrorCode::UnsupportedMethod => "Your wallet does not support this action.",
            WalletErrorCode::SessionLost => "Wallet session was lost. Please reconnect.",
            WalletErrorCode::NetworkError => "Network error while talking to your wallet.",
            WalletErrorCode::Unknown => "Something went wrong with your wallet.",
        }
    }
}

impl fmt::Display for WalletErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Error surfaced by wallet actions and published for event-driven failures.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct WalletError {
    pub code: WalletErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl WalletError {
    pub fn new(code: WalletErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: Value) -> Self { self.details = Some(details); self }

    pub fn user_rejected(message: impl Into<String>) -> Self { Self::new(WalletErrorCode::UserRejected, message) }
    pub fn timeout(message: impl Into<String>) -> Self { Self::new(WalletErrorCode::Timeout, message) }
    pub fn unsupported_method(message: impl Into<String>) -> Self { Self::new(WalletErrorCode::UnsupportedMethod, message) }
    pub fn session_lost(message: impl Into<String>) -> Self { Self::new(WalletErrorCode::SessionLost, message) }
    pub fn network(message: impl Into<String>) -> Self { Self::new(WalletErrorCode::NetworkError, message) }
    pub fn unknown(message: impl Into<String>) -> Self { Self::new(WalletErrorCode::Unknown, message) }

    pub fn is_retryable(&self) -> bool { self.code.is_retryable() }

    pub fn user_message(&self) -> &'static str { self.code.user_message() }
}

pub type Result<T> = std::result::Result<T, WalletError>;

/// Failure reported by a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// User declined the prompt in the wallet
    #[error("rejected by user: {0}")]
    Rejected(String),
    /// Adapter gave up waiting on the wallet
    #[error("timed out: {0}")]
    Timeout(String),
    /// Wallet lacks the requested capability
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Relay/RPC transport failure
    #[error("transport: {0}")]
    Transport(String),
    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    pub fn code(&self) -> WalletErrorCode {
        match self {
            AdapterError::Rejected(_) => WalletErrorCode::UserRejected,
            AdapterError::Timeout(_) => WalletErrorCode::Timeout,
            AdapterError::Unsupported(_) => WalletErrorCode::UnsupportedMethod,
            AdapterError::Transport(_) => WalletErrorCode::NetworkError,
            AdapterError::Other(_) => WalletErrorCode::Unknown,
        }
    }
}

impl From<AdapterError> for WalletError {
    fn from(err: AdapterError) -> Self {
        WalletError::new(err.code(), err.to_string())
    }
}
