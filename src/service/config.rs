//! Wallet configuration - constructed by the host app or read from the environment

use std::time::Duration;
use thiserror::Error;

use crate::core::chains::SupportedChains;
use crate::wallet::ReconnectPolicy;

pub const ENV_TARGET_CHAIN: &str = "CHILIZ_TARGET_CHAIN";
pub const ENV_SUPPORTED_CHAINS: &str = "CHILIZ_SUPPORTED_CHAINS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "CHILIZ_CONNECT_TIMEOUT_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CHILIZ_REQUEST_TIMEOUT_MS";
pub const ENV_RECONNECT_ATTEMPTS: &str = "CHILIZ_RECONNECT_ATTEMPTS";
pub const ENV_RECONNECT_BACKOFF_MS: &str = "CHILIZ_RECONNECT_BACKOFF_MS";
pub const ENV_SESSION_TTL_SECS: &str = "CHILIZ_SESSION_TTL_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: expected {expected}, got {value:?}")]
    Invalid { var: &'static str, expected: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub chains: SupportedChains,
    /// Limit on the wallet handshake, which waits for the user to approve
    pub connect_timeout: Duration,
    /// Limit on disconnect, switch_chain and restore_session
    pub request_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    /// Sessions older than this are dropped. `None` keeps them until disconnect.
    pub session_ttl: Option<Duration>,
    pub expiry_check_interval: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chains: SupportedChains::mainnet(),
            connect_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
            reconnect: ReconnectPolicy::default(),
            session_ttl: None,
            expiry_check_interval: Duration::from_secs(30),
        }
    }
}

impl WalletConfig {
    pub fn new() -> Self { Self::default() }

    pub fn mainnet() -> Self { Self::default() }

    pub fn spicy() -> Self { Self { chains: SupportedChains::spicy(), ..Self::default() } }

    pub fn with_chains(mut self, chains: SupportedChains) -> Self { self.chains = chains; self }
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self { self.connect_timeout = timeout; self }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self { self.request_timeout = timeout; self }
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self { self.reconnect = policy; self }
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self { self.session_ttl = Some(ttl); self }

    pub fn with_expiry_check_interval(mut self, interval: Duration) -> Self {
        self.expiry_check_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Defaults overridden by any `CHILIZ_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(target) = parse::<u64>(&lookup, ENV_TARGET_CHAIN, "chain id")? {
            config.chains = SupportedChains::new(target);
        }
        if let Some(raw) = lookup(ENV_SUPPORTED_CHAINS) {
            let extra = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<u64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid(ENV_SUPPORTED_CHAINS, "comma-separated chain ids", &raw))?;
            config.chains = config.chains.with_chains(extra);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_CONNECT_TIMEOUT_MS, "milliseconds")? {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_REQUEST_TIMEOUT_MS, "milliseconds")? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse::<u32>(&lookup, ENV_RECONNECT_ATTEMPTS, "attempt count")? {
            config.reconnect = config.reconnect.with_attempts(attempts);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_RECONNECT_BACKOFF_MS, "milliseconds")? {
            let max = config.reconnect.max_backoff;
            config.reconnect = config.reconnect.with_backoff(Duration::from_millis(ms), max);
        }
        if let Some(secs) = parse::<u64>(&lookup, ENV_SESSION_TTL_SECS, "seconds")? {
            config.session_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| invalid(var, expected, &raw)),
    }
}

fn invalid(var: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid { var, expected, value: value.to_string() }
}
