//! Chain constants and the supported-chain allow-list
//!
//! The app runs against exactly one target chain. Other chains in the
//! allow-list are accepted as-is; anything else is a network mismatch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Chiliz Chain mainnet
pub const CHILIZ_MAINNET: u64 = 88888;
/// Chiliz Spicy testnet
pub const CHILIZ_SPICY: u64 = 88882;

/// Human-readable name for well-known chain ids
pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHILIZ_MAINNET => "Chiliz Chain",
        CHILIZ_SPICY => "Chiliz Spicy Testnet",
        1 => "Ethereum",
        56 => "BNB Smart Chain",
        137 => "Polygon",
        _ => "Unknown network",
    }
}

/// Allow-list of chain ids with one designated target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedChains {
    target: u64,
    chains: BTreeSet<u64>,
}

impl Default for SupportedChains {
    fn default() -> Self { Self::mainnet() }
}

impl SupportedChains {
    /// Target chain only. The target is always part of the allow-list.
    pub fn new(target: u64) -> Self {
        Self { target, chains: BTreeSet::from([target]) }
    }

    pub fn mainnet() -> Self { Self::new(CHILIZ_MAINNET) }

    pub fn spicy() -> Self { Self::new(CHILIZ_SPICY) }

    pub fn with_chain(mut self, chain_id: u64) -> Self {
        self.chains.insert(chain_id);
        self
    }

    pub fn with_chains(mut self, chain_ids: impl IntoIterator<Item = u64>) -> Self {
        self.chains.extend(chain_ids);
        self
    }

    pub fn target(&self) -> u64 { self.target }

    pub fn is_supported(&self, chain_id: u64) -> bool { self.chains.contains(&chain_id) }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ { self.chains.iter().copied() }

    pub fn len(&self) -> usize { self.chains.len() }

    pub fn is_empty(&self) -> bool { self.chains.is_empty() }
}
