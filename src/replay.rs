//! Scenario replay - drive a controller over the in-memory adapter from a JSON script
//!
//! ```json
//! {
//!   "targetChain": 88888,
//!   "profile": { "id": "fan-1", "wallet_address": null },
//!   "steps": [
//!     { "action": "connect" },
//!     { "action": "event", "event": { "chain_changed": 1 } },
//!     { "action": "switch" },
//!     { "action": "fail", "operation": "restore", "error": "transport" },
//!     { "action": "event", "event": "session_dropped" },
//!     { "action": "wait", "ms": 15000 },
//!     { "action": "disconnect" }
//!   ]
//! }
//! ```
//!
//! Events are applied directly instead of through the event loop, so every
//! report reflects the step that produced it.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::chains::SupportedChains;
use crate::profile::{LinkAction, MemoryProfiles, ProfileLinkWorker, UserProfile};
use crate::service::WalletConfig;
use crate::status::WalletStatus;
use crate::wallet::{
    AdapterConnection, AdapterError, AdapterEvent, ConnectOptions, MemoryAdapter, ProviderType, WalletController,
    WalletError, WalletState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Connect,
    Disconnect,
    Switch,
    Restore,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Switch => "switch",
            Operation::Restore => "restore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Rejected,
    Timeout,
    Unsupported,
    Transport,
    Other,
}

impl FailureKind {
    fn into_error(self, message: String) -> AdapterError {
        match self {
            FailureKind::Rejected => AdapterError::Rejected(message),
            FailureKind::Timeout => AdapterError::Timeout(message),
            FailureKind::Unsupported => AdapterError::Unsupported(message),
            FailureKind::Transport => AdapterError::Transport(message),
            FailureKind::Other => AdapterError::Other(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Connect {
        #[serde(default)]
        provider: Option<ProviderType>,
        #[serde(default, rename = "chainId")]
        chain_id: Option<u64>,
    },
    Disconnect,
    Switch,
    Event { event: AdapterEvent },
    /// Script the next call of `operation` to fail.
    Fail {
        operation: Operation,
        error: FailureKind,
        #[serde(default)]
        message: Option<String>,
    },
    Wait { ms: u64 },
    SetProfile {
        #[serde(default)]
        profile: Option<UserProfile>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Connect { .. } => "connect",
            Step::Disconnect => "disconnect",
            Step::Switch => "switch",
            Step::Event { .. } => "event",
            Step::Fail { .. } => "fail",
            Step::Wait { .. } => "wait",
            Step::SetProfile { .. } => "set_profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub target_chain: Option<u64>,
    #[serde(default)]
    pub supported_chains: Vec<u64>,
    #[serde(default)]
    pub reconnect_attempts: Option<u32>,
    #[serde(default)]
    pub reconnect_backoff_ms: Option<u64>,
    /// Connection the adapter hands out. Defaults to the demo wallet on mainnet.
    #[serde(default)]
    pub connection: Option<AdapterConnection>,
    /// Enables profile linking when present.
    #[serde(default)]
    pub profile: Option<UserProfile>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WalletError>,
    /// Address written to the profile during this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked: Option<String>,
    pub state: WalletState,
    pub status: WalletStatus,
}

impl StepReport {
    /// One-line human summary
    pub fn line(&self) -> String {
        let mut line = format!(
            "{:>3} {:<12} {:<13} {:<20} {}",
            self.index,
            self.action,
            self.state.connection_state.as_str(),
            self.status.label,
            self.status.short_address
        );
        if let Some(err) = &self.error {
            line.push_str(&format!("  [{}] {}", err.code, err.message));
        }
        if let Some(address) = &self.linked {
            line.push_str(&format!("  linked {}", address));
        }
        line
    }
}

impl Scenario {
    pub fn parse(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid scenario")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn config(&self) -> WalletConfig {
        let mut config = WalletConfig::default();
        if let Some(target) = self.target_chain {
            config.chains = SupportedChains::new(target);
        }
        config.chains = config.chains.clone().with_chains(self.supported_chains.iter().copied());
        if let Some(attempts) = self.reconnect_attempts {
            config.reconnect = config.reconnect.with_attempts(attempts);
        }
        if let Some(ms) = self.reconnect_backoff_ms {
            let max = config.reconnect.max_backoff;
            config.reconnect = config.reconnect.with_backoff(Duration::from_millis(ms), max);
        }
        config
    }

    /// Run every step in order. Step failures are recorded in the report.
    pub async fn run(&self) -> Vec<StepReport> {
        let adapter = Arc::new(match &self.connection {
            Some(connection) => MemoryAdapter::with_connection(connection.clone()),
            None => MemoryAdapter::new(),
        });
        let controller = Arc::new(WalletController::new(adapter.clone(), self.config()));
        let profiles = self.profile.clone().map(|profile| Arc::new(MemoryProfiles::new(Some(profile))));
        let mut worker = profiles
            .clone()
            .map(|profiles| ProfileLinkWorker::new(controller.subscribe(), profiles));

        let mut reports = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let error = match step {
                Step::Connect { provider, chain_id } => {
                    let options = ConnectOptions { preferred_provider: *provider, chain_id: *chain_id };
                    controller.connect(options).await.err()
                }
                Step::Disconnect => controller.disconnect().await.err(),
                Step::Switch => controller.switch_to_chiliz().await.err(),
                Step::Event { event } => {
                    controller.handle_event(event.clone());
                    tokio::task::yield_now().await;
                    None
                }
                Step::Fail { operation, error, message } => {
                    let message = message.clone().unwrap_or_else(|| format!("scripted {} failure", operation.as_str()));
                    let failure = error.into_error(message);
                    match operation {
                        Operation::Connect => adapter.push_connect(Err(failure)),
                        Operation::Disconnect => adapter.push_disconnect(Err(failure)),
                        Operation::Switch => adapter.push_switch(Err(failure)),
                        Operation::Restore => adapter.push_restore(Err(failure)),
                    }
                    None
                }
                Step::Wait { ms } => {
                    tokio::time::sleep(Duration::from_millis(*ms)).await;
                    None
                }
                Step::SetProfile { profile } => {
                    if let Some(profiles) = &profiles {
                        profiles.set_profile(profile.clone());
                    }
                    None
                }
            };

            let linked = match worker.as_mut() {
                Some(worker) => match worker.step().await {
                    LinkAction::Push(address) if worker.linker().last_pushed() == Some(address.as_str()) => Some(address),
                    _ => None,
                },
                None => None,
            };

            let state = controller.state();
            reports.push(StepReport {
                index: index + 1,
                action: step.name(),
                error,
                linked,
                status: WalletStatus::from(&state),
                state,
            });
        }
        reports
    }
}
