//! MemoryAdapter - scripted in-process provider adapter
//!
//! Queue outcomes per operation, emit events by hand, and inspect call counts.
//! Operations with an empty queue fall back to the default connection / `Ok`.
//! Connect and disconnect gates hold calls in flight until released.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

use crate::core::chains::CHILIZ_MAINNET;
use crate::wallet::adapter::{AdapterConnection, AdapterEvent, ProviderAdapter};
use crate::wallet::error::AdapterError;
use crate::wallet::types::{ConnectOptions, ProviderType};

/// Address used by [`MemoryAdapter::new`] for its default connection.
pub const DEMO_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

const EVENT_CAPACITY: usize = 64;

type Outcome<T> = Result<T, AdapterError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub connect: usize,
    pub disconnect: usize,
    pub switch_chain: usize,
    pub restore_session: usize,
}

#[derive(Default)]
struct Script {
    connect: VecDeque<Outcome<AdapterConnection>>,
    disconnect: VecDeque<Outcome<()>>,
    switch_chain: VecDeque<Outcome<()>>,
    restore: VecDeque<Outcome<Option<AdapterConnection>>>,
    calls: CallCounts,
    switched_to: Vec<u64>,
    last_options: Option<ConnectOptions>,
}

pub struct MemoryAdapter {
    default_connection: AdapterConnection,
    script: Mutex<Script>,
    events: broadcast::Sender<AdapterEvent>,
    connect_gate: Option<Arc<Notify>>,
    disconnect_gate: Option<Arc<Notify>>,
}

impl Default for MemoryAdapter {
    fn default() -> Self { Self::new() }
}

impl MemoryAdapter {
    /// Connects to [`DEMO_ADDRESS`] on Chiliz mainnet via WalletConnect.
    pub fn new() -> Self {
        Self::with_connection(AdapterConnection::new(DEMO_ADDRESS, CHILIZ_MAINNET, ProviderType::WalletConnect))
    }

    pub fn with_connection(connection: AdapterConnection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { default_connection: connection, script: Mutex::new(Script::default()), events, connect_gate: None, disconnect_gate: None }
    }

    /// Hold every `connect` until the returned handle is notified.
    pub fn gate_connect(&mut self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.connect_gate = Some(gate.clone());
        gate
    }

    /// Hold every `disconnect` until the returned handle is notified.
    pub fn gate_disconnect(&mut self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.disconnect_gate = Some(gate.clone());
        gate
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_connect(&self, outcome: Outcome<AdapterConnection>) { self.script().connect.push_back(outcome); }
    pub fn push_disconnect(&self, outcome: Outcome<()>) { self.script().disconnect.push_back(outcome); }
    pub fn push_switch(&self, outcome: Outcome<()>) { self.script().switch_chain.push_back(outcome); }
    pub fn push_restore(&self, outcome: Outcome<Option<AdapterConnection>>) { self.script().restore.push_back(outcome); }

    /// Broadcast an event to subscribers. Returns the number of receivers.
    pub fn emit(&self, event: AdapterEvent) -> usize { self.events.send(event).unwrap_or(0) }

    pub fn calls(&self) -> CallCounts { self.script().calls }

    pub fn switched_to(&self) -> Vec<u64> { self.script().switched_to.clone() }

    pub fn last_connect_options(&self) -> Option<ConnectOptions> { self.script().last_options.clone() }
}

#[async_trait]
impl ProviderAdapter for MemoryAdapter {
    async fn connect(&self, options: &ConnectOptions) -> Result<AdapterConnection, AdapterError> {
        let outcome = {
            let mut script = self.script();
            script.calls.connect += 1;
            script.last_options = Some(options.clone());
            script.connect.pop_front()
        };
        if let Some(gate) = &self.connect_gate {
            gate.notified().await;
        }
        outcome.unwrap_or_else(|| {
            let mut connection = self.default_connection.clone();
            if let Some(provider) = options.preferred_provider {
                connection.provider_type = provider;
            }
            Ok(connection)
        })
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        let outcome = {
            let mut script = self.script();
            script.calls.disconnect += 1;
            script.disconnect.pop_front()
        };
        if let Some(gate) = &self.disconnect_gate {
            gate.notified().await;
        }
        outcome.unwrap_or(Ok(()))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), AdapterError> {
        let mut script = self.script();
        script.calls.switch_chain += 1;
        let outcome = script.switch_chain.pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            script.switched_to.push(chain_id);
        }
        outcome
    }

    async fn restore_session(&self) -> Result<Option<AdapterConnection>, AdapterError> {
        let mut script = self.script();
        script.calls.restore_session += 1;
        script.restore.pop_front().unwrap_or(Ok(None))
    }

    fn events(&self) -> broadcast::Receiver<AdapterEvent> { self.events.subscribe() }
}
