//! WalletController - sole owner of `WalletState`, mediates every adapter call.
//!
//! ```text
//! disconnected ──connect──▶ connecting ──ok──▶ connected ◀──account/chain──┐
//!      ▲                        │                 │  └───────────────────────┘
//!      │◀───────failure─────────┘                 │ session drop
//!      │                                          ▼
//!      │◀──────attempts exhausted (SESSION_LOST)─ reconnecting ──resume──▶ connected
//!      │
//!      └──────── disconnect (from any state, always wins)
//! ```

use chrono::Utc;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

use crate::core::address;
use crate::core::chains::{chain_name, SupportedChains};
use crate::service::WalletConfig;
use crate::wallet::adapter::{AdapterConnection, AdapterEvent, ProviderAdapter};
use crate::wallet::error::{AdapterError, Result, WalletError, WalletErrorCode};
use crate::wallet::store::SessionStore;
use crate::wallet::types::{ConnectOptions, ConnectionState, WalletSession, WalletState};

const ERROR_CHANNEL_CAPACITY: usize = 16;

pub struct WalletController {
    adapter: Arc<dyn ProviderAdapter>,
    store: SessionStore,
    config: WalletConfig,
    errors: broadcast::Sender<WalletError>,
    switching: Mutex<()>,
}

impl WalletController {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, config: WalletConfig) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            adapter,
            store: SessionStore::new(config.chains.clone()),
            config,
            errors,
            switching: Mutex::new(()),
        }
    }

    pub fn state(&self) -> WalletState { self.store.snapshot() }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> { self.store.subscribe() }

    /// Failures from event-driven transitions (session lost, expiry), which have no caller.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<WalletError> { self.errors.subscribe() }

    pub fn config(&self) -> &WalletConfig { &self.config }

    pub fn chains(&self) -> &SupportedChains { self.store.chains() }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Open a session. No-op while a session is connecting, connected or reconnecting.
    pub async fn connect(&self, options: ConnectOptions) -> Result<WalletState> {
        let started = self.store.transition(|state| {
            if state.connection_state.is_active() {
                return None;
            }
            state.clear();
            state.connection_state = ConnectionState::Connecting;
            Some(self.store.generation())
        });
        let Some(generation) = started else {
            debug!(state = self.state().connection_state.as_str(), "connect ignored, session already active");
            return Ok(self.state());
        };

        info!(provider = ?options.preferred_provider, "wallet connecting");
        let outcome = self
            .call(self.config.connect_timeout, "connect", self.adapter.connect(&options))
            .await
            .and_then(validate_connection);

        let connection = match outcome {
            Ok(connection) => connection,
            Err(err) => {
                self.store.transition_if_current(generation, |state| {
                    (state.connection_state == ConnectionState::Connecting).then(|| state.clear())
                });
                warn!(code = %err.code, "wallet connect failed: {}", err.message);
                return Err(err);
            }
        };

        let now = Utc::now().timestamp_millis();
        let expiry = self.config.session_ttl.map(|ttl| expiry_after(now, ttl));
        let applied = self.store.transition_if_current(generation, |state| {
            if state.connection_state != ConnectionState::Connecting {
                return None;
            }
            state.session = WalletSession {
                address: Some(connection.address.clone()),
                chain_id: Some(connection.chain_id),
                provider_type: Some(connection.provider_type),
                connected_at: Some(now),
                session_expiry_ms: expiry,
            };
            state.capabilities = Some(connection.capabilities.clone());
            state.connection_state = ConnectionState::Connected;
            Some(())
        });
        if applied.is_none() {
            info!("connect superseded by disconnect, discarding handshake result");
            return Ok(self.state());
        }

        info!(
            address = %address::shorten(&connection.address),
            chain_id = connection.chain_id,
            network = chain_name(connection.chain_id),
            provider = connection.provider_type.as_str(),
            "wallet connected"
        );

        if let Some(requested) = options.chain_id.filter(|id| *id != connection.chain_id) {
            if let Err(err) = self.request_switch(requested, generation).await {
                warn!(chain_id = requested, code = %err.code, "post-connect chain switch failed: {}", err.message);
            }
        }
        Ok(self.state())
    }

    /// Tear the session down. Local state is reset first and always; adapter
    /// failure is still reported.
    pub async fn disconnect(&self) -> Result<WalletState> {
        let prior = self.store.transition(|state| {
            self.store.invalidate();
            let prior = state.connection_state;
            if prior == ConnectionState::Disconnected && state.session == WalletSession::default() {
                return None;
            }
            state.clear();
            Some(prior)
        });
        if let Some(prior) = prior {
            info!(from = prior.as_str(), "wallet disconnected");
        }

        match self.call(self.config.request_timeout, "disconnect", self.adapter.disconnect()).await {
            Ok(()) => Ok(self.state()),
            Err(err) => {
                let code = match err.code {
                    WalletErrorCode::NetworkError | WalletErrorCode::Timeout => WalletErrorCode::NetworkError,
                    _ => WalletErrorCode::Unknown,
                };
                let err = WalletError::new(code, err.message);
                warn!(code = %err.code, "adapter disconnect failed: {}", err.message);
                Err(err)
            }
        }
    }

    /// Move the wallet to the target chain. Only acts while on the wrong network.
    pub async fn switch_to_chiliz(&self) -> Result<WalletState> {
        let state = self.state();
        if !state.is_wrong_network {
            debug!("switch_to_chiliz ignored, network already correct");
            return Ok(state);
        }
        let Ok(_guard) = self.switching.try_lock() else {
            debug!("switch_to_chiliz coalesced with in-flight switch");
            return Ok(state);
        };

        let target = self.store.chains().target();
        if let Some(caps) = &state.capabilities {
            if !caps.switch_chain {
                return Err(WalletError::unsupported_method("wallet does not support chain switching"));
            }
            if !caps.can_reach(target) {
                return Err(WalletError::unsupported_method(format!("wallet cannot operate on {}", chain_name(target)))
                    .with_details(json!({ "chainId": target })));
            }
        }

        self.request_switch(target, self.store.generation()).await?;
        Ok(self.state())
    }

    async fn request_switch(&self, chain_id: u64, generation: u64) -> Result<()> {
        if let Err(err) = self.call(self.config.request_timeout, "switch_chain", self.adapter.switch_chain(chain_id)).await {
            warn!(chain_id, code = %err.code, "chain switch failed: {}", err.message);
            return Err(err);
        }
        let applied = self.store.transition_if_current(generation, |state| {
            (state.connection_state == ConnectionState::Connected).then(|| state.session.chain_id = Some(chain_id))
        });
        if applied.is_some() {
            info!(chain_id, network = chain_name(chain_id), "wallet switched chain");
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn short_address(&self) -> String { address::display(self.state().address()) }

    pub fn is_chain_supported(&self, chain_id: u64) -> bool { self.store.chains().is_supported(chain_id) }

    // =========================================================================
    // Adapter events
    // =========================================================================

    /// Apply an adapter event; starts the reconnect supervisor on session drop.
    pub fn handle_event(self: &Arc<Self>, event: AdapterEvent) {
        if let Some(generation) = self.apply_event(event) {
            tokio::spawn(self.clone().supervise_reconnect(generation));
        }
    }

    /// Returns the new generation when a reconnect must start.
    fn apply_event(&self, event: AdapterEvent) -> Option<u64> {
        match event {
            AdapterEvent::AccountChanged(account) => {
                if !address::is_valid_address(&account) {
                    warn!(account = %account, "ignoring malformed account from adapter");
                    return None;
                }
                let changed = self.store.transition(|state| {
                    let live = matches!(state.connection_state, ConnectionState::Connected | ConnectionState::Reconnecting);
                    (live && state.address() != Some(account.as_str())).then(|| state.session.address = Some(account.clone()))
                });
                if changed.is_some() {
                    info!(address = %address::shorten(&account), "wallet account changed");
                }
                None
            }
            AdapterEvent::ChainChanged(chain_id) => {
                let changed = self.store.transition(|state| {
                    let live = matches!(state.connection_state, ConnectionState::Connected | ConnectionState::Reconnecting);
                    (live && state.chain_id() != Some(chain_id)).then(|| state.session.chain_id = Some(chain_id))
                });
                if changed.is_some() {
                    let state = self.state();
                    info!(chain_id, network = state.network_state.as_str(), "wallet chain changed");
                }
                None
            }
            AdapterEvent::SessionDropped => {
                let generation = self.store.transition(|state| {
                    (state.connection_state == ConnectionState::Connected).then(|| {
                        state.connection_state = ConnectionState::Reconnecting;
                        self.store.invalidate()
                    })
                });
                if generation.is_some() {
                    warn!("wallet session dropped, reconnecting");
                }
                generation
            }
            AdapterEvent::SessionResumed { address: account, chain_id } => {
                if !address::is_valid_address(&account) {
                    warn!(account = %account, "ignoring resume with malformed account");
                    return None;
                }
                let now = Utc::now().timestamp_millis();
                let resumed = self.store.transition(|state| match state.connection_state {
                    ConnectionState::Reconnecting | ConnectionState::Connected => {
                        state.session.address = Some(account.clone());
                        state.session.chain_id = Some(chain_id);
                        state.connection_state = ConnectionState::Connected;
                        Some(())
                    }
                    // Session restored by the adapter on its own, e.g. after a cold start.
                    ConnectionState::Disconnected => {
                        state.session = WalletSession {
                            address: Some(account.clone()),
                            chain_id: Some(chain_id),
                            provider_type: None,
                            connected_at: Some(now),
                            session_expiry_ms: self.config.session_ttl.map(|ttl| expiry_after(now, ttl)),
                        };
                        state.connection_state = ConnectionState::Connected;
                        Some(())
                    }
                    ConnectionState::Connecting => None,
                });
                if resumed.is_some() {
                    info!(address = %address::shorten(&account), chain_id, "wallet session resumed");
                }
                None
            }
        }
    }

    fn still_reconnecting(&self, generation: u64) -> bool {
        self.store.generation() == generation && self.state().connection_state == ConnectionState::Reconnecting
    }

    /// Bounded restore loop. Ends early when the session resumes or is torn down.
    async fn supervise_reconnect(self: Arc<Self>, generation: u64) {
        let policy = self.config.reconnect.clone();
        let restorable = self.state().capabilities.as_ref().map_or(true, |caps| caps.restore_session);

        for (attempt, delay) in (1u32..).zip(policy.delays()) {
            tokio::time::sleep(delay).await;
            if !self.still_reconnecting(generation) {
                return;
            }
            if !restorable {
                debug!(attempt, "waiting for adapter to resume session");
                continue;
            }
            match self.call(self.config.request_timeout, "restore_session", self.adapter.restore_session()).await {
                Ok(Some(connection)) => match validate_connection(connection) {
                    Ok(connection) => {
                        let restored = self.store.transition_if_current(generation, |state| {
                            (state.connection_state == ConnectionState::Reconnecting).then(|| {
                                state.session.address = Some(connection.address.clone());
                                state.session.chain_id = Some(connection.chain_id);
                                state.session.provider_type = Some(connection.provider_type);
                                state.capabilities = Some(connection.capabilities.clone());
                                state.connection_state = ConnectionState::Connected;
                            })
                        });
                        if restored.is_some() {
                            info!(attempt, chain_id = connection.chain_id, "wallet session restored");
                        }
                        return;
                    }
                    Err(err) => warn!(attempt, "restore returned bad session: {}", err.message),
                },
                Ok(None) => debug!(attempt, "nothing to restore yet"),
                Err(err) => warn!(attempt, code = %err.code, "restore attempt failed: {}", err.message),
            }
        }

        let lost = self.store.transition_if_current(generation, |state| {
            (state.connection_state == ConnectionState::Reconnecting).then(|| {
                self.store.invalidate();
                state.clear();
            })
        });
        if lost.is_some() {
            let err = WalletError::session_lost("wallet session could not be restored")
                .with_details(json!({ "attempts": policy.max_attempts }));
            warn!(attempts = policy.max_attempts, "wallet session lost");
            let _ = self.errors.send(err);
        }
    }

    /// Reset a connected session whose expiry has passed. Returns whether it expired.
    ///
    /// The adapter is told to disconnect on a separate task, so a slow wallet
    /// never holds up the caller.
    pub fn expire_if_due(&self, now_ms: i64) -> bool {
        let expired = self.store.transition(|state| {
            (state.connection_state == ConnectionState::Connected && state.is_expired(now_ms)).then(|| {
                self.store.invalidate();
                state.clear();
            })
        });
        if expired.is_none() {
            return false;
        }
        warn!("wallet session expired");
        let _ = self.errors.send(WalletError::session_lost("wallet session expired"));
        let adapter = self.adapter.clone();
        let limit = self.config.request_timeout;
        tokio::spawn(async move {
            if let Err(err) = bounded(limit, "disconnect", adapter.disconnect()).await {
                warn!(code = %err.code, "adapter disconnect after expiry failed: {}", err.message);
            }
        });
        true
    }

    /// Pump adapter events into the controller until shutdown.
    pub fn spawn_event_loop(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> tokio::task::JoinHandle<()> {
        let mut events = self.adapter.events();
        let expiry_enabled = self.config.session_ttl.is_some();
        let check_every = self.config.expiry_check_interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_every);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        debug!("wallet event loop stopping");
                        break;
                    }
                    received = events.recv() => match received {
                        Ok(event) => self.handle_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "adapter events lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("adapter event stream closed");
                            break;
                        }
                    },
                    _ = ticker.tick(), if expiry_enabled => {
                        self.expire_if_due(Utc::now().timestamp_millis());
                    }
                }
            }
        })
    }

    async fn call<T>(
        &self,
        limit: Duration,
        operation: &str,
        fut: impl Future<Output = std::result::Result<T, AdapterError>>,
    ) -> Result<T> {
        bounded(limit, operation, fut).await
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: &str,
    fut: impl Future<Output = std::result::Result<T, AdapterError>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(WalletError::from),
        Err(_) => Err(WalletError::timeout(format!("{} did not complete within {}ms", operation, limit.as_millis()))),
    }
}

/// Expiry timestamp `ttl` after `now_ms`, saturating at `i64::MAX`.
fn expiry_after(now_ms: i64, ttl: Duration) -> i64 {
    now_ms.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

fn validate_connection(connection: AdapterConnection) -> Result<AdapterConnection> {
    if address::is_valid_address(&connection.address) {
        Ok(connection)
    } else {
        Err(WalletError::unknown("adapter returned a malformed address")
            .with_details(json!({ "address": connection.address })))
    }
}
