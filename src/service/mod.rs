//! WalletService - app-lifetime wiring of controller, event loop and profile linking
//!
//! ```text
//! WalletService::init(config, adapter, profiles)
//!   ├── WalletController            (state owner)
//!   ├── event loop task             (adapter events, expiry ticks)
//!   └── ProfileLinkWorker task      (only when a ProfileStore is given)
//!
//! WalletService::teardown()  → Shutdown::trigger → join both tasks
//! ```

mod config;

pub use config::{
    ConfigError, WalletConfig, ENV_CONNECT_TIMEOUT_MS, ENV_RECONNECT_ATTEMPTS, ENV_RECONNECT_BACKOFF_MS,
    ENV_REQUEST_TIMEOUT_MS, ENV_SESSION_TTL_SECS, ENV_SUPPORTED_CHAINS, ENV_TARGET_CHAIN,
};

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::profile::{ProfileLinkWorker, ProfileStore};
use crate::runtime::Shutdown;
use crate::status::{WalletActions, WalletStatus};
use crate::wallet::{ProviderAdapter, WalletController, WalletError, WalletState};

pub struct WalletService {
    controller: Arc<WalletController>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl WalletService {
    /// Start the background tasks. Must be called inside a tokio runtime.
    pub fn init(config: WalletConfig, adapter: Arc<dyn ProviderAdapter>, profiles: Option<Arc<dyn ProfileStore>>) -> Self {
        let target = config.chains.target();
        let controller = Arc::new(WalletController::new(adapter, config));
        let shutdown = Shutdown::new();

        let mut tasks = vec![controller.clone().spawn_event_loop(shutdown.subscribe())];
        if let Some(profiles) = profiles {
            let worker = ProfileLinkWorker::new(controller.subscribe(), profiles)
                .with_update_timeout(controller.config().request_timeout);
            tasks.push(worker.spawn(shutdown.subscribe()));
        }

        info!(target_chain = target, tasks = tasks.len(), "wallet service started");
        Self { controller, shutdown, tasks }
    }

    pub fn controller(&self) -> &Arc<WalletController> { &self.controller }

    pub fn state(&self) -> WalletState { self.controller.state() }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> { self.controller.subscribe() }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<WalletError> { self.controller.subscribe_errors() }

    pub fn status(&self) -> WalletStatus { WalletStatus::from(&self.state()) }

    pub fn actions(&self) -> WalletActions { WalletActions::new(self.controller.clone()) }

    /// Stop background tasks. The wallet session itself is left untouched.
    pub async fn teardown(self) {
        self.shutdown.trigger();
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "wallet service task ended abnormally");
            }
        }
        info!("wallet service stopped");
    }
}
