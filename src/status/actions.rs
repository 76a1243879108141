use std::sync::Arc;
use tracing::error;

use crate::wallet::{ConnectOptions, Result, WalletController, WalletState};

/// Controller actions with failure logging. Errors are returned unchanged.
#[derive(Clone)]
pub struct WalletActions {
    controller: Arc<WalletController>,
}

impl WalletActions {
    pub fn new(controller: Arc<WalletController>) -> Self { Self { controller } }

    pub async fn connect(&self, options: ConnectOptions) -> Result<WalletState> {
        self.controller.connect(options).await.inspect_err(|err| {
            error!(code = %err.code, "connect failed: {}", err.message);
        })
    }

    pub async fn disconnect(&self) -> Result<WalletState> {
        self.controller.disconnect().await.inspect_err(|err| {
            error!(code = %err.code, "disconnect failed: {}", err.message);
        })
    }

    pub async fn switch_to_chiliz(&self) -> Result<WalletState> {
        self.controller.switch_to_chiliz().await.inspect_err(|err| {
            error!(code = %err.code, "network switch failed: {}", err.message);
        })
    }
}
