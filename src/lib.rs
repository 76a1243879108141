//! chiliz-session: wallet connection and session state for a Chiliz Chain fan-token app.
//!
//! # Architecture
//!
//! ```text
//! WalletService (app lifetime)
//!   │
//!   ├── WalletController ── ProviderAdapter (Reown / WalletConnect SDK)
//!   │     │                   └── events: account, chain, drop, resume
//!   │     └── SessionStore (watch<WalletState>)
//!   │           │
//!   │           ├──▶ WalletStatus / WalletActions (UI projections)
//!   │           └──▶ ProfileLinkWorker ──▶ ProfileStore
//!   │
//!   └── Shutdown (teardown)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | connect | `controller.connect(options)` | Open a wallet session |
//! | disconnect | `controller.disconnect()` | Tear down, always resets local state |
//! | switch | `controller.switch_to_chiliz()` | Move a wrong-network wallet to the target chain |
//! | short address | `controller.short_address()` | `0x1234...5678` or "Not connected" |
//! | chain check | `controller.is_chain_supported(id)` | Allow-list membership |
//!
//! # Features
//!
//! - `native` - CLI binary, tracing subscriber, signal handling
//!
//! # Usage
//!
//! ```ignore
//! use chiliz_session::{ConnectOptions, WalletConfig, WalletService};
//!
//! let service = WalletService::init(WalletConfig::from_env()?, adapter, Some(profiles));
//! service.controller().connect(ConnectOptions::new()).await?;
//! println!("{}", service.status().label);
//! service.teardown().await;
//! ```

pub mod core;
pub mod profile;
pub mod replay;
pub mod runtime;
pub mod service;
pub mod status;
pub mod wallet;

#[cfg(feature = "native")]
pub mod logging;

pub use crate::core::chains::{SupportedChains, CHILIZ_MAINNET, CHILIZ_SPICY};
pub use profile::{ProfileStore, UserProfile};
pub use service::{ConfigError, WalletConfig, WalletService};
pub use status::{StatusColor, WalletActions, WalletStatus};
pub use wallet::{
    AdapterConnection, AdapterEvent, ConnectOptions, ConnectionState, NetworkState, ProviderAdapter,
    ProviderCapabilities, ProviderType, WalletController, WalletError, WalletErrorCode, WalletState,
};
