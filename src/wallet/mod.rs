//! Wallet module - session lifecycle over a wallet-connect provider
//!
//! # Architecture
//!
//! ```text
//! ProviderAdapter (Reown / WalletConnect SDK, or MemoryAdapter)
//!     │  connect / disconnect / switch_chain / restore_session
//!     │  events: accountChanged, chainChanged, sessionDropped, sessionResumed
//!     ▼
//! WalletController ── reconnect supervisor (ReconnectPolicy)
//!     │
//!     ▼
//! SessionStore (watch channel, generation counter)
//!     │
//!     ├──▶ status projections (WalletStatus, WalletActions)
//!     └──▶ ProfileLinkWorker
//! ```
//!
//! # State
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `connectionState` | disconnected / connecting / connected / reconnecting |
//! | `networkState` | correct / wrong_network / unsupported_network |
//! | `isConnected` | `connectionState == connected` |
//! | `isWrongNetwork` | connected and `networkState != correct` |

mod adapter;
mod controller;
mod error;
mod memory;
mod reconnect;
mod store;
mod types;

pub use adapter::{AdapterConnection, AdapterEvent, ProviderAdapter, ProviderCapabilities};
pub use controller::WalletController;
pub use error::{AdapterError, Result, WalletError, WalletErrorCode};
pub use memory::{CallCounts, MemoryAdapter, DEMO_ADDRESS};
pub use reconnect::ReconnectPolicy;
pub use store::SessionStore;
pub use types::{ConnectOptions, ConnectionState, NetworkState, ProviderType, WalletSession, WalletState};
