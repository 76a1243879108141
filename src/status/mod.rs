//! Status projections - read-only views over `WalletState` for presentation
//!
//! | Projection | Rule |
//! |------------|------|
//! | `is_ready` | connected and on a correct network |
//! | `can_transact` | ready and an address is present |
//! | `label` | short human-readable status |
//! | `color` | tag the UI maps to a theme color |
//!
//! `WalletActions` wraps controller actions with error logging; it owns no state.

mod actions;
mod projection;

pub use actions::WalletActions;
pub use projection::{StatusColor, WalletStatus};
