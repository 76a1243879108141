//! Session store: the one canonical `WalletState`
//!
//! Backed by a `tokio::sync::watch` channel so readers get cheap snapshots and
//! change notifications. Transitions run as closures under the channel's write
//! lock, which makes check-and-set atomic without a separate mutex.
//!
//! The generation counter identifies a session lifetime. `disconnect` and
//! terminal resets bump it; async results carrying an older generation are
//! discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::core::chains::SupportedChains;
use crate::wallet::types::WalletState;

pub struct SessionStore {
    tx: watch::Sender<WalletState>,
    chains: SupportedChains,
    generation: AtomicU64,
}

impl SessionStore {
    pub fn new(chains: SupportedChains) -> Self {
        let mut initial = WalletState::default();
        initial.refresh(&chains);
        let (tx, _) = watch::channel(initial);
        Self { tx, chains, generation: AtomicU64::new(0) }
    }

    pub fn snapshot(&self) -> WalletState { self.tx.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> { self.tx.subscribe() }

    pub fn chains(&self) -> &SupportedChains { &self.chains }

    pub fn generation(&self) -> u64 { self.generation.load(Ordering::SeqCst) }

    /// Apply `f` atomically. `f` returns `None` when it left the state
    /// untouched, in which case no notification is sent.
    pub(crate) fn transition<R>(&self, f: impl FnOnce(&mut WalletState) -> Option<R>) -> Option<R> {
        let mut out = None;
        self.tx.send_if_modified(|state| match f(state) {
            Some(result) => {
                state.refresh(&self.chains);
                out = Some(result);
                true
            }
            None => false,
        });
        out
    }

    /// Like [`transition`](Self::transition), but only while `generation` is current.
    pub(crate) fn transition_if_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut WalletState) -> Option<R>,
    ) -> Option<R> {
        self.transition(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return None;
            }
            f(state)
        })
    }

    /// Start a new session lifetime. Call from inside a transition closure.
    pub(crate) fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
