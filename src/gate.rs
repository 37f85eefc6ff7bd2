//! The active-thread gate.
//!
//! One atomic cell names the single thread currently permitted to run past
//! its control point. Every other subscribed thread spins on the cell,
//! yielding to the OS between probes. Writing a new identity into the cell
//! is the only mechanism that releases a thread, so at most one thread can
//! ever observe itself selected.
//!
//! `std::thread::ThreadId` cannot live inside an atomic, so each
//! subscription is issued an opaque [`GateToken`] instead; the token plays
//! the role of the thread identity everywhere the gate is concerned and is
//! never persisted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

/// Cell value meaning "nobody may run".
const NOBODY: u64 = 0;

/// Opaque per-subscription identity used by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateToken(u64);

impl GateToken {
    /// Issues a token no other subscription in this process has held.
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Single-writer atomic holding the identity of the runnable thread.
///
/// All accesses are sequentially consistent: stores happen only under the
/// governor lock, loads happen in the spin loop, and the total order keeps
/// a released thread from racing a subsequent selection.
#[derive(Debug)]
pub(crate) struct Gate {
    active: AtomicU64,
}

impl Gate {
    pub(crate) const fn new() -> Self {
        Self {
            active: AtomicU64::new(NOBODY),
        }
    }

    /// Names `token` as the one thread allowed to proceed.
    pub(crate) fn open_for(&self, token: GateToken) {
        self.active.store(token.0, Ordering::SeqCst);
    }

    /// Clears the cell if `token` currently holds it.
    ///
    /// Called by a thread giving up its own turn (re-entering a control
    /// point, or unsubscribing). Tokens are unique, so no other thread can
    /// be named by the cell when the comparison succeeds.
    pub(crate) fn release_if_held(&self, token: GateToken) {
        if self.active.load(Ordering::SeqCst) == token.0 {
            self.active.store(NOBODY, Ordering::SeqCst);
        }
    }

    /// True when the cell names `token`.
    pub(crate) fn admits(&self, token: GateToken) -> bool {
        self.active.load(Ordering::SeqCst) == token.0
    }

    /// Spin-yields until the cell names `token`.
    ///
    /// Must be called without the governor lock held, otherwise no other
    /// thread could ever be dispatched.
    pub(crate) fn wait_for_turn(&self, token: GateToken) {
        while !self.admits(token) {
            thread::yield_now();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.active.load(Ordering::SeqCst) == NOBODY
    }
}
