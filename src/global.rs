#![allow(unsafe_code)]
//! The process-wide governor and its lifecycle hooks.
//!
//! Programs under test rarely want to thread a handle through every
//! function, so the usual entry points are the free functions here, backed
//! by one lazily constructed instance configured from the environment.
//!
//! Two hooks keep the instance honest about lifecycles:
//!
//! - a thread-local guard, registered on the first successful subscription
//!   of each thread, unsubscribes the thread when it exits without saying
//!   goodbye, so the remaining subscribers are not stranded mid-run;
//! - an `atexit` handler seals the journal when the process terminates
//!   cleanly, which is what marks the recorded run as complete.
//!
//! Construction failures are fatal: a governor that cannot read its
//! configuration or open its journal cannot do anything meaningful later.

use std::cell::RefCell;
use std::process;
use std::sync::{Arc, OnceLock, Weak};

use tracing::error;

use crate::config::GovernorConfig;
use crate::governor::Governor;

static GOVERNOR: OnceLock<Arc<Governor>> = OnceLock::new();

/// The process-wide governor, created on first use from `GOV_MODE` and
/// `GOV_SEED`.
///
/// Aborts the process when the environment names an unknown mode or the
/// journal cannot be opened.
pub fn governor() -> &'static Arc<Governor> {
    GOVERNOR.get_or_init(|| {
        let config = GovernorConfig::from_env().unwrap_or_else(|err| {
            error!(error = %err, "refusing to start with an invalid mode");
            process::abort();
        });
        let governor = Governor::new(config).unwrap_or_else(|err| {
            error!(error = %err, "failed to open the schedule journal");
            process::abort();
        });
        unsafe {
            let _ = libc::atexit(seal_at_exit);
        }
        Arc::new(governor)
    })
}

extern "C" fn seal_at_exit() {
    if let Some(governor) = GOVERNOR.get() {
        governor.seal();
    }
}

thread_local! {
    static DEPARTURE_HOOK: RefCell<Option<DepartureGuard>> = const { RefCell::new(None) };
}

/// Unsubscribes the owning thread when it exits. Registered once per
/// thread; deliberately inert once the governor is gone.
struct DepartureGuard {
    governor: Weak<Governor>,
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        if let Some(governor) = self.governor.upgrade() {
            governor.unsubscribe();
        }
    }
}

/// Declares that `count` threads will subscribe. See
/// [`Governor::prepare`].
pub fn prepare(count: usize) {
    governor().prepare(count);
}

/// Subscribes the calling thread under `thread_id` and arms its exit hook.
///
/// Refused attempts were already reported; the caller keeps running
/// unsubscribed.
pub fn subscribe(thread_id: usize) {
    let instance = governor();
    if instance.subscribe(thread_id).is_err() {
        return;
    }
    DEPARTURE_HOOK.with(|hook| {
        hook.borrow_mut().get_or_insert_with(|| DepartureGuard {
            governor: Arc::downgrade(instance),
        });
    });
}

/// Unsubscribes the calling thread. Safe to call when not subscribed.
pub fn unsubscribe() {
    governor().unsubscribe();
}

/// Yields scheduling authority until the governor selects the caller
/// again. A no-op for unsubscribed threads.
pub fn control_point() {
    governor().control_point();
}

/// Advances to the next run. See [`Governor::reset`].
#[must_use]
pub fn reset(force: bool) -> bool {
    governor().reset(force)
}
