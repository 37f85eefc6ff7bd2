//! The governor: one lock, one gate, and the run lifecycle.
//!
//! All bookkeeping lives behind a single mutex; the gate atomic is the only
//! cross-thread channel outside it. A thread entering a control point marks
//! itself parked, gives the dispatcher a chance to run, releases the lock,
//! and only then spins on the gate. Releasing before spinning is load
//! bearing: the thread that will eventually open the gate needs the lock to
//! get there.
//!
//! # Run lifecycle
//!
//! [`Governor::reset`] is the seam between runs. It seals the journal of
//! the run that just ended, reloads per mode, and re-arms the schedule:
//! random starts blank, explore advances to the next unexplored
//! interleaving (or reports exhaustion), preset rewinds exactly once.
//!
//! The governor assumes subscribed threads never block on one another
//! outside control points; a program that does so spins forever, which is
//! a defect of the program under test, not of the governor.

use std::io;
use std::process;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::affinity;
use crate::chooser;
use crate::config::{GovernorConfig, RunMode};
use crate::gate::Gate;
use crate::journal::Journal;
use crate::registry::{Registry, SubscribeError};
use crate::rng::Rng;
use crate::schedule::Schedule;

/// Deterministic thread governor.
///
/// Shared freely across threads (typically through an `Arc`); every method
/// takes `&self`. The run mode is fixed at construction.
#[derive(Debug)]
pub struct Governor {
    mode: RunMode,
    gate: Gate,
    inner: Mutex<Inner>,
}

/// Everything the core mutex protects.
#[derive(Debug)]
struct Inner {
    registry: Registry,
    schedule: Schedule,
    journal: Journal,
    rng: Rng,
    pin_subscribers: bool,
    pin_cpu: Option<usize>,
}

impl Governor {
    /// Opens the journal and loads whatever the previous run left behind.
    ///
    /// # Errors
    ///
    /// Fails when the journal cannot be opened; in particular, replay mode
    /// requires the recording to exist.
    pub fn new(config: GovernorConfig) -> io::Result<Self> {
        let GovernorConfig {
            mode,
            data_path,
            seed,
            pin_subscribers,
        } = config;

        let journal = Journal::open(&data_path, mode.writes())?;
        let governor = Self {
            mode,
            gate: Gate::new(),
            inner: Mutex::new(Inner {
                registry: Registry::new(),
                schedule: Schedule::new(),
                journal,
                rng: seed.map_or_else(Rng::from_entropy, Rng::seeded),
                pin_subscribers,
                pin_cpu: None,
            }),
        };

        {
            let mut inner = governor.inner.lock();
            if !governor.reset_inner(&mut inner, true) {
                warn!("recorded search space is already exhausted");
            }
        }
        Ok(governor)
    }

    /// The mode this governor was constructed with.
    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Declares that `count` threads will subscribe before scheduling can
    /// begin. Overwrites any previous declaration.
    pub fn prepare(&self, count: usize) {
        let mut inner = self.inner.lock();
        inner.registry.announce(count);
        debug!(count, "announced subscribers");
    }

    /// Registers the calling thread under `thread_id`.
    ///
    /// # Errors
    ///
    /// Refused (with a diagnostic already emitted) when the caller is
    /// subscribed, no announced slot remains, or the id is taken. The
    /// governor keeps running either way.
    pub fn subscribe(&self, thread_id: usize) -> Result<(), SubscribeError> {
        let native = thread::current().id();
        let mut inner = self.inner.lock();
        inner.registry.subscribe(native, thread_id)?;
        trace!(thread_id, "subscribed");

        if inner.pin_subscribers {
            let cpu = match inner.pin_cpu {
                Some(cpu) => cpu,
                None => {
                    let cpu = inner.rng.pick(affinity::cpu_count());
                    inner.pin_cpu = Some(cpu);
                    cpu
                }
            };
            if let Err(err) = affinity::pin_current_thread(cpu) {
                warn!(error = %err, cpu, "failed to pin subscriber");
            }
        }
        Ok(())
    }

    /// Removes the calling thread's subscription; no-op for strangers.
    ///
    /// The departure may unblock the remaining threads, so a dispatch is
    /// attempted before returning.
    pub fn unsubscribe(&self) {
        let native = thread::current().id();
        let mut inner = self.inner.lock();
        let Some(gone) = inner.registry.unsubscribe(native) else {
            return;
        };
        self.gate.release_if_held(gone.token());
        trace!(thread_id = gone.thread_id(), "unsubscribed");

        if inner.pin_subscribers {
            if let Err(err) = affinity::reset_affinity() {
                warn!(error = %err, "failed to restore affinity");
            }
        }
        self.try_dispatch(&mut inner);
    }

    /// Yields scheduling authority; returns when the caller is selected
    /// again. A no-op for unsubscribed callers.
    pub fn control_point(&self) {
        let native = thread::current().id();
        let token = {
            let mut inner = self.inner.lock();
            let Some(token) = inner.registry.park(native) else {
                return;
            };
            self.gate.release_if_held(token);
            self.try_dispatch(&mut inner);
            token
        };
        // Lock released: the spin must leave the dispatcher reachable.
        self.gate.wait_for_turn(token);
    }

    /// Advances to the next run.
    ///
    /// Returns `false` when no further run should be launched: the search
    /// space is exhausted (explore) or the recording was already replayed
    /// (preset). Calling again with no intervening scheduling is a no-op
    /// that returns `true`.
    #[must_use]
    pub fn reset(&self, force: bool) -> bool {
        let mut inner = self.inner.lock();
        self.reset_inner(&mut inner, force)
    }

    /// Appends the termination sentinel to the journal.
    ///
    /// Invoked automatically on drop and, for the process-wide instance, at
    /// process exit. Harmless to call early or repeatedly.
    pub fn seal(&self) {
        let mut inner = self.inner.lock();
        if let Err(err) = inner.journal.seal() {
            warn!(error = %err, "failed to seal the schedule journal");
        }
    }

    // ====================================================================
    // Dispatch
    // ====================================================================

    /// Selects and releases the next thread if the run is ready for it:
    /// every announced thread subscribed, every subscriber parked, and at
    /// least one subscriber present (the last departure leaves nobody to
    /// choose). Returns whether a thread was released.
    fn try_dispatch(&self, inner: &mut Inner) -> bool {
        if inner.registry.outstanding() != 0 {
            return false;
        }
        if !inner.registry.all_parked() {
            return false;
        }
        if inner.registry.is_empty() {
            return false;
        }

        let decision = match self.mode {
            RunMode::Random => {
                chooser::pick_random(&inner.registry, &mut inner.schedule, &mut inner.rng)
            }
            RunMode::Explore => chooser::pick_explore(&inner.registry, &mut inner.schedule),
            RunMode::Preset => match chooser::pick_preset(&inner.registry, &mut inner.schedule) {
                Ok(decision) => decision,
                Err(err) => {
                    error!(error = %err, "recorded schedule does not match this run");
                    process::abort();
                }
            },
        };

        if self.mode.writes() {
            require(inner.journal.append(&decision));
        }
        debug!(
            thread_id = decision.thread_id,
            available = decision.available,
            higher = decision.higher,
            "dispatching"
        );

        let token = inner
            .registry
            .unpark(decision.thread_id)
            .expect("chosen decision names a subscribed thread");
        self.gate.open_for(token);
        true
    }

    // ====================================================================
    // Reset
    // ====================================================================

    fn reset_inner(&self, inner: &mut Inner, force: bool) -> bool {
        // Back-to-back resets with no intervening scheduling collapse into
        // one, so callers may reset defensively.
        if !force && inner.schedule.cursor() == 0 {
            return true;
        }

        if inner.schedule.cursor() > 0 {
            require(inner.journal.seal());
        }
        if self.mode.replays() {
            let (points, complete) = require(inner.journal.load());
            inner.schedule.reload(points, complete);
        }
        require(inner.journal.begin());

        match self.mode {
            RunMode::Random => {
                inner.schedule.clear();
                debug!("reset for a fresh random run");
                true
            }
            RunMode::Explore => {
                inner.schedule.rewind();
                if !inner.schedule.is_complete() {
                    // The previous run never terminated; try the same
                    // prefix again before moving the frontier.
                    debug!("re-attempting an unfinished schedule");
                    return true;
                }
                if inner.schedule.advance_next_branch() {
                    debug!(prefix = inner.schedule.len(), "advanced to the next branch");
                    true
                } else {
                    debug!("search space exhausted");
                    false
                }
            }
            RunMode::Preset => {
                let first = inner.schedule.cursor() == 0;
                inner.schedule.rewind();
                // A recording is good for exactly one run.
                first
            }
        }
    }
}

impl Drop for Governor {
    fn drop(&mut self) {
        self.seal();
    }
}

/// Journal failures mid-run leave the recording unusable and the search
/// frontier unrecoverable; treat them like the replay mismatches.
fn require<T>(result: io::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!(error = %err, "schedule journal failure");
            process::abort();
        }
    }
}
