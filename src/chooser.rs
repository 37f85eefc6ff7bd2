//! Mode-specific decision making.
//!
//! All three choosers run under the governor lock once every subscriber is
//! parked. They share one tie-break rule: candidates are always considered
//! in ascending thread-id order, so with a fixed seed there is no source of
//! nondeterminism left anywhere in the selection.

use smallvec::SmallVec;
use thiserror::Error;

use crate::decision::Decision;
use crate::registry::Registry;
use crate::rng::Rng;
use crate::schedule::Schedule;

/// Replay found the run diverging from the recording.
///
/// `line` is the 1-based record number in the journal, which makes the
/// diagnostic greppable against the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The run needs more decisions than the recording holds.
    #[error("no recorded decision at step {step}")]
    OutOfDecisions {
        /// 0-based index of the first missing decision.
        step: usize,
    },
    /// The recorded thread id is not subscribed in this run.
    #[error("line {line}: recorded thread id {thread_id} is not subscribed")]
    UnknownThread {
        /// Journal line of the offending record.
        line: usize,
        /// The id the recording names.
        thread_id: usize,
    },
    /// The recorded subscriber count differs from this run's.
    #[error("line {line}: {recorded} threads recorded but {present} subscribed")]
    AvailableMismatch {
        /// Journal line of the offending record.
        line: usize,
        /// Count stored in the recording.
        recorded: usize,
        /// Count observed in this run.
        present: usize,
    },
    /// The recorded higher-id count differs from this run's.
    #[error("line {line}: higher-id count {recorded} recorded but {present} observed")]
    HigherMismatch {
        /// Journal line of the offending record.
        line: usize,
        /// Count stored in the recording.
        recorded: usize,
        /// Count observed in this run.
        present: usize,
    },
}

/// Uniform choice over the subscribed ids, recorded at the schedule tail.
pub(crate) fn pick_random(
    registry: &Registry,
    schedule: &mut Schedule,
    rng: &mut Rng,
) -> Decision {
    let ids: SmallVec<[usize; 8]> = registry.ids().collect();
    let thread_id = ids[rng.pick(ids.len())];
    let decision = Decision {
        thread_id,
        available: ids.len(),
        higher: registry.higher_than(thread_id),
    };
    schedule.push(decision);
    schedule.mark_latest();
    decision
}

/// Replays the schedule prefix and extends it when the prefix runs out.
///
/// The tail entry needs care: the depth-first advance bumped its thread id
/// without consulting any registry, so the id may fall in a gap. The repair
/// lands on the smallest subscribed id at or above the recorded one, and it
/// applies to the returned copy only; the stored entry and its alternative
/// count are left exactly as the advance computed them.
pub(crate) fn pick_explore(registry: &Registry, schedule: &mut Schedule) -> Decision {
    let index = schedule.take_slot();
    debug_assert!(index <= schedule.len());

    if index == schedule.len() {
        // Past the known prefix: this decision is new, take the lowest id.
        let available = registry.len();
        schedule.push(Decision {
            thread_id: registry.min_id().expect("dispatch requires a subscriber"),
            available,
            higher: available - 1,
        });
    }

    let mut decision = schedule.get(index).expect("cursor stays within the schedule");
    if index + 1 == schedule.len() {
        if let Some(thread_id) = registry.id_at_or_above(decision.thread_id) {
            decision.thread_id = thread_id;
        }
    }
    decision
}

/// Replays the next recorded decision, verbatim and verified.
pub(crate) fn pick_preset(
    registry: &Registry,
    schedule: &mut Schedule,
) -> Result<Decision, ReplayError> {
    let index = schedule.take_slot();
    let Some(decision) = schedule.get(index) else {
        return Err(ReplayError::OutOfDecisions { step: index });
    };

    let line = index + 1;
    if !registry.contains_id(decision.thread_id) {
        return Err(ReplayError::UnknownThread {
            line,
            thread_id: decision.thread_id,
        });
    }
    if decision.available != registry.len() {
        return Err(ReplayError::AvailableMismatch {
            line,
            recorded: decision.available,
            present: registry.len(),
        });
    }
    let present = registry.higher_than(decision.thread_id);
    if decision.higher != present {
        return Err(ReplayError::HigherMismatch {
            line,
            recorded: decision.higher,
            present,
        });
    }

    Ok(decision)
}
