//! Subscriber bookkeeping.
//!
//! Two coordinated views over the same population: native thread identity
//! to [`Subscriber`] record, and user-assigned thread id back to the native
//! identity. The id view is a `BTreeMap` so that "ascending thread id" is
//! the one canonical order every chooser sees. Native identities are map
//! keys only; the user-assigned ids are what recorded runs carry, because
//! native identities differ from process to process.
//!
//! The registry also tracks how many subscriptions were announced but not
//! yet claimed; dispatch stays disabled while that count is non-zero.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::thread::ThreadId;

use thiserror::Error;
use tracing::error;

use crate::gate::GateToken;

/// Refused subscription attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubscribeError {
    /// The calling thread already holds a subscription.
    #[error("calling thread is already subscribed")]
    AlreadySubscribed,
    /// More threads tried to subscribe than were announced.
    #[error("no further subscriptions were announced")]
    NoSlotAnnounced,
    /// Another thread already claimed this id.
    #[error("thread id {0} is already taken")]
    IdTaken(usize),
}

/// Per-subscribed-thread record.
#[derive(Debug)]
pub(crate) struct Subscriber {
    thread_id: usize,
    token: GateToken,
    parked: bool,
}

impl Subscriber {
    pub(crate) fn thread_id(&self) -> usize {
        self.thread_id
    }

    pub(crate) fn token(&self) -> GateToken {
        self.token
    }

    /// True while the owning thread sits in a control point waiting to be
    /// chosen.
    pub(crate) fn is_parked(&self) -> bool {
        self.parked
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    by_native: HashMap<ThreadId, Subscriber>,
    by_id: BTreeMap<usize, ThreadId>,
    outstanding: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declares how many threads will subscribe next. Overwrites any
    /// previous announcement.
    pub(crate) fn announce(&mut self, count: usize) {
        self.outstanding = count;
    }

    /// Announced subscriptions not yet claimed.
    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Registers `native` under the user id `thread_id`.
    ///
    /// Emits a diagnostic and refuses when the caller is already
    /// subscribed, no announcement slot remains, or the id is taken.
    pub(crate) fn subscribe(
        &mut self,
        native: ThreadId,
        thread_id: usize,
    ) -> Result<GateToken, SubscribeError> {
        if self.by_native.contains_key(&native) {
            error!(thread_id, "thread is already subscribed");
            return Err(SubscribeError::AlreadySubscribed);
        }
        if self.outstanding == 0 {
            error!(thread_id, "no further subscriptions were announced");
            return Err(SubscribeError::NoSlotAnnounced);
        }
        if self.by_id.contains_key(&thread_id) {
            error!(thread_id, "thread id is already taken");
            return Err(SubscribeError::IdTaken(thread_id));
        }

        let token = GateToken::fresh();
        self.by_native.insert(
            native,
            Subscriber {
                thread_id,
                token,
                parked: false,
            },
        );
        self.by_id.insert(thread_id, native);
        self.outstanding -= 1;

        debug_assert!(self.views_consistent());
        Ok(token)
    }

    /// Removes `native` if subscribed, returning its record.
    pub(crate) fn unsubscribe(&mut self, native: ThreadId) -> Option<Subscriber> {
        let record = self.by_native.remove(&native)?;
        self.by_id.remove(&record.thread_id);
        debug_assert!(self.views_consistent());
        Some(record)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_native.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_native.is_empty()
    }

    /// Marks the caller as sitting in a control point; returns its token.
    pub(crate) fn park(&mut self, native: ThreadId) -> Option<GateToken> {
        let record = self.by_native.get_mut(&native)?;
        record.parked = true;
        Some(record.token)
    }

    /// Clears the parked flag of the thread registered under `thread_id`
    /// and returns its token.
    pub(crate) fn unpark(&mut self, thread_id: usize) -> Option<GateToken> {
        let native = self.by_id.get(&thread_id)?;
        let record = self.by_native.get_mut(native)?;
        record.parked = false;
        Some(record.token)
    }

    /// True when every subscribed thread sits in a control point.
    pub(crate) fn all_parked(&self) -> bool {
        self.by_native.values().all(Subscriber::is_parked)
    }

    /// Subscribed user ids in ascending order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_id.keys().copied()
    }

    pub(crate) fn min_id(&self) -> Option<usize> {
        self.ids().next()
    }

    pub(crate) fn contains_id(&self, thread_id: usize) -> bool {
        self.by_id.contains_key(&thread_id)
    }

    /// Smallest subscribed id that is `>= thread_id`.
    pub(crate) fn id_at_or_above(&self, thread_id: usize) -> Option<usize> {
        self.by_id.range(thread_id..).next().map(|(id, _)| *id)
    }

    /// Number of subscribed ids strictly greater than `thread_id`.
    pub(crate) fn higher_than(&self, thread_id: usize) -> usize {
        self.by_id
            .range((Bound::Excluded(thread_id), Bound::Unbounded))
            .count()
    }

    fn views_consistent(&self) -> bool {
        self.by_native.len() == self.by_id.len()
            && self.by_id.iter().all(|(id, native)| {
                self.by_native
                    .get(native)
                    .is_some_and(|record| record.thread_id == *id)
            })
    }
}
