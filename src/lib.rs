#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Deterministic thread governor for interleaving exploration.
//!
//! Cooperating threads hand scheduling authority to the governor at
//! explicit *control points*; at each one the governor selects exactly one
//! thread to proceed and parks the rest. Across repeated runs of the same
//! program it can
//!
//! - pick uniformly at random ([`RunMode::Random`]),
//! - enumerate every interleaving depth-first ([`RunMode::Explore`]), or
//! - replay a recorded run verbatim ([`RunMode::Preset`]).
//!
//! Every decision is persisted as one text line in a journal file; the
//! journal is both the replay artifact and the depth-first frontier that
//! carries the search from one run to the next.
//!
//! # Usage
//!
//! The program under test talks to the process-wide instance through the
//! free functions in [`global`], with the mode chosen by the `GOV_MODE`
//! environment variable:
//!
//! ```ignore
//! use interlock::global;
//!
//! global::prepare(2);
//!
//! // On each participating thread:
//! global::subscribe(thread_id);
//! loop {
//!     global::control_point();
//!     // ... one step of shared-state work ...
//! }
//! global::unsubscribe();
//!
//! // Between runs, on the driver thread:
//! while global::reset(false) {
//!     // launch the next run
//! }
//! ```
//!
//! Test harnesses embed a private instance instead, with its own journal
//! path and a fixed seed:
//!
//! ```ignore
//! use interlock::{Governor, GovernorConfig, RunMode};
//!
//! let governor = Governor::new(
//!     GovernorConfig::new(RunMode::Explore).data_path("target/sched.data"),
//! )?;
//! ```
//!
//! # Caveats
//!
//! Subscribed threads must never block on each other outside control
//! points; the governor runs exactly one of them at a time, so any foreign
//! rendezvous deadlocks the run. There is no timeout machinery, by
//! design: a stuck run points at the program under test.

pub mod affinity;
mod chooser;
pub mod config;
mod decision;
mod gate;
pub mod global;
mod governor;
mod journal;
mod registry;
mod rng;
mod schedule;

pub use chooser::ReplayError;
pub use config::{GovernorConfig, ModeError, RunMode};
pub use decision::Decision;
pub use governor::Governor;
pub use registry::SubscribeError;
