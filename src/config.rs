//! Run mode selection and governor configuration.
//!
//! The process-wide instance configures itself from the environment; tests
//! and embedders construct a [`GovernorConfig`] directly and point it at a
//! private journal path.
//!
//! # Environment
//!
//! | Variable   | Meaning |
//! |------------|---------|
//! | `GOV_MODE` | `RUN_RANDOM` / `RUN_EXPLORE` / `RUN_PRESET`, or any value starting with `RAND`, `EXP`, `PRE`. Unset or empty selects random. Anything else is fatal. |
//! | `GOV_SEED` | Optional u64 seed for the random chooser. Unset seeds from entropy. |
//!
//! `GovernorConfig` uses a move-based builder style: each method consumes
//! `self` and returns the updated configuration.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Environment variable selecting the run mode.
pub const MODE_ENV: &str = "GOV_MODE";
/// Environment variable fixing the random chooser seed.
pub const SEED_ENV: &str = "GOV_SEED";
/// Journal filename used by the process-wide instance.
pub const DEFAULT_DATA_FILE: &str = "gov.data";

/// Rejected `GOV_MODE` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised GOV_MODE value {0:?}")]
pub struct ModeError(pub String);

/// How the governor decides which thread runs at each control point.
///
/// The mode is fixed for the lifetime of a [`Governor`](crate::Governor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Choose uniformly among the subscribed threads and record the run.
    Random,
    /// Enumerate interleavings depth-first across runs, recording each one.
    Explore,
    /// Replay a recorded run verbatim, exactly once. Never writes.
    Preset,
}

impl RunMode {
    /// Parses a `GOV_MODE` value.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError`] for any value that is neither a full mode name
    /// nor one of the recognised prefixes.
    pub fn parse(value: &str) -> Result<Self, ModeError> {
        if value == "RUN_RANDOM" || value.starts_with("RAND") {
            Ok(Self::Random)
        } else if value == "RUN_EXPLORE" || value.starts_with("EXP") {
            Ok(Self::Explore)
        } else if value == "RUN_PRESET" || value.starts_with("PRE") {
            Ok(Self::Preset)
        } else {
            Err(ModeError(value.to_owned()))
        }
    }

    /// Reads the mode from `GOV_MODE`. Unset or empty selects [`Random`].
    ///
    /// [`Random`]: Self::Random
    ///
    /// # Errors
    ///
    /// Returns [`ModeError`] when the variable holds an unrecognised value.
    pub fn from_env() -> Result<Self, ModeError> {
        match env::var(MODE_ENV) {
            Ok(value) if value.is_empty() => Ok(Self::Random),
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(Self::Random),
        }
    }

    /// True for the modes that record decisions to the journal.
    pub(crate) fn writes(self) -> bool {
        !matches!(self, Self::Preset)
    }

    /// True for the modes that reload the journal on reset.
    pub(crate) fn replays(self) -> bool {
        matches!(self, Self::Explore | Self::Preset)
    }
}

/// Configuration for a [`Governor`](crate::Governor) instance.
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    pub(crate) mode: RunMode,
    pub(crate) data_path: PathBuf,
    pub(crate) seed: Option<u64>,
    pub(crate) pin_subscribers: bool,
}

impl GovernorConfig {
    /// Creates a configuration with the default journal path and an
    /// entropy-derived seed.
    #[must_use]
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            seed: None,
            pin_subscribers: false,
        }
    }

    /// Builds the configuration the process-wide instance uses: mode from
    /// `GOV_MODE`, seed from `GOV_SEED` when present.
    ///
    /// A malformed `GOV_SEED` is reported and ignored; the seed is a tuning
    /// knob, not a correctness input.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError`] when `GOV_MODE` holds an unrecognised value.
    pub fn from_env() -> Result<Self, ModeError> {
        let mut config = Self::new(RunMode::from_env()?);
        if let Ok(raw) = env::var(SEED_ENV) {
            match raw.parse::<u64>() {
                Ok(seed) => config.seed = Some(seed),
                Err(_) => warn!(value = %raw, "ignoring malformed GOV_SEED"),
            }
        }
        Ok(config)
    }

    /// Overrides the journal path.
    #[must_use]
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Fixes the random chooser seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pins each subscriber to a single CPU while it is subscribed.
    ///
    /// Scheduling hint only; has no effect on platforms without affinity
    /// support.
    #[must_use]
    pub fn pin_subscribers(mut self, pin: bool) -> Self {
        self.pin_subscribers = pin;
        self
    }

    /// The configured run mode.
    #[must_use]
    pub fn mode(&self) -> RunMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mode_names_parse() {
        assert_eq!(RunMode::parse("RUN_RANDOM"), Ok(RunMode::Random));
        assert_eq!(RunMode::parse("RUN_EXPLORE"), Ok(RunMode::Explore));
        assert_eq!(RunMode::parse("RUN_PRESET"), Ok(RunMode::Preset));
    }

    #[test]
    fn prefix_aliases_parse() {
        assert_eq!(RunMode::parse("RAND"), Ok(RunMode::Random));
        assert_eq!(RunMode::parse("RANDOM"), Ok(RunMode::Random));
        assert_eq!(RunMode::parse("EXPLORE"), Ok(RunMode::Explore));
        assert_eq!(RunMode::parse("EXP"), Ok(RunMode::Explore));
        assert_eq!(RunMode::parse("PRESET"), Ok(RunMode::Preset));
        assert_eq!(RunMode::parse("PREVIOUS"), Ok(RunMode::Preset));
    }

    #[test]
    fn prefixes_are_case_sensitive() {
        assert!(RunMode::parse("rand").is_err());
        assert!(RunMode::parse("run_random").is_err());
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = RunMode::parse("SOMETIMES").unwrap_err();
        assert_eq!(err, ModeError("SOMETIMES".to_owned()));
        assert!(RunMode::parse("").is_err());
    }

    #[test]
    fn mode_env_round_trip() {
        env::set_var(MODE_ENV, "EXPLORE");
        env::set_var(SEED_ENV, "42");
        let config = GovernorConfig::from_env().unwrap();
        assert_eq!(config.mode(), RunMode::Explore);
        assert_eq!(config.seed, Some(42));

        env::set_var(SEED_ENV, "not-a-number");
        let config = GovernorConfig::from_env().unwrap();
        assert_eq!(config.seed, None);

        env::remove_var(MODE_ENV);
        env::remove_var(SEED_ENV);
        let config = GovernorConfig::from_env().unwrap();
        assert_eq!(config.mode(), RunMode::Random);
    }

    #[test]
    fn builder_chains() {
        let config = GovernorConfig::new(RunMode::Random)
            .data_path("/tmp/sched.log")
            .seed(7)
            .pin_subscribers(true);
        assert_eq!(config.data_path, PathBuf::from("/tmp/sched.log"));
        assert_eq!(config.seed, Some(7));
        assert!(config.pin_subscribers);
    }

    #[test]
    fn mode_io_roles() {
        assert!(RunMode::Random.writes());
        assert!(RunMode::Explore.writes());
        assert!(!RunMode::Preset.writes());
        assert!(!RunMode::Random.replays());
        assert!(RunMode::Explore.replays());
        assert!(RunMode::Preset.replays());
    }
}
