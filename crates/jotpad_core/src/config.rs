//! Core tunables with validated defaults.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Key under which the JSON note array is stored.
pub const DEFAULT_STORAGE_KEY: &str = "notes";
/// Quiescence window before an edit is written to the store.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(300);
/// Quiescence window before an edit becomes an undo step.
pub const DEFAULT_SNAPSHOT_DELAY: Duration = Duration::from_millis(300);
/// Maximum undo stack length, initial state included.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;
/// Smallest depth that still allows one undo step.
pub const MIN_HISTORY_DEPTH: usize = 2;

const MAX_DELAY: Duration = Duration::from_secs(60);

/// Runtime configuration for store and editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub storage_key: String,
    pub autosave_delay: Duration,
    pub snapshot_delay: Duration,
    pub history_depth: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            snapshot_delay: DEFAULT_SNAPSHOT_DELAY,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl CoreConfig {
    /// Checks every field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        for (name, delay) in [
            ("autosave_delay", self.autosave_delay),
            ("snapshot_delay", self.snapshot_delay),
        ] {
            if delay > MAX_DELAY {
                return Err(ConfigError::DelayOutOfRange { name, delay });
            }
        }
        if self.history_depth < MIN_HISTORY_DEPTH {
            return Err(ConfigError::HistoryDepthTooSmall(self.history_depth));
        }
        Ok(())
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyStorageKey,
    DelayOutOfRange { name: &'static str, delay: Duration },
    HistoryDepthTooSmall(usize),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStorageKey => write!(f, "storage key must not be blank"),
            Self::DelayOutOfRange { name, delay } => write!(
                f,
                "{name} of {}ms exceeds the {}ms limit",
                delay.as_millis(),
                MAX_DELAY.as_millis()
            ),
            Self::HistoryDepthTooSmall(depth) => write!(
                f,
                "history depth {depth} is below the minimum of {MIN_HISTORY_DEPTH}"
            ),
        }
    }
}

impl Error for ConfigError {}
