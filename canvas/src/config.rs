//! Engine configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

pub const HISTORY_LIMIT_ENV: &str = "MINDBOARD_HISTORY_LIMIT";
pub const STORAGE_PATH_ENV: &str = "MINDBOARD_STORAGE_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum undo depth. `None` keeps every snapshot.
    pub history_limit: Option<usize>,
    /// File backing the persisted editor state. `None` disables persistence.
    pub storage_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Normalize raw settings: a zero limit is unbounded and a blank path
    /// disables persistence.
    #[must_use]
    pub fn new(history_limit: Option<usize>, storage_path: Option<PathBuf>) -> Self {
        let history_limit = history_limit.filter(|n| *n > 0);
        let storage_path = storage_path.and_then(|p| {
            let trimmed = p.to_str().map(|s| s.trim().to_owned());
            match trimmed {
                Some(s) if s.is_empty() => None,
                Some(s) => Some(PathBuf::from(s)),
                None => Some(p),
            }
        });
        Self { history_limit, storage_path }
    }

    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `MINDBOARD_HISTORY_LIMIT`: positive integer; unset, `0` or unparsable means unbounded
    /// - `MINDBOARD_STORAGE_PATH`: path of the state file; unset or empty disables persistence
    #[must_use]
    pub fn from_env() -> Self {
        let history_limit = env_parse::<usize>(HISTORY_LIMIT_ENV);
        let storage_path = match std::env::var(STORAGE_PATH_ENV) {
            Ok(raw) => Some(PathBuf::from(raw)),
            Err(_) => None,
        };
        Self::new(history_limit, storage_path)
    }
}

fn env_parse<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_setting(key, &raw),
        Err(_) => None,
    }
}

/// Parse one setting, warning about (and ignoring) values that do not parse.
fn parse_setting<T>(key: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring unparsable env value");
            None
        }
    }
}
