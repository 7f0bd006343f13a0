//! `ATLAS_*` environment variables.
//!
//! Variables are read through a lookup function so they can be supplied
//! from a map in tests. Empty values count as unset.

use std::str::FromStr;

use super::ConfigError;

/// Listening port.
pub const PORT: &str = "ATLAS_PORT";
/// Listening address.
pub const ADDRESS: &str = "ATLAS_ADDRESS";
/// Path of the rc file holding the server list.
pub const RC_FILE: &str = "ATLAS_RC";
/// Any non-empty value disables origin fetches.
pub const OFFLINE: &str = "ATLAS_OFFLINE";
/// Root for relative cache folders.
pub const CACHE_DIR: &str = "ATLAS_CACHE_DIR";
/// Seconds between cache sweeps.
pub const SWEEP_SECS: &str = "ATLAS_SWEEP_SECS";
/// Origin request timeout in seconds.
pub const FETCH_TIMEOUT_SECS: &str = "ATLAS_FETCH_TIMEOUT";

/// Typed access to variables through a lookup function.
pub struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// The variable's value, `None` when unset or empty.
    pub fn string(&self, var: &str) -> Option<String> {
        (self.lookup)(var).filter(|v| !v.trim().is_empty())
    }

    /// The variable parsed as `T`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Env`] when the value does not parse.
    pub fn parse<T: FromStr>(&self, var: &'static str) -> Result<Option<T>, ConfigError> {
        match self.string(var) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::Env { var, value }),
        }
    }

    /// Whether the variable is set to anything.
    pub fn flag(&self, var: &str) -> bool {
        self.string(var).is_some()
    }
}

/// Reader over the process environment.
pub fn process_env() -> EnvReader<impl Fn(&str) -> Option<String>> {
    EnvReader::new(|var: &str| std::env::var(var).ok())
}
