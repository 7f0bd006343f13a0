//! Application configuration for AtlasApp.
//!
//! `AppConfig` gathers the process-level settings: where to listen, where
//! the server list lives, whether origin fetches are allowed and how often
//! cache budgets are enforced. It is usually read from the `ATLAS_*`
//! environment variables (see [`crate::config::env`]) and then adjusted by
//! command line flags through the `with_*` builders.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::env::{self, EnvReader};
use crate::config::ConfigError;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default rc file, relative to the working directory.
pub const DEFAULT_RC_FILE: &str = "atlasrc.json";

/// Default time between cache sweeps (in seconds).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Default origin request timeout (in seconds).
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration passed to `AtlasApp::start()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Listening address.
    pub address: IpAddr,

    /// Listening port; 0 picks a free one.
    pub port: u16,

    /// JSON file listing the tile servers.
    pub rc_file: PathBuf,

    /// Root for relative cache folders. Defaults to the rc file's directory.
    pub cache_dir: Option<PathBuf>,

    /// Serve cached tiles only.
    pub offline: bool,

    /// Sweep interval in seconds.
    pub sweep_interval_secs: u64,

    /// Origin request timeout in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            rc_file: PathBuf::from(DEFAULT_RC_FILE),
            cache_dir: None,
            offline: false,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Create a config for the given rc file with default settings.
    pub fn new(rc_file: impl Into<PathBuf>) -> Self {
        Self {
            rc_file: rc_file.into(),
            ..Self::default()
        }
    }

    /// Reads the `ATLAS_*` variables of the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(&env::process_env())
    }

    /// Reads the `ATLAS_*` variables through `lookup`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Env`] when a numeric or address variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_reader(&EnvReader::new(lookup))
    }

    fn from_reader<F>(vars: &EnvReader<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            address: vars.parse(env::ADDRESS)?.unwrap_or(defaults.address),
            port: vars.parse(env::PORT)?.unwrap_or(defaults.port),
            rc_file: vars.string(env::RC_FILE).map(PathBuf::from).unwrap_or(defaults.rc_file),
            cache_dir: vars.string(env::CACHE_DIR).map(PathBuf::from),
            offline: vars.flag(env::OFFLINE),
            sweep_interval_secs: vars.parse(env::SWEEP_SECS)?.unwrap_or(defaults.sweep_interval_secs),
            fetch_timeout_secs: vars
                .parse(env::FETCH_TIMEOUT_SECS)?
                .unwrap_or(defaults.fetch_timeout_secs),
        })
    }

    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.address = address;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_rc_file(mut self, rc_file: impl Into<PathBuf>) -> Self {
        self.rc_file = rc_file.into();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }

    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Root against which relative cache folders are resolved.
    pub fn cache_root(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => match self.rc_file.parent() {
                Some(parent) if parent != Path::new("") => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(move |var: &str| map.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:5000".parse().unwrap());
        assert!(!config.offline);
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.cache_root(), PathBuf::from("."));
    }

    #[test]
    fn test_environment_overrides() {
        let config = from_pairs(&[
            ("ATLAS_PORT", "8080"),
            ("ATLAS_ADDRESS", "0.0.0.0"),
            ("ATLAS_RC", "/etc/atlas/servers.json"),
            ("ATLAS_OFFLINE", "yes"),
            ("ATLAS_SWEEP_SECS", "60"),
            ("ATLAS_FETCH_TIMEOUT", "5"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.rc_file, PathBuf::from("/etc/atlas/servers.json"));
        assert!(config.offline);
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.fetch_timeout_secs, 5);
        assert_eq!(config.cache_root(), PathBuf::from("/etc/atlas"));
    }

    #[test]
    fn test_cache_dir_overrides_rc_directory() {
        let config = from_pairs(&[("ATLAS_RC", "/etc/atlas/servers.json"), ("ATLAS_CACHE_DIR", "/var/cache/atlas")])
            .unwrap();
        assert_eq!(config.cache_root(), PathBuf::from("/var/cache/atlas"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            from_pairs(&[("ATLAS_PORT", "http")]),
            Err(ConfigError::Env { var: "ATLAS_PORT", .. })
        ));
        assert!(matches!(
            from_pairs(&[("ATLAS_ADDRESS", "localhost")]),
            Err(ConfigError::Env { var: "ATLAS_ADDRESS", .. })
        ));
    }

    #[test]
    fn test_builders() {
        let config = AppConfig::new("rc.json")
            .with_port(0)
            .with_offline(true)
            .with_cache_dir("/tmp/tiles")
            .with_sweep_interval_secs(10);
        assert_eq!(config.rc_file, PathBuf::from("rc.json"));
        assert_eq!(config.port, 0);
        assert!(config.offline);
        assert_eq!(config.cache_root(), PathBuf::from("/tmp/tiles"));
        assert_eq!(config.sweep_interval_secs, 10);
    }
}
