//! Logging setup.
//!
//! Library code only emits `tracing` events; binaries call [`init`] once.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "atlas=info,warn";

/// Installs a formatting subscriber filtered by `RUST_LOG`, or by `default`
/// when `RUST_LOG` is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        init(DEFAULT_FILTER);
        assert!(!init(DEFAULT_FILTER));
    }
}
