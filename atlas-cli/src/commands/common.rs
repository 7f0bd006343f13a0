//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use atlas::app::AppConfig;
use atlas::config::{TileServerConfig, TileServerRegistry};
use atlas::geodetic::GeodeticTransform;
use clap::Args;
use tracing::debug;

use crate::error::CliError;

/// Configuration flags accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Server list (overrides ATLAS_RC)
    #[arg(long, global = true, value_name = "FILE")]
    pub rc: Option<PathBuf>,

    /// Root for relative cache folders (overrides ATLAS_CACHE_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Resolve settings from the environment, then CLI flags.
pub fn resolve_config(args: &ConfigArgs) -> Result<AppConfig, CliError> {
    let mut config = AppConfig::from_env()?;
    if let Some(rc) = &args.rc {
        config = config.with_rc_file(rc);
    }
    if let Some(dir) = &args.cache_dir {
        config = config.with_cache_dir(dir);
    }
    debug!(rc = %config.rc_file.display(), cache_root = %config.cache_root().display(), "resolved configuration");
    Ok(config)
}

/// Load the tile servers named by `config`.
pub fn load_registry(config: &AppConfig) -> Result<TileServerRegistry, CliError> {
    Ok(TileServerRegistry::load(
        &config.rc_file,
        config.cache_root(),
        GeodeticTransform::national_grid(),
    )?)
}

/// The server with `id`, or the default server.
pub fn select_server<'a>(registry: &'a TileServerRegistry, id: Option<&str>) -> Result<&'a TileServerConfig, CliError> {
    match id {
        Some(id) => registry.get(id).ok_or_else(|| CliError::UnknownServer(id.to_string())),
        None => Ok(registry.default_server()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_select_server() {
        let text = r#"[
            {"id": "a", "folder": "a", "type": "zxy", "url": "u"},
            {"id": "b", "folder": "b", "type": "quadkey", "url": "v"}
        ]"#;
        let registry = TileServerRegistry::from_json(text, Path::new("/cache"), GeodeticTransform::national_grid()).unwrap();

        assert_eq!(select_server(&registry, None).unwrap().id(), "a");
        assert_eq!(select_server(&registry, Some("b")).unwrap().id(), "b");
        assert!(matches!(select_server(&registry, Some("c")), Err(CliError::UnknownServer(_))));
    }
}
