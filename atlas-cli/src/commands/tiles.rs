//! Tiles command - print the proxy URLs of the tiles around a reference.

use atlas::app::AppConfig;
use atlas::config::TileServerConfig;
use atlas::grid_ref::GridReference;

use super::common::{load_registry, select_server};
use crate::error::CliError;

/// Arguments for the tiles command.
pub struct TilesArgs {
    pub center: String,
    pub server: Option<String>,
    pub zoom: Option<f64>,
    pub width: u32,
    pub height: u32,
}

/// Run the tiles command.
pub fn run(args: TilesArgs, config: &AppConfig) -> Result<(), CliError> {
    let registry = load_registry(config)?;
    let server = select_server(&registry, args.server.as_deref())?.with_zoom(args.zoom);
    let center: GridReference = args.center.parse()?;

    let base = format!("http://{}", config.bind_addr());
    for row in tile_grid(&server, center, args.width, args.height, &base)? {
        println!("{}", row.join(" "));
    }
    Ok(())
}

/// URLs of the `(2w+1) × (2h+1)` tiles centred on `center`, northern row
/// first.
pub fn tile_grid(
    server: &TileServerConfig,
    center: GridReference,
    width: u32,
    height: u32,
    base: &str,
) -> Result<Vec<Vec<String>>, CliError> {
    let scheme = server.scheme();
    let ll = scheme
        .geodetic()
        .to_long_lat(center.easting() as f64, center.northing() as f64);
    let middle = scheme.from_long_lat(&ll)?;

    let (w, h) = (width as i64, height as i64);
    (-h..=h)
        .rev()
        .map(|dy| {
            (-w..=w)
                .map(|dx| {
                    let tile = scheme.move_by(&middle, dx, dy)?;
                    Ok::<String, CliError>(format!("{}{}", base, server.proxy_path(&tile)))
                })
                .collect::<Result<Vec<String>, CliError>>()
        })
        .collect()
}
