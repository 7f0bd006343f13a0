//! Grid reference CLI commands.

use atlas::geodetic::GeodeticTransform;
use atlas::grid_ref::{self, GridReference};
use clap::Subcommand;

use crate::error::CliError;

/// Grid reference subcommands.
#[derive(Debug, Subcommand)]
pub enum RefAction {
    /// Encode an easting and northing in metres, e.g. `437250 115900`
    Encode { easting: i64, northing: i64 },
    /// Decode a reference such as `SU 3715`
    Decode {
        #[arg(required = true, num_args = 1..)]
        reference: Vec<String>,
    },
    /// Print the WGS84 longitude and latitude of a reference
    LongLat {
        #[arg(required = true, num_args = 1..)]
        reference: Vec<String>,
    },
    /// Print the references one page away in each direction
    Neighbours {
        #[arg(required = true, num_args = 1..)]
        reference: Vec<String>,
        /// Page width in kilometres
        #[arg(long, default_value_t = 1.0)]
        width: f64,
        /// Page height in kilometres
        #[arg(long, default_value_t = 1.0)]
        height: f64,
    },
}

/// Run a grid reference subcommand.
pub fn run(action: RefAction) -> Result<(), CliError> {
    match action {
        RefAction::Encode { easting, northing } => {
            println!("{}", grid_ref::encode(easting, northing)?);
        }
        RefAction::Decode { reference } => {
            let (easting, northing) = grid_ref::decode(&reference.join(" "))?;
            println!("{} {}", easting, northing);
        }
        RefAction::LongLat { reference } => {
            let reference: GridReference = reference.join(" ").parse()?;
            let ll = GeodeticTransform::national_grid().to_long_lat(reference.easting() as f64, reference.northing() as f64);
            println!("{:.6} {:.6}", ll.lon(), ll.lat());
        }
        RefAction::Neighbours {
            reference,
            width,
            height,
        } => {
            let reference: GridReference = reference.join(" ").parse()?;
            let n = reference.neighbours(width, height)?;
            println!("north {}", n.north);
            println!("south {}", n.south);
            println!("west  {}", n.west);
            println!("east  {}", n.east);
        }
    }
    Ok(())
}
