//! National grid reference codec.
//!
//! Converts between numeric (easting, northing) pairs in metres and the
//! alphanumeric grid reference notation, e.g. `SU 37192 15651`.
//!
//! # Notation
//!
//! The first letter selects a 500 km square and the second a 100 km square
//! inside it. Both letters come from the same 5×5 lookup grid (the letter
//! `I` is skipped):
//!
//! ```text
//!   A B C D E      north
//!   F G H J K
//!   L M N O P
//!   Q R S T U
//!   V W X Y Z      south
//! ```
//!
//! The false origin of the grid sits at the south-west corner of the `S`
//! 500 km square. The letters are followed by the easting digits then the
//! northing digits within the 100 km square, each run the same length.
//! Trailing zeros common to both axes are dropped, so `SU3700015000`
//! is written `SU3715`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Side of a 100 km lettered square, in metres.
pub const SQUARE_SIZE: i64 = 100_000;

/// Number of digits per axis at full (1 m) precision.
const FULL_PRECISION: usize = 5;

/// Largest number of trailing zeros that may be stripped per axis.
///
/// Keeps at least two digits per axis, i.e. a 1 km reference.
const MAX_STRIPPED_ZEROS: u32 = 3;

/// Exclusive upper bound on eastings representable by the letter grid.
pub const MAX_EASTING: i64 = 1_500_000;

/// Exclusive upper bound on northings representable by the letter grid.
pub const MAX_NORTHING: i64 = 2_000_000;

/// Letter grid rows, listed from the southern row upwards.
const LETTER_ROWS: [&[u8; 5]; 5] = [b"VWXYZ", b"QRSTU", b"LMNOP", b"FGHJK", b"ABCDE"];

/// (column, row) of the `S` square, the false origin.
const ORIGIN: (i64, i64) = (2, 1);

/// Errors produced while encoding or decoding grid references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridRefError {
    /// The text does not follow the grid reference grammar.
    #[error("Invalid grid reference {0:?}")]
    MalformedReference(String),

    /// The easting and northing digit runs have different lengths.
    #[error("Imbalanced grid reference {0:?}")]
    ImbalancedReference(String),

    /// The coordinate lies outside the lettered grid.
    #[error("Coordinate ({easting}, {northing}) is outside the national grid")]
    InvalidCoordinate { easting: i64, northing: i64 },
}

/// A validated national grid position in whole metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridReference {
    easting: u32,
    northing: u32,
}

/// The four references one page away from a centre, see
/// [`GridReference::neighbours`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbours {
    pub north: GridReference,
    pub south: GridReference,
    pub west: GridReference,
    pub east: GridReference,
}

impl GridReference {
    /// Creates a reference, checking it lies within the letter grid.
    pub fn new(easting: i64, northing: i64) -> Result<Self, GridRefError> {
        if !(0..MAX_EASTING).contains(&easting) || !(0..MAX_NORTHING).contains(&northing) {
            return Err(GridRefError::InvalidCoordinate { easting, northing });
        }
        Ok(Self {
            easting: easting as u32,
            northing: northing as u32,
        })
    }

    pub fn easting(&self) -> u32 {
        self.easting
    }

    pub fn northing(&self) -> u32 {
        self.northing
    }

    /// Returns `(easting, northing)`.
    pub fn coords(&self) -> (u32, u32) {
        (self.easting, self.northing)
    }

    /// The two-letter 100 km square code, e.g. `"SU"`.
    pub fn square_letters(&self) -> String {
        // Validated on construction, so the lookup cannot fail.
        square_code(self.easting as i64, self.northing as i64).unwrap_or_default()
    }

    /// Moves the reference by whole or fractional kilometres.
    pub fn offset_km(&self, dx: f64, dy: f64) -> Result<Self, GridRefError> {
        Self::new(
            (self.easting as f64 + 1000.0 * dx).round() as i64,
            (self.northing as f64 + 1000.0 * dy).round() as i64,
        )
    }

    /// References `width` km east/west and `height` km north/south.
    pub fn neighbours(&self, width: f64, height: f64) -> Result<Neighbours, GridRefError> {
        Ok(Neighbours {
            north: self.offset_km(0.0, height)?,
            south: self.offset_km(0.0, -height)?,
            west: self.offset_km(-width, 0.0)?,
            east: self.offset_km(width, 0.0)?,
        })
    }
}

impl fmt::Display for GridReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = encode(self.easting as i64, self.northing as i64).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for GridReference {
    type Err = GridRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (easting, northing) = decode(s)?;
        Ok(Self { easting, northing })
    }
}

/// Encodes a coordinate pair as a grid reference string.
///
/// Precision is reduced by dropping trailing zeros shared by both axes,
/// down to two digits per axis.
///
/// # Errors
///
/// Returns [`GridRefError::InvalidCoordinate`] for negative values or values
/// beyond the letter grid.
pub fn encode(easting: i64, northing: i64) -> Result<String, GridRefError> {
    let letters = square_code(easting, northing)
        .ok_or(GridRefError::InvalidCoordinate { easting, northing })?;

    let stripped = (0..=MAX_STRIPPED_ZEROS)
        .rev()
        .find(|&n| {
            let unit = 10_i64.pow(n);
            easting % unit == 0 && northing % unit == 0
        })
        .unwrap_or(0);

    let unit = 10_i64.pow(stripped);
    let width = FULL_PRECISION - stripped as usize;

    Ok(format!(
        "{}{:0width$}{:0width$}",
        letters,
        easting % SQUARE_SIZE / unit,
        northing % SQUARE_SIZE / unit,
        width = width
    ))
}

/// Decodes a grid reference into `(easting, northing)` metres.
///
/// Accepts `SU3715`, `su 3715`, and `SU 37 15` style references.
///
/// # Errors
///
/// - [`GridRefError::MalformedReference`] when the text does not match
/// - [`GridRefError::ImbalancedReference`] when the digit runs differ in length
/// - [`GridRefError::InvalidCoordinate`] when the letters name a square off the grid
pub fn decode(code: &str) -> Result<(u32, u32), GridRefError> {
    let malformed = || GridRefError::MalformedReference(code.to_string());

    let captures = reference_pattern().captures(code.trim()).ok_or_else(malformed)?;

    let letters = captures["letters"].to_ascii_uppercase();
    let letters = letters.as_bytes();
    let major = letter_position(letters[0]).ok_or_else(malformed)?;
    let minor = letter_position(letters[1]).ok_or_else(malformed)?;

    let (easting_digits, northing_digits) = match captures.name("combined") {
        Some(combined) => combined.as_str().split_at(combined.as_str().len() / 2),
        None => (&captures["first"], &captures["second"]),
    };

    if easting_digits.len() != northing_digits.len() {
        return Err(GridRefError::ImbalancedReference(code.to_string()));
    }
    if easting_digits.len() > FULL_PRECISION {
        return Err(malformed());
    }

    let square_e = (major.0 - ORIGIN.0) * 5 + minor.0;
    let square_n = (major.1 - ORIGIN.1) * 5 + minor.1;

    let easting = square_e * SQUARE_SIZE + pad_digits(easting_digits);
    let northing = square_n * SQUARE_SIZE + pad_digits(northing_digits);

    if easting < 0 || northing < 0 {
        return Err(GridRefError::InvalidCoordinate { easting, northing });
    }

    Ok((easting as u32, northing as u32))
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?xi-u)
            ^
            (?P<letters>[a-z]{2})
            \s*
            (?:
                (?P<combined>[0-9]+)
            |
                (?P<first>[0-9]{0,5})\s+(?P<second>[0-9]{0,5})
            )
            $",
        )
        .expect("grid reference pattern is valid")
    })
}

/// Right-pads a digit run to full precision, e.g. `"37"` → 37000.
fn pad_digits(digits: &str) -> i64 {
    digits
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(FULL_PRECISION)
        .fold(0, |acc, d| acc * 10 + (d - b'0') as i64)
}

/// (column, row) of a letter in the lookup grid, rows counted from the south.
fn letter_position(letter: u8) -> Option<(i64, i64)> {
    LETTER_ROWS.iter().enumerate().find_map(|(row, letters)| {
        letters
            .iter()
            .position(|&l| l == letter)
            .map(|col| (col as i64, row as i64))
    })
}

fn letter_at(col: i64, row: i64) -> Option<char> {
    if !(0..5).contains(&col) || !(0..5).contains(&row) {
        return None;
    }
    Some(LETTER_ROWS[row as usize][col as usize] as char)
}

fn square_code(easting: i64, northing: i64) -> Option<String> {
    if easting < 0 || northing < 0 {
        return None;
    }
    let square = (easting / SQUARE_SIZE, northing / SQUARE_SIZE);
    let major = letter_at(square.0 / 5 + ORIGIN.0, square.1 / 5 + ORIGIN.1)?;
    let minor = letter_at(square.0 % 5, square.1 % 5)?;
    Some(format!("{}{}", major, minor))
}
