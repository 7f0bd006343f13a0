//! Zoom level selection.
//!
//! Each tile server advertises the zoom levels it can serve, either as an
//! explicit list or as a contiguous range. Requests for any other zoom are
//! snapped to the nearest allowed level.

use std::fmt;

use serde::Deserialize;

/// Zoom used when neither the request nor the server names one.
pub const DEFAULT_ZOOM: u8 = 14;

/// Zoom range of a server that configures neither `zoom` nor `zooms`.
pub const DEFAULT_MIN_ZOOM: u8 = 8;
pub const DEFAULT_MAX_ZOOM: u8 = 16;

/// The zoom levels a server can serve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawZooms")]
pub enum AllowedZooms {
    /// Ascending, without duplicates, never empty.
    List(Vec<u8>),
    /// Every level from `min` to `max` inclusive.
    Range { min: u8, max: u8 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawZooms {
    List(Vec<u8>),
    Range { min: u8, max: u8 },
}

impl TryFrom<RawZooms> for AllowedZooms {
    type Error = &'static str;

    fn try_from(raw: RawZooms) -> Result<Self, Self::Error> {
        match raw {
            RawZooms::List(list) => AllowedZooms::list(list).ok_or("zoom list must not be empty"),
            RawZooms::Range { min, max } => Ok(AllowedZooms::range(min, max)),
        }
    }
}

impl Default for AllowedZooms {
    fn default() -> Self {
        AllowedZooms::Range {
            min: DEFAULT_MIN_ZOOM,
            max: DEFAULT_MAX_ZOOM,
        }
    }
}

impl AllowedZooms {
    /// A list of levels, sorted and deduplicated. `None` when empty.
    pub fn list(mut levels: Vec<u8>) -> Option<Self> {
        if levels.is_empty() {
            return None;
        }
        levels.sort_unstable();
        levels.dedup();
        Some(AllowedZooms::List(levels))
    }

    pub fn range(min: u8, max: u8) -> Self {
        AllowedZooms::Range {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// The levels a server offers when it configures only a single `zoom`
    /// (or nothing at all).
    pub fn implied_by(zoom: Option<u8>) -> Self {
        match zoom {
            Some(z) => AllowedZooms::List(vec![z]),
            None => AllowedZooms::default(),
        }
    }

    pub fn min(&self) -> u8 {
        match self {
            AllowedZooms::List(levels) => levels.first().copied().unwrap_or(DEFAULT_ZOOM),
            AllowedZooms::Range { min, .. } => *min,
        }
    }

    pub fn max(&self) -> u8 {
        match self {
            AllowedZooms::List(levels) => levels.last().copied().unwrap_or(DEFAULT_ZOOM),
            AllowedZooms::Range { max, .. } => *max,
        }
    }

    pub fn contains(&self, zoom: u8) -> bool {
        match self {
            AllowedZooms::List(levels) => levels.binary_search(&zoom).is_ok(),
            AllowedZooms::Range { min, max } => (*min..=*max).contains(&zoom),
        }
    }

    /// Every allowed level, ascending.
    pub fn levels(&self) -> Vec<u8> {
        match self {
            AllowedZooms::List(levels) => levels.clone(),
            AllowedZooms::Range { min, max } => (*min..=*max).collect(),
        }
    }
}

impl fmt::Display for AllowedZooms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedZooms::List(levels) => {
                let parts: Vec<String> = levels.iter().map(u8::to_string).collect();
                write!(f, "[{}]", parts.join(","))
            }
            AllowedZooms::Range { min, max } => write!(f, "{}..={}", min, max),
        }
    }
}

/// Snaps `requested` to the nearest allowed zoom.
///
/// An absent or non-finite request yields `default`. Requests outside the
/// allowed levels clamp to the nearest end; between two listed levels the
/// closer one wins, and a tie goes to the lower level.
pub fn closest_zoom(requested: Option<f64>, allowed: &AllowedZooms, default: u8) -> u8 {
    let Some(zoom) = requested.filter(|z| z.is_finite()) else {
        return default;
    };

    let (lowest, highest) = (allowed.min(), allowed.max());
    if zoom <= lowest as f64 {
        return lowest;
    }
    if zoom >= highest as f64 {
        return highest;
    }

    match allowed {
        AllowedZooms::Range { .. } => zoom.round() as u8,
        AllowedZooms::List(levels) => {
            // First level not below the request; the clamps above keep it
            // strictly inside the list.
            let at = levels.partition_point(|&level| (level as f64) < zoom);
            let above = levels[at];
            if above as f64 == zoom {
                return above;
            }
            let below = levels[at - 1];
            if zoom - below as f64 <= above as f64 - zoom {
                below
            } else {
                above
            }
        }
    }
}
