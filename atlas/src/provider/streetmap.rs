//! Street-map tile token lookup.
//!
//! Street-map origins do not accept grid coordinates. A lookup service is
//! asked for the tile at `easting|northing`; the third line of its plain
//! text reply carries `<ignored>@<rest>@<tile>`, and the tile URL template
//! is then filled with `tile` and `rest` (positionally, or as `{tile}` and
//! `{rest}`).

use std::fmt;

use tracing::debug;

use super::{AsyncHttpClient, FetchError};
use crate::tile::{GridTile, UrlTemplate};

/// Provider-specific name of one street-map tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetMapToken {
    pub tile: String,
    pub rest: String,
}

impl StreetMapToken {
    /// Fills the origin URL template with this token.
    pub fn render(&self, url: &UrlTemplate) -> String {
        url.render(&[("tile", self.tile.as_str()), ("rest", self.rest.as_str())])
    }
}

impl fmt::Display for StreetMapToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.rest, self.tile)
    }
}

/// URL that resolves `tile` to its token.
pub fn lookup_url(template: &UrlTemplate, tile: &GridTile) -> String {
    let easting = tile.easting.to_string();
    let northing = tile.northing.to_string();
    let grid = format!("{}|{}", easting, northing);
    template.render(&[
        ("grid", grid.as_str()),
        ("easting", easting.as_str()),
        ("northing", northing.as_str()),
    ])
}

/// Extracts the token from a lookup reply.
pub fn parse_lookup_response(body: &str) -> Result<StreetMapToken, FetchError> {
    let line = body
        .lines()
        .nth(2)
        .ok_or_else(|| FetchError::Lookup("reply has fewer than three lines".to_string()))?
        .trim();

    let mut fields = line.split('@').skip(1);
    match (fields.next(), fields.next()) {
        (Some(rest), Some(tile)) if !tile.is_empty() => Ok(StreetMapToken {
            tile: tile.to_string(),
            rest: rest.to_string(),
        }),
        _ => Err(FetchError::Lookup(format!("unexpected reply line '{}'", line))),
    }
}

/// Resolves the token of `tile` through the lookup service.
pub async fn lookup_token<C: AsyncHttpClient>(
    client: &C,
    template: &UrlTemplate,
    tile: &GridTile,
) -> Result<StreetMapToken, FetchError> {
    let url = lookup_url(template, tile);
    let body = client.get(&url).await.map_err(|e| match e {
        FetchError::Http(msg) => FetchError::Lookup(msg),
        other => other,
    })?;
    let text = std::str::from_utf8(&body)
        .map_err(|_| FetchError::Lookup(format!("non-text reply from {}", url)))?;
    let token = parse_lookup_response(text)?;
    debug!(tile = %tile, token = %token, "resolved street-map tile");
    Ok(token)
}
