//! Origin URL templates.
//!
//! Templates understand three kinds of substitution:
//!
//! - `{a|b|c}` alternations, resolved by a uniform random choice every time
//!   the template is rendered (used to spread load over mirror hosts);
//! - named placeholders such as `{z}`, `{x}`, `{y}` or `{quadkey}`;
//! - positional `%s` markers, filled with the variables in order.
//!
//! Placeholders without a value are left untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use rand::seq::IndexedRandom;
use regex::{Captures, Regex};
use serde::Deserialize;

fn alternation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{((?:\w+\|)+\w+)\}").expect("valid alternation regex"))
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder regex"))
}

/// A single origin URL template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the template with the given `(name, value)` variables.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let chosen = alternation_regex().replace_all(&self.0, |caps: &Captures| {
            let options: Vec<&str> = caps[1].split('|').collect();
            options
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or_default()
                .to_string()
        });

        let named = placeholder_regex().replace_all(&chosen, |caps: &Captures| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        });

        let mut out = String::with_capacity(named.len());
        let mut values = vars.iter().map(|(_, value)| *value);
        let mut rest: &str = &named;
        while let Some(at) = rest.find("%s") {
            out.push_str(&rest[..at]);
            out.push_str(values.next().unwrap_or_default());
            rest = &rest[at + 2..];
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One template, or templates keyed by the first zoom they apply to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawOriginUrl")]
pub enum OriginUrl {
    Single(UrlTemplate),
    ByZoom(BTreeMap<u8, UrlTemplate>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOriginUrl {
    Single(String),
    ByZoom(BTreeMap<String, String>),
}

impl TryFrom<RawOriginUrl> for OriginUrl {
    type Error = String;

    fn try_from(raw: RawOriginUrl) -> Result<Self, Self::Error> {
        match raw {
            RawOriginUrl::Single(url) => Ok(OriginUrl::Single(UrlTemplate(url))),
            RawOriginUrl::ByZoom(map) => {
                if map.is_empty() {
                    return Err("url map must not be empty".to_string());
                }
                map.into_iter()
                    .map(|(zoom, url)| {
                        zoom.trim()
                            .parse::<u8>()
                            .map(|z| (z, UrlTemplate(url)))
                            .map_err(|_| format!("invalid zoom key '{}' in url map", zoom))
                    })
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(OriginUrl::ByZoom)
            }
        }
    }
}

impl OriginUrl {
    /// The template to use at `zoom`.
    ///
    /// A zoom map yields the entry with the greatest key not above `zoom`,
    /// falling back to the lowest key. Without a zoom the lowest key is used.
    pub fn for_zoom(&self, zoom: Option<u8>) -> Option<&UrlTemplate> {
        match self {
            OriginUrl::Single(template) => Some(template),
            OriginUrl::ByZoom(map) => zoom
                .and_then(|z| map.range(..=z).next_back().map(|(_, t)| t))
                .or_else(|| map.values().next()),
        }
    }
}

impl From<&str> for OriginUrl {
    fn from(template: &str) -> Self {
        OriginUrl::Single(UrlTemplate::new(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_placeholders() {
        let t = UrlTemplate::new("https://tiles.example/{z}/{x}/{y}.png");
        assert_eq!(
            t.render(&[("z", "12"), ("x", "2031"), ("y", "1358")]),
            "https://tiles.example/12/2031/1358.png"
        );
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        let t = UrlTemplate::new("https://tiles.example/{z}/{style}");
        assert_eq!(t.render(&[("z", "3")]), "https://tiles.example/3/{style}");
    }

    #[test]
    fn test_alternation_picks_one_option() {
        let t = UrlTemplate::new("https://{a|b|c}.tiles.example/{z}");
        for _ in 0..50 {
            let url = t.render(&[("z", "1")]);
            assert!(
                ["https://a.tiles.example/1", "https://b.tiles.example/1", "https://c.tiles.example/1"]
                    .contains(&url.as_str()),
                "unexpected {}",
                url
            );
        }
    }

    #[test]
    fn test_positional_markers() {
        let t = UrlTemplate::new("https://tiles.example/%s/%s.gif");
        assert_eq!(t.render(&[("tile", "abc"), ("rest", "def")]), "https://tiles.example/abc/def.gif");

        let t = UrlTemplate::new("https://tiles.example/%s/%s/%s");
        assert_eq!(t.render(&[("q", "0123")]), "https://tiles.example/0123//");
    }

    #[test]
    fn test_for_zoom_picks_greatest_key_below() {
        let url: OriginUrl =
            serde_json::from_str(r#"{"8": "low/{z}", "14": "high/{z}"}"#).unwrap();
        assert_eq!(url.for_zoom(Some(7)).unwrap().as_str(), "low/{z}");
        assert_eq!(url.for_zoom(Some(8)).unwrap().as_str(), "low/{z}");
        assert_eq!(url.for_zoom(Some(13)).unwrap().as_str(), "low/{z}");
        assert_eq!(url.for_zoom(Some(16)).unwrap().as_str(), "high/{z}");
        assert_eq!(url.for_zoom(None).unwrap().as_str(), "low/{z}");
    }

    #[test]
    fn test_deserialize_single() {
        let url: OriginUrl = serde_json::from_str(r#""https://tiles.example/{z}""#).unwrap();
        assert_eq!(url, OriginUrl::from("https://tiles.example/{z}"));
        assert_eq!(url.for_zoom(Some(3)).unwrap().as_str(), "https://tiles.example/{z}");
    }

    #[test]
    fn test_deserialize_rejects_bad_zoom_key() {
        assert!(serde_json::from_str::<OriginUrl>(r#"{"high": "x"}"#).is_err());
        assert!(serde_json::from_str::<OriginUrl>(r#"{}"#).is_err());
    }
}
