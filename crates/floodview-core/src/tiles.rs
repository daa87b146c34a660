//! Tile URL Resolver: formats templated tile URLs for the remote single-band
//! raster service. Pure string formatting; nothing here checks that the
//! referenced dataset exists.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Placeholder consumed by the map engine. Never encoded or substituted here.
pub const TILE_PLACEHOLDER: &str = "{z}/{x}/{y}";
/// Single-hue palette used by the pure-colour override.
pub const PURE_COLOR_HEX: &str = "0000ff";

const TERRAIN_COLLECTION: &str = "terrain";
const FLOOD_COLLECTION: &str = "flood_scenarios";

/// Everything except the unreserved set of `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `s` as a single URL component.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Composite flood layer identifier: `<model>_<correction>_flood_<level>`.
pub fn flood_layer_id(model: &str, correction: &str, level: &str) -> String {
    format!("{model}_{correction}_flood_{level}")
}

// ── Stretch range ─────────────────────────────────────────────────────────────

/// Value range mapped onto the colormap's extremes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StretchRange {
    pub min: f64,
    pub max: f64,
}

impl StretchRange {
    /// Bounds given in the wrong order are swapped.
    pub fn new(a: f64, b: f64) -> Self {
        if a > b {
            Self { min: b, max: a }
        } else {
            Self { min: a, max: b }
        }
    }
}

/// `[min,max]` with no inner whitespace, numbers written the way a browser
/// stringifies them (`5` rather than `5.0`).
impl fmt::Display for StretchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", js_number(self.min), js_number(self.max))
    }
}

fn js_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_owned()
    } else if v.is_infinite() {
        let sign = if v > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if v == 0.0 {
        // also folds -0
        "0".to_owned()
    } else if v.abs() < 1e-6 || v.abs() >= 1e21 {
        // Shortest round-trip digits in exponent form; JS always signs the exponent.
        let exp = format!("{v:e}");
        match exp.split_once('e') {
            Some((mantissa, e)) if !e.starts_with('-') => format!("{mantissa}e+{e}"),
            _ => exp,
        }
    } else {
        v.to_string()
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// URL builder bound to one service base (dev proxy path or public origin).
/// The base is decided by [`crate::config::ViewerConfig`], never here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlResolver {
    base: String,
}

impl TileUrlResolver {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<base>/singleband/terrain/<model>/{z}/{x}/{y}.png?colormap=<c>&stretch_range=[min,max]`
    pub fn terrain_url(&self, model: &str, colormap: &str, stretch: StretchRange) -> String {
        format!(
            "{}/singleband/{TERRAIN_COLLECTION}/{}/{TILE_PLACEHOLDER}.png?colormap={}&stretch_range={stretch}",
            self.base,
            encode_component(model),
            encode_component(colormap),
        )
    }

    /// Flood-depth tile template for one `(model, correction, level)` scenario.
    ///
    /// With `pure_color` set the caller's colormap is ignored and the layer is
    /// drawn in [`PURE_COLOR_HEX`].
    pub fn flood_url(
        &self,
        model: &str,
        correction: &str,
        level: &str,
        colormap: &str,
        stretch: StretchRange,
        pure_color: bool,
    ) -> String {
        let layer = encode_component(&flood_layer_id(model, correction, level));
        let palette = if pure_color {
            format!("colormap=custom&colors={PURE_COLOR_HEX}")
        } else {
            format!("colormap={}", encode_component(colormap))
        };
        format!(
            "{}/singleband/{FLOOD_COLLECTION}/{layer}/{TILE_PLACEHOLDER}.png?{palette}&stretch_range={stretch}",
            self.base,
        )
    }
}
