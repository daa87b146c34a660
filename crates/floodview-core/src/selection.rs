//! Explicit, serializable selection state for the three raster layers: one
//! terrain layer and two flood-depth comparison layers. Owned by
//! [`crate::viewer::ViewerController`]; every mutation that depends on the
//! catalog takes it as an argument.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{resolve_level, Catalog};
use crate::tiles::StretchRange;

pub const DEFAULT_TERRAIN_COLORMAP: &str = "terrain";
pub const DEFAULT_FLOOD_COLORMAP: &str = "blues";

/// Number of side-by-side flood comparison layers.
pub const COMPARISON_LAYERS: usize = 2;

// ── Layer ids ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerId {
    Terrain,
    ComparisonA,
    ComparisonB,
}

impl LayerId {
    pub const ALL: [LayerId; 3] = [Self::Terrain, Self::ComparisonA, Self::ComparisonB];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::ComparisonA => "comparison-a",
            Self::ComparisonB => "comparison-b",
        }
    }

    /// Index into [`ViewerSelection::comparisons`], `None` for terrain.
    pub fn comparison_index(self) -> Option<usize> {
        match self {
            Self::Terrain => None,
            Self::ComparisonA => Some(0),
            Self::ComparisonB => Some(1),
        }
    }

    pub fn comparison(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::ComparisonA),
            1 => Some(Self::ComparisonB),
            _ => None,
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown layer id `{s}`"))
    }
}

// ── Terrain layer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainLayer {
    pub model: String,
    pub visible: bool,
    pub opacity: f64,
    pub colormap: String,
    pub stretch: StretchRange,
}

impl Default for TerrainLayer {
    fn default() -> Self {
        Self {
            model: String::new(),
            visible: true,
            opacity: 1.0,
            colormap: DEFAULT_TERRAIN_COLORMAP.to_owned(),
            stretch: StretchRange::new(0.0, 3000.0),
        }
    }
}

impl TerrainLayer {
    /// Returns false (and leaves the layer alone) for unknown models.
    pub fn select_model(&mut self, catalog: &Catalog, model: &str) -> bool {
        if !catalog.has_model(model) {
            return false;
        }
        self.model = model.to_owned();
        true
    }

    /// Re-point at a model the catalog still knows, falling back to the first.
    pub fn revalidate(&mut self, catalog: &Catalog) {
        if !catalog.has_model(&self.model) {
            self.model = catalog.model_list.first().cloned().unwrap_or_default();
        }
    }

    /// The selection values that feed the tile URL.
    pub fn url_key(&self) -> (String, String, StretchRange) {
        (self.model.clone(), self.colormap.clone(), self.stretch)
    }
}

// ── Flood layer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodLayer {
    pub model: String,
    /// Empty when the model has no levels.
    pub level: String,
    /// Resolved from the catalog for `(model, level)`.
    pub correction: String,
    pub visible: bool,
    pub opacity: f64,
    pub colormap: String,
    pub stretch: StretchRange,
    /// Draw in a single fixed hue instead of `colormap`.
    pub pure_color: bool,
}

impl Default for FloodLayer {
    fn default() -> Self {
        Self {
            model: String::new(),
            level: String::new(),
            correction: String::new(),
            visible: true,
            opacity: 0.7,
            colormap: DEFAULT_FLOOD_COLORMAP.to_owned(),
            stretch: StretchRange::new(0.0, 5.0),
            pure_color: false,
        }
    }
}

impl FloodLayer {
    /// Switch model, keeping the current level if the new model offers it and
    /// otherwise applying the default-level policy.
    pub fn select_model(&mut self, catalog: &Catalog, model: &str) {
        let levels = catalog.levels(model);
        let previous = (!self.level.is_empty()).then_some(self.level.as_str());
        self.level = resolve_level(levels, previous).unwrap_or_default();
        self.model = model.to_owned();
        self.refresh_correction(catalog);
    }

    /// Returns false (and leaves the layer alone) if `level` is not offered
    /// for the current model.
    pub fn select_level(&mut self, catalog: &Catalog, level: &str) -> bool {
        if !catalog.levels(&self.model).iter().any(|l| l == level) {
            return false;
        }
        self.level = level.to_owned();
        self.refresh_correction(catalog);
        true
    }

    /// Re-apply the model to a (possibly new) catalog. Models the catalog no
    /// longer has fall back to the first model with levels.
    pub fn revalidate(&mut self, catalog: &Catalog) {
        let model = if catalog.levels(&self.model).is_empty() {
            catalog
                .first_model_with_levels()
                .unwrap_or(self.model.as_str())
                .to_owned()
        } else {
            self.model.clone()
        };
        self.select_model(catalog, &model);
    }

    fn refresh_correction(&mut self, catalog: &Catalog) {
        self.correction = catalog
            .correction_for(&self.model, &self.level)
            .unwrap_or_default()
            .to_owned();
    }

    /// A URL is only worth building once model, level and correction are known.
    pub fn is_complete(&self) -> bool {
        !self.model.is_empty() && !self.level.is_empty() && !self.correction.is_empty()
    }

    pub fn url_key(&self) -> FloodUrlKey {
        FloodUrlKey {
            model: self.model.clone(),
            correction: self.correction.clone(),
            level: self.level.clone(),
            colormap: self.colormap.clone(),
            stretch: self.stretch,
            pure_color: self.pure_color,
        }
    }
}

/// The selection values that feed a flood tile URL.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodUrlKey {
    pub model: String,
    pub correction: String,
    pub level: String,
    pub colormap: String,
    pub stretch: StretchRange,
    pub pure_color: bool,
}

// ── Whole selection ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSelection {
    pub terrain: TerrainLayer,
    pub comparisons: [FloodLayer; COMPARISON_LAYERS],
}

impl ViewerSelection {
    /// Starting state for a catalog: first terrain model, both comparisons on
    /// the first model with levels. The second comparison starts hidden and in
    /// pure colour so it reads clearly over the first when toggled on.
    pub fn initial(catalog: &Catalog) -> Self {
        let mut selection = Self::default();
        selection.comparisons[1].visible = false;
        selection.comparisons[1].pure_color = true;
        selection.revalidate(catalog);
        selection
    }

    pub fn revalidate(&mut self, catalog: &Catalog) {
        self.terrain.revalidate(catalog);
        for layer in &mut self.comparisons {
            layer.revalidate(catalog);
        }
    }

    pub fn comparison_mut(&mut self, index: usize) -> Option<&mut FloodLayer> {
        self.comparisons.get_mut(index)
    }

    pub fn is_visible(&self, id: LayerId) -> bool {
        match id.comparison_index() {
            None => self.terrain.visible,
            Some(i) => self.comparisons[i].visible,
        }
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        match id.comparison_index() {
            None => self.terrain.visible = visible,
            Some(i) => self.comparisons[i].visible = visible,
        }
    }

    /// Clamped to [0, 1]; NaN is ignored.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) {
        if opacity.is_nan() {
            return;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        match id.comparison_index() {
            None => self.terrain.opacity = opacity,
            Some(i) => self.comparisons[i].opacity = opacity,
        }
    }

    pub fn set_colormap(&mut self, id: LayerId, colormap: &str) {
        match id.comparison_index() {
            None => self.terrain.colormap = colormap.to_owned(),
            Some(i) => self.comparisons[i].colormap = colormap.to_owned(),
        }
    }

    pub fn set_stretch(&mut self, id: LayerId, stretch: StretchRange) {
        match id.comparison_index() {
            None => self.terrain.stretch = stretch,
            Some(i) => self.comparisons[i].stretch = stretch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_catalog;
    use crate::record::LayerRecord;

    fn catalog() -> Catalog {
        build_catalog(&[
            LayerRecord::terrain("alos_dem"),
            LayerRecord::terrain("cop30"),
            LayerRecord::terrain("srtm"),
            LayerRecord::flood_scenario("alos_dem", Some("hand_2000"), "1m"),
            LayerRecord::flood_scenario("alos_dem", Some("hand_2000"), "5m"),
            LayerRecord::flood_scenario("alos_dem", Some("hand_500"), "10m"),
            LayerRecord::flood_scenario("cop30", Some("hand_100"), "2m"),
            LayerRecord::flood_scenario("cop30", Some("hand_100"), "3m"),
        ])
    }

    #[test]
    fn initial_selection_picks_first_models_and_default_level() {
        let sel = ViewerSelection::initial(&catalog());
        assert_eq!(sel.terrain.model, "alos_dem");
        for layer in &sel.comparisons {
            assert_eq!(layer.model, "alos_dem");
            assert_eq!(layer.level, "5m");
            assert_eq!(layer.correction, "hand_2000");
        }
        assert!(sel.is_visible(LayerId::ComparisonA));
        assert!(!sel.is_visible(LayerId::ComparisonB));
        assert!(sel.comparisons[1].pure_color);
    }

    #[test]
    fn model_switch_keeps_level_when_available() {
        let cat = catalog();
        let mut layer = FloodLayer::default();
        layer.select_model(&cat, "alos_dem");
        assert!(layer.select_level(&cat, "10m"));
        assert_eq!(layer.correction, "hand_500");

        layer.select_model(&cat, "cop30");
        // 10m is not offered for cop30 and neither is 5m: first level wins.
        assert_eq!(layer.level, "2m");
        assert_eq!(layer.correction, "hand_100");

        assert!(layer.select_level(&cat, "3m"));
        layer.select_model(&cat, "alos_dem");
        assert_eq!(layer.level, "5m", "3m missing for alos_dem, default applies");
    }

    #[test]
    fn model_without_levels_leaves_layer_incomplete() {
        let cat = catalog();
        let mut layer = FloodLayer::default();
        layer.select_model(&cat, "srtm");
        assert_eq!(layer.level, "");
        assert_eq!(layer.correction, "");
        assert!(!layer.is_complete());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let cat = catalog();
        let mut layer = FloodLayer::default();
        layer.select_model(&cat, "alos_dem");
        assert!(!layer.select_level(&cat, "2m"));
        assert_eq!(layer.level, "5m");
    }

    #[test]
    fn terrain_rejects_unknown_model() {
        let cat = catalog();
        let mut terrain = TerrainLayer::default();
        assert!(terrain.select_model(&cat, "cop30"));
        assert!(!terrain.select_model(&cat, "nasadem"));
        assert_eq!(terrain.model, "cop30");
    }

    #[test]
    fn opacity_is_clamped_and_nan_ignored() {
        let mut sel = ViewerSelection::initial(&catalog());
        sel.set_opacity(LayerId::Terrain, 1.7);
        assert_eq!(sel.terrain.opacity, 1.0);
        sel.set_opacity(LayerId::ComparisonB, -0.2);
        assert_eq!(sel.comparisons[1].opacity, 0.0);
        sel.set_opacity(LayerId::ComparisonB, f64::NAN);
        assert_eq!(sel.comparisons[1].opacity, 0.0);
    }

    #[test]
    fn revalidate_moves_off_vanished_models() {
        let mut sel = ViewerSelection::initial(&catalog());
        let smaller = build_catalog(&[
            LayerRecord::terrain("cop30"),
            LayerRecord::flood_scenario("cop30", Some("hand_100"), "3m"),
        ]);
        sel.revalidate(&smaller);
        assert_eq!(sel.terrain.model, "cop30");
        assert_eq!(sel.comparisons[0].model, "cop30");
        assert_eq!(sel.comparisons[0].level, "3m");
    }

    #[test]
    fn layer_ids_round_trip_through_strings() {
        for id in LayerId::ALL {
            assert_eq!(id.as_str().parse::<LayerId>().unwrap(), id);
        }
        assert!("basemap".parse::<LayerId>().is_err());
    }

    #[test]
    fn selection_serializes_for_the_ui() {
        let sel = ViewerSelection::initial(&catalog());
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json["terrain"]["model"], "alos_dem");
        assert_eq!(json["comparisons"][1]["pureColor"], true);
        let back: ViewerSelection = serde_json::from_value(json).unwrap();
        assert_eq!(back, sel);
    }
}
