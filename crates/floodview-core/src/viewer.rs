//! Single owner of the viewer's state: record list, memoized catalog,
//! selection, and memoized per-layer tile URLs. The UI calls the mutators on
//! every interaction and hands [`ViewerController::descriptors`] to the map
//! engine.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{build_catalog, Catalog};
use crate::config::{BasemapConfig, ViewerConfig};
use crate::descriptor::TileDescriptor;
use crate::error::ConfigError;
use crate::memo::Memo;
use crate::record::LayerRecord;
use crate::selection::{FloodUrlKey, LayerId, ViewerSelection, COMPARISON_LAYERS};
use crate::tiles::{StretchRange, TileUrlResolver};

/// Record list compared by identity: the catalog is rebuilt only when the
/// caller hands over a different list, not when an equal copy arrives.
#[derive(Debug, Clone)]
struct RecordsKey(Arc<[LayerRecord]>);

impl PartialEq for RecordsKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

type TerrainUrlKey = (String, String, StretchRange);

pub struct ViewerController {
    config: ViewerConfig,
    resolver: TileUrlResolver,
    records: Arc<[LayerRecord]>,
    catalog: Memo<RecordsKey, Catalog>,
    selection: ViewerSelection,
    terrain_url: Memo<TerrainUrlKey, String>,
    flood_urls: [Memo<FloodUrlKey, String>; COMPARISON_LAYERS],
}

/// Catalog for `records`, rebuilt only if the list identity changed.
fn current_catalog<'a>(
    memo: &'a mut Memo<RecordsKey, Catalog>,
    records: &Arc<[LayerRecord]>,
) -> &'a Catalog {
    memo.get_or_compute(RecordsKey(Arc::clone(records)), |key| {
        let catalog = build_catalog(&key.0);
        debug!(
            records = key.0.len(),
            models = catalog.model_list.len(),
            "catalog rebuilt"
        );
        catalog
    })
}

impl ViewerController {
    pub fn new(
        config: ViewerConfig,
        records: impl Into<Arc<[LayerRecord]>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolver = config.resolver()?;
        let records = records.into();
        let mut catalog = Memo::new();
        let selection = ViewerSelection::initial(current_catalog(&mut catalog, &records));

        Ok(Self {
            config,
            resolver,
            records,
            catalog,
            selection,
            terrain_url: Memo::new(),
            flood_urls: Default::default(),
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Replace the record list. Handing back the same `Arc` is a no-op.
    pub fn set_records(&mut self, records: impl Into<Arc<[LayerRecord]>>) {
        let records = records.into();
        if Arc::ptr_eq(&records, &self.records) {
            return;
        }
        self.records = records;
        let catalog = current_catalog(&mut self.catalog, &self.records);
        self.selection.revalidate(catalog);
    }

    pub fn records(&self) -> &Arc<[LayerRecord]> {
        &self.records
    }

    pub fn catalog(&mut self) -> &Catalog {
        current_catalog(&mut self.catalog, &self.records)
    }

    pub fn selection(&self) -> &ViewerSelection {
        &self.selection
    }

    /// Basemap settings, `None` when no token is configured. Raster layers
    /// are unaffected either way.
    pub fn basemap(&self) -> Option<BasemapConfig> {
        self.config.basemap()
    }

    // ── Selection mutators ──────────────────────────────────────────────────

    pub fn select_terrain_model(&mut self, model: &str) -> bool {
        let catalog = current_catalog(&mut self.catalog, &self.records);
        self.selection.terrain.select_model(catalog, model)
    }

    /// Returns false for an out-of-range index or a model the catalog lacks.
    pub fn select_flood_model(&mut self, index: usize, model: &str) -> bool {
        let catalog = current_catalog(&mut self.catalog, &self.records);
        if !catalog.levels_by_model.contains_key(model) {
            return false;
        }
        match self.selection.comparison_mut(index) {
            Some(layer) => {
                layer.select_model(catalog, model);
                true
            }
            None => false,
        }
    }

    pub fn select_flood_level(&mut self, index: usize, level: &str) -> bool {
        let catalog = current_catalog(&mut self.catalog, &self.records);
        self.selection
            .comparison_mut(index)
            .is_some_and(|layer| layer.select_level(catalog, level))
    }

    pub fn set_pure_color(&mut self, index: usize, pure_color: bool) -> bool {
        match self.selection.comparison_mut(index) {
            Some(layer) => {
                layer.pure_color = pure_color;
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        self.selection.set_visible(id, visible);
    }

    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) {
        self.selection.set_opacity(id, opacity);
    }

    pub fn set_colormap(&mut self, id: LayerId, colormap: &str) {
        self.selection.set_colormap(id, colormap);
    }

    pub fn set_stretch(&mut self, id: LayerId, stretch: StretchRange) {
        self.selection.set_stretch(id, stretch);
    }

    // ── Output ──────────────────────────────────────────────────────────────

    /// Descriptors for every visible layer whose selection is complete, in
    /// draw order (terrain first). Incomplete layers are left out rather than
    /// given a URL with an empty path segment.
    pub fn descriptors(&mut self) -> Vec<TileDescriptor> {
        let mut out = Vec::with_capacity(LayerId::ALL.len());

        let terrain = &self.selection.terrain;
        if terrain.visible && !terrain.model.is_empty() {
            let resolver = &self.resolver;
            let url = self
                .terrain_url
                .get_or_compute(terrain.url_key(), |(model, colormap, stretch)| {
                    debug!(layer = "terrain", %model, "tile url rebuilt");
                    resolver.terrain_url(model, colormap, *stretch)
                });
            out.push(TileDescriptor::new(
                LayerId::Terrain.as_str(),
                url.as_str(),
                terrain.opacity,
                &self.config,
            ));
        }

        for (index, (layer, memo)) in self
            .selection
            .comparisons
            .iter()
            .zip(self.flood_urls.iter_mut())
            .enumerate()
        {
            if !layer.visible || !layer.is_complete() {
                continue;
            }
            let Some(id) = LayerId::comparison(index) else {
                continue;
            };
            let resolver = &self.resolver;
            let url = memo.get_or_compute(layer.url_key(), |key| {
                debug!(
                    layer = id.as_str(),
                    model = %key.model,
                    level = %key.level,
                    "tile url rebuilt"
                );
                resolver.flood_url(
                    &key.model,
                    &key.correction,
                    &key.level,
                    &key.colormap,
                    key.stretch,
                    key.pure_color,
                )
            });
            out.push(TileDescriptor::new(
                id.as_str(),
                url.as_str(),
                layer.opacity,
                &self.config,
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Arc<[LayerRecord]> {
        vec![
            LayerRecord::terrain("alos_dem"),
            LayerRecord::terrain("cop30"),
            LayerRecord::flood_scenario("alos_dem", Some("hand_2000"), "5m"),
            LayerRecord::flood_scenario("alos_dem", Some("hand_500"), "5m"),
            LayerRecord::flood_scenario("alos_dem", Some("hand_2000"), "10m"),
            LayerRecord::flood_scenario("cop30", Some("hand_100"), "2m"),
        ]
        .into()
    }

    fn controller() -> ViewerController {
        ViewerController::new(ViewerConfig::default(), records()).unwrap()
    }

    #[test]
    fn initial_descriptors_cover_visible_layers() {
        let mut c = controller();
        let d = c.descriptors();
        let ids: Vec<&str> = d.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["terrain", "comparison-a"]);
        assert_eq!(
            d[0].url_template,
            "/tiles/singleband/terrain/alos_dem/{z}/{x}/{y}.png?colormap=terrain&stretch_range=[0,3000]"
        );
        assert_eq!(
            d[1].url_template,
            "/tiles/singleband/flood_scenarios/alos_dem_hand_2000_flood_5m/{z}/{x}/{y}.png\
             ?colormap=blues&stretch_range=[0,5]"
        );
        assert_eq!(d[1].tile_size, 256);
    }

    #[test]
    fn second_comparison_uses_pure_color_once_shown() {
        let mut c = controller();
        c.set_visible(LayerId::ComparisonB, true);
        let d = c.descriptors();
        assert_eq!(d.len(), 3);
        assert!(d[2].url_template.contains("colormap=custom&colors=0000ff"));
    }

    #[test]
    fn opacity_change_does_not_rebuild_urls() {
        let mut c = controller();
        c.descriptors();
        c.set_opacity(LayerId::Terrain, 0.4);
        c.set_opacity(LayerId::ComparisonA, 0.2);
        let d = c.descriptors();
        assert_eq!(d[0].opacity, 0.4);
        assert_eq!(d[1].opacity, 0.2);
        assert_eq!(c.terrain_url.computations(), 1);
        assert_eq!(c.flood_urls[0].computations(), 1);
    }

    #[test]
    fn level_change_rebuilds_only_that_layer() {
        let mut c = controller();
        c.descriptors();
        assert!(c.select_flood_level(0, "10m"));
        let d = c.descriptors();
        assert!(d[1].url_template.contains("alos_dem_hand_2000_flood_10m"));
        assert_eq!(c.terrain_url.computations(), 1);
        assert_eq!(c.flood_urls[0].computations(), 2);
    }

    #[test]
    fn hidden_and_incomplete_layers_are_suppressed() {
        let mut c = controller();
        c.set_visible(LayerId::Terrain, false);
        assert!(c.select_flood_model(0, "alos_dem"));
        let d = c.descriptors();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].id, "comparison-a");

        let empty: Arc<[LayerRecord]> = Vec::new().into();
        c.set_records(empty);
        assert!(c.descriptors().is_empty());
    }

    #[test]
    fn same_record_list_does_not_rebuild_catalog() {
        let recs = records();
        let mut c = ViewerController::new(ViewerConfig::default(), Arc::clone(&recs)).unwrap();
        c.set_records(Arc::clone(&recs));
        c.catalog();
        assert_eq!(c.catalog.computations(), 1);

        // An equal but distinct list is a new input.
        c.set_records(records());
        assert_eq!(c.catalog.computations(), 2);
    }

    #[test]
    fn invalid_selections_are_rejected() {
        let mut c = controller();
        assert!(!c.select_flood_model(0, "nasadem"));
        assert!(!c.select_flood_model(5, "cop30"));
        assert!(!c.select_flood_level(0, "7m"));
        assert!(!c.select_terrain_model("nasadem"));
        assert!(!c.set_pure_color(2, true));
        assert_eq!(c.selection().comparisons[0].level, "5m");
    }

    #[test]
    fn production_without_base_fails_to_start() {
        let config = ViewerConfig {
            profile: crate::config::BuildProfile::Production,
            ..ViewerConfig::default()
        };
        assert!(matches!(
            ViewerController::new(config, records()),
            Err(ConfigError::MissingBaseUrl)
        ));
    }
}
