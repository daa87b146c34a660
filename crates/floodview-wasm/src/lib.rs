//! Browser bindings: the UI layer calls these on every selection change and
//! feeds the returned descriptors to the map engine.

use std::sync::Arc;

use floodview_core::{
    build_catalog, parse_records, resolve_level, LayerId, LayerRecord, StretchRange,
    TileUrlResolver, ViewerConfig, ViewerController,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn js_error(msg: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&msg.to_string()).into()
}

/// Plain JS objects rather than `Map`s, so the UI can index by key.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(js_error)
}

fn layer_id(id: &str) -> Result<LayerId, JsValue> {
    id.parse().map_err(js_error)
}

/// Derive `{ modelList, levelsByModel, correctionByModelLevel }` from a
/// record export.
#[wasm_bindgen(js_name = buildCatalog)]
pub fn build_catalog_js(records_json: &str) -> Result<JsValue, JsValue> {
    let records = parse_records(records_json).map_err(js_error)?;
    to_js(&build_catalog(&records))
}

#[wasm_bindgen(js_name = terrainUrl)]
pub fn terrain_url(base: &str, model: &str, colormap: &str, min: f64, max: f64) -> String {
    TileUrlResolver::new(base).terrain_url(model, colormap, StretchRange::new(min, max))
}

#[wasm_bindgen(js_name = floodUrl)]
#[allow(clippy::too_many_arguments)]
pub fn flood_url(
    base: &str,
    model: &str,
    correction: &str,
    level: &str,
    colormap: &str,
    min: f64,
    max: f64,
    pure_color: bool,
) -> String {
    TileUrlResolver::new(base).flood_url(
        model,
        correction,
        level,
        colormap,
        StretchRange::new(min, max),
        pure_color,
    )
}

/// Default-level policy. `levels_json` is a JSON array of level strings.
#[wasm_bindgen(js_name = resolveLevel)]
pub fn resolve_level_js(levels_json: &str, previous: Option<String>) -> Result<Option<String>, JsValue> {
    let levels: Vec<String> = serde_json::from_str(levels_json).map_err(js_error)?;
    Ok(resolve_level(&levels, previous.as_deref()))
}

/// Stateful viewer: owns the selection and memoizes catalog and URLs.
#[wasm_bindgen]
pub struct Viewer {
    inner: ViewerController,
}

#[wasm_bindgen]
impl Viewer {
    /// `config_json` may be empty for development defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(records_json: &str, config_json: &str) -> Result<Viewer, JsValue> {
        let records: Arc<[LayerRecord]> = parse_records(records_json).map_err(js_error)?.into();
        let config = if config_json.trim().is_empty() {
            ViewerConfig::default()
        } else {
            ViewerConfig::from_json(config_json).map_err(js_error)?
        };
        let inner = ViewerController::new(config, records).map_err(js_error)?;
        Ok(Viewer { inner })
    }

    #[wasm_bindgen(js_name = setRecords)]
    pub fn set_records(&mut self, records_json: &str) -> Result<(), JsValue> {
        let records: Arc<[LayerRecord]> = parse_records(records_json).map_err(js_error)?.into();
        self.inner.set_records(records);
        Ok(())
    }

    pub fn catalog(&mut self) -> Result<JsValue, JsValue> {
        to_js(self.inner.catalog())
    }

    pub fn selection(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.selection())
    }

    /// `null` when no basemap token is configured.
    pub fn basemap(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.basemap())
    }

    #[wasm_bindgen(js_name = selectTerrainModel)]
    pub fn select_terrain_model(&mut self, model: &str) -> bool {
        self.inner.select_terrain_model(model)
    }

    #[wasm_bindgen(js_name = selectFloodModel)]
    pub fn select_flood_model(&mut self, index: usize, model: &str) -> bool {
        self.inner.select_flood_model(index, model)
    }

    #[wasm_bindgen(js_name = selectFloodLevel)]
    pub fn select_flood_level(&mut self, index: usize, level: &str) -> bool {
        self.inner.select_flood_level(index, level)
    }

    #[wasm_bindgen(js_name = setPureColor)]
    pub fn set_pure_color(&mut self, index: usize, pure_color: bool) -> bool {
        self.inner.set_pure_color(index, pure_color)
    }

    #[wasm_bindgen(js_name = setVisible)]
    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), JsValue> {
        self.inner.set_visible(layer_id(id)?, visible);
        Ok(())
    }

    #[wasm_bindgen(js_name = setOpacity)]
    pub fn set_opacity(&mut self, id: &str, opacity: f64) -> Result<(), JsValue> {
        self.inner.set_opacity(layer_id(id)?, opacity);
        Ok(())
    }

    #[wasm_bindgen(js_name = setColormap)]
    pub fn set_colormap(&mut self, id: &str, colormap: &str) -> Result<(), JsValue> {
        self.inner.set_colormap(layer_id(id)?, colormap);
        Ok(())
    }

    #[wasm_bindgen(js_name = setStretch)]
    pub fn set_stretch(&mut self, id: &str, min: f64, max: f64) -> Result<(), JsValue> {
        self.inner.set_stretch(layer_id(id)?, StretchRange::new(min, max));
        Ok(())
    }

    /// Tile descriptors for the visible, complete layers.
    pub fn descriptors(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.descriptors())
    }
}
