use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;

/// One raster layer as handed to the map engine: a `{z}/{x}/{y}` URL template
/// plus the rendering options it needs to fetch and composite the tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDescriptor {
    pub id: String,
    pub url_template: String,
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_size: u32,
}

impl TileDescriptor {
    pub fn new(
        id: impl Into<String>,
        url_template: impl Into<String>,
        opacity: f64,
        config: &ViewerConfig,
    ) -> Self {
        Self {
            id: id.into(),
            url_template: url_template.into(),
            opacity: opacity.clamp(0.0, 1.0),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            tile_size: config.tile_size,
        }
    }
}
