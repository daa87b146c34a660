use thiserror::Error;

/// Failures while reading a layer-record export.
///
/// Only the top-level shape is fatal; per-entry variants are reported by
/// [`crate::record::LayerRecord::from_value`] and turned into skips by
/// [`crate::record::parse_records`].
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record export is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record export must be a JSON array, found {0}")]
    NotAnArray(&'static str),

    #[error("entry is not a JSON object")]
    NotAnObject,

    #[error("field `{0}` must be a string")]
    FieldType(&'static str),
}

/// Invalid or incomplete viewer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown build profile `{0}` (expected `development` or `production`)")]
    UnknownProfile(String),

    #[error("production builds need an explicit tile base URL (FLOODVIEW_TILE_BASE_URL)")]
    MissingBaseUrl,

    #[error("invalid zoom range {min}..={max}")]
    ZoomRange { min: u8, max: u8 },

    #[error("tile size must be a non-zero power of two, got {0}")]
    TileSize(u32),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
