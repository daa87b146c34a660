//! Layer catalog derivation and tile-URL resolution for the flood-depth map
//! viewer. Everything here is synchronous and side-effect free apart from
//! `tracing` events; the map engine, basemap provider and UI framework live
//! outside this crate and consume [`TileDescriptor`]s.

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod memo;
pub mod record;
pub mod selection;
pub mod tiles;
pub mod viewer;

pub use catalog::{build_catalog, level_magnitude, resolve_level, Catalog};
pub use config::{BasemapConfig, BuildProfile, ViewerConfig};
pub use descriptor::TileDescriptor;
pub use error::{ConfigError, RecordError};
pub use record::{parse_records, Category, LayerRecord};
pub use selection::{FloodLayer, LayerId, TerrainLayer, ViewerSelection};
pub use tiles::{StretchRange, TileUrlResolver};
pub use viewer::ViewerController;
