//! Layer records as exported from the backing index, plus the boundary parse
//! that turns loosely-typed JSON into them. Tolerance for junk input lives
//! here and nowhere else.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::RecordError;

// ── Category ──────────────────────────────────────────────────────────────────

/// Product family of a record. Unrecognised values are kept verbatim so they
/// can be reported, but never contribute to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Terrain,
    FloodScenario,
    Other(String),
}

impl Category {
    /// Case-insensitive match against the spellings seen in index exports.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "terrain" | "dem" => Self::Terrain,
            "flood_scenario" | "flood_scenarios" | "flood" => Self::FloodScenario,
            _ => Self::Other(raw.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Terrain => "terrain",
            Self::FloodScenario => "flood_scenario",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_owned()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LayerRecord ───────────────────────────────────────────────────────────────

/// One entry of the flat raster-product catalog.
///
/// Terrain records carry `name`; flood-scenario records carry `base_model`,
/// `level` and optionally `correction_dataset`. Which fields are required is
/// decided by [`crate::catalog::build_catalog`], not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "dem",
        alias = "base_model",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_model: Option<String>,
    #[serde(
        default,
        alias = "hand",
        alias = "correction_dataset",
        skip_serializing_if = "Option::is_none"
    )]
    pub correction_dataset: Option<String>,
    #[serde(default, alias = "flood", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl LayerRecord {
    pub fn terrain(name: impl Into<String>) -> Self {
        Self {
            category: Category::Terrain,
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn flood_scenario(
        base_model: impl Into<String>,
        correction_dataset: Option<&str>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            category: Category::FloodScenario,
            base_model: Some(base_model.into()),
            correction_dataset: correction_dataset.map(str::to_owned),
            level: Some(level.into()),
            ..Self::default()
        }
    }

    /// Parse a single export entry.
    ///
    /// Strings are trimmed and blank strings become `None`. `null` counts as
    /// absent; any other non-string type for a known field rejects the entry.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject)?;

        let category = string_field(obj, "category", &[])?
            .map(|raw| Category::parse(&raw))
            .unwrap_or_default();

        Ok(Self {
            category,
            name: string_field(obj, "name", &[])?,
            base_model: string_field(obj, "baseModel", &["dem", "base_model"])?,
            correction_dataset: string_field(
                obj,
                "correctionDataset",
                &["hand", "correction_dataset"],
            )?,
            level: string_field(obj, "level", &["flood"])?,
        })
    }
}

/// First present key wins, in declaration order (canonical name, then aliases).
fn string_field(
    obj: &Map<String, Value>,
    key: &'static str,
    aliases: &[&'static str],
) -> Result<Option<String>, RecordError> {
    for k in std::iter::once(&key).chain(aliases) {
        match obj.get(*k) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                return Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()));
            }
            Some(_) => return Err(RecordError::FieldType(key)),
        }
    }
    Ok(None)
}

/// Parse a flat record export. Entries that cannot be read are skipped with a
/// warning; only a malformed top level is an error.
pub fn parse_records(json: &str) -> Result<Vec<LayerRecord>, RecordError> {
    let root: Value = serde_json::from_str(json)?;
    let entries = match root {
        Value::Array(entries) => entries,
        other => return Err(RecordError::NotAnArray(json_kind(&other))),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match LayerRecord::from_value(entry) {
            Ok(record) => records.push(record),
            Err(e) => warn!(index, error = %e, "skipping unreadable layer record"),
        }
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
