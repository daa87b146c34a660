//! Catalog Builder: derives the navigable model → level → correction lookup
//! from a flat list of [`LayerRecord`]s.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{Category, LayerRecord};

/// Correction dataset that wins whenever it is among the candidates.
pub const PREFERRED_CORRECTION: &str = "hand_2000";
/// Level chosen when a layer's previous level is not available.
pub const DEFAULT_LEVEL: &str = "5m";

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Derived lookup structures. Pure output of [`build_catalog`]; never mutated
/// in place.
///
/// Every model in `model_list` has an entry in `levels_by_model` (possibly
/// empty), and every `(model, level)` pair listed there has exactly one entry
/// in `correction_by_model_level` (possibly the empty string).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Distinct terrain model identifiers, alphabetical.
    pub model_list: Vec<String>,
    /// Distinct levels per model, ascending by numeric magnitude.
    pub levels_by_model: BTreeMap<String, Vec<String>>,
    pub correction_by_model_level: BTreeMap<String, BTreeMap<String, String>>,
}

impl Catalog {
    /// Levels available for `model`; empty for unknown models.
    pub fn levels(&self, model: &str) -> &[String] {
        self.levels_by_model
            .get(model)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolved correction dataset for a `(model, level)` pair.
    pub fn correction_for(&self, model: &str, level: &str) -> Option<&str> {
        self.correction_by_model_level
            .get(model)?
            .get(level)
            .map(String::as_str)
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.model_list.binary_search_by(|m| m.as_str().cmp(model)).is_ok()
    }

    /// First model (alphabetically) that has at least one flood level.
    pub fn first_model_with_levels(&self) -> Option<&str> {
        self.levels_by_model
            .iter()
            .find(|(_, levels)| !levels.is_empty())
            .map(|(model, _)| model.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.model_list.is_empty() && self.levels_by_model.is_empty()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Build the catalog from a flat record list.
///
/// Records of unrecognised categories are ignored. A terrain record needs a
/// non-empty `name`; a flood-scenario record needs non-empty `base_model` and
/// `level`, and a missing correction is recorded as the empty string. The
/// result does not depend on input order.
pub fn build_catalog(records: &[LayerRecord]) -> Catalog {
    let mut models: BTreeSet<String> = BTreeSet::new();
    // model → level → candidate corrections
    let mut candidates: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        match &record.category {
            Category::Terrain => match non_empty(&record.name) {
                Some(name) => {
                    models.insert(name.to_owned());
                }
                None => debug!(index, "terrain record without a name skipped"),
            },
            Category::FloodScenario => {
                let (Some(model), Some(level)) =
                    (non_empty(&record.base_model), non_empty(&record.level))
                else {
                    debug!(index, "flood scenario record without model or level skipped");
                    continue;
                };
                let correction = non_empty(&record.correction_dataset).unwrap_or("");
                candidates
                    .entry(model.to_owned())
                    .or_default()
                    .entry(level.to_owned())
                    .or_default()
                    .insert(correction.to_owned());
            }
            Category::Other(_) => {}
        }
    }

    let mut levels_by_model: BTreeMap<String, Vec<String>> = models
        .iter()
        .map(|m| (m.clone(), Vec::new()))
        .collect();
    let mut correction_by_model_level = BTreeMap::new();

    for (model, by_level) in candidates {
        let mut levels: Vec<String> = by_level.keys().cloned().collect();
        levels.sort_by(|a, b| compare_levels(a, b));

        let corrections: BTreeMap<String, String> = by_level
            .into_iter()
            .map(|(level, set)| (level, choose_correction(&set)))
            .collect();

        levels_by_model.insert(model.clone(), levels);
        correction_by_model_level.insert(model, corrections);
    }

    Catalog {
        model_list: models.into_iter().collect(),
        levels_by_model,
        correction_by_model_level,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `hand_2000` if present, else the smallest non-empty candidate, else "".
fn choose_correction(candidates: &BTreeSet<String>) -> String {
    if candidates.contains(PREFERRED_CORRECTION) {
        return PREFERRED_CORRECTION.to_owned();
    }
    candidates
        .iter()
        .find(|c| !c.is_empty())
        .cloned()
        .unwrap_or_default()
}

// ── Levels ────────────────────────────────────────────────────────────────────

/// Numeric magnitude of a level string such as `"5m"` or `"0.5M"`.
///
/// A trailing unit is dropped, then every character other than digits, `.`
/// and `-`. Anything that still fails to parse is NaN.
pub fn level_magnitude(level: &str) -> f64 {
    let trimmed = level.trim();
    let without_unit = trimmed
        .strip_suffix(|c: char| c.eq_ignore_ascii_case(&'m'))
        .unwrap_or(trimmed);
    let numeric: String = without_unit
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    numeric.parse().unwrap_or(f64::NAN)
}

/// Total order on level strings: ascending magnitude, NaN last, ties by text.
pub fn compare_levels(a: &str, b: &str) -> Ordering {
    let (ma, mb) = (level_magnitude(a), level_magnitude(b));
    let by_magnitude = match (ma.is_nan(), mb.is_nan()) {
        (false, false) => ma.total_cmp(&mb),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    };
    by_magnitude.then_with(|| a.cmp(b))
}

/// Default-level policy for a layer whose model just changed.
///
/// Keeps `previous` when the new model offers it, else falls back to
/// [`DEFAULT_LEVEL`], else the lowest level, else nothing.
pub fn resolve_level(levels: &[String], previous: Option<&str>) -> Option<String> {
    if let Some(prev) = previous.filter(|p| levels.iter().any(|l| l == p)) {
        return Some(prev.to_owned());
    }
    if levels.iter().any(|l| l == DEFAULT_LEVEL) {
        return Some(DEFAULT_LEVEL.to_owned());
    }
    levels.first().cloned()
}
