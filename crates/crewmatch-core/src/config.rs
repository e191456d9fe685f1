//! Document-family extraction profiles.
//!
//! A profile picks the extraction strategy and its tuning knobs. Built-in
//! presets are embedded JSON; custom profiles are loaded from files and
//! validated the same way.

use crate::error::CrewError;
use crate::layout::ClusterMode;
use crate::model::PilotCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

const PDF_TABLE_JSON: &str = include_str!("../../../profiles/pdf-table.json");
const PDF_STACKED_JSON: &str = include_str!("../../../profiles/pdf-stacked.json");
const DOCX_GRID_JSON: &str = include_str!("../../../profiles/docx-grid.json");
const SHEET_GRID_JSON: &str = include_str!("../../../profiles/sheet-grid.json");
const SCAN_OCR_JSON: &str = include_str!("../../../profiles/scan-ocr.json");

/// Available built-in profiles.
pub const PRESETS: &[&str] = &["pdf-table", "pdf-stacked", "docx-grid", "sheet-grid", "scan-ocr"];

pub const DEFAULT_PRESET: &str = "pdf-table";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Pilot code and markers share one visual row.
    SameRow,
    /// Pilot declared on one row, markers on the unlabeled rows below it.
    NearestRowAbove,
    /// Explicit table grid; header cells give day columns by index.
    GridTable,
    /// Recognized text lines; "day marker" pairs matched per line.
    RecognizedText,
}

impl Strategy {
    pub fn from_str_loose(s: &str) -> Option<Strategy> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "same_row" | "row" => Some(Strategy::SameRow),
            "nearest_row_above" | "row_above" | "above" => Some(Strategy::NearestRowAbove),
            "grid_table" | "grid" | "table" => Some(Strategy::GridTable),
            "recognized_text" | "ocr" | "text" => Some(Strategy::RecognizedText),
            _ => None,
        }
    }

    pub fn is_geometric(self) -> bool {
        matches!(self, Strategy::SameRow | Strategy::NearestRowAbove)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SameRow => write!(f, "same_row"),
            Strategy::NearestRowAbove => write!(f, "nearest_row_above"),
            Strategy::GridTable => write!(f, "grid_table"),
            Strategy::RecognizedText => write!(f, "recognized_text"),
        }
    }
}

/// What to do when a labeling row carries more than one pilot code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiPilot {
    /// Credit every code found on the row.
    #[default]
    All,
    /// Credit only the leftmost code.
    First,
}

fn default_marker() -> String {
    "A".to_string()
}

fn default_tolerance() -> f32 {
    5.0
}

fn default_max_row_distance() -> f32 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub strategy: Strategy,
    /// Literal token meaning "available".
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Vertical tolerance for grouping content tokens into rows.
    #[serde(default = "default_tolerance")]
    pub row_tolerance: f32,
    /// Vertical tolerance for grouping day-number tokens into header rows.
    #[serde(default = "default_tolerance")]
    pub header_tolerance: f32,
    #[serde(default)]
    pub cluster_mode: ClusterMode,
    /// Largest vertical gap between a marker row and the pilot row above it
    /// (nearest-row-above only).
    #[serde(default = "default_max_row_distance")]
    pub max_row_distance: f32,
    #[serde(default)]
    pub multi_pilot: MultiPilot,
    /// If non-empty, only these codes are accepted as pilots.
    #[serde(default)]
    pub known_pilots: BTreeSet<PilotCode>,
    /// Uppercase tokens that look like codes but are not pilots (duty codes).
    #[serde(default)]
    pub ignored_codes: BTreeSet<String>,
    /// Record per-row decisions in the extraction trace.
    #[serde(default)]
    pub trace: bool,
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        ExtractionProfile {
            name: "default".into(),
            description: None,
            strategy: Strategy::SameRow,
            marker: default_marker(),
            row_tolerance: default_tolerance(),
            header_tolerance: default_tolerance(),
            cluster_mode: ClusterMode::default(),
            max_row_distance: default_max_row_distance(),
            multi_pilot: MultiPilot::default(),
            known_pilots: BTreeSet::new(),
            ignored_codes: BTreeSet::new(),
            trace: false,
        }
    }
}

impl ExtractionProfile {
    pub fn with_strategy(strategy: Strategy) -> Self {
        ExtractionProfile {
            strategy,
            ..Default::default()
        }
    }
}

/// Load a built-in profile by name.
pub fn load_preset(name: &str) -> Result<ExtractionProfile, CrewError> {
    let json = match name {
        "pdf-table" => PDF_TABLE_JSON,
        "pdf-stacked" => PDF_STACKED_JSON,
        "docx-grid" => DOCX_GRID_JSON,
        "sheet-grid" => SHEET_GRID_JSON,
        "scan-ocr" => SCAN_OCR_JSON,
        _ => {
            return Err(CrewError::ProfileInvalid(format!(
                "unknown profile '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    parse_profile_str(json)
}

/// Load a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<ExtractionProfile, CrewError> {
    let content = std::fs::read_to_string(path).map_err(|e| CrewError::ProfileLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let profile: ExtractionProfile =
        serde_json::from_str(&content).map_err(|e| CrewError::ProfileLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Parse a profile from a JSON string (no file path context).
pub fn parse_profile_str(json: &str) -> Result<ExtractionProfile, CrewError> {
    let profile: ExtractionProfile = serde_json::from_str(json)?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Validate that a profile is usable.
pub fn validate_profile(profile: &ExtractionProfile) -> Result<(), CrewError> {
    if profile.marker.trim().is_empty() {
        return Err(CrewError::ProfileInvalid("marker must not be empty".into()));
    }
    if profile.marker.split_whitespace().count() != 1 {
        return Err(CrewError::ProfileInvalid(format!(
            "marker '{}' must be a single token",
            profile.marker
        )));
    }

    for (field, value) in [
        ("row_tolerance", profile.row_tolerance),
        ("header_tolerance", profile.header_tolerance),
        ("max_row_distance", profile.max_row_distance),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(CrewError::ProfileInvalid(format!(
                "{field} must be a positive number, got {value}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_load() {
        for name in PRESETS {
            let profile = load_preset(name).unwrap();
            assert_eq!(&profile.name, name);
        }
    }

    #[test]
    fn test_preset_strategies() {
        assert_eq!(load_preset("pdf-table").unwrap().strategy, Strategy::SameRow);
        assert_eq!(load_preset("pdf-stacked").unwrap().strategy, Strategy::NearestRowAbove);
        assert_eq!(load_preset("docx-grid").unwrap().strategy, Strategy::GridTable);
        assert_eq!(load_preset("scan-ocr").unwrap().strategy, Strategy::RecognizedText);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let p = parse_profile_str(r#"{ "name": "mine", "strategy": "same_row" }"#).unwrap();
        assert_eq!(p.marker, "A");
        assert_eq!(p.row_tolerance, 5.0);
        assert_eq!(p.max_row_distance, 10.0);
        assert_eq!(p.multi_pilot, MultiPilot::All);
        assert_eq!(p.cluster_mode, ClusterMode::Gap);
        assert!(p.known_pilots.is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            r#"{ "name": "x", "strategy": "same_row", "marker": "" }"#,
            r#"{ "name": "x", "strategy": "same_row", "marker": "A B" }"#,
            r#"{ "name": "x", "strategy": "same_row", "row_tolerance": 0 }"#,
            r#"{ "name": "x", "strategy": "nearest_row_above", "max_row_distance": -1 }"#,
            r#"{ "name": "x", "strategy": "diagonal" }"#,
            r#"{ "name": "x", "strategy": "same_row", "known_pilots": ["TOOLONG"] }"#,
        ];
        for json in bad {
            assert!(parse_profile_str(json).is_err(), "accepted: {json}");
        }
    }

    #[test]
    fn test_strategy_loose_names() {
        assert_eq!(Strategy::from_str_loose("row-above"), Some(Strategy::NearestRowAbove));
        assert_eq!(Strategy::from_str_loose("GRID"), Some(Strategy::GridTable));
        assert_eq!(Strategy::from_str_loose("ocr"), Some(Strategy::RecognizedText));
        assert_eq!(Strategy::from_str_loose("nope"), None);
    }
}
