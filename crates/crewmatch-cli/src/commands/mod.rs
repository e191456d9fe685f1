pub mod availability;
pub mod days;
pub mod pair;
pub mod profiles;

use crewmatch_core::availability::Extraction;
use crewmatch_core::config::{load_preset, load_profile, ExtractionProfile, Strategy};
use crewmatch_core::error::CrewError;
use crewmatch_core::extraction::extractor_for_path;
use std::path::Path;

use crate::RosterArgs;

/// Built-in profile for a roster file when none is given.
fn default_preset(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "docx" => "docx-grid",
        "csv" | "xlsx" => "sheet-grid",
        "png" | "jpg" | "jpeg" | "tif" | "tiff" => "scan-ocr",
        _ => crewmatch_core::config::DEFAULT_PRESET,
    }
}

/// The profile selected on the command line, with flag overrides applied.
pub fn resolve_profile(args: &RosterArgs) -> Result<ExtractionProfile, CrewError> {
    let mut profile = match (&args.profile_file, &args.profile) {
        (Some(path), _) => load_profile(path)?,
        (None, Some(name)) => load_preset(name)?,
        (None, None) => load_preset(default_preset(&args.roster))?,
    };

    if let Some(marker) = &args.marker {
        profile.marker = marker.clone();
    }
    if let Some(strategy) = &args.strategy {
        profile.strategy = Strategy::from_str_loose(strategy).ok_or_else(|| {
            CrewError::ProfileInvalid(format!(
                "unknown strategy '{strategy}'. Expected same_row, nearest_row_above, grid_table or recognized_text"
            ))
        })?;
    }
    if let Some(tolerance) = args.row_tolerance {
        profile.row_tolerance = tolerance;
    }
    if let Some(distance) = args.max_row_distance {
        profile.max_row_distance = distance;
    }

    tracing::debug!(profile = %profile.name, strategy = %profile.strategy, "profile resolved");
    Ok(profile)
}

/// Read the roster and run extraction with the given profile.
pub fn extract(args: &RosterArgs, profile: &ExtractionProfile) -> Result<Extraction, CrewError> {
    let bytes = std::fs::read(&args.roster)?;
    let extractor = extractor_for_path(&args.roster, profile.strategy)?;
    crewmatch_core::extract_availability(&bytes, extractor.as_ref(), profile)
}
