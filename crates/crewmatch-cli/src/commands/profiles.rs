use crewmatch_core::config::{self, Strategy};
use crewmatch_core::error::CrewError;
use std::path::Path;

pub fn list() -> Result<(), CrewError> {
    println!("Built-in extraction profiles:\n");
    for name in config::PRESETS {
        let profile = config::load_preset(name)?;
        let default_tag = if *name == config::DEFAULT_PRESET {
            " (default for pdf)"
        } else {
            ""
        };
        println!("  {:<12} {}{}", name, profile.strategy, default_tag);
        if let Some(ref desc) = profile.description {
            println!("               {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(name: &str) -> Result<(), CrewError> {
    let profile = config::load_preset(name)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), CrewError> {
    let profile = config::load_profile(file)?;

    println!("Profile '{}' is valid.", profile.name);
    println!("  {:<18}{}", "Strategy:", profile.strategy);
    println!("  {:<18}{}", "Marker:", profile.marker);
    if profile.strategy.is_geometric() {
        println!("  {:<18}{}", "Row tolerance:", profile.row_tolerance);
        println!("  {:<18}{}", "Header tolerance:", profile.header_tolerance);
    }
    if profile.strategy == Strategy::NearestRowAbove {
        println!("  {:<18}{}", "Max row distance:", profile.max_row_distance);
    }
    if !profile.known_pilots.is_empty() {
        println!("  {:<18}{}", "Known pilots:", profile.known_pilots.len());
    }

    Ok(())
}
