use crate::output;
use crate::RosterArgs;
use crewmatch_core::error::CrewError;
use crewmatch_core::trace::ExtractionTrace;
use std::path::{Path, PathBuf};

pub fn run(args: &RosterArgs, day: &str, trace_file: Option<PathBuf>) -> Result<(), CrewError> {
    let mut profile = super::resolve_profile(args)?;
    if trace_file.is_some() {
        profile.trace = true;
    }

    let extraction = match super::extract(args, &profile) {
        Ok(extraction) => extraction,
        Err(CrewError::NoDaysDetected { extraction }) => {
            // the trace matters most when nothing was found
            if let (Some(path), Some(trace)) = (&trace_file, &extraction.trace) {
                write_trace(path, trace)?;
            }
            return Err(CrewError::NoDaysDetected { extraction });
        }
        Err(e) => return Err(e),
    };

    if let (Some(path), Some(trace)) = (&trace_file, &extraction.trace) {
        write_trace(path, trace)?;
    }

    let day = crewmatch_core::resolve_day(&extraction, day)?;
    let pilots = extraction.pilots_on(day);

    match args.output.as_str() {
        "json" => output::json::print(&serde_json::json!({
            "day": day,
            "pilots": pilots,
            "diagnostics": extraction.diagnostics,
        })),
        _ => {
            output::table::print_availability(day, &pilots, &extraction.diagnostics);
            Ok(())
        }
    }
}

fn write_trace(path: &Path, trace: &ExtractionTrace) -> Result<(), CrewError> {
    std::fs::write(path, serde_json::to_string_pretty(trace)?)?;
    eprintln!(
        "Trace with {} decision(s) written to {}",
        trace.decisions.len(),
        path.display()
    );
    Ok(())
}
