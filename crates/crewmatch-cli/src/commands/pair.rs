use crate::output;
use crate::RosterArgs;
use crewmatch_core::error::CrewError;
use crewmatch_core::model::RestrictionSet;
use crewmatch_core::tables::{load_restrictions, load_role_map, pairings_to_csv};
use std::path::{Path, PathBuf};

pub fn run(
    args: &RosterArgs,
    day: &str,
    roles_file: &Path,
    restrictions_file: Option<&Path>,
    out: Option<PathBuf>,
) -> Result<(), CrewError> {
    // Table errors surface before the (slower) document extraction.
    let roles = load_role_map(roles_file)?;
    let restrictions = match restrictions_file {
        Some(path) => load_restrictions(path)?,
        None => RestrictionSet::new(),
    };

    let profile = super::resolve_profile(args)?;
    let extraction = super::extract(args, &profile)?;
    let day = crewmatch_core::resolve_day(&extraction, day)?;
    let plan = crewmatch_core::plan_day(&extraction, day, &roles, &restrictions)?;

    match args.output.as_str() {
        "json" => output::json::print(&plan)?,
        _ => output::table::print_plan(&plan),
    }

    if let Some(out) = out {
        let path = if out.is_dir() {
            out.join(format!("pairings_day_{day}.csv"))
        } else {
            out
        };
        std::fs::write(&path, pairings_to_csv(&plan.pairings)?)?;
        eprintln!(
            "{} pairing(s) written to {}",
            plan.pairings.len(),
            path.display()
        );
    }

    Ok(())
}
