use crate::output;
use crate::RosterArgs;
use crewmatch_core::error::CrewError;

pub fn run(args: &RosterArgs) -> Result<(), CrewError> {
    let profile = super::resolve_profile(args)?;
    let extraction = super::extract(args, &profile)?;

    match args.output.as_str() {
        "json" => output::json::print(&serde_json::json!({
            "days": extraction.days,
            "diagnostics": extraction.diagnostics,
        })),
        _ => {
            output::table::print_days(&extraction);
            Ok(())
        }
    }
}
