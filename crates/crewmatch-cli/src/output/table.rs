use crewmatch_core::availability::{Extraction, ExtractionDiagnostics};
use crewmatch_core::model::{Day, PilotCode};
use crewmatch_core::DayPlan;

fn codes(pilots: &[PilotCode]) -> String {
    if pilots.is_empty() {
        return "-".into();
    }
    pilots
        .iter()
        .map(PilotCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_days(extraction: &Extraction) {
    println!("Days detected: {}\n", extraction.days.len());
    for day in &extraction.days {
        let pilots = extraction.pilots_on(*day);
        println!("  {:>2}  {:>3} available  {}", day.number(), pilots.len(), codes(&pilots));
    }
    println!();
    print_diagnostics(&extraction.diagnostics);
}

pub fn print_availability(day: Day, pilots: &[PilotCode], diagnostics: &ExtractionDiagnostics) {
    println!("=== Day {} ===\n", day);
    println!("  Available ({}): {}\n", pilots.len(), codes(pilots));
    print_diagnostics(diagnostics);
}

pub fn print_plan(plan: &DayPlan) {
    println!("=== Pairings for day {} ===\n", plan.day);
    println!("  PICs available:   {}", plan.metrics.pics_available);
    println!("  SICs available:   {}", plan.metrics.sics_available);
    println!("  Crewed aircraft:  {}\n", plan.metrics.crewed_aircraft);

    if plan.pairings.is_empty() {
        println!("  No pairings possible.\n");
    } else {
        println!("  {:<6} {:<6}", "PIC", "SIC");
        for pairing in &plan.pairings {
            println!("  {:<6} {:<6}", pairing.pic, pairing.sic);
        }
        println!();
    }

    let paired: Vec<&PilotCode> = plan
        .pairings
        .iter()
        .flat_map(|p| [&p.pic, &p.sic])
        .collect();
    let unmatched: Vec<PilotCode> = plan
        .pics
        .iter()
        .chain(&plan.sics)
        .filter(|p| !paired.contains(p))
        .cloned()
        .collect();
    if !unmatched.is_empty() {
        println!("  Unmatched: {}", codes(&unmatched));
    }
    if !plan.unroled.is_empty() {
        println!("  No role (not paired): {}", codes(&plan.unroled));
    }
}

pub fn print_diagnostics(d: &ExtractionDiagnostics) {
    println!(
        "  Markers: {} found, {} credited, {} rejected",
        d.markers_found,
        d.markers_credited,
        d.markers_rejected()
    );
    if d.pages_without_days > 0 {
        println!(
            "  {} of {} page(s) had no day header",
            d.pages_without_days, d.pages_scanned
        );
    }
    if d.tables_without_days > 0 {
        println!("  {} table(s) without a day header", d.tables_without_days);
    }
    if d.rows_without_pilot > 0 {
        println!("  {} row(s) with markers but no pilot code", d.rows_without_pilot);
    }
    if d.markers_without_day > 0 {
        println!("  {} marker(s) without a day column", d.markers_without_day);
    }
    if d.markers_without_pilot_row > 0 || d.markers_too_far > 0 {
        println!(
            "  {} marker(s) with no pilot row above, {} too far from it",
            d.markers_without_pilot_row, d.markers_too_far
        );
    }
    if d.markers_on_labeled_row > 0 {
        println!(
            "  {} marker(s) on a labeled row credited to the pilot above",
            d.markers_on_labeled_row
        );
    }
}
