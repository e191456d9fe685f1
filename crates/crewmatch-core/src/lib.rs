pub mod availability;
pub mod config;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod model;
pub mod pairing;
pub mod tables;
pub mod trace;

use serde::Serialize;

use availability::{extract_document, Extraction};
use config::{validate_profile, ExtractionProfile};
use error::CrewError;
use extraction::DocumentExtractor;
use model::{Day, Pairing, PilotCode, RestrictionSet, RoleMap};
use pairing::{build_allowed_pairs, max_bipartite_pairings};

/// Main API entry point: extract the day -> pilots availability map from a
/// roster document.
///
/// Pages are read through `extractor` and scanned with the profile's
/// strategy. Rows and pages that yield nothing only show up in the
/// diagnostics; a document where no day was detected at all is an error that
/// still carries the extraction, so its diagnostics and trace can be reported.
pub fn extract_availability(
    bytes: &[u8],
    extractor: &dyn DocumentExtractor,
    profile: &ExtractionProfile,
) -> Result<Extraction, CrewError> {
    validate_profile(profile)?;

    let pages = extractor.extract_pages(bytes)?;
    tracing::debug!(
        backend = extractor.backend_name(),
        pages = pages.len(),
        profile = %profile.name,
        "document read"
    );

    let extraction = extract_document(&pages, profile);
    if extraction.days.is_empty() {
        return Err(CrewError::NoDaysDetected {
            extraction: Box::new(extraction),
        });
    }
    Ok(extraction)
}

/// Look up a day label ("7", "07") among the days detected in a roster.
pub fn resolve_day(extraction: &Extraction, label: &str) -> Result<Day, CrewError> {
    Day::parse(label)
        .filter(|day| extraction.days.contains(day))
        .ok_or_else(|| CrewError::UnknownDay {
            day: label.trim().to_string(),
            available: join_days(&extraction.days),
        })
}

fn join_days(days: &[Day]) -> String {
    days.iter().map(Day::to_string).collect::<Vec<_>>().join(", ")
}

/// Headline numbers for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMetrics {
    pub pics_available: usize,
    pub sics_available: usize,
    /// Size of the maximum matching.
    pub crewed_aircraft: usize,
}

/// Everything computed for one day: who is available, how they split by
/// role, which pairs are allowed and the maximum set of crews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlan {
    pub day: Day,
    pub available: Vec<PilotCode>,
    pub pics: Vec<PilotCode>,
    pub sics: Vec<PilotCode>,
    pub allowed: Vec<(PilotCode, PilotCode)>,
    pub pairings: Vec<Pairing>,
    /// Available but without a PIC/SIC role; reported, never paired.
    pub unroled: Vec<PilotCode>,
    pub metrics: DayMetrics,
}

/// Pair the crews available on `day`.
///
/// No PICs or no SICs is a normal result with zero crewed aircraft.
pub fn plan_day(
    extraction: &Extraction,
    day: Day,
    roles: &RoleMap,
    restrictions: &RestrictionSet,
) -> Result<DayPlan, CrewError> {
    if !extraction.days.contains(&day) {
        return Err(CrewError::UnknownDay {
            day: day.to_string(),
            available: join_days(&extraction.days),
        });
    }

    let available = extraction.pilots_on(day);
    let problem = build_allowed_pairs(&available, roles, restrictions);
    let pairings = max_bipartite_pairings(&problem.pics, &problem.sics, &problem.edges);

    if !problem.unroled.is_empty() {
        tracing::warn!(
            day = %day,
            pilots = ?problem.unroled.iter().map(PilotCode::as_str).collect::<Vec<_>>(),
            "available pilots without a PIC/SIC role"
        );
    }

    let metrics = DayMetrics {
        pics_available: problem.pics.len(),
        sics_available: problem.sics.len(),
        crewed_aircraft: pairings.len(),
    };
    tracing::info!(
        day = %day,
        available = available.len(),
        pics = metrics.pics_available,
        sics = metrics.sics_available,
        allowed = problem.edges.len(),
        crewed = metrics.crewed_aircraft,
        "day planned"
    );

    Ok(DayPlan {
        day,
        available,
        pics: problem.pics,
        sics: problem.sics,
        allowed: problem.edges,
        pairings,
        unroled: problem.unroled,
        metrics,
    })
}
