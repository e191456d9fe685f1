//! Turning page content into a day -> pilots availability map.
//!
//! One pipeline, four strategies. Each page is scanned independently into a
//! `PageScan`; page results are merged by union, so pages never influence
//! each other. Heuristic misses (no day header, no pilot on a row, a marker
//! too far from its pilot row) are counted, never fatal.

pub mod grid_table;
pub mod nearest_row_above;
pub mod pilot;
pub mod recognized_text;
pub mod same_row;

use crate::config::{ExtractionProfile, Strategy};
use crate::extraction::PageContent;
use crate::layout::{cluster_rows, detect_day_columns};
use crate::model::{AvailabilityMap, Day, PilotCode};
use crate::trace::{ExtractionTrace, RowDecision, RowOutcome, TraceSeverity, TraceWarning};
use pilot::PilotMatcher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Counters for everything that reduced the yield of an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionDiagnostics {
    pub pages_scanned: usize,
    /// Pages that produced no day columns (or, for grids, no day header).
    pub pages_without_days: usize,
    pub tables_without_days: usize,
    /// Rows carrying markers but no recognizable pilot code.
    pub rows_without_pilot: usize,
    pub markers_found: usize,
    pub markers_credited: usize,
    pub markers_without_day: usize,
    pub markers_without_pilot_row: usize,
    pub markers_too_far: usize,
    /// Nearest-row-above: markers on a labeled row, credited to the labeled
    /// row above rather than the row's own pilot.
    #[serde(default)]
    pub markers_on_labeled_row: usize,
}

impl ExtractionDiagnostics {
    pub fn markers_rejected(&self) -> usize {
        self.markers_found - self.markers_credited
    }

    fn absorb(&mut self, other: &ExtractionDiagnostics) {
        self.pages_scanned += other.pages_scanned;
        self.pages_without_days += other.pages_without_days;
        self.tables_without_days += other.tables_without_days;
        self.rows_without_pilot += other.rows_without_pilot;
        self.markers_found += other.markers_found;
        self.markers_credited += other.markers_credited;
        self.markers_without_day += other.markers_without_day;
        self.markers_without_pilot_row += other.markers_without_pilot_row;
        self.markers_too_far += other.markers_too_far;
        self.markers_on_labeled_row += other.markers_on_labeled_row;
    }
}

/// Result of running the pipeline over all pages of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    /// Every day discovered in any header, ascending.
    pub days: Vec<Day>,
    pub availability: AvailabilityMap,
    pub diagnostics: ExtractionDiagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<ExtractionTrace>,
}

impl Extraction {
    pub fn pilots_on(&self, day: Day) -> Vec<PilotCode> {
        self.availability.pilots_on(day)
    }
}

/// Per-page accumulator handed to the strategies.
pub(crate) struct PageScan<'a> {
    pub page_number: usize,
    pub matcher: &'a PilotMatcher,
    pub profile: &'a ExtractionProfile,
    pub days: BTreeSet<Day>,
    pub availability: AvailabilityMap,
    pub diagnostics: ExtractionDiagnostics,
    pub decisions: Vec<RowDecision>,
    pub warnings: Vec<TraceWarning>,
}

/// Where a marker sat and which row it came from, for the trace.
pub(crate) struct MarkerSite<'r> {
    pub row_index: usize,
    pub row_text: &'r str,
    pub marker_x: Option<f32>,
    pub distance: Option<f32>,
}

impl<'a> PageScan<'a> {
    fn new(page_number: usize, matcher: &'a PilotMatcher, profile: &'a ExtractionProfile) -> Self {
        PageScan {
            page_number,
            matcher,
            profile,
            days: BTreeSet::new(),
            availability: AvailabilityMap::new(),
            diagnostics: ExtractionDiagnostics {
                pages_scanned: 1,
                ..Default::default()
            },
            decisions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Credit every pilot for `day`.
    pub fn credit(&mut self, site: MarkerSite<'_>, pilots: &[PilotCode], day: Day) {
        self.credit_as(site, pilots, day, RowOutcome::Credited);
    }

    /// Credit every pilot for `day`, recording a specific credited outcome.
    pub fn credit_as(&mut self, site: MarkerSite<'_>, pilots: &[PilotCode], day: Day, outcome: RowOutcome) {
        self.diagnostics.markers_found += 1;
        self.diagnostics.markers_credited += 1;
        self.days.insert(day);
        for pilot in pilots {
            self.availability.add(day, pilot.clone());
        }
        tracing::debug!(
            page = self.page_number,
            row = site.row_index,
            day = %day,
            pilots = ?pilots.iter().map(PilotCode::as_str).collect::<Vec<_>>(),
            reason = ?outcome,
            "marker credited"
        );
        if outcome == RowOutcome::CreditedFromLabeledRow {
            self.diagnostics.markers_on_labeled_row += 1;
        }
        self.record(site, pilots, Some(day), outcome);
    }

    /// Record a marker that could not be attributed.
    pub fn reject(
        &mut self,
        site: MarkerSite<'_>,
        pilots: &[PilotCode],
        day: Option<Day>,
        outcome: RowOutcome,
    ) {
        self.diagnostics.markers_found += 1;
        match outcome {
            RowOutcome::NoDayColumn => self.diagnostics.markers_without_day += 1,
            RowOutcome::NoPilotRowAbove => self.diagnostics.markers_without_pilot_row += 1,
            RowOutcome::TooFarFromPilotRow => self.diagnostics.markers_too_far += 1,
            RowOutcome::NoPilot | RowOutcome::Credited | RowOutcome::CreditedFromLabeledRow => {}
        }
        tracing::debug!(
            page = self.page_number,
            row = site.row_index,
            text = site.row_text,
            reason = ?outcome,
            "marker rejected"
        );
        self.record(site, pilots, day, outcome);
    }

    /// A row whose markers have no pilot to go to. Counted once per row; each
    /// marker on it is still counted as found.
    pub fn pilotless_row(&mut self, row_index: usize, row_text: &str, markers: usize) {
        self.diagnostics.rows_without_pilot += 1;
        self.diagnostics.markers_found += markers;
        tracing::debug!(
            page = self.page_number,
            row = row_index,
            text = row_text,
            markers,
            "row has markers but no pilot code"
        );
        self.record(
            MarkerSite {
                row_index,
                row_text,
                marker_x: None,
                distance: None,
            },
            &[],
            None,
            RowOutcome::NoPilot,
        );
    }

    pub fn warn(&mut self, message: String) {
        tracing::warn!(page = self.page_number, "{message}");
        self.warnings.push(TraceWarning {
            page_number: Some(self.page_number),
            message,
            severity: TraceSeverity::Important,
        });
    }

    fn record(&mut self, site: MarkerSite<'_>, pilots: &[PilotCode], day: Option<Day>, outcome: RowOutcome) {
        if !self.profile.trace {
            return;
        }
        self.decisions.push(RowDecision {
            page_number: self.page_number,
            row_index: site.row_index,
            row_text: site.row_text.to_string(),
            pilots: pilots.to_vec(),
            day,
            marker_x: site.marker_x,
            distance: site.distance,
            outcome,
        });
    }
}

/// Run the profile's strategy over one page.
fn scan_page<'a>(
    page: &PageContent,
    matcher: &'a PilotMatcher,
    profile: &'a ExtractionProfile,
) -> PageScan<'a> {
    let mut scan = PageScan::new(page.page_number, matcher, profile);

    match profile.strategy {
        Strategy::SameRow | Strategy::NearestRowAbove => {
            if page.tokens.is_empty() {
                scan.diagnostics.pages_without_days += 1;
                scan.warn("no words detected".into());
                return scan;
            }

            // without a header the strategy still runs, so every marker on the
            // page is recorded as rejected for want of a day column
            let columns = detect_day_columns(&page.tokens, profile.header_tolerance, profile.cluster_mode);
            if columns.is_empty() {
                scan.diagnostics.pages_without_days += 1;
                scan.warn("no day numbers found".into());
            }
            scan.days.extend(columns.days());
            tracing::debug!(page = page.page_number, columns = ?columns, "day columns");

            let rows = cluster_rows(&page.tokens, profile.row_tolerance, profile.cluster_mode);
            if profile.strategy == Strategy::SameRow {
                same_row::extract(&rows, &columns, &mut scan);
            } else {
                nearest_row_above::extract(&rows, &columns, &mut scan);
            }
        }
        Strategy::GridTable => {
            if page.tables.is_empty() {
                scan.diagnostics.pages_without_days += 1;
                scan.warn("no tables found".into());
                return scan;
            }
            grid_table::extract(&page.tables, &mut scan);
            if scan.days.is_empty() {
                scan.diagnostics.pages_without_days += 1;
            }
        }
        Strategy::RecognizedText => {
            recognized_text::extract(&page.lines, &mut scan);
            if scan.days.is_empty() {
                scan.diagnostics.pages_without_days += 1;
                scan.warn("no day numbers recognized".into());
            }
        }
    }

    scan
}

/// Extract availability from every page of a document.
///
/// Deterministic: the same pages and profile always give the same map.
pub fn extract_document(pages: &[PageContent], profile: &ExtractionProfile) -> Extraction {
    let matcher = PilotMatcher::new(profile);

    let mut days = BTreeSet::new();
    let mut availability = AvailabilityMap::new();
    let mut diagnostics = ExtractionDiagnostics::default();
    let mut trace = profile.trace.then(|| ExtractionTrace::new(profile.strategy));

    for page in pages {
        let scan = scan_page(page, &matcher, profile);
        days.extend(scan.days);
        availability.merge(scan.availability);
        diagnostics.absorb(&scan.diagnostics);
        if let Some(trace) = trace.as_mut() {
            trace.decisions.extend(scan.decisions);
            trace.warnings.extend(scan.warnings);
        }
    }

    tracing::info!(
        strategy = %profile.strategy,
        pages = diagnostics.pages_scanned,
        days = days.len(),
        credited = diagnostics.markers_credited,
        rejected = diagnostics.markers_rejected(),
        "extraction finished"
    );

    Extraction {
        days: days.into_iter().collect(),
        availability,
        diagnostics,
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PositionedToken;

    fn tok(text: &str, left: f32, top: f32) -> PositionedToken {
        PositionedToken::new(text, left, left + 6.0, top, top + 10.0)
    }

    fn roster_page(page_number: usize) -> PageContent {
        PageContent {
            page_number,
            tokens: vec![
                tok("1", 100.0, 20.0),
                tok("2", 140.0, 20.0),
                tok("3", 180.0, 20.0),
                tok("Berg", 10.0, 50.0),
                tok("(KVB)", 40.0, 50.0),
                tok("A", 100.0, 50.0),
                tok("A", 181.0, 50.0),
                tok("(HEB)", 40.0, 80.0),
                tok("A", 139.0, 80.0),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_pages_merge_by_union() {
        let blank = PageContent {
            page_number: 2,
            tokens: vec![tok("Notes", 10.0, 10.0)],
            ..Default::default()
        };
        let profile = ExtractionProfile::default();
        let ex = extract_document(&[roster_page(1), blank, roster_page(3)], &profile);

        assert_eq!(ex.days.iter().map(|d| d.number()).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ex.diagnostics.pages_scanned, 3);
        assert_eq!(ex.diagnostics.pages_without_days, 1);
        let day3 = ex.pilots_on(Day::new(3).unwrap());
        assert_eq!(day3, vec![PilotCode::parse("KVB").unwrap()]);
        assert_eq!(ex.diagnostics.markers_credited, 6);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let profile = ExtractionProfile {
            trace: true,
            ..Default::default()
        };
        let pages = vec![roster_page(1), roster_page(2)];
        let a = extract_document(&pages, &profile);
        let b = extract_document(&pages, &profile);
        assert_eq!(a.availability, b.availability);
        assert_eq!(a.days, b.days);
        assert_eq!(a.trace, b.trace);
    }

    #[test]
    fn test_trace_only_when_enabled() {
        let ex = extract_document(&[roster_page(1)], &ExtractionProfile::default());
        assert!(ex.trace.is_none());

        let profile = ExtractionProfile {
            trace: true,
            ..Default::default()
        };
        let ex = extract_document(&[roster_page(1)], &profile);
        let trace = ex.trace.unwrap();
        assert_eq!(trace.decisions.len(), 3);
        assert!(trace.decisions.iter().all(|d| d.outcome == RowOutcome::Credited));
    }
}
