use super::{MarkerSite, PageScan};
use crate::layout::{DayColumnMap, Row};
use crate::trace::RowOutcome;

/// Dense tabular layout: each row names its pilot and carries that pilot's
/// markers. Every marker is assigned to the day column nearest its center.
/// Pilot codes are only read from the label area left of the day columns;
/// duty codes in the grid ("SBY", "OFF") never name a pilot.
pub(crate) fn extract(rows: &[Row<'_>], columns: &DayColumnMap, scan: &mut PageScan<'_>) {
    for (row_index, row) in rows.iter().enumerate() {
        let markers: Vec<f32> = row
            .tokens
            .iter()
            .filter(|t| scan.matcher.is_marker(&t.text))
            .map(|t| t.center_x())
            .collect();
        if markers.is_empty() {
            continue;
        }

        let row_text = row.text();
        let pilots = scan.matcher.codes_in(
            row.tokens
                .iter()
                .filter(|t| columns.in_label_area(t.center_x()))
                .map(|t| t.text.as_str()),
        );
        if pilots.is_empty() {
            scan.pilotless_row(row_index, &row_text, markers.len());
            continue;
        }

        for x in markers {
            let site = MarkerSite {
                row_index,
                row_text: &row_text,
                marker_x: Some(x),
                distance: None,
            };
            match columns.nearest_day(x) {
                Some(day) => scan.credit(site, &pilots, day),
                None => scan.reject(site, &pilots, None, RowOutcome::NoDayColumn),
            }
        }
    }
}
