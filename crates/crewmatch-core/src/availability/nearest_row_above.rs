use super::{MarkerSite, PageScan};
use crate::availability::pilot::PilotMatcher;
use crate::layout::{DayColumnMap, Row};
use crate::model::PilotCode;
use crate::trace::RowOutcome;

/// Stacked layout: a pilot is named on one row and the markers follow on
/// unlabeled rows underneath. Each marker row is attributed to the closest
/// labeled row strictly above it, as long as the vertical gap stays within
/// `max_row_distance`. Markers on a labeled row itself also look upward and
/// are recorded as `CreditedFromLabeledRow`.
pub(crate) fn extract(rows: &[Row<'_>], columns: &DayColumnMap, scan: &mut PageScan<'_>) {
    let labels: Vec<Vec<PilotCode>> = rows
        .iter()
        .map(|row| label_codes(row, columns, scan.matcher))
        .collect();
    let labeled: Vec<(f32, &[PilotCode])> = rows
        .iter()
        .zip(&labels)
        .filter(|(_, pilots)| !pilots.is_empty())
        .map(|(row, pilots)| (row.center_y, pilots.as_slice()))
        .collect();
    let max_distance = scan.profile.max_row_distance;

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
        let own_label = !labels[row_index].is_empty();
        let above = labeled
            .iter()
            .filter(|(y, _)| *y < row.center_y)
            .max_by(|(a, _), (b, _)| a.total_cmp(b));

        for x in markers {
            let mut site = MarkerSite {
                row_index,
                row_text: &row_text,
                marker_x: Some(x),
                distance: None,
            };

            let Some(&(pilot_y, pilots)) = above else {
                scan.reject(site, &[], None, RowOutcome::NoPilotRowAbove);
                continue;
            };

            let distance = row.center_y - pilot_y;
            site.distance = Some(distance);
            let day = columns.nearest_day(x);

            if distance > max_distance {
                scan.reject(site, pilots, day, RowOutcome::TooFarFromPilotRow);
                continue;
            }
            match day {
                Some(day) if own_label => {
                    scan.credit_as(site, pilots, day, RowOutcome::CreditedFromLabeledRow)
                }
                Some(day) => scan.credit(site, pilots, day),
                None => scan.reject(site, pilots, None, RowOutcome::NoDayColumn),
            }
        }
    }
}

/// Pilot codes naming a row. Only tokens in the label area count, and a row
/// that also carries markers must name its pilot in parentheses, so a duty
/// line ("A OFF") never opens a new pilot block.
fn label_codes(row: &Row<'_>, columns: &DayColumnMap, matcher: &PilotMatcher) -> Vec<PilotCode> {
    let label: Vec<&str> = row
        .tokens
        .iter()
        .filter(|t| columns.in_label_area(t.center_x()))
        .map(|t| t.text.as_str())
        .collect();

    if row.tokens.iter().any(|t| matcher.is_marker(&t.text)) {
        matcher.codes_in_line(&label.join(" "))
    } else {
        matcher.codes_in(label)
    }
}
