use super::{MarkerSite, PageScan};
use crate::model::Day;
use regex::Regex;
use std::collections::BTreeSet;

/// Scanned rosters: no usable geometry, only recognized text lines.
///
/// A line credits its parenthesized pilot code(s) for every day number that
/// is immediately followed by the marker, either as two adjacent tokens
/// ("3 A") or glued together ("3A"). The line with the most distinct day
/// numbers is taken as the header and contributes to the day list.
pub(crate) fn extract(lines: &[String], scan: &mut PageScan<'_>) {
    if let Some(header) = header_days(lines) {
        scan.days.extend(header);
    }

    let glued = match glued_pattern(scan.matcher.marker()) {
        Ok(re) => Some(re),
        Err(e) => {
            scan.warn(format!("glued day/marker tokens not recognized: {e}"));
            None
        }
    };

    for (row_index, line) in lines.iter().enumerate() {
        let days = marked_days(line, scan, glued.as_ref());
        if days.is_empty() {
            continue;
        }

        let pilots = scan.matcher.codes_in_line(line);
        if pilots.is_empty() {
            scan.pilotless_row(row_index, line, days.len());
            continue;
        }

        for day in days {
            let site = MarkerSite {
                row_index,
                row_text: line,
                marker_x: None,
                distance: None,
            };
            scan.credit(site, &pilots, day);
        }
    }
}

/// "3A" style tokens: a day number with the marker glued on.
fn glued_pattern(marker: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)^(\d{{1,2}}){}$", regex::escape(marker)))
}

fn header_days(lines: &[String]) -> Option<BTreeSet<Day>> {
    lines
        .iter()
        .map(|line| line.split_whitespace().filter_map(Day::parse).collect::<BTreeSet<_>>())
        .rev()
        .max_by_key(BTreeSet::len)
        .filter(|days| !days.is_empty())
}

fn marked_days(line: &str, scan: &PageScan<'_>, glued: Option<&Regex>) -> Vec<Day> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut days = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if let Some(next) = tokens.get(i + 1) {
            if scan.matcher.is_marker(next) {
                if let Some(day) = Day::parse(token) {
                    days.push(day);
                    continue;
                }
            }
        }
        if let Some(day) = glued
            .and_then(|re| re.captures(token))
            .and_then(|cap| Day::parse(&cap[1]))
        {
            days.push(day);
        }
    }
    days
}
