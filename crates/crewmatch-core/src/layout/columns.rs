use crate::extraction::PositionedToken;
use crate::layout::rows::{cluster_rows, ClusterMode};
use crate::model::Day;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Day of month -> horizontal center of its header label on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayColumnMap(BTreeMap<Day, f32>);

impl DayColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: Day, x_center: f32) {
        self.0.insert(day, x_center);
    }

    /// The day whose column center is horizontally closest to `x`.
    /// Equal distances resolve to the lower day.
    pub fn nearest_day(&self, x: f32) -> Option<Day> {
        self.0
            .iter()
            .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
            .map(|(day, _)| *day)
    }

    /// Left edge of the day area: half a column pitch before the leftmost
    /// day column. Tokens centered left of it form the row label, where pilot
    /// codes live; anything right of it is duty content.
    pub fn label_limit(&self) -> Option<f32> {
        let mut xs: Vec<f32> = self.0.values().copied().collect();
        xs.sort_by(f32::total_cmp);
        let first = *xs.first()?;
        let half_pitch = xs.get(1).map_or(0.0, |second| (second - first) / 2.0);
        Some(first - half_pitch)
    }

    /// Whether a token centered at `x` sits in the row label area. Without
    /// day columns the whole row counts as label.
    pub fn in_label_area(&self, x: f32) -> bool {
        self.label_limit().map_or(true, |limit| x < limit)
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Day, f32)> for DayColumnMap {
    fn from_iter<I: IntoIterator<Item = (Day, f32)>>(iter: I) -> Self {
        DayColumnMap(iter.into_iter().collect())
    }
}

/// Find the day header on a page: among rows made only of day-number tokens,
/// take the one with the most distinct days and map each day to its label's
/// horizontal center. The topmost row wins ties. A page without day numbers
/// gives an empty map.
pub fn detect_day_columns(
    tokens: &[PositionedToken],
    tolerance: f32,
    mode: ClusterMode,
) -> DayColumnMap {
    let day_tokens = tokens.iter().filter(|t| Day::parse(&t.text).is_some());
    let rows = cluster_rows(day_tokens, tolerance, mode);

    let distinct = |row: &crate::layout::Row<'_>| {
        row.tokens
            .iter()
            .filter_map(|t| Day::parse(&t.text))
            .collect::<BTreeSet<_>>()
            .len()
    };

    // max_by_key keeps the last maximum; reverse so the topmost row wins
    let Some(best) = rows.iter().rev().max_by_key(|row| distinct(row)) else {
        return DayColumnMap::new();
    };

    best.tokens
        .iter()
        .filter_map(|t| Day::parse(&t.text).map(|day| (day, t.center_x())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, left: f32, top: f32) -> PositionedToken {
        PositionedToken::new(text, left, left + 6.0, top, top + 10.0)
    }

    #[test]
    fn test_nearest_day_scenario() {
        let map: DayColumnMap = [(1u8, 10.0f32), (2, 50.0), (3, 90.0)]
            .into_iter()
            .map(|(d, x)| (Day::new(d).unwrap(), x))
            .collect();
        assert_eq!(map.nearest_day(48.0), Day::new(2));
        assert_eq!(map.nearest_day(-100.0), Day::new(1));
        assert_eq!(map.nearest_day(1000.0), Day::new(3));
        // equidistant from 1 and 2
        assert_eq!(map.nearest_day(30.0), Day::new(1));
    }

    #[test]
    fn test_label_limit_is_half_a_pitch_before_first_column() {
        let map: DayColumnMap = [(3u8, 180.0f32), (1, 100.0), (2, 140.0)]
            .into_iter()
            .map(|(d, x)| (Day::new(d).unwrap(), x))
            .collect();
        assert_eq!(map.label_limit(), Some(80.0));
        assert!(map.in_label_area(43.0));
        assert!(!map.in_label_area(83.0));
        assert!(DayColumnMap::new().in_label_area(500.0));
    }

    #[test]
    fn test_nearest_day_empty_map() {
        assert_eq!(DayColumnMap::new().nearest_day(12.0), None);
    }

    #[test]
    fn test_header_row_with_most_days_wins() {
        let tokens = vec![
            // page title with a stray number
            tok("March", 10.0, 5.0),
            tok("2024", 50.0, 5.0),
            tok("3", 90.0, 5.0),
            // header
            tok("01", 100.0, 30.0),
            tok("02", 120.0, 30.0),
            tok("03", 140.0, 30.0),
            // body row with a couple of numbers
            tok("(KVB)", 10.0, 60.0),
            tok("12", 100.0, 60.0),
        ];
        let map = detect_day_columns(&tokens, 5.0, ClusterMode::Gap);
        let days: Vec<String> = map.days().map(|d| d.to_string()).collect();
        assert_eq!(days, vec!["1", "2", "3"]);
        assert_eq!(map.nearest_day(123.0), Day::new(2));
    }

    #[test]
    fn test_tie_prefers_topmost_row() {
        let tokens = vec![
            tok("1", 100.0, 30.0),
            tok("2", 120.0, 30.0),
            tok("5", 300.0, 80.0),
            tok("6", 320.0, 80.0),
        ];
        let map = detect_day_columns(&tokens, 5.0, ClusterMode::Gap);
        assert_eq!(map.days().collect::<Vec<_>>(), vec![Day::new(1).unwrap(), Day::new(2).unwrap()]);
    }

    #[test]
    fn test_no_day_tokens() {
        let tokens = vec![tok("Roster", 10.0, 10.0), tok("0", 20.0, 10.0), tok("45", 30.0, 10.0)];
        assert!(detect_day_columns(&tokens, 5.0, ClusterMode::Gap).is_empty());
    }
}
