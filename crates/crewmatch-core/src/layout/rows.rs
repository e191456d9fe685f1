use crate::extraction::PositionedToken;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How tokens are assigned to rows by their vertical center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    /// Sort by vertical center and start a new row whenever the gap to the
    /// previous token exceeds the tolerance. Raising the tolerance can only
    /// merge rows.
    #[default]
    Gap,
    /// Bucket by `round(center / tolerance)`. Matches exports tuned against
    /// fixed bucket boundaries, but a larger tolerance may move a bucket edge
    /// between two tokens that used to share a row.
    Bucket,
}

/// Tokens sharing an approximate vertical center, sorted left to right.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub tokens: Vec<&'a PositionedToken>,
    /// Mean vertical center of the tokens.
    pub center_y: f32,
}

impl<'a> Row<'a> {
    fn new(mut tokens: Vec<&'a PositionedToken>) -> Self {
        tokens.sort_by(|a, b| a.left.total_cmp(&b.left));
        let center_y = if tokens.is_empty() {
            0.0
        } else {
            tokens.iter().map(|t| t.center_y()).sum::<f32>() / tokens.len() as f32
        };
        Row { tokens, center_y }
    }

    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group tokens into rows, ordered top to bottom.
///
/// Empty input gives no rows. A non-positive tolerance is clamped to a tiny
/// epsilon, so only tokens with identical centers share a row.
pub fn cluster_rows<'a>(
    tokens: impl IntoIterator<Item = &'a PositionedToken>,
    tolerance: f32,
    mode: ClusterMode,
) -> Vec<Row<'a>> {
    let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        f32::EPSILON
    };

    match mode {
        ClusterMode::Gap => cluster_by_gap(tokens, tolerance),
        ClusterMode::Bucket => cluster_by_bucket(tokens, tolerance),
    }
}

fn cluster_by_gap<'a>(
    tokens: impl IntoIterator<Item = &'a PositionedToken>,
    tolerance: f32,
) -> Vec<Row<'a>> {
    let mut sorted: Vec<&PositionedToken> = tokens.into_iter().collect();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut rows = Vec::new();
    let mut current: Vec<&PositionedToken> = Vec::new();
    let mut prev_center: Option<f32> = None;

    for token in sorted {
        let center = token.center_y();
        if let Some(prev) = prev_center {
            if center - prev > tolerance {
                rows.push(Row::new(std::mem::take(&mut current)));
            }
        }
        current.push(token);
        prev_center = Some(center);
    }
    if !current.is_empty() {
        rows.push(Row::new(current));
    }

    rows
}

fn cluster_by_bucket<'a>(
    tokens: impl IntoIterator<Item = &'a PositionedToken>,
    tolerance: f32,
) -> Vec<Row<'a>> {
    let mut buckets: BTreeMap<i64, Vec<&PositionedToken>> = BTreeMap::new();
    for token in tokens {
        let key = (token.center_y() / tolerance).round() as i64;
        buckets.entry(key).or_default().push(token);
    }
    buckets.into_values().map(Row::new).collect()
}
