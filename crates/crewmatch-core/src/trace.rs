use crate::config::Strategy;
use crate::model::{Day, PilotCode};
use serde::{Deserialize, Serialize};

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Important,
    Info,
}

/// What happened to one marker (or one marker-less labeled row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    /// Pilots credited for the day.
    Credited,
    /// Nearest-row-above: the marker sits on a labeled row and was credited
    /// to the labeled row above it, not to the row's own pilot.
    CreditedFromLabeledRow,
    /// Markers found but no pilot code on the row.
    NoPilot,
    /// Marker found but the page has no day columns.
    NoDayColumn,
    /// Nearest-row-above: no labeled row above the marker row.
    NoPilotRowAbove,
    /// Nearest-row-above: the labeled row above is further than the threshold.
    TooFarFromPilotRow,
}

impl RowOutcome {
    pub fn is_credited(self) -> bool {
        matches!(self, RowOutcome::Credited | RowOutcome::CreditedFromLabeledRow)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDecision {
    pub page_number: usize,
    pub row_index: usize,
    pub row_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pilots: Vec<PilotCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<Day>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_x: Option<f32>,
    /// Vertical distance to the attributed pilot row (nearest-row-above).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    pub message: String,
    pub severity: TraceSeverity,
}

/// Per-row extraction decisions, for tuning tolerances against a document family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionTrace {
    pub trace_schema_version: String,
    pub strategy: Strategy,
    pub decisions: Vec<RowDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TraceWarning>,
}

impl ExtractionTrace {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            strategy,
            decisions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn rejected(&self) -> impl Iterator<Item = &RowDecision> {
        self.decisions.iter().filter(|d| !d.outcome.is_credited())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_json_shape() {
        let mut trace = ExtractionTrace::new(Strategy::SameRow);
        trace.decisions.push(RowDecision {
            page_number: 1,
            row_index: 3,
            row_text: "Berg (KVB) A".into(),
            pilots: vec![PilotCode::parse("KVB").unwrap()],
            day: Day::new(2),
            marker_x: Some(48.0),
            distance: None,
            outcome: RowOutcome::Credited,
        });

        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["trace_schema_version"], "1.0");
        assert_eq!(json["strategy"], "same_row");
        assert_eq!(json["decisions"][0]["day"], "2");
        assert_eq!(json["decisions"][0]["outcome"], "credited");
        assert!(json["decisions"][0].get("distance").is_none());
        assert!(json.get("warnings").is_none());
        assert_eq!(trace.rejected().count(), 0);
    }
}
