use crate::config::{ExtractionProfile, MultiPilot};
use crate::model::PilotCode;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static PAREN_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Z]{2,3})\)").expect("valid regex"));
static BARE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("valid regex"));

/// Recognizes pilot codes and availability markers in roster text.
///
/// Codes in parentheses ("Berg (KVB)") take precedence over bare uppercase
/// tokens; bare tokens are only considered when a row has no parenthesized
/// code. The marker itself, ignored duty codes and codes outside a non-empty
/// allowlist are never pilots.
#[derive(Debug, Clone)]
pub struct PilotMatcher {
    marker: String,
    known: BTreeSet<PilotCode>,
    ignored: BTreeSet<String>,
    policy: MultiPilot,
}

impl PilotMatcher {
    pub fn new(profile: &ExtractionProfile) -> Self {
        PilotMatcher {
            marker: profile.marker.trim().to_string(),
            known: profile.known_pilots.clone(),
            ignored: profile
                .ignored_codes
                .iter()
                .map(|c| c.trim().to_ascii_uppercase())
                .collect(),
            policy: profile.multi_pilot,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Case-insensitive comparison against the availability marker.
    pub fn is_marker(&self, text: &str) -> bool {
        text.trim().eq_ignore_ascii_case(&self.marker)
    }

    /// Pilot codes declared by a sequence of cells or tokens, left to right.
    pub fn codes_in<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> Vec<PilotCode> {
        let mut parenthesized = Vec::new();
        let mut bare = Vec::new();

        for text in texts {
            for cap in PAREN_CODE.captures_iter(text) {
                parenthesized.push(cap[1].to_string());
            }
            let trimmed = text.trim();
            if BARE_CODE.is_match(trimmed) && !self.is_marker(trimmed) {
                bare.push(trimmed.to_string());
            }
        }

        let candidates = if parenthesized.is_empty() {
            bare
        } else {
            parenthesized
        };
        self.accept(candidates)
    }

    /// Pilot codes in a line of text where only parenthesized codes count:
    /// recognized OCR lines, and stacked-layout rows that also carry markers.
    pub fn codes_in_line(&self, line: &str) -> Vec<PilotCode> {
        let candidates = PAREN_CODE
            .captures_iter(line)
            .map(|cap| cap[1].to_string())
            .collect();
        self.accept(candidates)
    }

    fn accept(&self, candidates: Vec<String>) -> Vec<PilotCode> {
        let mut seen = BTreeSet::new();
        let codes = candidates
            .iter()
            .filter(|c| !self.ignored.contains(c.as_str()))
            .filter_map(|c| PilotCode::parse(c))
            .filter(|c| self.known.is_empty() || self.known.contains(c))
            .filter(|c| seen.insert(c.clone()));

        match self.policy {
            MultiPilot::All => codes.collect(),
            MultiPilot::First => codes.take(1).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(f: impl FnOnce(&mut ExtractionProfile)) -> PilotMatcher {
        let mut profile = ExtractionProfile::default();
        f(&mut profile);
        PilotMatcher::new(&profile)
    }

    fn codes(v: Vec<PilotCode>) -> Vec<String> {
        v.into_iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_parenthesized_code_wins_over_bare() {
        let m = matcher(|_| {});
        let found = m.codes_in(["Kristian", "Berg", "(KVB)", "OFF", "A"]);
        assert_eq!(codes(found), vec!["KVB"]);
    }

    #[test]
    fn test_bare_code_when_no_parentheses() {
        let m = matcher(|_| {});
        assert_eq!(codes(m.codes_in(["KVB", "A", "A"])), vec!["KVB"]);
    }

    #[test]
    fn test_marker_never_a_pilot() {
        let m = matcher(|p| p.marker = "AV".into());
        assert!(m.codes_in(["AV", "av"]).is_empty());
        assert!(m.is_marker(" av "));
    }

    #[test]
    fn test_multi_pilot_policy() {
        let all = matcher(|_| {});
        let first = matcher(|p| p.multi_pilot = MultiPilot::First);
        let row = ["(KVB)", "/", "(HEB)", "A"];
        assert_eq!(codes(all.codes_in(row)), vec!["KVB", "HEB"]);
        assert_eq!(codes(first.codes_in(row)), vec!["KVB"]);
    }

    #[test]
    fn test_allowlist_and_ignored_codes() {
        let m = matcher(|p| {
            p.known_pilots = [PilotCode::parse("HEB").unwrap()].into_iter().collect();
        });
        assert!(m.codes_in(["(KVB)"]).is_empty());
        assert_eq!(codes(m.codes_in(["(KVB)", "(HEB)"])), vec!["HEB"]);

        let m = matcher(|p| p.ignored_codes = ["sby".to_string()].into_iter().collect());
        assert!(m.codes_in(["SBY", "A"]).is_empty());
    }

    #[test]
    fn test_codes_in_line_requires_parentheses() {
        let m = matcher(|_| {});
        assert_eq!(codes(m.codes_in_line("Berg (KVB) 3 A 4 A")), vec!["KVB"]);
        assert!(m.codes_in_line("KVB 3 A").is_empty());
    }

    #[test]
    fn test_lowercase_not_a_code() {
        let m = matcher(|_| {});
        assert!(m.codes_in(["kvb", "(kvb)", "Berg"]).is_empty());
    }
}
