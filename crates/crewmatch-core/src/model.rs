use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A day of month (1..=31) as it appears in a roster header.
///
/// Ordered numerically; displayed and serialized in its minimal decimal form
/// ("07" is stored as day 7 and rendered as "7").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(u8);

impl Day {
    /// Parse a day label. Leading zeros are stripped; anything that is not
    /// purely ASCII digits in the range 1..=31 is rejected.
    pub fn parse(s: &str) -> Option<Day> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let stripped = s.trim_start_matches('0');
        if stripped.is_empty() || stripped.len() > 2 {
            return None;
        }
        let n: u8 = stripped.parse().ok()?;
        Day::new(n)
    }

    pub fn new(n: u8) -> Option<Day> {
        (1..=31).contains(&n).then_some(Day(n))
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Day::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid day '{s}'")))
    }
}

/// Canonical crew member identifier: 2-3 uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PilotCode(String);

impl PilotCode {
    /// Parse a code from table data. Case-insensitive, surrounding
    /// whitespace and parentheses are ignored.
    pub fn parse(s: &str) -> Option<PilotCode> {
        let s = s.trim().trim_start_matches('(').trim_end_matches(')').trim();
        if !(2..=3).contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        Some(PilotCode(s.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PilotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl<'de> Deserialize<'de> for PilotCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PilotCode::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid pilot code '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "PIC")]
    Pic,
    #[serde(rename = "SIC")]
    Sic,
}

impl Role {
    pub fn from_str_loose(s: &str) -> Option<Role> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PIC" => Some(Role::Pic),
            "SIC" => Some(Role::Sic),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Pic => write!(f, "PIC"),
            Role::Sic => write!(f, "SIC"),
        }
    }
}

/// Pilot code -> role, as loaded from the roles table.
///
/// Rows whose role is neither PIC nor SIC are kept in `unrecognized` so they
/// can be reported; they never take part in pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap {
    pub roles: BTreeMap<PilotCode, Role>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unrecognized: BTreeMap<PilotCode, String>,
}

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same pilot replace earlier ones.
    pub fn insert(&mut self, pilot: PilotCode, role: Role) {
        self.unrecognized.remove(&pilot);
        self.roles.insert(pilot, role);
    }

    pub fn insert_unrecognized(&mut self, pilot: PilotCode, raw_role: String) {
        self.roles.remove(&pilot);
        self.unrecognized.insert(pilot, raw_role);
    }

    pub fn role_of(&self, pilot: &PilotCode) -> Option<Role> {
        self.roles.get(pilot).copied()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl FromIterator<(PilotCode, Role)> for RoleMap {
    fn from_iter<I: IntoIterator<Item = (PilotCode, Role)>>(iter: I) -> Self {
        let mut map = RoleMap::new();
        for (pilot, role) in iter {
            map.insert(pilot, role);
        }
        map
    }
}

/// Ordered (PIC, SIC) pairs that must never fly together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionSet(BTreeSet<(PilotCode, PilotCode)>);

impl RestrictionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pic: PilotCode, sic: PilotCode) -> bool {
        self.0.insert((pic, sic))
    }

    pub fn forbids(&self, pic: &PilotCode, sic: &PilotCode) -> bool {
        self.0.contains(&(pic.clone(), sic.clone()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PilotCode, PilotCode)> {
        self.0.iter()
    }
}

impl FromIterator<(PilotCode, PilotCode)> for RestrictionSet {
    fn from_iter<I: IntoIterator<Item = (PilotCode, PilotCode)>>(iter: I) -> Self {
        RestrictionSet(iter.into_iter().collect())
    }
}

/// One PIC matched to one SIC.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pairing {
    #[serde(rename = "PIC")]
    pub pic: PilotCode,
    #[serde(rename = "SIC")]
    pub sic: PilotCode,
}

/// Day -> pilots available that day, accumulated across all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityMap(BTreeMap<Day, BTreeSet<PilotCode>>);

impl AvailabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the pilot was not already recorded for that day.
    pub fn add(&mut self, day: Day, pilot: PilotCode) -> bool {
        self.0.entry(day).or_default().insert(pilot)
    }

    pub fn merge(&mut self, other: AvailabilityMap) {
        for (day, pilots) in other.0 {
            self.0.entry(day).or_default().extend(pilots);
        }
    }

    /// Pilots available on `day`, in lexicographic order.
    pub fn pilots_on(&self, day: Day) -> Vec<PilotCode> {
        self.0
            .get(&day)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, day: Day, pilot: &PilotCode) -> bool {
        self.0.get(&day).is_some_and(|set| set.contains(pilot))
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Day, &BTreeSet<PilotCode>)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_strips_leading_zeros() {
        assert_eq!(Day::parse("07"), Day::new(7));
        assert_eq!(Day::parse("07").unwrap().to_string(), "7");
        assert_eq!(Day::parse(" 31 "), Day::new(31));
    }

    #[test]
    fn test_day_rejects_out_of_range() {
        assert!(Day::parse("0").is_none());
        assert!(Day::parse("00").is_none());
        assert!(Day::parse("32").is_none());
        assert!(Day::parse("1a").is_none());
        assert!(Day::parse("-3").is_none());
        assert!(Day::parse("").is_none());
    }

    #[test]
    fn test_days_sort_numerically() {
        let mut days: Vec<Day> = ["10", "2", "1"].iter().filter_map(|s| Day::parse(s)).collect();
        days.sort();
        let labels: Vec<String> = days.iter().map(|d| d.to_string()).collect();
        assert_eq!(labels, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_pilot_code_parse() {
        assert_eq!(PilotCode::parse("kvb").unwrap().as_str(), "KVB");
        assert_eq!(PilotCode::parse("(HEB)").unwrap().as_str(), "HEB");
        assert!(PilotCode::parse("A").is_none());
        assert!(PilotCode::parse("ABCD").is_none());
        assert!(PilotCode::parse("K1").is_none());
    }

    #[test]
    fn test_role_loose() {
        assert_eq!(Role::from_str_loose(" pic "), Some(Role::Pic));
        assert_eq!(Role::from_str_loose("Sic"), Some(Role::Sic));
        assert_eq!(Role::from_str_loose("FO"), None);
    }

    #[test]
    fn test_availability_merge_is_union() {
        let d1 = Day::new(1).unwrap();
        let kvb = PilotCode::parse("KVB").unwrap();
        let heb = PilotCode::parse("HEB").unwrap();

        let mut a = AvailabilityMap::new();
        a.add(d1, kvb.clone());
        let mut b = AvailabilityMap::new();
        b.add(d1, kvb.clone());
        b.add(d1, heb.clone());
        a.merge(b);

        assert_eq!(a.pilots_on(d1), vec![heb, kvb]);
    }

    #[test]
    fn test_day_serializes_as_string() {
        let json = serde_json::to_string(&Day::new(5).unwrap()).unwrap();
        assert_eq!(json, "\"5\"");
        let day: Day = serde_json::from_str("\"05\"").unwrap();
        assert_eq!(day.number(), 5);
    }
}
