// Scenario Domain Model

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use super::error::DomainError;
use super::PurgeStats;

/// Named scenarios understood by the harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Add,
    Count,
    Get,
    Iterate,
    Purge,
    Remove,
    Simple,
}

impl ScenarioKind {
    /// All scenarios, in the order they are listed to users
    pub const ALL: [ScenarioKind; 7] = [
        ScenarioKind::Add,
        ScenarioKind::Count,
        ScenarioKind::Get,
        ScenarioKind::Iterate,
        ScenarioKind::Purge,
        ScenarioKind::Remove,
        ScenarioKind::Simple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::Add => "add",
            ScenarioKind::Count => "count",
            ScenarioKind::Get => "get",
            ScenarioKind::Iterate => "iterate",
            ScenarioKind::Purge => "purge",
            ScenarioKind::Remove => "remove",
            ScenarioKind::Simple => "simple",
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::InvalidScenario(s.to_string()))
    }
}

/// Outcome of a single scenario invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: ScenarioKind,
    /// Elements successfully processed (added, counted, locked, removed...)
    pub done: u64,
    /// Wall-clock duration of the operate loop
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    /// Purge statistics (purge scenario only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub purge: Option<PurgeStats>,
}

impl ScenarioReport {
    pub fn new(scenario: ScenarioKind, done: u64, elapsed: Duration) -> Self {
        Self {
            scenario,
            done,
            elapsed,
            purge: None,
        }
    }
}

/// Outcome of the composite "simple" pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeReport {
    pub stages: Vec<ScenarioReport>,
    /// Top-level entries left under the queue root after the pipeline
    pub residual_entries: usize,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

/// Serialize durations as fractional seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_scenario_names() {
        for kind in ScenarioKind::ALL {
            assert_eq!(kind.as_str().parse::<ScenarioKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_scenario() {
        let err = "size".parse::<ScenarioKind>().unwrap_err();
        assert_eq!(err, DomainError::InvalidScenario("size".to_string()));
        assert_eq!(err.to_string(), "invalid test name: size");
    }

    #[test]
    fn test_report_serializes_elapsed_as_seconds() {
        let report = ScenarioReport::new(ScenarioKind::Add, 10, Duration::from_millis(1500));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["scenario"], "add");
        assert_eq!(json["done"], 10);
        assert_eq!(json["elapsed"], 1.5);
        assert!(json.get("purge").is_none());
    }
}
