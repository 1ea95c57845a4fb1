//! Case and run reports
//!
//! Reports serialize to JSON so a run can be archived or inspected by other
//! tools.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::golden::Stage;

/// Outcome of one fixture/stage case
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Found value matches the recorded baseline
    Passed,
    /// No baseline existed; it was written from the found value
    Seeded,
    Failed,
}

impl CaseStatus {
    /// Whether the case counts as a success
    pub fn is_ok(self) -> bool {
        !matches!(self, CaseStatus::Failed)
    }
}

/// Result of running one case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    /// Fixture name
    pub fixture: String,
    pub stage: Stage,
    pub status: CaseStatus,
    /// Baseline file compared against
    pub baseline: PathBuf,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Failure details, including a unified diff on mismatch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of cases (three per fixture)
    pub total: usize,
    pub passed: usize,
    pub seeded: usize,
    pub failed: usize,
    /// Total duration
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

/// Complete run results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    /// Build a report, counting cases by status
    pub fn new(cases: Vec<CaseReport>, duration: Duration) -> Self {
        let count = |status: CaseStatus| cases.iter().filter(|c| c.status == status).count();
        let summary = RunSummary {
            total: cases.len(),
            passed: count(CaseStatus::Passed),
            seeded: count(CaseStatus::Seeded),
            failed: count(CaseStatus::Failed),
            duration,
        };
        Self { summary, cases }
    }

    /// Check if no case failed
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    /// Failed cases, in run order
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| c.status == CaseStatus::Failed)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Serde helper for Duration in milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
