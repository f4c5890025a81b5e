//! Quality check audit records and scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Warning => "warning",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(Self::Passed),
            "warning" => Ok(Self::Warning),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown check status: {}", s)),
        }
    }
}

/// One appended quality check result (audit row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct QualityCheckResult {
    pub id: i64,
    pub check_name: String,
    pub table_name: String,
    /// Stored as text; parse with [`CheckStatus`]
    pub status: String,
    pub details: Option<serde_json::Value>,
    pub executed_at: DateTime<Utc>,
}

/// Per-table quality score: passed checks over total checks, as a
/// percentage rounded to one decimal. Warnings count as non-passed.
pub fn quality_score(passed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = passed as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_counts_warnings_as_non_passed() {
        // 4 passed, 1 warning, 1 failed out of 6
        assert_eq!(quality_score(4, 6), 66.7);
    }

    #[test]
    fn score_is_percentage() {
        assert_eq!(quality_score(6, 6), 100.0);
        assert_eq!(quality_score(0, 6), 0.0);
        assert_eq!(quality_score(0, 0), 0.0);
    }
}
