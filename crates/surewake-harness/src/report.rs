//! Run-report model: serde-serializable outcomes plus markdown rendering.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from report generation and persistence.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("report io: {0}")]
    Io(#[from] std::io::Error),
    #[error("report serialization: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of one executed scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub summary: String,
    pub passed: bool,
    /// Failure detail (panic message), absent on success.
    pub detail: Option<String>,
}

/// A full harness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessReport {
    /// Caller-supplied timestamp string; omitted for deterministic output.
    pub generated_at: Option<String>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl HarnessReport {
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<ScenarioOutcome>, generated_at: Option<String>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            generated_at,
            total,
            passed,
            failed: total - passed,
            outcomes,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# surewake scenario report\n\n");
        if let Some(ts) = &self.generated_at {
            out.push_str(&format!("Generated: {ts}\n\n"));
        }
        out.push_str(&format!(
            "Scenarios: {} total, {} passed, {} failed\n\n",
            self.total, self.passed, self.failed
        ));
        out.push_str("| Scenario | Status | Detail |\n");
        out.push_str("|----------|--------|--------|\n");
        for o in &self.outcomes {
            let status = if o.passed { "PASS" } else { "FAIL" };
            let detail = o.detail.as_deref().unwrap_or("");
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                o.name,
                status,
                detail.replace('\n', " ")
            ));
        }
        out
    }

    pub fn write_markdown(&self, path: &Path) -> Result<(), HarnessError> {
        std::fs::write(path, self.to_markdown())?;
        Ok(())
    }
}
