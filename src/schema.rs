//! Batch output schema.
//!
//! One [`ReductionRecord`] per input term, written as a JSONL line.

use crate::engine::TextReduction;
use crate::error::LexpError;
use crate::reduction::StopReason;
use serde::{Deserialize, Serialize};

/// Outcome of reducing one input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionRecord {
    /// 1-origin line number in the input
    pub line: usize,
    pub input: String,

    pub steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopReason>,
    pub normal_form: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Cells held by the result term
    pub cells: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub fatal: bool,
}

impl ReductionRecord {
    pub fn reduced(line: usize, input: &str, outcome: TextReduction) -> Self {
        ReductionRecord {
            line,
            input: input.to_string(),
            steps: outcome.reduction.steps,
            stop: Some(outcome.reduction.stop),
            normal_form: outcome.reduction.converged(),
            result: Some(outcome.result),
            cells: outcome.cells,
            error: None,
            fatal: false,
        }
    }

    pub fn failed(line: usize, input: &str, err: &LexpError) -> Self {
        ReductionRecord {
            line,
            input: input.to_string(),
            steps: 0,
            stop: None,
            normal_form: false,
            result: None,
            cells: 0,
            error: Some(err.to_string()),
            fatal: err.is_fatal(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduction::Reduction;

    #[test]
    fn test_serialization() {
        let record = ReductionRecord::reduced(
            3,
            "((L 1.1) 2)",
            TextReduction {
                reduction: Reduction {
                    steps: 1,
                    stop: StopReason::NormalForm,
                },
                result: "2".to_string(),
                cells: 1,
            },
        );

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"stop\":\"normal_form\""));
        assert!(json.contains("\"normal_form\":true"));
        assert!(!json.contains("\"error\""));

        let back: ReductionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_failed_record() {
        let record = ReductionRecord::failed(1, "(L 1.", &LexpError::EmptyInput);
        assert!(record.is_error());
        assert!(!record.fatal);

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"result\""));
        assert!(!json.contains("\"stop\""));

        let fatal = ReductionRecord::failed(1, "x", &LexpError::PoolExhausted { capacity: 8 });
        assert!(fatal.fatal);
    }
}
