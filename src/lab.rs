//! Lab result aggregation
//!
//! A lab job runs several independently scored tests. Results arrive over one
//! or more packets; the aggregator keeps the latest outcome per test and
//! derives the overall verdict after every update.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single lab test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
    Pending,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Fail | Outcome::Error)
    }

    /// Display group: failures first, passes last
    fn display_rank(&self) -> u8 {
        match self {
            Outcome::Fail | Outcome::Error => 0,
            Outcome::Pending => 1,
            Outcome::Pass => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Error => "error",
            Outcome::Pending => "pending",
        };
        write!(f, "{}", s)
    }
}

/// Latest known state of one lab test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestResult {
    pub test_ref: String,
    pub outcome: Outcome,
    #[serde(default)]
    pub detail: String,
}

impl LabTestResult {
    pub fn pending(test_ref: impl Into<String>) -> Self {
        Self {
            test_ref: test_ref.into(),
            outcome: Outcome::Pending,
            detail: String::new(),
        }
    }
}

/// Payload of a `lab` message: one result or a batch of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabOutput {
    /// Any overall `success` flag sent with a batch is ignored; the
    /// verdict is always derived from the cases.
    Batch { cases: Vec<LabTestResult> },
    Single(LabTestResult),
}

impl LabOutput {
    pub fn results(&self) -> &[LabTestResult] {
        match self {
            LabOutput::Batch { cases } => cases,
            LabOutput::Single(result) => std::slice::from_ref(result),
        }
    }
}

/// Overall verdict of the tests seen so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStatus {
    pub all_passed: bool,
    pub any_failed: bool,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub pending: usize,
    pub total: usize,
}

impl AggregateStatus {
    /// Fraction of tests passed, 0.0 when nothing is known yet
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

/// Per-test state of one submission, keyed by test reference
#[derive(Debug, Default)]
pub struct LabAggregator {
    results: BTreeMap<String, LabTestResult>,
}

impl LabAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test referenced by a packet; keeps any known outcome
    pub fn touch(&mut self, test_ref: &str) {
        if !self.results.contains_key(test_ref) {
            self.results
                .insert(test_ref.to_string(), LabTestResult::pending(test_ref));
        }
    }

    /// Merge a lab payload and recompute the status.
    /// A second result for the same test overwrites the first.
    pub fn apply(&mut self, output: &LabOutput) -> AggregateStatus {
        for result in output.results() {
            self.results.insert(result.test_ref.clone(), result.clone());
        }
        self.status()
    }

    pub fn status(&self) -> AggregateStatus {
        let mut status = AggregateStatus {
            total: self.results.len(),
            ..Default::default()
        };

        for result in self.results.values() {
            match result.outcome {
                Outcome::Pass => status.passed += 1,
                Outcome::Fail => status.failed += 1,
                Outcome::Error => status.errored += 1,
                Outcome::Pending => status.pending += 1,
            }
        }

        status.all_passed = status.total > 0 && status.passed == status.total;
        status.any_failed = status.failed + status.errored > 0;
        status
    }

    pub fn get(&self, test_ref: &str) -> Option<&LabTestResult> {
        self.results.get(test_ref)
    }

    /// Results ordered for display: failures and errors, then pending, then
    /// passes; alphabetical by reference within a group
    pub fn sorted(&self) -> Vec<&LabTestResult> {
        let mut sorted: Vec<_> = self.results.values().collect();
        sorted.sort_by(|a, b| display_order(a, b));
        sorted
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn reset(&mut self) {
        self.results.clear();
    }
}

fn display_order(a: &LabTestResult, b: &LabTestResult) -> Ordering {
    a.outcome
        .display_rank()
        .cmp(&b.outcome.display_rank())
        .then_with(|| a.test_ref.cmp(&b.test_ref))
}
