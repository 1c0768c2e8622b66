//! Validation report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::violation::{Severity, Violation};

/// Outcome of validating one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Unique id of the structure the dataset is bound through.
    pub dataset: String,
    pub rows: usize,
    pub violations: Vec<Violation>,
    /// True when fail-fast mode stopped the run early.
    pub halted: bool,
}

impl ValidationReport {
    /// A dataset is valid iff no violation was found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity() == severity)
            .count()
    }

    /// Violation count per code.
    pub fn counts_by_code(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for violation in &self.violations {
            *counts.entry(violation.code()).or_insert(0) += 1;
        }
        counts
    }

    pub fn for_component<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.component_id == id)
    }
}
