//! Validation options.

use serde::{Deserialize, Serialize};

/// How violations are collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationMode {
    /// Check everything and return every violation.
    #[default]
    CollectAll,
    /// Stop at the first error-severity violation.
    FailFast,
}

/// Options for a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    pub mode: ValidationMode,
    /// Report observations sharing a key.
    pub check_duplicates: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            mode: ValidationMode::CollectAll,
            check_duplicates: true,
        }
    }
}

impl ValidationOptions {
    #[must_use]
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_duplicate_check(mut self, enabled: bool) -> Self {
        self.check_duplicates = enabled;
        self
    }
}
