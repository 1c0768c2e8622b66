//! Conformance checking of SDMX datasets against their data structure.
//!
//! Validation runs in a fixed order of steps:
//!
//! 1. column set: the observation axis and undeclared columns (ST02, ST01)
//! 2. presence of dimensions, the measure and mandatory attributes (SS01-SS03)
//! 3. per-cell values: codelist membership, time grammar and facets
//!    (SS04-SS06, SS08, SS09)
//! 4. duplicated keys (SS07)
//!
//! Violations are returned in that order and never raised as errors. Only
//! unresolved references abort a run.

mod checks;
mod engine;
mod options;
mod report;
mod rules;
mod violation;

pub use checks::time::is_valid as is_valid_time_period;
pub use engine::{Validator, validate_dataset, validate_message};
pub use options::{ValidationMode, ValidationOptions};
pub use report::ValidationReport;
pub use violation::{Location, Severity, Violation, ViolationKind};
