//! Check steps.
//!
//! Each step appends to a shared [`Collector`] and returns early once the
//! collector has halted (fail-fast mode).

pub mod duplicates;
pub mod facets;
pub mod presence;
pub mod structure;
pub mod time;
pub mod values;

use sdmx_model::Dataset;

use crate::options::{ValidationMode, ValidationOptions};
use crate::rules::RuleSet;
use crate::violation::{Severity, Violation};

/// Everything a check step needs.
pub(crate) struct CheckContext<'a> {
    pub dataset: &'a Dataset,
    pub rules: &'a RuleSet,
    pub options: &'a ValidationOptions,
}

/// Ordered violation sink honouring the validation mode.
#[derive(Debug)]
pub(crate) struct Collector {
    mode: ValidationMode,
    violations: Vec<Violation>,
    halted: bool,
}

impl Collector {
    pub(crate) fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            violations: Vec::new(),
            halted: false,
        }
    }

    pub(crate) fn push(&mut self, violation: Violation) {
        if self.halted {
            return;
        }
        if self.mode == ValidationMode::FailFast && violation.severity() == Severity::Error {
            self.halted = true;
        }
        self.violations.push(violation);
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn into_parts(self) -> (Vec<Violation>, bool) {
        (self.violations, self.halted)
    }
}

/// Run all check steps in order.
pub(crate) fn run_all(ctx: &CheckContext<'_>, out: &mut Collector) {
    let steps: [fn(&CheckContext<'_>, &mut Collector); 4] = [
        structure::check,
        presence::check,
        values::check,
        duplicates::check,
    ];
    for step in steps {
        if out.is_halted() {
            break;
        }
        step(ctx, out);
    }
}
