//! Validation entry points.

use sdmx_model::{Dataset, Message, Result, StructureRegistry};

use crate::checks::{self, CheckContext, Collector};
use crate::options::ValidationOptions;
use crate::report::ValidationReport;
use crate::rules::RuleSet;

/// Checks datasets against their bound structure.
///
/// Codelists and concepts are resolved through the registry. An unresolved
/// reference aborts validation with a reference error; everything else is
/// reported as a [`Violation`](crate::Violation).
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a StructureRegistry,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a StructureRegistry) -> Self {
        Self {
            registry,
            options: ValidationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate one dataset. The dataset is never modified.
    pub fn validate(&self, dataset: &Dataset) -> Result<ValidationReport> {
        let rules = RuleSet::resolve(dataset.structure(), self.registry, dataset.dim_at_obs())?;
        let ctx = CheckContext {
            dataset,
            rules: &rules,
            options: &self.options,
        };
        let mut collector = Collector::new(self.options.mode);
        checks::run_all(&ctx, &mut collector);
        let (violations, halted) = collector.into_parts();

        let report = ValidationReport {
            dataset: dataset.label(),
            rows: dataset.height(),
            violations,
            halted,
        };
        tracing::info!(
            dataset = %report.dataset,
            rows = report.rows,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "Validated dataset"
        );
        Ok(report)
    }

    /// Validate every dataset of a message, in payload order.
    pub fn validate_message(&self, message: &Message) -> Result<Vec<ValidationReport>> {
        message
            .datasets()
            .iter()
            .map(|dataset| self.validate(dataset))
            .collect()
    }
}

/// Validate a dataset with default options.
pub fn validate_dataset(
    dataset: &Dataset,
    registry: &StructureRegistry,
) -> Result<ValidationReport> {
    Validator::new(registry).validate(dataset)
}

/// Validate all datasets of a message with the given options.
pub fn validate_message(
    message: &Message,
    registry: &StructureRegistry,
    options: ValidationOptions,
) -> Result<Vec<ValidationReport>> {
    Validator::new(registry)
        .with_options(options)
        .validate_message(message)
}
