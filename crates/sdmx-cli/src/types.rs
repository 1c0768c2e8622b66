use std::path::PathBuf;

use sdmx_core::{Conversion, DataFormat};
use sdmx_model::{Action, StructureClass};
use sdmx_validate::ValidationReport;

/// One loaded structure artefact.
#[derive(Debug, Clone)]
pub struct ArtefactSummary {
    pub class: StructureClass,
    pub unique_id: String,
    pub name: Option<String>,
    /// Short description of what the artefact holds, e.g. `12 codes`.
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub structure: String,
    pub action: Action,
    pub dim_at_obs: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone)]
pub struct DataFileSummary {
    pub path: PathBuf,
    pub format: DataFormat,
    pub datasets: Vec<DatasetSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct InspectResult {
    pub structures: Vec<ArtefactSummary>,
    pub data: Vec<DataFileSummary>,
}

#[derive(Debug, Clone)]
pub struct ValidateResult {
    pub input: PathBuf,
    pub format: DataFormat,
    pub reports: Vec<ValidationReport>,
}

impl ValidateResult {
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(ValidationReport::has_errors)
    }
}

#[derive(Debug, Clone)]
pub struct ConvertResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub conversion: Conversion,
}
