//! Datasets: observations bound to a data structure.
//!
//! The table holds one row per observation and one string column per
//! dimension, measure and non-dataset-level attribute. Blank cells are
//! stored as nulls. Dataset-level attribute values live in
//! `attached_attributes` instead of the table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sdmx_common::string_cells;

use crate::base::Maintainable;
use crate::dsd::{DataFlowDefinition, DataStructureDefinition};
use crate::error::{Result, SdmxError};
use crate::registry::StructureRegistry;
use crate::urn::StructureRef;

/// The dimension used as the observation axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DimensionAtObservation {
    /// Flat layout: every dimension is reported on each observation.
    #[default]
    AllDimensions,
    /// Series layout keyed by every other dimension.
    Dimension(String),
}

impl DimensionAtObservation {
    pub const ALL_DIMENSIONS: &'static str = "AllDimensions";

    pub fn as_str(&self) -> &str {
        match self {
            Self::AllDimensions => Self::ALL_DIMENSIONS,
            Self::Dimension(id) => id,
        }
    }

    pub fn is_all_dimensions(&self) -> bool {
        matches!(self, Self::AllDimensions)
    }
}

impl fmt::Display for DimensionAtObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DimensionAtObservation {
    fn from(value: &str) -> Self {
        if value == Self::ALL_DIMENSIONS || value.is_empty() {
            Self::AllDimensions
        } else {
            Self::Dimension(value.to_string())
        }
    }
}

/// What the receiver should do with a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Append,
    #[default]
    Replace,
    Delete,
    Information,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "Append",
            Self::Replace => "Replace",
            Self::Delete => "Delete",
            Self::Information => "Information",
        }
    }

    /// Single-letter code used by SDMX-CSV.
    pub fn code(self) -> &'static str {
        match self {
            Self::Append => "A",
            Self::Replace => "R",
            Self::Delete => "D",
            Self::Information => "I",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = SdmxError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "append" | "a" => Ok(Self::Append),
            "replace" | "r" => Ok(Self::Replace),
            "delete" | "d" => Ok(Self::Delete),
            "information" | "i" => Ok(Self::Information),
            other => Err(SdmxError::structural(format!("unknown dataset action {other}"))),
        }
    }
}

/// Observations bound to one data structure.
#[derive(Debug, Clone)]
pub struct Dataset {
    structure: Arc<DataStructureDefinition>,
    structure_ref: StructureRef,
    dim_at_obs: DimensionAtObservation,
    pub action: Action,
    attached_attributes: BTreeMap<String, String>,
    data: DataFrame,
}

impl Dataset {
    /// Empty dataset bound directly to a data structure.
    pub fn new(structure: Arc<DataStructureDefinition>) -> Self {
        let structure_ref = structure.structure_ref();
        Self {
            structure,
            structure_ref,
            dim_at_obs: DimensionAtObservation::AllDimensions,
            action: Action::default(),
            attached_attributes: BTreeMap::new(),
            data: DataFrame::empty(),
        }
    }

    /// Empty dataset bound through a dataflow.
    pub fn for_dataflow(
        flow: &DataFlowDefinition,
        structure: Arc<DataStructureDefinition>,
    ) -> Result<Self> {
        if flow.structure() != &structure.structure_ref() {
            return Err(SdmxError::reference(flow.structure().urn()));
        }
        let mut dataset = Self::new(structure);
        dataset.structure_ref = flow.structure_ref();
        Ok(dataset)
    }

    /// Empty dataset for a DataStructure or Dataflow reference.
    pub fn from_registry(registry: &StructureRegistry, reference: &StructureRef) -> Result<Self> {
        let structure = registry.structure_for(reference)?;
        let mut dataset = Self::new(structure);
        dataset.structure_ref = reference.clone();
        Ok(dataset)
    }

    pub fn structure(&self) -> &Arc<DataStructureDefinition> {
        &self.structure
    }

    /// The DataStructure or Dataflow this dataset was bound through.
    pub fn structure_ref(&self) -> &StructureRef {
        &self.structure_ref
    }

    /// Label used in errors and logs.
    pub fn label(&self) -> String {
        self.structure_ref.unique_id()
    }

    pub fn dim_at_obs(&self) -> &DimensionAtObservation {
        &self.dim_at_obs
    }

    /// Changes the observation axis. The value is checked by validation, not
    /// here.
    pub fn set_dim_at_obs(&mut self, dim_at_obs: DimensionAtObservation) {
        self.dim_at_obs = dim_at_obs;
    }

    pub fn attached_attributes(&self) -> &BTreeMap<String, String> {
        &self.attached_attributes
    }

    pub fn attribute(&self, id: &str) -> Option<&str> {
        self.attached_attributes.get(id).map(String::as_str)
    }

    pub fn set_attribute(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.attached_attributes.insert(id.into(), value.into());
    }

    pub fn remove_attribute(&mut self, id: &str) -> Option<String> {
        self.attached_attributes.remove(id)
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, id: &str) -> bool {
        self.data.column(id).is_ok()
    }

    /// String cells of a column, or `None` when the column is absent.
    pub fn column_values(&self, id: &str) -> Option<&StringChunked> {
        self.data.column(id).ok()?.str().ok()
    }

    pub fn value(&self, column: &str, row: usize) -> Option<&str> {
        self.column_values(column)?.get(row)
    }

    /// Replaces the table.
    ///
    /// Every column is converted to strings with blanks as nulls. Columns
    /// of dataset-level attributes are lifted into `attached_attributes`
    /// (first non-null value, unless already set) and dropped. Remaining
    /// columns are put in canonical order: dimensions, measure,
    /// attributes, then anything undeclared.
    pub fn set_data(&mut self, data: DataFrame) -> Result<()> {
        let data = normalize(data)?;
        let data = self.lift_dataset_attributes(data)?;
        self.data = self.canonical_order(data)?;
        debug!(
            dataset = %self.label(),
            rows = self.data.height(),
            columns = self.data.width(),
            "dataset table set"
        );
        Ok(())
    }

    /// Appends rows. Columns present on only one side are null-filled on
    /// the other.
    pub fn append(&mut self, rows: DataFrame) -> Result<()> {
        if self.data.width() == 0 {
            return self.set_data(rows);
        }
        let rows = normalize(rows)?;
        let mut rows = self.lift_dataset_attributes(rows)?;
        let mut current = std::mem::take(&mut self.data);
        for name in column_names(&rows) {
            if current.column(&name).is_err() {
                current.with_column(Column::full_null(
                    name.as_str().into(),
                    current.height(),
                    &DataType::String,
                ))?;
            }
        }
        for name in column_names(&current) {
            if rows.column(&name).is_err() {
                rows.with_column(Column::full_null(
                    name.as_str().into(),
                    rows.height(),
                    &DataType::String,
                ))?;
            }
        }
        let order = column_names(&current);
        let rows = rows.select(order)?;
        current.vstack_mut(&rows)?;
        self.data = current;
        Ok(())
    }

    fn lift_dataset_attributes(&mut self, mut data: DataFrame) -> Result<DataFrame> {
        let codes = self.structure.dataset_attribute_codes().to_vec();
        for code in codes {
            let Ok(column) = data.drop_in_place(&code) else {
                continue;
            };
            let cells = string_cells(&column)?;
            let mut values = cells.into_iter().flatten();
            if let Some(first) = values.next() {
                if values.any(|v| v != first) {
                    warn!(
                        dataset = %self.label(),
                        attribute = %code,
                        "dataset-level attribute has several values, keeping the first"
                    );
                }
                self.attached_attributes.entry(code).or_insert(first);
            }
        }
        Ok(data)
    }

    fn canonical_order(&self, data: DataFrame) -> Result<DataFrame> {
        let present = column_names(&data);
        let declared = self.structure.column_codes();
        let mut order: Vec<String> = declared
            .iter()
            .filter(|code| present.iter().any(|p| p == *code))
            .map(|code| code.to_string())
            .collect();
        order.extend(
            present
                .into_iter()
                .filter(|name| !declared.contains(&name.as_str())),
        );
        Ok(data.select(order)?)
    }

    /// Fails when the table cannot be encoded against its structure:
    /// a dimension or the measure column is missing, a column is not
    /// declared, or the observation axis is not a dimension.
    pub fn ensure_encodable(&self) -> Result<()> {
        let dsd = &self.structure;
        if let DimensionAtObservation::Dimension(id) = &self.dim_at_obs
            && !dsd.dimensions().contains(id)
        {
            return Err(SdmxError::schema_mismatch(
                self.label(),
                format!("dimension at observation {id} is not a dimension"),
            ));
        }
        let mut required: Vec<&str> = dsd.dimension_codes().iter().map(String::as_str).collect();
        required.extend(dsd.measure_code());
        let missing: Vec<&str> = required
            .into_iter()
            .filter(|code| !self.has_column(code))
            .collect();
        if !missing.is_empty() {
            return Err(SdmxError::schema_mismatch(
                self.label(),
                format!("missing columns {}", missing.join(", ")),
            ));
        }
        let undeclared: Vec<String> = self
            .column_names()
            .into_iter()
            .filter(|name| dsd.component(name).is_none())
            .collect();
        if !undeclared.is_empty() {
            return Err(SdmxError::schema_mismatch(
                self.label(),
                format!("undeclared columns {}", undeclared.join(", ")),
            ));
        }
        Ok(())
    }
}

fn column_names(data: &DataFrame) -> Vec<String> {
    data.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Converts every column to strings with blanks as nulls.
fn normalize(data: DataFrame) -> Result<DataFrame> {
    let columns = data
        .get_columns()
        .iter()
        .map(|column| Ok(Column::new(column.name().clone(), string_cells(column)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(DataFrame::new(columns)?)
}
