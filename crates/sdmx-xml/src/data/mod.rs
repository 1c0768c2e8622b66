//! Data messages: generic and structure-specific encodings.

pub mod reader;
pub mod writer;

use std::collections::HashMap;

use sdmx_model::{
    AttachmentLevel, AttributeRelationship, Dataset, DimensionAtObservation, Identifiable,
};

/// Which data encoding a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFlavor {
    Generic,
    StructureSpecific,
}

/// Where each column of a dataset is written.
#[derive(Debug)]
pub(crate) struct Layout<'a> {
    /// Dimensions written on each observation.
    pub obs_dimensions: Vec<&'a str>,
    /// Dimensions forming the series key; empty for flat datasets.
    pub series_dimensions: Vec<&'a str>,
    pub series_attributes: Vec<&'a str>,
    pub obs_attributes: Vec<&'a str>,
    pub groups: Vec<GroupLayout<'a>>,
    pub measure: &'a str,
}

#[derive(Debug)]
pub(crate) struct GroupLayout<'a> {
    pub id: &'a str,
    pub dimensions: Vec<&'a str>,
    pub attributes: Vec<&'a str>,
}

impl<'a> Layout<'a> {
    pub(crate) fn new(dataset: &'a Dataset) -> Self {
        let dsd = dataset.structure();
        let dim_at_obs = dataset.dim_at_obs();
        let obs_dimensions = match dim_at_obs {
            DimensionAtObservation::AllDimensions => {
                dsd.dimension_codes().iter().map(String::as_str).collect()
            }
            DimensionAtObservation::Dimension(id) => dsd
                .dimension_codes()
                .iter()
                .map(String::as_str)
                .filter(|code| *code == id.as_str())
                .collect(),
        };
        let groups = dsd
            .groups()
            .iter()
            .filter_map(|group| {
                let attributes: Vec<&str> = dsd
                    .attributes()
                    .components()
                    .iter()
                    .filter(|c| c.attachment_level(dim_at_obs) == Some(AttachmentLevel::Group))
                    .filter(|c| {
                        matches!(c.relationship(), Some(AttributeRelationship::Group(g)) if g == group.id())
                    })
                    .map(Identifiable::id)
                    .collect();
                (!attributes.is_empty()).then(|| GroupLayout {
                    id: group.id(),
                    dimensions: group.dimensions.iter().map(String::as_str).collect(),
                    attributes,
                })
            })
            .collect();
        Self {
            obs_dimensions,
            series_dimensions: dsd.series_dimension_codes(dim_at_obs),
            series_attributes: dsd.attribute_codes_at(AttachmentLevel::Series, dim_at_obs),
            obs_attributes: dsd.attribute_codes_at(AttachmentLevel::Observation, dim_at_obs),
            groups,
            measure: dsd.measure_code().unwrap_or_default(),
        }
    }

    pub(crate) fn is_flat(&self) -> bool {
        self.series_dimensions.is_empty()
    }
}

/// Row indices grouped by the values of `columns`, in first-seen order.
pub(crate) fn group_rows(dataset: &Dataset, columns: &[&str]) -> Vec<Vec<usize>> {
    let mut index: HashMap<Vec<Option<&str>>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for row in 0..dataset.height() {
        let key: Vec<Option<&str>> = columns.iter().map(|c| dataset.value(c, row)).collect();
        match index.get(&key) {
            Some(&slot) => groups[slot].push(row),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }
    groups
}

/// `(column, value)` pairs of a row for the given columns, skipping nulls.
pub(crate) fn row_values<'a>(
    dataset: &'a Dataset,
    row: usize,
    columns: &[&'a str],
) -> Vec<(&'a str, &'a str)> {
    columns
        .iter()
        .filter_map(|&column| dataset.value(column, row).map(|value| (column, value)))
        .collect()
}
