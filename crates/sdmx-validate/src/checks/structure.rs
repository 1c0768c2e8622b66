//! Column-set checks: observation axis and undeclared columns.

use sdmx_model::DimensionAtObservation;

use super::{CheckContext, Collector};
use crate::violation::{Location, Violation, ViolationKind};

pub(crate) fn check(ctx: &CheckContext<'_>, out: &mut Collector) {
    let dsd = ctx.dataset.structure();
    if let DimensionAtObservation::Dimension(id) = ctx.dataset.dim_at_obs()
        && !dsd.dimensions().contains(id)
    {
        out.push(Violation::new(
            Location::DatasetLevel,
            id.as_str(),
            ViolationKind::InvalidDimensionAtObservation,
            format!("dimension at observation {id} is not a dimension of the structure"),
        ));
    }
    for column in ctx.dataset.column_names() {
        if out.is_halted() {
            return;
        }
        if ctx.rules.get(&column).is_none() {
            out.push(Violation::new(
                Location::DatasetLevel,
                column.as_str(),
                ViolationKind::UndeclaredColumn,
                format!("column {column} is not declared by the structure"),
            ));
        }
    }
    for id in ctx.dataset.attached_attributes().keys() {
        if out.is_halted() {
            return;
        }
        if ctx.rules.get(id).is_none_or(|rule| !rule.is_dataset_level()) {
            out.push(Violation::new(
                Location::DatasetLevel,
                id.as_str(),
                ViolationKind::UndeclaredColumn,
                format!("{id} is not a dataset-level attribute of the structure"),
            ));
        }
    }
}
