//! Presence of dimensions, measure and mandatory attributes.

use super::{CheckContext, Collector};
use crate::rules::Role;
use crate::violation::{Location, Violation, ViolationKind};

/// A column counts as reported when it exists and holds a non-null cell.
fn is_reported(ctx: &CheckContext<'_>, id: &str) -> bool {
    ctx.dataset
        .column_values(id)
        .is_some_and(|values| values.null_count() < values.len())
}

pub(crate) fn check(ctx: &CheckContext<'_>, out: &mut Collector) {
    for rule in &ctx.rules.rules {
        if out.is_halted() {
            return;
        }
        if rule.is_dataset_level() {
            if rule.mandatory && ctx.dataset.attribute(&rule.id).is_none() {
                out.push(Violation::new(
                    Location::DatasetLevel,
                    rule.id.as_str(),
                    ViolationKind::MissingAttribute,
                    format!("missing mandatory attribute {}", rule.id),
                ));
            }
            continue;
        }
        if is_reported(ctx, &rule.id) {
            continue;
        }
        let kind = match rule.role {
            Role::Dimension => ViolationKind::MissingDimension,
            Role::Measure => ViolationKind::MissingMeasure,
            Role::Attribute if rule.mandatory => ViolationKind::MissingAttribute,
            Role::Attribute => continue,
        };
        out.push(Violation::new(
            Location::DatasetLevel,
            rule.id.as_str(),
            kind,
            format!("missing {} {}", mandatory_label(rule.role), rule.id),
        ));
    }
}

fn mandatory_label(role: Role) -> &'static str {
    match role {
        Role::Attribute => "mandatory attribute",
        other => other.label(),
    }
}
