//! Per-cell checks: missing values and representation conformance.

use sdmx_common::is_missing;
use sdmx_model::Maintainable;

use super::{CheckContext, Collector, facets, time};
use crate::rules::{ComponentRule, Role};
use crate::violation::{Location, Violation, ViolationKind};

/// Column holding the observation status; `M` marks a missing value.
const OBS_STATUS: &str = "OBS_STATUS";
const MISSING_STATUS: &str = "M";

/// Why a non-empty value fails its component's representation.
pub(crate) fn representation_failure(
    rule: &ComponentRule,
    value: &str,
) -> Option<(ViolationKind, String)> {
    if let Some(codelist) = &rule.codelist {
        if codelist.contains(value) {
            return None;
        }
        return Some((
            ViolationKind::CodelistMembership,
            format!("value {value} not found in codelist {}", codelist_label(rule)),
        ));
    }
    if rule.is_time()
        && let Some(text_type) = rule.text_type
        && !time::is_valid(text_type, value)
    {
        return Some((
            ViolationKind::TimeFormat,
            format!("value {value} is not a valid {text_type}"),
        ));
    }
    facets::check(rule, value).map(|reason| (ViolationKind::Facet, reason))
}

fn codelist_label(rule: &ComponentRule) -> String {
    rule.codelist
        .as_deref()
        .map(Maintainable::unique_id)
        .unwrap_or_default()
}

pub(crate) fn check(ctx: &CheckContext<'_>, out: &mut Collector) {
    check_dataset_attributes(ctx, out);

    // Only columns that carry at least one value; fully missing ones were
    // reported by the presence step.
    let columns: Vec<_> = ctx
        .rules
        .rules
        .iter()
        .filter(|rule| !rule.is_dataset_level())
        .filter_map(|rule| {
            let values = ctx.dataset.column_values(&rule.id)?;
            (values.null_count() < values.len()).then_some((rule, values))
        })
        .collect();
    let status = ctx.dataset.column_values(OBS_STATUS);

    for row in 0..ctx.dataset.height() {
        for (rule, values) in &columns {
            if out.is_halted() {
                return;
            }
            match values.get(row) {
                Some(value) if !is_missing(Some(value)) => {
                    if let Some((kind, reason)) = representation_failure(rule, value) {
                        out.push(Violation::new(Location::Row(row), rule.id.as_str(), kind, reason));
                    }
                }
                _ => {
                    let kind = match rule.role {
                        Role::Dimension => ViolationKind::MissingDimensionValue,
                        Role::Measure => {
                            let flagged = status.and_then(|s| s.get(row)) == Some(MISSING_STATUS);
                            if flagged {
                                continue;
                            }
                            ViolationKind::MissingMeasure
                        }
                        Role::Attribute if rule.mandatory => ViolationKind::MissingAttributeValue,
                        Role::Attribute => continue,
                    };
                    out.push(Violation::new(
                        Location::Row(row),
                        rule.id.as_str(),
                        kind,
                        format!("missing value in {} {}", rule.role.label(), rule.id),
                    ));
                }
            }
        }
    }
}

/// Values attached at dataset level are checked once, not per row.
fn check_dataset_attributes(ctx: &CheckContext<'_>, out: &mut Collector) {
    for (id, value) in ctx.dataset.attached_attributes() {
        if out.is_halted() {
            return;
        }
        let Some(rule) = ctx.rules.get(id) else {
            continue;
        };
        if is_missing(Some(value)) {
            continue;
        }
        if let Some((kind, reason)) = representation_failure(rule, value) {
            out.push(Violation::new(Location::DatasetLevel, id.as_str(), kind, reason));
        }
    }
}
