//! Observations sharing the same full key.

use std::collections::HashMap;

use super::{CheckContext, Collector};
use crate::rules::Role;
use crate::violation::{Location, Violation, ViolationKind};

pub(crate) fn check(ctx: &CheckContext<'_>, out: &mut Collector) {
    if !ctx.options.check_duplicates {
        return;
    }
    let key_columns: Vec<_> = ctx
        .rules
        .by_role(Role::Dimension)
        .filter_map(|rule| ctx.dataset.column_values(&rule.id))
        .collect();
    if key_columns.is_empty() {
        return;
    }
    let measure = ctx.dataset.structure().measure_code().unwrap_or_default();

    let mut first_seen: HashMap<Vec<Option<&str>>, usize> = HashMap::new();
    for row in 0..ctx.dataset.height() {
        if out.is_halted() {
            return;
        }
        let key: Vec<Option<&str>> = key_columns.iter().map(|values| values.get(row)).collect();
        if let Some(first) = first_seen.get(&key) {
            out.push(Violation::new(
                Location::Row(row),
                measure,
                ViolationKind::DuplicateObservation,
                format!("duplicated datapoint, same key as row {first}"),
            ));
        } else {
            first_seen.insert(key, row);
        }
    }
}
