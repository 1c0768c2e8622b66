use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use sdmx_core::DataFormat;
use sdmx_validate::{Location, Severity, ValidationReport};

use crate::types::{ConvertResult, InspectResult, ValidateResult};

pub fn print_formats() {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Format"),
        header_cell("Extension"),
        header_cell("Message type"),
        header_cell("Access"),
    ]);
    apply_table_style(&mut table);
    for format in DataFormat::ALL {
        table.add_row(vec![
            Cell::new(format.as_str()).fg(Color::Blue),
            Cell::new(format.extension()),
            Cell::new(format.message_type().as_str()),
            Cell::new(if format.is_writable() {
                "read, write"
            } else {
                "read"
            }),
        ]);
    }
    println!("{table}");
}

pub fn print_inspect(result: &InspectResult) {
    if !result.structures.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Class"),
            header_cell("Artefact"),
            header_cell("Name"),
            header_cell("Contents"),
        ]);
        apply_table_style(&mut table);
        for artefact in &result.structures {
            table.add_row(vec![
                Cell::new(artefact.class.as_str()),
                Cell::new(&artefact.unique_id)
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                artefact
                    .name
                    .as_deref()
                    .map_or_else(|| dim_cell("-"), Cell::new),
                Cell::new(&artefact.contents),
            ]);
        }
        println!("Structures:");
        println!("{table}");
    }

    for file in &result.data {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Structure"),
            header_cell("Action"),
            header_cell("Observation axis"),
            header_cell("Rows"),
            header_cell("Columns"),
        ]);
        apply_summary_table_style(&mut table);
        align_column(&mut table, 3, CellAlignment::Right);
        align_column(&mut table, 4, CellAlignment::Right);
        for dataset in &file.datasets {
            table.add_row(vec![
                Cell::new(&dataset.structure)
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                Cell::new(dataset.action.as_str()),
                Cell::new(&dataset.dim_at_obs),
                Cell::new(dataset.rows),
                Cell::new(dataset.columns),
            ]);
        }
        println!();
        println!("{} ({})", file.path.display(), file.format);
        println!("{table}");
    }
}

pub fn print_validation(result: &ValidateResult) {
    println!("Input: {} ({})", result.input.display(), result.format);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Rows"),
        header_cell("Errors"),
        header_cell("Warnings"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for report in &result.reports {
        table.add_row(vec![
            Cell::new(&report.dataset)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(report.rows),
            count_cell(report.error_count(), Color::Red),
            count_cell(report.warning_count(), Color::Yellow),
            status_cell(report),
        ]);
    }
    println!("{table}");
    print_violation_table(&result.reports);
}

pub fn print_conversion(result: &ConvertResult) {
    let conversion = &result.conversion;
    println!(
        "{} ({}) -> {} ({}): {} datasets, {} observations",
        result.input.display(),
        conversion.from,
        result.output.display(),
        conversion.to,
        conversion.datasets,
        conversion.observations
    );
}

/// Violations sharing a dataset, code and component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationGroup {
    pub dataset: String,
    pub severity: Severity,
    pub code: &'static str,
    pub component: String,
    pub count: usize,
    pub first: Location,
    pub reason: String,
}

/// Group violations for display: errors before warnings, then by dataset,
/// code and component.
pub fn violation_groups(reports: &[ValidationReport]) -> Vec<ViolationGroup> {
    let mut groups: BTreeMap<(Severity, &str, &str, &str), ViolationGroup> = BTreeMap::new();
    for report in reports {
        for violation in &report.violations {
            let key = (
                violation.severity(),
                report.dataset.as_str(),
                violation.code(),
                violation.component_id.as_str(),
            );
            groups
                .entry(key)
                .and_modify(|group| group.count += 1)
                .or_insert_with(|| ViolationGroup {
                    dataset: report.dataset.clone(),
                    severity: violation.severity(),
                    code: violation.code(),
                    component: violation.component_id.clone(),
                    count: 1,
                    first: violation.location,
                    reason: violation.reason.clone(),
                });
        }
    }
    groups.into_values().collect()
}

fn print_violation_table(reports: &[ValidationReport]) {
    let groups = violation_groups(reports);
    if groups.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Component"),
        header_cell("Count"),
        header_cell("First at"),
        header_cell("Reason"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for group in groups {
        table.add_row(vec![
            Cell::new(&group.dataset),
            severity_cell(group.severity),
            Cell::new(group.code),
            Cell::new(&group.component),
            Cell::new(group.count).fg(severity_color(group.severity)),
            dim_cell(group.first),
            Cell::new(&group.reason),
        ]);
    }
    println!();
    println!("Violations:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(report: &ValidationReport) -> Cell {
    if report.halted {
        Cell::new("halted")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else if report.has_errors() {
        Cell::new("✗").fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR").fg(Color::Red),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdmx_validate::{Violation, ViolationKind};

    fn report(dataset: &str, violations: Vec<Violation>) -> ValidationReport {
        ValidationReport {
            dataset: dataset.to_string(),
            rows: 3,
            violations,
            halted: false,
        }
    }

    #[test]
    fn test_violation_groups_order_and_count() {
        let reports = [report(
            "ECB:EXR(1.0)",
            vec![
                Violation::new(
                    Location::Row(2),
                    "OBS_VALUE",
                    ViolationKind::DuplicateObservation,
                    "duplicated key",
                ),
                Violation::new(
                    Location::Row(0),
                    "FREQ",
                    ViolationKind::CodelistMembership,
                    "X is not in CL_FREQ",
                ),
                Violation::new(
                    Location::Row(1),
                    "FREQ",
                    ViolationKind::CodelistMembership,
                    "Y is not in CL_FREQ",
                ),
            ],
        )];
        let groups = violation_groups(&reports);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].code, "SS04");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].first, Location::Row(0));
        assert_eq!(groups[0].reason, "X is not in CL_FREQ");
        assert_eq!(groups[1].severity, Severity::Warning);
    }

    #[test]
    fn test_no_violations_no_groups() {
        assert!(violation_groups(&[report("ECB:EXR(1.0)", Vec::new())]).is_empty());
    }
}
