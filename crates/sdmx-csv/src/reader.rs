//! CSV reader.

use std::collections::HashMap;
use std::io::Read;

use sdmx_model::{
    Action, Dataset, FormatPosition, Header, Message, MessageType, Result, RowBuffer, SdmxError,
    StructureClass, StructureRef, StructureRegistry,
};
use tracing::{debug, info};

use crate::options::{CsvLayout, CsvOptions};
use crate::{ACTION_COLUMN, DATAFLOW_COLUMN, csv_error};

/// Read a CSV table into a data message.
///
/// A plain table needs `structure`. SDMX-CSV rows name their structure in
/// the `DATAFLOW` column, which is tried as a dataflow first and as a data
/// structure otherwise; `structure`, when given, overrides it. Rows are
/// split into one dataset per structure and action, in first-seen order.
///
/// The header must hold every dimension and the measure, and nothing the
/// structure does not declare.
pub fn read_data<R: Read>(
    input: R,
    registry: &StructureRegistry,
    structure: Option<&StructureRef>,
    options: &CsvOptions,
) -> Result<Message> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(options.delimiter)
        .from_reader(input);
    let columns = header_columns(reader.headers().map_err(csv_error)?.iter());
    let records = reader
        .into_records()
        .map(|record| -> Result<(u64, csv::StringRecord)> {
            let record = record.map_err(csv_error)?;
            let line = record.position().map_or(0, csv::Position::line);
            Ok((line, record))
        });
    let message = read_records(&columns, records, registry, structure, options.layout)?;
    info!(
        datasets = message.datasets().len(),
        observations = message.observation_count(),
        "CSV read"
    );
    Ok(message)
}

/// Header cells with byte-order marks and surrounding blanks removed.
pub(crate) fn header_columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
        .collect()
}

/// Build datasets from table rows, each paired with its line number.
///
/// Shared by every tabular source; the header checks and dataset split are
/// those described on [`read_data`].
pub(crate) fn read_records<I>(
    columns: &[String],
    records: I,
    registry: &StructureRegistry,
    structure: Option<&StructureRef>,
    layout: CsvLayout,
) -> Result<Message>
where
    I: IntoIterator<Item = Result<(u64, csv::StringRecord)>>,
{
    let (prefix, components) = match layout {
        CsvLayout::Plain => (0, columns),
        CsvLayout::SdmxCsv => {
            if columns.first().map(String::as_str) != Some(DATAFLOW_COLUMN) {
                return Err(SdmxError::format(
                    format!("SDMX-CSV must start with a {DATAFLOW_COLUMN} column"),
                    FormatPosition::Line(1),
                ));
            }
            let prefix = if columns.get(1).map(String::as_str) == Some(ACTION_COLUMN) {
                2
            } else {
                1
            };
            (prefix, &columns[prefix..])
        }
    };
    let plain_reference = match (layout, structure) {
        (_, Some(reference)) => Some(reference.clone()),
        (CsvLayout::Plain, None) => {
            return Err(SdmxError::structural(
                "a plain table needs a structure to bind to",
            ));
        }
        (CsvLayout::SdmxCsv, None) => None,
    };

    let mut pending: Vec<Pending> = Vec::new();
    let mut slots: HashMap<(String, Action), usize> = HashMap::new();
    for record in records {
        let (line, record) = record?;
        let (dataflow, action) = match layout {
            CsvLayout::Plain => (String::new(), Action::default()),
            CsvLayout::SdmxCsv => {
                let dataflow = record.get(0).unwrap_or_default().trim().to_string();
                let action = match record.get(1).filter(|_| prefix == 2).map(str::trim) {
                    None | Some("") => Action::default(),
                    Some(letter) => letter.parse().map_err(|_| {
                        SdmxError::format(
                            format!("unknown action {letter}"),
                            FormatPosition::Line(line),
                        )
                    })?,
                };
                (dataflow, action)
            }
        };

        let key = (dataflow, action);
        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let reference = match &plain_reference {
                    Some(reference) => reference.clone(),
                    None => resolve(registry, &key.0)?,
                };
                let mut dataset = Dataset::from_registry(registry, &reference)?;
                dataset.action = action;
                check_columns(&dataset, components)?;
                let mut rows = RowBuffer::new();
                for column in components {
                    rows.ensure_column(column);
                }
                slots.insert(key, pending.len());
                pending.push(Pending { dataset, rows });
                pending.len() - 1
            }
        };

        let values = components
            .iter()
            .zip(record.iter().skip(prefix))
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(column, value)| (column, value.to_string()));
        pending[slot].rows.push_row(values);
    }

    // A header without rows still yields an empty dataset for plain tables.
    if pending.is_empty()
        && let Some(reference) = &plain_reference
    {
        let dataset = Dataset::from_registry(registry, reference)?;
        check_columns(&dataset, components)?;
        let mut rows = RowBuffer::new();
        for column in components {
            rows.ensure_column(column);
        }
        pending.push(Pending { dataset, rows });
    }

    let mut datasets = Vec::with_capacity(pending.len());
    for Pending { mut dataset, rows } in pending {
        debug!(dataset = %dataset.label(), rows = rows.len(), "table dataset read");
        dataset.set_data(rows.finish()?)?;
        datasets.push(dataset);
    }
    Ok(Message::new(
        MessageType::StructureSpecificData,
        Header::default(),
        datasets,
    ))
}

struct Pending {
    dataset: Dataset,
    rows: RowBuffer,
}

/// Reference for a `DATAFLOW` cell: a registered dataflow, else a data
/// structure with the same unique id.
fn resolve(registry: &StructureRegistry, unique_id: &str) -> Result<StructureRef> {
    let flow = StructureRef::from_unique_id(StructureClass::Dataflow, unique_id)?;
    if registry.contains(&flow) {
        return Ok(flow);
    }
    StructureRef::from_unique_id(StructureClass::DataStructure, unique_id)
}

fn check_columns(dataset: &Dataset, columns: &[String]) -> Result<()> {
    let dsd = dataset.structure();
    let missing: Vec<&str> = dsd
        .dimension_codes()
        .iter()
        .map(String::as_str)
        .chain(dsd.measure_code())
        .filter(|code| !columns.iter().any(|c| c == code))
        .collect();
    if !missing.is_empty() {
        return Err(SdmxError::schema_mismatch(
            dataset.label(),
            format!("missing columns {}", missing.join(", ")),
        ));
    }
    let undeclared: Vec<&str> = columns
        .iter()
        .map(String::as_str)
        .filter(|column| dsd.component(column).is_none())
        .collect();
    if !undeclared.is_empty() {
        return Err(SdmxError::schema_mismatch(
            dataset.label(),
            format!("undeclared columns {}", undeclared.join(", ")),
        ));
    }
    Ok(())
}
