//! CSV writer.

use std::io::Write;

use sdmx_model::{DataStructureDefinition, Dataset, Message, Result, SdmxError};
use tracing::info;

use crate::options::{CsvLayout, CsvOptions};
use crate::{ACTION_COLUMN, DATAFLOW_COLUMN, csv_error};

/// Write the datasets of a message as one CSV table.
///
/// The plain layout holds exactly one dataset. SDMX-CSV may hold several,
/// provided they share the same components; each row then names its
/// structure and action.
pub fn write_data<W: Write>(writer: W, message: &Message, options: &CsvOptions) -> Result<()> {
    if !message.message_type.is_data() {
        return Err(SdmxError::structural(format!(
            "{} is not a data message",
            message.message_type
        )));
    }
    let datasets = message.datasets();
    let Some(first) = datasets.first() else {
        return Err(SdmxError::structural("message has no dataset to write"));
    };
    if options.layout == CsvLayout::Plain && datasets.len() > 1 {
        return Err(SdmxError::structural(format!(
            "plain CSV holds one dataset, message has {}",
            datasets.len()
        )));
    }
    let columns = component_columns(first.structure());
    for dataset in datasets {
        dataset.ensure_encodable()?;
        if component_columns(dataset.structure()) != columns {
            return Err(SdmxError::schema_mismatch(
                dataset.label(),
                format!("components differ from {}", first.label()),
            ));
        }
    }

    let mut out = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 2);
    if options.layout == CsvLayout::SdmxCsv {
        header.extend([DATAFLOW_COLUMN, ACTION_COLUMN]);
    }
    header.extend(columns.iter().copied());
    out.write_record(&header).map_err(csv_error)?;

    for dataset in datasets {
        write_rows(&mut out, dataset, &columns, options.layout)?;
    }
    out.flush()?;
    info!(
        datasets = datasets.len(),
        observations = message.observation_count(),
        columns = header.len(),
        "CSV written"
    );
    Ok(())
}

/// Header columns in declaration order: dimensions, measure, attributes.
fn component_columns(dsd: &DataStructureDefinition) -> Vec<&str> {
    dsd.dimension_codes()
        .iter()
        .map(String::as_str)
        .chain(dsd.measure_code())
        .chain(dsd.attribute_codes().iter().map(String::as_str))
        .collect()
}

fn write_rows<W: Write>(
    out: &mut csv::Writer<W>,
    dataset: &Dataset,
    columns: &[&str],
    layout: CsvLayout,
) -> Result<()> {
    let dsd = dataset.structure();
    let dataflow = dataset.structure_ref().unique_id();
    let mut record: Vec<&str> = Vec::with_capacity(columns.len() + 2);
    for row in 0..dataset.height() {
        record.clear();
        if layout == CsvLayout::SdmxCsv {
            record.extend([dataflow.as_str(), dataset.action.code()]);
        }
        record.extend(columns.iter().map(|&column| {
            let value = if dsd.dataset_attribute_codes().iter().any(|c| c == column) {
                dataset.attribute(column)
            } else {
                dataset.value(column, row)
            };
            value.unwrap_or_default()
        }));
        out.write_record(&record).map_err(csv_error)?;
    }
    Ok(())
}
