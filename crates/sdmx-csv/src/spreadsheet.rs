//! Spreadsheet reader.

use std::io::{Read, Seek};

use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};
use chrono::NaiveTime;
use sdmx_model::{FormatPosition, Message, Result, SdmxError, StructureRef, StructureRegistry};
use tracing::info;

use crate::DATAFLOW_COLUMN;
use crate::options::CsvLayout;
use crate::reader::{header_columns, read_records};

/// Read the first worksheet of a workbook (xlsx, xlsb, xls or ods) into a
/// data message.
///
/// The first row is the header and is checked as for a CSV table. A sheet
/// whose header starts with `DATAFLOW` is read in the SDMX-CSV layout,
/// any other sheet needs `structure`. Blank rows are skipped; line numbers
/// in errors are sheet row numbers.
pub fn read_spreadsheet<RS>(
    input: RS,
    registry: &StructureRegistry,
    structure: Option<&StructureRef>,
) -> Result<Message>
where
    RS: Read + Seek + Clone,
{
    let mut workbook = open_workbook_auto_from_rs(input).map_err(spreadsheet_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SdmxError::format("workbook has no worksheet", FormatPosition::Unknown))?
        .map_err(spreadsheet_error)?;
    let header_line = range.start().map_or(1, |(row, _)| u64::from(row) + 1);

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells
            .iter()
            .map(|cell| cell_text(cell, header_line))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let mut columns = header_columns(header.iter().map(String::as_str));
    while columns.last().is_some_and(String::is_empty) {
        columns.pop();
    }
    let layout = if columns.first().map(String::as_str) == Some(DATAFLOW_COLUMN) {
        CsvLayout::SdmxCsv
    } else {
        CsvLayout::Plain
    };

    let records = rows
        .zip(header_line + 1..)
        .filter(|(cells, _)| !cells.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|(cells, line)| -> Result<(u64, csv::StringRecord)> {
            let values = cells
                .iter()
                .map(|cell| cell_text(cell, line))
                .collect::<Result<Vec<_>>>()?;
            Ok((line, csv::StringRecord::from(values)))
        });
    let message = read_records(&columns, records, registry, structure, layout)?;
    info!(
        datasets = message.datasets().len(),
        observations = message.observation_count(),
        "spreadsheet read"
    );
    Ok(message)
}

fn spreadsheet_error(err: calamine::Error) -> SdmxError {
    SdmxError::format(format!("spreadsheet: {err}"), FormatPosition::Unknown)
}

/// Text of one cell. Whole numbers lose their fraction, dates become ISO
/// dates, and error cells are rejected.
fn cell_text(cell: &Data, line: u64) -> Result<String> {
    match cell {
        Data::Empty => Ok(String::new()),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            Ok(text.trim().to_string())
        }
        Data::DateTime(_) => {
            let moment = cell.as_datetime().ok_or_else(|| {
                SdmxError::format("date cell out of range", FormatPosition::Line(line))
            })?;
            let pattern = if moment.time() == NaiveTime::MIN {
                "%Y-%m-%d"
            } else {
                "%Y-%m-%dT%H:%M:%S"
            };
            Ok(moment.format(pattern).to_string())
        }
        Data::Error(error) => Err(SdmxError::format(
            format!("cell holds the error {error}"),
            FormatPosition::Line(line),
        )),
        _ => Ok(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use calamine::CellErrorType;

    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(2020.0), 2).unwrap(), "2020");
        assert_eq!(cell_text(&Data::Float(1.5), 2).unwrap(), "1.5");
        assert_eq!(cell_text(&Data::Int(7), 2).unwrap(), "7");
        assert_eq!(cell_text(&Data::String(" A ".into()), 2).unwrap(), "A");
        assert_eq!(cell_text(&Data::Empty, 2).unwrap(), "");
    }

    #[test]
    fn test_error_cell_reports_row() {
        let err = cell_text(&Data::Error(CellErrorType::Div0), 4).unwrap_err();
        assert!(
            matches!(
                err,
                SdmxError::Format {
                    position: FormatPosition::Line(4),
                    ..
                }
            ),
            "{err}"
        );
    }
}
