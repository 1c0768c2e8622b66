//! Tabular data: one row per observation, one column per component id.
//!
//! The header must name exactly the components of the data structure.
//! Reading accepts columns in any order; writing uses the order the
//! structure declares them in (dimensions, measure, attributes).
//! Dataset-level attributes are repeated on every row.
//!
//! Two layouts are supported, see [`CsvLayout`]. Spreadsheets are read
//! through the same header checks with [`read_spreadsheet`].

mod options;
mod reader;
mod spreadsheet;
mod writer;

use sdmx_model::{FormatPosition, SdmxError};

pub use options::{CsvLayout, CsvOptions};
pub use reader::read_data;
pub use spreadsheet::read_spreadsheet;
pub use writer::write_data;

/// Column holding the structure unique id in SDMX-CSV.
pub const DATAFLOW_COLUMN: &str = "DATAFLOW";

/// Column holding the dataset action letter in SDMX-CSV.
pub const ACTION_COLUMN: &str = "ACTION";

pub(crate) fn csv_error(err: csv::Error) -> SdmxError {
    if err.is_io_error() {
        return SdmxError::Io(err.into());
    }
    let position = err
        .position()
        .map_or(FormatPosition::Unknown, |p| FormatPosition::Line(p.line()));
    SdmxError::format(err.to_string(), position)
}
