//! SDMX-JSON data messages.
//!
//! Dimension and attribute values are not written inline. Each component
//! gets a table of its distinct values in the `structures` part, and the
//! data part refers to them by position:
//!
//! - a series key `"0:1"` picks value 0 of the first series dimension and
//!   value 1 of the second
//! - an observation is `[measure, attribute index, ...]`, with `null` for
//!   a missing attribute
//!
//! Tables list values in first-seen order (series by series for series
//! datasets), so the same dataset always encodes to the same indices. The
//! reader needs the data structure from a registry to rebuild the dataset.
//!
//! Unlike the XML and CSV readers, which stream rows, the reader parses
//! the whole document before decoding it, so a message is held in memory
//! twice at its peak: once as parsed JSON and once as dataset tables.

mod document;
mod options;
mod reader;
mod writer;

use sdmx_model::{FormatPosition, SdmxError};

pub use options::JsonWriterOptions;
pub use reader::read_data;
pub use writer::write_data;

/// Maps a serde error to a format error at the line it reports.
pub(crate) fn json_error(err: serde_json::Error) -> SdmxError {
    if err.is_io() {
        return SdmxError::Io(err.into());
    }
    let position = match err.line() {
        0 => FormatPosition::Unknown,
        line => FormatPosition::Line(line as u64),
    };
    SdmxError::format(err.to_string(), position)
}
