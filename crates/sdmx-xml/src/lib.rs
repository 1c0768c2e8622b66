//! SDMX-ML 2.1 reader and writer.
//!
//! Data messages come in two encodings:
//!
//! - generic: every component value is a `Value id=".." value=".."` pair
//! - structure-specific: component ids are the attribute names, and the
//!   data structure is needed to tell dimensions from attributes
//!
//! [`read_data`] detects the encoding from the root element and fails with a
//! format error when it is neither. [`write_data`] picks the encoding from
//! [`XmlWriterOptions::message_type`]. Group attributes are written as
//! `Group` elements in series datasets and merged back into matching rows
//! on read.
//!
//! Structure messages are handled by [`read_structure`] and
//! [`write_structure`].

mod data;
mod emit;
mod header;
pub mod namespaces;
mod options;
mod source;
mod structure;

pub use data::DataFlavor;
pub use data::reader::{detect, read_data};
pub use data::writer::write_data;
pub use options::XmlWriterOptions;
pub use structure::reader::{read_structure, read_structure_into};
pub use structure::writer::write_structure;
