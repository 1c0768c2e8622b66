//! Structure messages: agency schemes, codelists, concept schemes, data
//! structures and dataflows.
//!
//! Structure documents are small compared to data, so they are read into an
//! element tree and walked. Sections may appear in any order on input;
//! cross references are checked once the whole document is registered.

pub mod reader;
pub mod writer;

/// Attribute names of a `TextFormat`/`EnumerationFormat` element that are
/// not facets.
const TEXT_TYPE: &str = "textType";
