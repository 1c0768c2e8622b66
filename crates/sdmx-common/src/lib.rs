//! Shared utilities for SDMX crates.

pub mod polars;

pub use polars::{is_missing, parse_f64, string_cells};
