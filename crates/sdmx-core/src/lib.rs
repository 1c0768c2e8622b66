//! File-level entry points over the SDMX encodings.
//!
//! This crate ties the format crates together: it loads structure files
//! into one registry, detects the encoding of a data file from its first
//! bytes (falling back to the extension), and reads, writes or converts
//! data files through the matching reader and writer.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use sdmx_core::{DataFormat, ReadOptions, WriteOptions, convert, load_structures};
//!
//! let registry = load_structures(&["structures/ecb_exr.xml"])?;
//! let outcome = convert(
//!     Path::new("data/exr.csv"),
//!     Path::new("data/exr.json"),
//!     DataFormat::Json,
//!     &registry,
//!     &ReadOptions::default(),
//!     &WriteOptions::default(),
//! )?;
//! println!("{} observations", outcome.observations);
//! # Ok::<(), sdmx_core::CoreError>(())
//! ```

pub mod error;
pub mod files;
pub mod format;

pub use error::{CoreError, Result};
pub use files::{
    Conversion, ReadOptions, SNIFF_LEN, WriteOptions, convert, detect_format, load_structures,
    read_data, read_file, write_data, write_file,
};
pub use format::{DataFormat, DocumentKind, sniff, sniff_delimiter};
