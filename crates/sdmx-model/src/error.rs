//! Error taxonomy shared by every SDMX crate.
//!
//! Semantic violations found during validation are not errors: they are
//! collected as records by `sdmx-validate`. Everything here aborts the
//! current operation.

use std::fmt;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Where in the input a format error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPosition {
    /// Byte offset into the input stream.
    Offset(u64),
    /// 1-based line number.
    Line(u64),
    /// The position could not be determined.
    Unknown,
}

impl fmt::Display for FormatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "byte {offset}"),
            Self::Line(line) => write!(f, "line {line}"),
            Self::Unknown => f.write_str("unknown position"),
        }
    }
}

/// Errors raised while building the structure graph or moving data between
/// encodings.
#[derive(Debug, Error)]
pub enum SdmxError {
    /// A URN or structure reference could not be resolved.
    #[error("unresolved reference: {urn}")]
    Reference { urn: String },

    /// The component or item set of a structure is inconsistent.
    #[error("structural error: {message}")]
    Structural { message: String },

    /// Dataset columns do not match the bound structure.
    #[error("schema mismatch in dataset {dataset}: {message}")]
    SchemaMismatch { dataset: String, message: String },

    /// Malformed input bytes.
    #[error("format error at {position}: {message}")]
    Format {
        message: String,
        position: FormatPosition,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table operation failed.
    #[error("table error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type alias for SDMX operations.
pub type Result<T> = std::result::Result<T, SdmxError>;

impl SdmxError {
    /// Create a Reference error.
    pub fn reference(urn: impl Into<String>) -> Self {
        Self::Reference { urn: urn.into() }
    }

    /// Create a Structural error.
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    /// Create a SchemaMismatch error.
    pub fn schema_mismatch(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    /// Create a Format error.
    pub fn format(message: impl Into<String>, position: FormatPosition) -> Self {
        Self::Format {
            message: message.into(),
            position,
        }
    }

    /// Short category label used in reports.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Reference { .. } => "reference",
            Self::Structural { .. } => "structural",
            Self::SchemaMismatch { .. } => "schema-mismatch",
            Self::Format { .. } => "format",
            Self::Io(_) => "io",
            Self::Polars(_) => "table",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = SdmxError::format("unexpected element Foo", FormatPosition::Offset(120));
        assert_eq!(
            err.to_string(),
            "format error at byte 120: unexpected element Foo"
        );
        let err = SdmxError::format("bad row", FormatPosition::Line(3));
        assert_eq!(err.to_string(), "format error at line 3: bad row");
    }

    #[test]
    fn test_schema_mismatch_display() {
        let err = SdmxError::schema_mismatch("ECB:EXR(1.0)", "missing column FREQ");
        assert_eq!(
            err.to_string(),
            "schema mismatch in dataset ECB:EXR(1.0): missing column FREQ"
        );
        assert_eq!(err.category(), "schema-mismatch");
    }
}
