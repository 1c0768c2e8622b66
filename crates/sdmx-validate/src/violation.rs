//! Violation records.
//!
//! Violations are data, not errors: validation collects them in order and
//! the caller decides whether any of them is fatal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Violation severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// The dataset does not conform.
    Error,
    /// Suspicious but encodable.
    Warning,
}

impl Severity {
    /// Parse severity from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" | "critical" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// What went wrong, with its stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// SS01: a dimension column is absent or entirely empty.
    MissingDimension,
    /// SS02: the measure column is absent, or a measure value is missing.
    MissingMeasure,
    /// SS03: a mandatory attribute is not reported at all.
    MissingAttribute,
    /// SS04: a value is not a member of the component's codelist.
    CodelistMembership,
    /// SS05: a dimension cell is empty.
    MissingDimensionValue,
    /// SS06: a mandatory attribute cell is empty.
    MissingAttributeValue,
    /// SS07: two observations share the same key.
    DuplicateObservation,
    /// SS08: a value breaks a facet or its data type.
    Facet,
    /// SS09: a value is not a valid time period.
    TimeFormat,
    /// ST01: a column matches no component.
    UndeclaredColumn,
    /// ST02: the observation axis is not a dimension.
    InvalidDimensionAtObservation,
}

impl ViolationKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingDimension => "SS01",
            Self::MissingMeasure => "SS02",
            Self::MissingAttribute => "SS03",
            Self::CodelistMembership => "SS04",
            Self::MissingDimensionValue => "SS05",
            Self::MissingAttributeValue => "SS06",
            Self::DuplicateObservation => "SS07",
            Self::Facet => "SS08",
            Self::TimeFormat => "SS09",
            Self::UndeclaredColumn => "ST01",
            Self::InvalidDimensionAtObservation => "ST02",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::DuplicateObservation | Self::Facet => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// True for checks of the column set rather than of values.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::MissingDimension
                | Self::MissingMeasure
                | Self::MissingAttribute
                | Self::UndeclaredColumn
                | Self::InvalidDimensionAtObservation
        )
    }
}

/// Where a violation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    /// The dataset as a whole (column set, dataset-level attributes).
    DatasetLevel,
    /// 0-based row index in the dataset table.
    Row(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatasetLevel => f.write_str("dataset-level"),
            Self::Row(row) => write!(f, "row {row}"),
        }
    }
}

/// One conformance failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub location: Location,
    pub component_id: String,
    pub kind: ViolationKind,
    pub reason: String,
}

impl Violation {
    pub fn new(
        location: Location,
        component_id: impl Into<String>,
        kind: ViolationKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            location,
            component_id: component_id.into(),
            kind,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.code(),
            self.location,
            self.component_id,
            self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let violation = Violation::new(
            Location::DatasetLevel,
            "UNIT_MULT",
            ViolationKind::MissingAttribute,
            "missing mandatory attribute UNIT_MULT",
        );
        assert_eq!(
            violation.to_string(),
            "[SS03] dataset-level UNIT_MULT: missing mandatory attribute UNIT_MULT"
        );
        assert_eq!(Location::Row(4).to_string(), "row 4");
    }

    #[test]
    fn test_severity() {
        assert_eq!(ViolationKind::DuplicateObservation.severity(), Severity::Warning);
        assert_eq!(ViolationKind::CodelistMembership.severity(), Severity::Error);
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Error));
    }

    #[test]
    fn test_serializes_to_json() {
        let violation = Violation::new(Location::Row(0), "FREQ", ViolationKind::CodelistMembership, "x");
        let json = serde_json::to_value(&violation).expect("json");
        assert_eq!(json["kind"], "CodelistMembership");
        assert_eq!(json["location"]["Row"], 0);
    }
}
