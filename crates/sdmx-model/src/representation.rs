//! Representations and facets.
//!
//! A representation declares the value space of a component: either an
//! enumeration (a codelist reference) or a text format made of a data type
//! and a set of facets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::urn::StructureRef;

/// Facet kinds of an SDMX text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetType {
    IsSequence,
    MinLength,
    MaxLength,
    MinValue,
    MaxValue,
    StartValue,
    EndValue,
    Interval,
    TimeInterval,
    Decimals,
    Pattern,
    StartTime,
    EndTime,
}

impl FacetType {
    pub const ALL: [FacetType; 13] = [
        FacetType::IsSequence,
        FacetType::MinLength,
        FacetType::MaxLength,
        FacetType::MinValue,
        FacetType::MaxValue,
        FacetType::StartValue,
        FacetType::EndValue,
        FacetType::Interval,
        FacetType::TimeInterval,
        FacetType::Decimals,
        FacetType::Pattern,
        FacetType::StartTime,
        FacetType::EndTime,
    ];

    /// Attribute name on a `TextFormat` element.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsSequence => "isSequence",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::MinValue => "minValue",
            Self::MaxValue => "maxValue",
            Self::StartValue => "startValue",
            Self::EndValue => "endValue",
            Self::Interval => "interval",
            Self::TimeInterval => "timeInterval",
            Self::Decimals => "decimals",
            Self::Pattern => "pattern",
            Self::StartTime => "startTime",
            Self::EndTime => "endTime",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Type of the facet's own value.
    pub fn value_type(self) -> FacetValueType {
        match self {
            Self::IsSequence => FacetValueType::Boolean,
            Self::MinLength | Self::MaxLength | Self::Decimals => FacetValueType::BigInteger,
            Self::MinValue | Self::MaxValue | Self::StartValue | Self::EndValue | Self::Interval => {
                FacetValueType::Decimal
            }
            Self::TimeInterval => FacetValueType::Duration,
            Self::Pattern => FacetValueType::String,
            Self::StartTime | Self::EndTime => FacetValueType::ObservationalTimePeriod,
        }
    }
}

impl fmt::Display for FacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SDMX data types, used both as a representation's `textType` and as the
/// value type of individual facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetValueType {
    String,
    Alpha,
    AlphaNumeric,
    Numeric,
    BigInteger,
    Integer,
    Long,
    Short,
    Decimal,
    Float,
    Double,
    Boolean,
    Uri,
    Count,
    InclusiveValueRange,
    ExclusiveValueRange,
    Incremental,
    ObservationalTimePeriod,
    StandardTimePeriod,
    BasicTimePeriod,
    GregorianTimePeriod,
    GregorianYear,
    GregorianYearMonth,
    GregorianDay,
    ReportingTimePeriod,
    ReportingYear,
    ReportingSemester,
    ReportingTrimester,
    ReportingQuarter,
    ReportingMonth,
    ReportingWeek,
    ReportingDay,
    DateTime,
    TimeRange,
    Month,
    MonthDay,
    Day,
    Time,
    Duration,
}

impl FacetValueType {
    pub const ALL: [FacetValueType; 39] = [
        FacetValueType::String,
        FacetValueType::Alpha,
        FacetValueType::AlphaNumeric,
        FacetValueType::Numeric,
        FacetValueType::BigInteger,
        FacetValueType::Integer,
        FacetValueType::Long,
        FacetValueType::Short,
        FacetValueType::Decimal,
        FacetValueType::Float,
        FacetValueType::Double,
        FacetValueType::Boolean,
        FacetValueType::Uri,
        FacetValueType::Count,
        FacetValueType::InclusiveValueRange,
        FacetValueType::ExclusiveValueRange,
        FacetValueType::Incremental,
        FacetValueType::ObservationalTimePeriod,
        FacetValueType::StandardTimePeriod,
        FacetValueType::BasicTimePeriod,
        FacetValueType::GregorianTimePeriod,
        FacetValueType::GregorianYear,
        FacetValueType::GregorianYearMonth,
        FacetValueType::GregorianDay,
        FacetValueType::ReportingTimePeriod,
        FacetValueType::ReportingYear,
        FacetValueType::ReportingSemester,
        FacetValueType::ReportingTrimester,
        FacetValueType::ReportingQuarter,
        FacetValueType::ReportingMonth,
        FacetValueType::ReportingWeek,
        FacetValueType::ReportingDay,
        FacetValueType::DateTime,
        FacetValueType::TimeRange,
        FacetValueType::Month,
        FacetValueType::MonthDay,
        FacetValueType::Day,
        FacetValueType::Time,
        FacetValueType::Duration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Alpha => "Alpha",
            Self::AlphaNumeric => "AlphaNumeric",
            Self::Numeric => "Numeric",
            Self::BigInteger => "BigInteger",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Short => "Short",
            Self::Decimal => "Decimal",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Boolean => "Boolean",
            Self::Uri => "URI",
            Self::Count => "Count",
            Self::InclusiveValueRange => "InclusiveValueRange",
            Self::ExclusiveValueRange => "ExclusiveValueRange",
            Self::Incremental => "Incremental",
            Self::ObservationalTimePeriod => "ObservationalTimePeriod",
            Self::StandardTimePeriod => "StandardTimePeriod",
            Self::BasicTimePeriod => "BasicTimePeriod",
            Self::GregorianTimePeriod => "GregorianTimePeriod",
            Self::GregorianYear => "GregorianYear",
            Self::GregorianYearMonth => "GregorianYearMonth",
            Self::GregorianDay => "GregorianDay",
            Self::ReportingTimePeriod => "ReportingTimePeriod",
            Self::ReportingYear => "ReportingYear",
            Self::ReportingSemester => "ReportingSemester",
            Self::ReportingTrimester => "ReportingTrimester",
            Self::ReportingQuarter => "ReportingQuarter",
            Self::ReportingMonth => "ReportingMonth",
            Self::ReportingWeek => "ReportingWeek",
            Self::ReportingDay => "ReportingDay",
            Self::DateTime => "DateTime",
            Self::TimeRange => "TimeRange",
            Self::Month => "Month",
            Self::MonthDay => "MonthDay",
            Self::Day => "Day",
            Self::Time => "Time",
            Self::Duration => "Duration",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::BigInteger | Self::Integer | Self::Long | Self::Short | Self::Count
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer()
            || matches!(
                self,
                Self::Numeric
                    | Self::Decimal
                    | Self::Float
                    | Self::Double
                    | Self::InclusiveValueRange
                    | Self::ExclusiveValueRange
                    | Self::Incremental
            )
    }

    /// Time period types checked against the SDMX time grammar.
    pub fn is_time_period(self) -> bool {
        matches!(
            self,
            Self::ObservationalTimePeriod
                | Self::StandardTimePeriod
                | Self::BasicTimePeriod
                | Self::GregorianTimePeriod
                | Self::GregorianYear
                | Self::GregorianYearMonth
                | Self::GregorianDay
                | Self::ReportingTimePeriod
                | Self::ReportingYear
                | Self::ReportingSemester
                | Self::ReportingTrimester
                | Self::ReportingQuarter
                | Self::ReportingMonth
                | Self::ReportingWeek
                | Self::ReportingDay
                | Self::DateTime
                | Self::TimeRange
        )
    }
}

impl fmt::Display for FacetValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single constraint on a representation's value space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub facet_type: FacetType,
    pub facet_value: String,
    pub facet_value_type: FacetValueType,
}

impl Facet {
    pub fn new(facet_type: FacetType, facet_value: impl Into<String>) -> Self {
        Self {
            facet_type,
            facet_value: facet_value.into(),
            facet_value_type: facet_type.value_type(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        sdmx_common::parse_f64(&self.facet_value)
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.facet_value.trim().parse().ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.facet_value.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

/// Allowed value space of a component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Representation {
    codelist: Option<StructureRef>,
    text_type: Option<FacetValueType>,
    facets: Vec<Facet>,
}

impl Representation {
    /// Enumerated representation.
    pub fn enumerated(codelist: StructureRef) -> Self {
        Self {
            codelist: Some(codelist),
            ..Self::default()
        }
    }

    /// Non-enumerated representation of the given data type.
    pub fn text(text_type: FacetValueType) -> Self {
        Self {
            text_type: Some(text_type),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.set_facet(facet);
        self
    }

    #[must_use]
    pub fn with_text_type(mut self, text_type: FacetValueType) -> Self {
        self.text_type = Some(text_type);
        self
    }

    /// Adds a facet, replacing any facet of the same type.
    pub fn set_facet(&mut self, facet: Facet) {
        match self
            .facets
            .iter_mut()
            .find(|f| f.facet_type == facet.facet_type)
        {
            Some(existing) => *existing = facet,
            None => self.facets.push(facet),
        }
    }

    pub fn codelist(&self) -> Option<&StructureRef> {
        self.codelist.as_ref()
    }

    pub fn text_type(&self) -> Option<FacetValueType> {
        self.text_type
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn facet(&self, facet_type: FacetType) -> Option<&Facet> {
        self.facets.iter().find(|f| f.facet_type == facet_type)
    }

    pub fn is_enumerated(&self) -> bool {
        self.codelist.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_type_names_roundtrip() {
        for facet_type in FacetType::ALL {
            assert_eq!(FacetType::parse(facet_type.as_str()), Some(facet_type));
        }
        assert_eq!(FacetType::parse("textType"), None);
    }

    #[test]
    fn test_value_type_names_roundtrip() {
        for value_type in FacetValueType::ALL {
            assert_eq!(FacetValueType::parse(value_type.as_str()), Some(value_type));
        }
        assert_eq!(FacetValueType::parse("URI"), Some(FacetValueType::Uri));
    }

    #[test]
    fn test_set_facet_replaces_same_type() {
        let repr = Representation::text(FacetValueType::String)
            .with_facet(Facet::new(FacetType::MaxLength, "3"))
            .with_facet(Facet::new(FacetType::MaxLength, "5"));
        assert_eq!(repr.facets().len(), 1);
        assert_eq!(
            repr.facet(FacetType::MaxLength).and_then(Facet::as_usize),
            Some(5)
        );
    }

    #[test]
    fn test_facet_value_type_defaults() {
        let facet = Facet::new(FacetType::IsSequence, "TRUE");
        assert_eq!(facet.facet_value_type, FacetValueType::Boolean);
        assert_eq!(facet.as_bool(), Some(true));
    }
}
