//! Components: the typed data slots of a structure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::base::{Annotation, Identifiable, Naming, nameable_artefact};
use crate::dataset::DimensionAtObservation;
use crate::representation::Representation;
use crate::urn::ItemRef;

/// Whether an attribute must be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageStatus {
    Mandatory,
    Conditional,
}

impl UsageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mandatory => "Mandatory",
            Self::Conditional => "Conditional",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mandatory" => Some(Self::Mandatory),
            "conditional" => Some(Self::Conditional),
            _ => None,
        }
    }
}

/// What an attribute value is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeRelationship {
    /// No specified relationship: one value for the whole dataset.
    DataSet,
    /// A set of dimension ids.
    Dimensions(Vec<String>),
    /// A group descriptor id.
    Group(String),
    /// The primary measure: one value per observation.
    PrimaryMeasure,
}

/// Granularity at which an attribute value is reported in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttachmentLevel {
    DataSet,
    Group,
    Series,
    Observation,
}

impl AttachmentLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataSet => "DataSet",
            Self::Group => "Group",
            Self::Series => "Series",
            Self::Observation => "Observation",
        }
    }
}

impl fmt::Display for AttachmentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-specific part of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Dimension {
        position: usize,
    },
    TimeDimension {
        position: usize,
    },
    MeasureDimension {
        position: usize,
    },
    Attribute {
        usage_status: UsageStatus,
        relationship: AttributeRelationship,
    },
    PrimaryMeasure,
}

/// A dimension, attribute or measure bound to a concept.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    id: String,
    naming: Naming,
    annotations: Vec<Annotation>,
    pub concept_identity: Option<ItemRef>,
    pub local_representation: Option<Representation>,
    pub kind: ComponentKind,
}

nameable_artefact!(Component);

impl Identifiable for Component {
    fn id(&self) -> &str {
        &self.id
    }

    fn urn(&self) -> Option<String> {
        None
    }
}

impl Component {
    fn with_kind(id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            naming: Naming::default(),
            annotations: Vec::new(),
            concept_identity: None,
            local_representation: None,
            kind,
        }
    }

    /// A dimension. Position 0 lets the descriptor assign the next position.
    pub fn dimension(id: impl Into<String>) -> Self {
        Self::with_kind(id, ComponentKind::Dimension { position: 0 })
    }

    pub fn time_dimension(id: impl Into<String>) -> Self {
        Self::with_kind(id, ComponentKind::TimeDimension { position: 0 })
    }

    pub fn measure_dimension(id: impl Into<String>) -> Self {
        Self::with_kind(id, ComponentKind::MeasureDimension { position: 0 })
    }

    pub fn attribute(
        id: impl Into<String>,
        usage_status: UsageStatus,
        relationship: AttributeRelationship,
    ) -> Self {
        Self::with_kind(
            id,
            ComponentKind::Attribute {
                usage_status,
                relationship,
            },
        )
    }

    pub fn primary_measure(id: impl Into<String>) -> Self {
        Self::with_kind(id, ComponentKind::PrimaryMeasure)
    }

    #[must_use]
    pub fn with_concept(mut self, concept: ItemRef) -> Self {
        self.concept_identity = Some(concept);
        self
    }

    #[must_use]
    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.local_representation = Some(representation);
        self
    }

    #[must_use]
    pub fn with_name(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.naming.name.set(locale, text);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.set_position(position);
        self
    }

    pub(crate) fn set_position(&mut self, value: usize) {
        if let ComponentKind::Dimension { position }
        | ComponentKind::TimeDimension { position }
        | ComponentKind::MeasureDimension { position } = &mut self.kind
        {
            *position = value;
        }
    }

    /// 1-based position for dimensions.
    pub fn position(&self) -> Option<usize> {
        match self.kind {
            ComponentKind::Dimension { position }
            | ComponentKind::TimeDimension { position }
            | ComponentKind::MeasureDimension { position } => Some(position),
            _ => None,
        }
    }

    pub fn is_dimension(&self) -> bool {
        self.position().is_some()
    }

    pub fn is_time_dimension(&self) -> bool {
        matches!(self.kind, ComponentKind::TimeDimension { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, ComponentKind::Attribute { .. })
    }

    pub fn is_primary_measure(&self) -> bool {
        matches!(self.kind, ComponentKind::PrimaryMeasure)
    }

    pub fn usage_status(&self) -> Option<UsageStatus> {
        match self.kind {
            ComponentKind::Attribute { usage_status, .. } => Some(usage_status),
            _ => None,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.usage_status() == Some(UsageStatus::Mandatory)
    }

    pub fn relationship(&self) -> Option<&AttributeRelationship> {
        match &self.kind {
            ComponentKind::Attribute { relationship, .. } => Some(relationship),
            _ => None,
        }
    }

    /// Where this attribute's values are reported for a given observation axis.
    pub fn attachment_level(&self, dim_at_obs: &DimensionAtObservation) -> Option<AttachmentLevel> {
        let relationship = self.relationship()?;
        let level = match (relationship, dim_at_obs) {
            (AttributeRelationship::DataSet, _) => AttachmentLevel::DataSet,
            (_, DimensionAtObservation::AllDimensions) => AttachmentLevel::Observation,
            (AttributeRelationship::PrimaryMeasure, _) => AttachmentLevel::Observation,
            (AttributeRelationship::Group(_), _) => AttachmentLevel::Group,
            (AttributeRelationship::Dimensions(ids), DimensionAtObservation::Dimension(obs)) => {
                if ids.iter().any(|id| id == obs) {
                    AttachmentLevel::Observation
                } else {
                    AttachmentLevel::Series
                }
            }
        };
        Some(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_attribute() -> Component {
        Component::attribute(
            "TITLE",
            UsageStatus::Conditional,
            AttributeRelationship::Dimensions(vec!["FREQ".into(), "REF_AREA".into()]),
        )
    }

    #[test]
    fn test_attachment_level_series_vs_observation() {
        let attribute = series_attribute();
        let by_time = DimensionAtObservation::Dimension("TIME_PERIOD".into());
        assert_eq!(
            attribute.attachment_level(&by_time),
            Some(AttachmentLevel::Series)
        );
        let by_freq = DimensionAtObservation::Dimension("FREQ".into());
        assert_eq!(
            attribute.attachment_level(&by_freq),
            Some(AttachmentLevel::Observation)
        );
        assert_eq!(
            attribute.attachment_level(&DimensionAtObservation::AllDimensions),
            Some(AttachmentLevel::Observation)
        );
    }

    #[test]
    fn test_dataset_attribute_level_is_fixed() {
        let attribute =
            Component::attribute("UNIT_MULT", UsageStatus::Mandatory, AttributeRelationship::DataSet);
        assert!(attribute.is_mandatory());
        assert_eq!(
            attribute.attachment_level(&DimensionAtObservation::AllDimensions),
            Some(AttachmentLevel::DataSet)
        );
    }

    #[test]
    fn test_dimension_position() {
        let dimension = Component::dimension("FREQ").with_position(2);
        assert_eq!(dimension.position(), Some(2));
        assert!(dimension.attachment_level(&DimensionAtObservation::AllDimensions).is_none());
        assert_eq!(Component::primary_measure("OBS_VALUE").position(), None);
    }

    #[test]
    fn test_usage_status_parse() {
        assert_eq!(UsageStatus::parse("Mandatory"), Some(UsageStatus::Mandatory));
        assert_eq!(UsageStatus::parse("conditional"), Some(UsageStatus::Conditional));
        assert_eq!(UsageStatus::parse("optional"), None);
    }
}
