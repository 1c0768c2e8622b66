//! Data structure definitions and dataflows.

use std::sync::OnceLock;

use tracing::debug;

use crate::base::{
    Annotation, Identifiable, Maintainable, Maintenance, Naming, Versioning, maintainable_artefact,
};
use crate::component::{AttachmentLevel, AttributeRelationship, Component};
use crate::dataset::DimensionAtObservation;
use crate::descriptor::{ComponentList, DescriptorRole, GroupDimensionDescriptor};
use crate::error::{Result, SdmxError};
use crate::urn::{StructureClass, StructureRef};

/// Code projections derived from the descriptors.
#[derive(Debug, Clone, Default)]
struct DerivedCodes {
    dimension_codes: Vec<String>,
    attribute_codes: Vec<String>,
    dataset_attribute_codes: Vec<String>,
    mandatory_attribute_codes: Vec<String>,
    measure_code: Option<String>,
    time_dimension_code: Option<String>,
}

/// The schema a dataset must satisfy.
///
/// Component ids are unique across every descriptor. The code projections
/// are computed on first access and dropped on any mutation through `&mut
/// self`.
#[derive(Debug, Clone)]
pub struct DataStructureDefinition {
    id: String,
    naming: Naming,
    versioning: Versioning,
    maintenance: Maintenance,
    annotations: Vec<Annotation>,
    dimensions: ComponentList,
    attributes: ComponentList,
    measures: ComponentList,
    groups: Vec<GroupDimensionDescriptor>,
    codes: OnceLock<DerivedCodes>,
}

maintainable_artefact!(DataStructureDefinition, StructureClass::DataStructure);

impl DataStructureDefinition {
    pub fn new(agency_id: impl Into<String>, id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            naming: Naming::default(),
            versioning: Versioning::new(version),
            maintenance: Maintenance::new(agency_id),
            annotations: Vec::new(),
            dimensions: ComponentList::new(DescriptorRole::Dimension),
            attributes: ComponentList::new(DescriptorRole::Attribute),
            measures: ComponentList::new(DescriptorRole::Measure),
            groups: Vec::new(),
            codes: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.naming.name.set(locale, text);
        self
    }

    #[must_use]
    pub fn with_versioning(mut self, versioning: Versioning) -> Self {
        self.versioning = versioning;
        self
    }

    #[must_use]
    pub fn with_maintenance(mut self, maintenance: Maintenance) -> Self {
        self.maintenance = maintenance;
        self
    }

    /// Replace the descriptor ids used when writing structure documents.
    pub fn set_descriptor_ids(
        &mut self,
        dimensions: impl Into<String>,
        attributes: impl Into<String>,
        measures: impl Into<String>,
    ) {
        self.dimensions.set_id(dimensions.into());
        self.attributes.set_id(attributes.into());
        self.measures.set_id(measures.into());
    }

    pub fn add_dimension(&mut self, component: Component) -> Result<()> {
        self.ensure_unique(component.id())?;
        self.invalidate();
        self.dimensions.add(component)
    }

    pub fn add_attribute(&mut self, component: Component) -> Result<()> {
        self.ensure_unique(component.id())?;
        self.invalidate();
        self.attributes.add(component)
    }

    pub fn add_measure(&mut self, component: Component) -> Result<()> {
        self.ensure_unique(component.id())?;
        self.invalidate();
        self.measures.add(component)
    }

    pub fn add_group(&mut self, group: GroupDimensionDescriptor) -> Result<()> {
        self.ensure_unique(group.id())?;
        self.invalidate();
        self.groups.push(group);
        Ok(())
    }

    /// Mutable access to a component. Drops the cached code projections.
    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.invalidate();
        if self.dimensions.contains(id) {
            self.dimensions.get_mut(id)
        } else if self.attributes.contains(id) {
            self.attributes.get_mut(id)
        } else {
            self.measures.get_mut(id)
        }
    }

    fn invalidate(&mut self) {
        self.codes.take();
    }

    fn ensure_unique(&self, id: &str) -> Result<()> {
        if self.component(id).is_some() || self.group(id).is_some() {
            return Err(SdmxError::structural(format!(
                "duplicate component id {id} in {}",
                self.unique_id()
            )));
        }
        Ok(())
    }

    pub fn dimensions(&self) -> &ComponentList {
        &self.dimensions
    }

    pub fn attributes(&self) -> &ComponentList {
        &self.attributes
    }

    pub fn measures(&self) -> &ComponentList {
        &self.measures
    }

    pub fn groups(&self) -> &[GroupDimensionDescriptor] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&GroupDimensionDescriptor> {
        self.groups.iter().find(|g| g.id() == id)
    }

    /// Any component by id.
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.dimensions
            .get(id)
            .or_else(|| self.attributes.get(id))
            .or_else(|| self.measures.get(id))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.dimensions
            .components()
            .iter()
            .chain(self.measures.components())
            .chain(self.attributes.components())
    }

    fn codes(&self) -> &DerivedCodes {
        self.codes.get_or_init(|| {
            let mut dims: Vec<&Component> = self.dimensions.components().iter().collect();
            dims.sort_by_key(|c| c.position().unwrap_or(usize::MAX));
            let attribute_codes = self.attributes.ids().map(str::to_string).collect();
            let dataset_attribute_codes = self
                .attributes
                .components()
                .iter()
                .filter(|c| c.relationship() == Some(&AttributeRelationship::DataSet))
                .map(|c| c.id().to_string())
                .collect();
            let mandatory_attribute_codes = self
                .attributes
                .components()
                .iter()
                .filter(|c| c.is_mandatory())
                .map(|c| c.id().to_string())
                .collect();
            DerivedCodes {
                dimension_codes: dims.iter().map(|c| c.id().to_string()).collect(),
                attribute_codes,
                dataset_attribute_codes,
                mandatory_attribute_codes,
                measure_code: self.measures.ids().next().map(str::to_string),
                time_dimension_code: dims
                    .iter()
                    .find(|c| c.is_time_dimension())
                    .map(|c| c.id().to_string()),
            }
        })
    }

    /// Dimension ids ordered by position.
    pub fn dimension_codes(&self) -> &[String] {
        &self.codes().dimension_codes
    }

    /// Attribute ids in declaration order.
    pub fn attribute_codes(&self) -> &[String] {
        &self.codes().attribute_codes
    }

    /// Attributes with no specified relationship.
    pub fn dataset_attribute_codes(&self) -> &[String] {
        &self.codes().dataset_attribute_codes
    }

    pub fn mandatory_attribute_codes(&self) -> &[String] {
        &self.codes().mandatory_attribute_codes
    }

    pub fn measure_code(&self) -> Option<&str> {
        self.codes().measure_code.as_deref()
    }

    pub fn time_dimension_code(&self) -> Option<&str> {
        self.codes().time_dimension_code.as_deref()
    }

    /// Attribute ids reported at `level` for the given observation axis.
    pub fn attribute_codes_at(
        &self,
        level: AttachmentLevel,
        dim_at_obs: &DimensionAtObservation,
    ) -> Vec<&str> {
        self.attributes
            .components()
            .iter()
            .filter(|c| c.attachment_level(dim_at_obs) == Some(level))
            .map(Identifiable::id)
            .collect()
    }

    /// Dimensions forming the series key for the given observation axis.
    pub fn series_dimension_codes(&self, dim_at_obs: &DimensionAtObservation) -> Vec<&str> {
        match dim_at_obs {
            DimensionAtObservation::AllDimensions => Vec::new(),
            DimensionAtObservation::Dimension(obs) => self
                .dimension_codes()
                .iter()
                .filter(|code| *code != obs)
                .map(String::as_str)
                .collect(),
        }
    }

    /// Table columns in canonical order: dimensions, measure, then every
    /// attribute not reported at dataset level.
    pub fn column_codes(&self) -> Vec<&str> {
        let dataset_level = self.dataset_attribute_codes();
        self.dimension_codes()
            .iter()
            .map(String::as_str)
            .chain(self.measure_code())
            .chain(
                self.attribute_codes()
                    .iter()
                    .filter(|code| !dataset_level.contains(*code))
                    .map(String::as_str),
            )
            .collect()
    }

    /// Checks descriptor consistency: at least one dimension, exactly one
    /// measure, and every relationship pointing at a declared dimension or
    /// group.
    pub fn check(&self) -> Result<()> {
        let unique_id = self.unique_id();
        if self.dimensions.is_empty() {
            return Err(SdmxError::structural(format!(
                "{unique_id} declares no dimensions"
            )));
        }
        if self.measures.len() != 1 {
            return Err(SdmxError::structural(format!(
                "{unique_id} must declare exactly one primary measure, found {}",
                self.measures.len()
            )));
        }
        for group in &self.groups {
            if let Some(missing) = group
                .dimensions
                .iter()
                .find(|d| !self.dimensions.contains(d))
            {
                return Err(SdmxError::structural(format!(
                    "group {} of {unique_id} references unknown dimension {missing}",
                    group.id()
                )));
            }
        }
        for attribute in self.attributes.components() {
            match attribute.relationship() {
                Some(AttributeRelationship::Dimensions(ids)) => {
                    if let Some(missing) = ids.iter().find(|d| !self.dimensions.contains(d)) {
                        return Err(SdmxError::structural(format!(
                            "attribute {} of {unique_id} relates to unknown dimension {missing}",
                            attribute.id()
                        )));
                    }
                }
                Some(AttributeRelationship::Group(group)) if self.group(group).is_none() => {
                    return Err(SdmxError::structural(format!(
                        "attribute {} of {unique_id} relates to unknown group {group}",
                        attribute.id()
                    )));
                }
                _ => {}
            }
        }
        debug!(
            structure = %unique_id,
            dimensions = self.dimensions.len(),
            attributes = self.attributes.len(),
            "data structure checked"
        );
        Ok(())
    }
}

/// A dataflow: a usage of a data structure. It refers to its structure by
/// reference only.
#[derive(Debug, Clone)]
pub struct DataFlowDefinition {
    id: String,
    naming: Naming,
    versioning: Versioning,
    maintenance: Maintenance,
    annotations: Vec<Annotation>,
    structure: StructureRef,
}

maintainable_artefact!(DataFlowDefinition, StructureClass::Dataflow);

impl DataFlowDefinition {
    pub fn new(
        agency_id: impl Into<String>,
        id: impl Into<String>,
        version: impl Into<String>,
        structure: StructureRef,
    ) -> Result<Self> {
        if structure.class != StructureClass::DataStructure {
            return Err(SdmxError::structural(format!(
                "dataflow structure must be a DataStructure, got {}",
                structure.class
            )));
        }
        Ok(Self {
            id: id.into(),
            naming: Naming::default(),
            versioning: Versioning::new(version),
            maintenance: Maintenance::new(agency_id),
            annotations: Vec::new(),
            structure,
        })
    }

    #[must_use]
    pub fn with_name(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.naming.name.set(locale, text);
        self
    }

    #[must_use]
    pub fn with_maintenance(mut self, maintenance: Maintenance) -> Self {
        self.maintenance = maintenance;
        self
    }

    #[must_use]
    pub fn with_versioning(mut self, versioning: Versioning) -> Self {
        self.versioning = versioning;
        self
    }

    /// Reference to the data structure this flow uses.
    pub fn structure(&self) -> &StructureRef {
        &self.structure
    }
}
