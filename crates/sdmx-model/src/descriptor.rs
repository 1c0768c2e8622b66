//! Component lists.

use std::collections::HashMap;

use crate::base::{Annotable, Annotation, Identifiable};
use crate::component::Component;
use crate::error::{Result, SdmxError};

/// Role of a component list inside a structure definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorRole {
    Dimension,
    Attribute,
    Measure,
}

impl DescriptorRole {
    /// Conventional descriptor id.
    pub fn default_id(self) -> &'static str {
        match self {
            Self::Dimension => "DimensionDescriptor",
            Self::Attribute => "AttributeDescriptor",
            Self::Measure => "MeasureDescriptor",
        }
    }

    fn accepts(self, component: &Component) -> bool {
        match self {
            Self::Dimension => component.is_dimension(),
            Self::Attribute => component.is_attribute(),
            Self::Measure => component.is_primary_measure(),
        }
    }
}

/// An ordered, role-typed list of components with unique ids.
#[derive(Debug, Clone)]
pub struct ComponentList {
    id: String,
    annotations: Vec<Annotation>,
    role: DescriptorRole,
    components: Vec<Component>,
    index: HashMap<String, usize>,
}

impl ComponentList {
    pub fn new(role: DescriptorRole) -> Self {
        Self {
            id: role.default_id().to_string(),
            annotations: Vec::new(),
            role,
            components: Vec::new(),
            index: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub fn role(&self) -> DescriptorRole {
        self.role
    }

    /// Adds a component. Dimensions without a position get one past the
    /// highest taken so far; an explicit position already in use is
    /// rejected.
    pub fn add(&mut self, mut component: Component) -> Result<()> {
        if !self.role.accepts(&component) {
            return Err(SdmxError::structural(format!(
                "component {} does not belong in {}",
                component.id(),
                self.id
            )));
        }
        if self.index.contains_key(component.id()) {
            return Err(SdmxError::structural(format!(
                "duplicate component id {} in {}",
                component.id(),
                self.id
            )));
        }
        match component.position() {
            Some(0) => {
                let last = self
                    .components
                    .iter()
                    .filter_map(Component::position)
                    .max()
                    .unwrap_or(0);
                component.set_position(last + 1);
            }
            Some(position) => {
                if let Some(taken) = self
                    .components
                    .iter()
                    .find(|c| c.position() == Some(position))
                {
                    return Err(SdmxError::structural(format!(
                        "position {position} of {} is already held by {} in {}",
                        component.id(),
                        taken.id(),
                        self.id
                    )));
                }
            }
            None => {}
        }
        self.index
            .insert(component.id().to_string(), self.components.len());
        self.components.push(component);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.index.get(id).map(|&idx| &self.components[idx])
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Component> {
        let idx = *self.index.get(id)?;
        self.components.get_mut(idx)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Components in declaration order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(Identifiable::id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Identifiable for ComponentList {
    fn id(&self) -> &str {
        &self.id
    }

    fn urn(&self) -> Option<String> {
        None
    }
}

impl Annotable for ComponentList {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }
}

/// A named subset of dimensions that group attributes attach to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDimensionDescriptor {
    id: String,
    annotations: Vec<Annotation>,
    pub dimensions: Vec<String>,
}

impl GroupDimensionDescriptor {
    pub fn new(id: impl Into<String>, dimensions: Vec<String>) -> Self {
        Self {
            id: id.into(),
            annotations: Vec::new(),
            dimensions,
        }
    }
}

impl Identifiable for GroupDimensionDescriptor {
    fn id(&self) -> &str {
        &self.id
    }

    fn urn(&self) -> Option<String> {
        None
    }
}

impl Annotable for GroupDimensionDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{AttributeRelationship, UsageStatus};

    #[test]
    fn test_positions_assigned_in_order() {
        let mut list = ComponentList::new(DescriptorRole::Dimension);
        list.add(Component::dimension("FREQ")).expect("FREQ");
        list.add(Component::time_dimension("TIME_PERIOD"))
            .expect("TIME_PERIOD");
        assert_eq!(list.get("FREQ").and_then(Component::position), Some(1));
        assert_eq!(
            list.get("TIME_PERIOD").and_then(Component::position),
            Some(2)
        );
    }

    #[test]
    fn test_positions_follow_explicit_ones() {
        let mut list = ComponentList::new(DescriptorRole::Dimension);
        list.add(Component::dimension("REF_AREA").with_position(2))
            .expect("REF_AREA");
        list.add(Component::dimension("FREQ")).expect("FREQ");
        assert_eq!(list.get("FREQ").and_then(Component::position), Some(3));

        let err = list
            .add(Component::time_dimension("TIME_PERIOD").with_position(3))
            .unwrap_err();
        assert!(matches!(err, SdmxError::Structural { .. }), "{err}");
        assert!(err.to_string().contains("FREQ"), "{err}");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let mut list = ComponentList::new(DescriptorRole::Dimension);
        list.add(Component::dimension("FREQ")).expect("FREQ");
        let err = list.add(Component::dimension("FREQ")).unwrap_err();
        assert!(matches!(err, SdmxError::Structural { .. }));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_role_mismatch_rejected() {
        let mut list = ComponentList::new(DescriptorRole::Measure);
        let attribute = Component::attribute(
            "OBS_STATUS",
            UsageStatus::Mandatory,
            AttributeRelationship::PrimaryMeasure,
        );
        assert!(list.add(attribute).is_err());
        assert!(list.add(Component::primary_measure("OBS_VALUE")).is_ok());
    }
}
