//! Per-component rules resolved once before checking rows.

use std::sync::Arc;

use regex::Regex;
use sdmx_model::{
    AttachmentLevel, Codelist, Component, DataStructureDefinition, DimensionAtObservation, Facet,
    FacetType, FacetValueType, Identifiable, Representation, Result, SdmxError, StructureRegistry,
};

/// Role of a component for reporting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Dimension,
    Measure,
    Attribute,
}

impl Role {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Dimension => "dimension",
            Self::Measure => "measure",
            Self::Attribute => "attribute",
        }
    }
}

/// What a single component's values must satisfy.
#[derive(Debug, Clone)]
pub(crate) struct ComponentRule {
    pub id: String,
    pub role: Role,
    pub mandatory: bool,
    pub level: Option<AttachmentLevel>,
    pub codelist: Option<Arc<Codelist>>,
    pub text_type: Option<FacetValueType>,
    pub facets: Vec<Facet>,
    pub pattern: Option<Regex>,
}

impl ComponentRule {
    fn resolve(
        component: &Component,
        role: Role,
        registry: &StructureRegistry,
        dim_at_obs: &DimensionAtObservation,
    ) -> Result<Self> {
        let representation = registry.representation_of(component)?;
        let codelist = registry.codelist_of(component)?;
        let mut text_type = representation.as_ref().and_then(Representation::text_type);
        if component.is_time_dimension() && text_type.is_none() && codelist.is_none() {
            text_type = Some(FacetValueType::ObservationalTimePeriod);
        }
        let facets = representation
            .map(|r| r.facets().to_vec())
            .unwrap_or_default();
        let pattern = facets
            .iter()
            .find(|f| f.facet_type == FacetType::Pattern)
            .map(|f| compile_pattern(component.id(), &f.facet_value))
            .transpose()?;
        Ok(Self {
            id: component.id().to_string(),
            role,
            mandatory: role != Role::Attribute || component.is_mandatory(),
            level: component.attachment_level(dim_at_obs),
            codelist,
            text_type,
            facets,
            pattern,
        })
    }

    pub(crate) fn is_time(&self) -> bool {
        self.text_type.is_some_and(FacetValueType::is_time_period)
    }

    pub(crate) fn is_dataset_level(&self) -> bool {
        self.level == Some(AttachmentLevel::DataSet)
    }

    pub(crate) fn facet(&self, facet_type: FacetType) -> Option<&Facet> {
        self.facets.iter().find(|f| f.facet_type == facet_type)
    }
}

fn compile_pattern(component: &str, pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
        SdmxError::structural(format!("invalid pattern facet on {component}: {err}"))
    })
}

/// Rules for every component of a structure, in column order.
#[derive(Debug, Clone)]
pub(crate) struct RuleSet {
    pub rules: Vec<ComponentRule>,
}

impl RuleSet {
    pub(crate) fn resolve(
        dsd: &DataStructureDefinition,
        registry: &StructureRegistry,
        dim_at_obs: &DimensionAtObservation,
    ) -> Result<Self> {
        let mut rules = Vec::new();
        for code in dsd.dimension_codes() {
            if let Some(component) = dsd.dimensions().get(code) {
                rules.push(ComponentRule::resolve(component, Role::Dimension, registry, dim_at_obs)?);
            }
        }
        for component in dsd.measures().components() {
            rules.push(ComponentRule::resolve(component, Role::Measure, registry, dim_at_obs)?);
        }
        for component in dsd.attributes().components() {
            rules.push(ComponentRule::resolve(component, Role::Attribute, registry, dim_at_obs)?);
        }
        Ok(Self { rules })
    }

    pub(crate) fn get(&self, id: &str) -> Option<&ComponentRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub(crate) fn by_role(&self, role: Role) -> impl Iterator<Item = &ComponentRule> {
        self.rules.iter().filter(move |r| r.role == role)
    }
}
