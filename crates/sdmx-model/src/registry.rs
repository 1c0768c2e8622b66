//! Graph-scoped artefact registry.
//!
//! Every maintainable artefact loaded for a conversion lives here behind an
//! `Arc`. Cross references are resolved by lookup; a missing target is a
//! [`SdmxError::Reference`], which is distinct from an absent (`None`)
//! optional reference.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::base::{Identifiable, Maintainable};
use crate::component::Component;
use crate::dsd::{DataFlowDefinition, DataStructureDefinition};
use crate::error::{Result, SdmxError};
use crate::item::{AgencyScheme, Codelist, Concept, ConceptScheme};
use crate::representation::Representation;
use crate::urn::{ItemRef, StructureClass, StructureRef};

/// A maintainable artefact held by the registry.
#[derive(Debug, Clone)]
pub enum Artefact {
    AgencyScheme(Arc<AgencyScheme>),
    Codelist(Arc<Codelist>),
    ConceptScheme(Arc<ConceptScheme>),
    DataStructure(Arc<DataStructureDefinition>),
    Dataflow(Arc<DataFlowDefinition>),
}

impl Artefact {
    pub fn structure_ref(&self) -> StructureRef {
        match self {
            Self::AgencyScheme(a) => a.structure_ref(),
            Self::Codelist(a) => a.structure_ref(),
            Self::ConceptScheme(a) => a.structure_ref(),
            Self::DataStructure(a) => a.structure_ref(),
            Self::Dataflow(a) => a.structure_ref(),
        }
    }
}

impl From<AgencyScheme> for Artefact {
    fn from(value: AgencyScheme) -> Self {
        Self::AgencyScheme(Arc::new(value))
    }
}

impl From<Codelist> for Artefact {
    fn from(value: Codelist) -> Self {
        Self::Codelist(Arc::new(value))
    }
}

impl From<ConceptScheme> for Artefact {
    fn from(value: ConceptScheme) -> Self {
        Self::ConceptScheme(Arc::new(value))
    }
}

impl From<DataStructureDefinition> for Artefact {
    fn from(value: DataStructureDefinition) -> Self {
        Self::DataStructure(Arc::new(value))
    }
}

impl From<DataFlowDefinition> for Artefact {
    fn from(value: DataFlowDefinition) -> Self {
        Self::Dataflow(Arc::new(value))
    }
}

/// All artefacts of one loaded structure graph, keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct StructureRegistry {
    artefacts: BTreeMap<StructureRef, Artefact>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artefact. A second artefact with the same URN is rejected.
    pub fn insert(&mut self, artefact: impl Into<Artefact>) -> Result<StructureRef> {
        let artefact = artefact.into();
        let reference = artefact.structure_ref();
        if self.artefacts.contains_key(&reference) {
            return Err(SdmxError::structural(format!(
                "duplicate artefact {}",
                reference.urn()
            )));
        }
        debug!(urn = %reference, "registered artefact");
        self.artefacts.insert(reference.clone(), artefact);
        Ok(reference)
    }

    /// Looks up any maintainable artefact by URN.
    pub fn resolve(&self, urn: &str) -> Result<&Artefact> {
        let reference: StructureRef = urn.parse()?;
        self.get(&reference)
    }

    pub fn get(&self, reference: &StructureRef) -> Result<&Artefact> {
        self.artefacts
            .get(reference)
            .ok_or_else(|| SdmxError::reference(reference.urn()))
    }

    pub fn contains(&self, reference: &StructureRef) -> bool {
        self.artefacts.contains_key(reference)
    }

    /// Artefacts ordered by class, agency, id and version.
    pub fn artefacts(&self) -> impl Iterator<Item = &Artefact> {
        self.artefacts.values()
    }

    pub fn len(&self) -> usize {
        self.artefacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artefacts.is_empty()
    }

    pub fn codelist(&self, reference: &StructureRef) -> Result<&Arc<Codelist>> {
        match self.get(reference)? {
            Artefact::Codelist(codelist) => Ok(codelist),
            _ => Err(SdmxError::reference(reference.urn())),
        }
    }

    pub fn concept_scheme(&self, reference: &StructureRef) -> Result<&Arc<ConceptScheme>> {
        match self.get(reference)? {
            Artefact::ConceptScheme(scheme) => Ok(scheme),
            _ => Err(SdmxError::reference(reference.urn())),
        }
    }

    pub fn agency_scheme(&self, reference: &StructureRef) -> Result<&Arc<AgencyScheme>> {
        match self.get(reference)? {
            Artefact::AgencyScheme(scheme) => Ok(scheme),
            _ => Err(SdmxError::reference(reference.urn())),
        }
    }

    pub fn data_structure(&self, reference: &StructureRef) -> Result<&Arc<DataStructureDefinition>> {
        match self.get(reference)? {
            Artefact::DataStructure(dsd) => Ok(dsd),
            _ => Err(SdmxError::reference(reference.urn())),
        }
    }

    pub fn dataflow(&self, reference: &StructureRef) -> Result<&Arc<DataFlowDefinition>> {
        match self.get(reference)? {
            Artefact::Dataflow(flow) => Ok(flow),
            _ => Err(SdmxError::reference(reference.urn())),
        }
    }

    pub fn data_structures(&self) -> impl Iterator<Item = &Arc<DataStructureDefinition>> {
        self.artefacts.values().filter_map(|a| match a {
            Artefact::DataStructure(dsd) => Some(dsd),
            _ => None,
        })
    }

    /// The data structure behind a DataStructure or Dataflow reference.
    pub fn structure_for(&self, reference: &StructureRef) -> Result<Arc<DataStructureDefinition>> {
        match reference.class {
            StructureClass::DataStructure => self.data_structure(reference).cloned(),
            StructureClass::Dataflow => {
                let flow = self.dataflow(reference)?;
                self.data_structure(flow.structure()).cloned()
            }
            _ => Err(SdmxError::reference(reference.urn())),
        }
    }

    pub fn concept(&self, reference: &ItemRef) -> Result<&Concept> {
        self.concept_scheme(&reference.scheme)?
            .get(&reference.item_id)
            .ok_or_else(|| SdmxError::reference(reference.urn()))
    }

    /// Effective representation of a component: its local representation,
    /// falling back to the core representation of its concept.
    pub fn representation_of(&self, component: &Component) -> Result<Option<Representation>> {
        if let Some(local) = &component.local_representation {
            return Ok(Some(local.clone()));
        }
        match &component.concept_identity {
            Some(concept) => Ok(self.concept(concept)?.core_representation.clone()),
            None => Ok(None),
        }
    }

    /// Codelist enumerating a component's values, if any.
    pub fn codelist_of(&self, component: &Component) -> Result<Option<Arc<Codelist>>> {
        match self.representation_of(component)? {
            Some(repr) => match repr.codelist() {
                Some(reference) => Ok(Some(Arc::clone(self.codelist(reference)?))),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Verifies every cross reference in the graph resolves.
    pub fn check_references(&self) -> Result<()> {
        for artefact in self.artefacts.values() {
            match artefact {
                Artefact::Dataflow(flow) => {
                    self.data_structure(flow.structure())?;
                }
                Artefact::DataStructure(dsd) => {
                    for component in dsd.components() {
                        if let Some(concept) = &component.concept_identity {
                            self.concept(concept)?;
                        }
                        if let Some(reference) = component
                            .local_representation
                            .as_ref()
                            .and_then(Representation::codelist)
                        {
                            self.codelist(reference)?;
                        }
                    }
                }
                Artefact::ConceptScheme(scheme) => {
                    for concept in scheme.items() {
                        if let Some(reference) = concept
                            .core_representation
                            .as_ref()
                            .and_then(Representation::codelist)
                        {
                            self.codelist(reference).map_err(|_| {
                                SdmxError::reference(format!(
                                    "{} (core representation of {})",
                                    reference.urn(),
                                    concept.id()
                                ))
                            })?;
                        }
                    }
                }
                Artefact::AgencyScheme(_) | Artefact::Codelist(_) => {}
            }
        }
        Ok(())
    }
}
