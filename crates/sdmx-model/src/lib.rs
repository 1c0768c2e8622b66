//! SDMX information model.
//!
//! This crate holds the structural metadata graph and the canonical data
//! model that every encoding converts to and from:
//!
//! - capabilities shared by artefacts (identity, naming, versioning,
//!   maintenance, annotations)
//! - item schemes (codelists, concept schemes, agency schemes)
//! - representations, components, descriptors and data structure definitions
//! - a registry resolving cross references by URN
//! - datasets backed by a Polars `DataFrame`, and the message envelope
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sdmx_model::{
//!     AttributeRelationship, Component, DataStructureDefinition, Dataset, UsageStatus,
//! };
//!
//! let mut dsd = DataStructureDefinition::new("ECB", "EXR", "1.0");
//! dsd.add_dimension(Component::dimension("FREQ")).unwrap();
//! dsd.add_dimension(Component::time_dimension("TIME_PERIOD")).unwrap();
//! dsd.add_measure(Component::primary_measure("OBS_VALUE")).unwrap();
//! dsd.add_attribute(Component::attribute(
//!     "OBS_STATUS",
//!     UsageStatus::Mandatory,
//!     AttributeRelationship::PrimaryMeasure,
//! ))
//! .unwrap();
//! assert_eq!(dsd.dimension_codes(), ["FREQ", "TIME_PERIOD"]);
//!
//! let dataset = Dataset::new(Arc::new(dsd));
//! assert!(dataset.is_empty());
//! ```

pub mod base;
pub mod component;
pub mod dataset;
pub mod descriptor;
pub mod dsd;
mod error;
pub mod item;
pub mod message;
pub mod registry;
pub mod representation;
pub mod table;
pub mod urn;

pub use base::{
    Annotable, Annotation, DEFAULT_LOCALE, DEFAULT_VERSION, Identifiable, InternationalString,
    Maintainable, Maintenance, Nameable, Naming, Versionable, Versioning,
};
pub use component::{
    AttachmentLevel, AttributeRelationship, Component, ComponentKind, UsageStatus,
};
pub use dataset::{Action, Dataset, DimensionAtObservation};
pub use descriptor::{ComponentList, DescriptorRole, GroupDimensionDescriptor};
pub use dsd::{DataFlowDefinition, DataStructureDefinition};
pub use error::{FormatPosition, Result, SdmxError};
pub use item::{
    Agency, AgencyScheme, Code, Codelist, Concept, ConceptScheme, ItemScheme, SchemeItem,
};
pub use message::{Contact, Header, Message, MessageType, Party, parse_timestamp};
pub use registry::{Artefact, StructureRegistry};
pub use representation::{Facet, FacetType, FacetValueType, Representation};
pub use table::RowBuffer;
pub use urn::{ItemRef, StructureClass, StructureRef};
