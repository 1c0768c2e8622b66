//! URNs and structure references.
//!
//! Cross references between artefacts are never owning pointers. They are
//! stored as `StructureRef`/`ItemRef` values and resolved on demand against
//! a [`StructureRegistry`](crate::registry::StructureRegistry).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SdmxError};

const URN_PREFIX: &str = "urn:sdmx:org.sdmx.infomodel.";

/// Maintainable artefact classes known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureClass {
    AgencyScheme,
    Codelist,
    ConceptScheme,
    DataStructure,
    Dataflow,
}

impl StructureClass {
    pub const ALL: [StructureClass; 5] = [
        StructureClass::AgencyScheme,
        StructureClass::Codelist,
        StructureClass::ConceptScheme,
        StructureClass::DataStructure,
        StructureClass::Dataflow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AgencyScheme => "AgencyScheme",
            Self::Codelist => "Codelist",
            Self::ConceptScheme => "ConceptScheme",
            Self::DataStructure => "DataStructure",
            Self::Dataflow => "Dataflow",
        }
    }

    /// Information model package, as used in URNs and `Ref` elements.
    pub fn package(self) -> &'static str {
        match self {
            Self::AgencyScheme => "base",
            Self::Codelist => "codelist",
            Self::ConceptScheme => "conceptscheme",
            Self::DataStructure | Self::Dataflow => "datastructure",
        }
    }

    /// Class name of the items held by a scheme class.
    pub fn item_class(self) -> Option<&'static str> {
        match self {
            Self::AgencyScheme => Some("Agency"),
            Self::Codelist => Some("Code"),
            Self::ConceptScheme => Some("Concept"),
            Self::DataStructure | Self::Dataflow => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.as_str() == value)
    }

    fn from_item_class(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.item_class() == Some(value))
    }
}

impl fmt::Display for StructureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a maintainable artefact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureRef {
    pub class: StructureClass,
    pub agency_id: String,
    pub id: String,
    pub version: String,
}

impl StructureRef {
    pub fn new(
        class: StructureClass,
        agency_id: impl Into<String>,
        id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            class,
            agency_id: agency_id.into(),
            id: id.into(),
            version: version.into(),
        }
    }

    /// Parse `AGENCY:ID(VERSION)` for the given class.
    pub fn from_unique_id(class: StructureClass, unique_id: &str) -> Result<Self> {
        let (agency_id, id, version, rest) =
            split_unique_id(unique_id).ok_or_else(|| SdmxError::reference(unique_id))?;
        if !rest.is_empty() {
            return Err(SdmxError::reference(unique_id));
        }
        Ok(Self::new(class, agency_id, id, version))
    }

    /// `AGENCY:ID(VERSION)`.
    pub fn unique_id(&self) -> String {
        format!("{}:{}({})", self.agency_id, self.id, self.version)
    }

    pub fn urn(&self) -> String {
        format!(
            "{URN_PREFIX}{}.{}={}",
            self.class.package(),
            self.class.as_str(),
            self.unique_id()
        )
    }

    /// Reference to an item of this scheme.
    pub fn item(&self, item_id: impl Into<String>) -> ItemRef {
        ItemRef {
            scheme: self.clone(),
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for StructureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.urn())
    }
}

impl FromStr for StructureRef {
    type Err = SdmxError;

    fn from_str(urn: &str) -> Result<Self> {
        let (class_name, body) = split_urn(urn)?;
        let class = StructureClass::parse(class_name).ok_or_else(|| SdmxError::reference(urn))?;
        match split_unique_id(body) {
            Some((agency_id, id, version, "")) => Ok(Self::new(class, agency_id, id, version)),
            _ => Err(SdmxError::reference(urn)),
        }
    }
}

/// Reference to an item (code, concept, agency) inside a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemRef {
    pub scheme: StructureRef,
    pub item_id: String,
}

impl ItemRef {
    pub fn urn(&self) -> String {
        let item_class = self.scheme.class.item_class().unwrap_or("Item");
        format!(
            "{URN_PREFIX}{}.{}={}.{}",
            self.scheme.class.package(),
            item_class,
            self.scheme.unique_id(),
            self.item_id
        )
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.urn())
    }
}

impl FromStr for ItemRef {
    type Err = SdmxError;

    fn from_str(urn: &str) -> Result<Self> {
        let (class_name, body) = split_urn(urn)?;
        let class =
            StructureClass::from_item_class(class_name).ok_or_else(|| SdmxError::reference(urn))?;
        match split_unique_id(body) {
            Some((agency_id, id, version, rest)) => {
                let item_id = rest
                    .strip_prefix('.')
                    .filter(|item| !item.is_empty())
                    .ok_or_else(|| SdmxError::reference(urn))?;
                Ok(StructureRef::new(class, agency_id, id, version).item(item_id))
            }
            None => Err(SdmxError::reference(urn)),
        }
    }
}

/// Splits `urn:sdmx:org.sdmx.infomodel.<package>.<Class>=<body>` into class
/// name and body.
fn split_urn(urn: &str) -> Result<(&str, &str)> {
    let rest = urn
        .strip_prefix(URN_PREFIX)
        .ok_or_else(|| SdmxError::reference(urn))?;
    let (qualified, body) = rest
        .split_once('=')
        .ok_or_else(|| SdmxError::reference(urn))?;
    let class_name = qualified.rsplit('.').next().unwrap_or(qualified);
    Ok((class_name, body))
}

/// Splits `AGENCY:ID(VERSION)rest` into its parts.
fn split_unique_id(value: &str) -> Option<(&str, &str, &str, &str)> {
    let (agency_id, rest) = value.split_once(':')?;
    let (id, rest) = rest.split_once('(')?;
    let (version, rest) = rest.split_once(')')?;
    if agency_id.is_empty() || id.is_empty() || version.is_empty() {
        return None;
    }
    Some((agency_id, id, version, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_urn_roundtrip() {
        let reference = StructureRef::new(StructureClass::Codelist, "ECB", "CL_FREQ", "1.0");
        let urn = reference.urn();
        assert_eq!(
            urn,
            "urn:sdmx:org.sdmx.infomodel.codelist.Codelist=ECB:CL_FREQ(1.0)"
        );
        assert_eq!(urn.parse::<StructureRef>().expect("parse"), reference);
    }

    #[test]
    fn test_item_urn_roundtrip() {
        let concept = StructureRef::new(StructureClass::ConceptScheme, "ECB", "CS", "2.1").item("FREQ");
        let urn = concept.urn();
        assert_eq!(
            urn,
            "urn:sdmx:org.sdmx.infomodel.conceptscheme.Concept=ECB:CS(2.1).FREQ"
        );
        assert_eq!(urn.parse::<ItemRef>().expect("parse"), concept);
    }

    #[test]
    fn test_unique_id_parse() {
        let reference =
            StructureRef::from_unique_id(StructureClass::DataStructure, "BIS:CBS(1.0)").expect("parse");
        assert_eq!(reference.agency_id, "BIS");
        assert_eq!(reference.id, "CBS");
        assert_eq!(reference.version, "1.0");
        assert!(StructureRef::from_unique_id(StructureClass::DataStructure, "CBS").is_err());
    }

    #[test]
    fn test_malformed_urn_is_reference_error() {
        let err = "urn:other:thing".parse::<StructureRef>().unwrap_err();
        assert!(matches!(err, SdmxError::Reference { .. }));
    }
}
