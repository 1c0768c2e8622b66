//! Artefact capabilities.
//!
//! SDMX describes identity, naming, versioning, maintenance and annotation as
//! a chain of abstract classes. Here each one is an independent capability:
//! a small value type held as a field plus a trait that exposes it. Concrete
//! artefacts compose only the capabilities they have.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdmxError};
use crate::urn::{StructureClass, StructureRef};

/// Default version assigned to versionable artefacts.
pub const DEFAULT_VERSION: &str = "1.0";

/// Locale preferred when a single display text is needed.
pub const DEFAULT_LOCALE: &str = "en";

/// Multilingual text: an ordered locale to text mapping.
///
/// Insertion order is preserved. Writing a locale that already exists
/// replaces its text in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternationalString {
    entries: Vec<(String, String)>,
}

impl InternationalString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-locale text.
    pub fn from_text(locale: impl Into<String>, text: impl Into<String>) -> Self {
        let mut value = Self::new();
        value.set(locale, text);
        value
    }

    #[must_use]
    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.set(locale, text);
        self
    }

    /// Set the text for a locale. Last write per locale wins.
    pub fn set(&mut self, locale: impl Into<String>, text: impl Into<String>) {
        let locale = locale.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(l, _)| *l == locale) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((locale, text)),
        }
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, t)| t.as_str())
    }

    /// English text if present, otherwise the first entry.
    pub fn preferred(&self) -> Option<&str> {
        self.get(DEFAULT_LOCALE)
            .or_else(|| self.entries.first().map(|(_, t)| t.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A free-form note attached to an artefact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Option<String>,
    pub title: Option<String>,
    pub annotation_type: Option<String>,
    pub url: Option<String>,
    pub text: InternationalString,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, annotation_type: impl Into<String>) -> Self {
        self.annotation_type = Some(annotation_type.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.text.set(locale, text);
        self
    }
}

/// Name and description of a nameable artefact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Naming {
    pub name: InternationalString,
    pub description: InternationalString,
}

/// Version string and validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioning {
    version: String,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
}

impl Default for Versioning {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

impl Versioning {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            valid_from: None,
            valid_to: None,
        }
    }

    /// Attach a validity window; `valid_from` must not be after `valid_to`.
    pub fn with_validity(
        mut self,
        valid_from: Option<DateTime<Utc>>,
        valid_to: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        if let (Some(from), Some(to)) = (valid_from, valid_to)
            && from > to
        {
            return Err(SdmxError::structural(format!(
                "validFrom {from} is after validTo {to}"
            )));
        }
        self.valid_from = valid_from;
        self.valid_to = valid_to;
        Ok(self)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.valid_from
    }

    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.valid_to
    }
}

/// Ownership metadata of a maintainable artefact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintenance {
    pub agency_id: String,
    pub is_final: bool,
    pub is_external_reference: bool,
}

impl Maintenance {
    pub fn new(agency_id: impl Into<String>) -> Self {
        Self {
            agency_id: agency_id.into(),
            ..Self::default()
        }
    }
}

/// Artefacts that carry an append-only list of annotations.
pub trait Annotable {
    fn annotations(&self) -> &[Annotation];
    fn add_annotation(&mut self, annotation: Annotation);
}

/// Artefacts with an id unique in their declaring scope.
pub trait Identifiable {
    fn id(&self) -> &str;

    /// Derived URN, when the artefact knows its maintainable parent.
    fn urn(&self) -> Option<String>;
}

/// Artefacts with multilingual name and description.
pub trait Nameable {
    fn naming(&self) -> &Naming;
    fn naming_mut(&mut self) -> &mut Naming;

    fn name(&self) -> Option<&str> {
        self.naming().name.preferred()
    }
}

/// Artefacts with a version and validity window.
pub trait Versionable {
    fn versioning(&self) -> &Versioning;

    fn version(&self) -> &str {
        self.versioning().version()
    }
}

/// Top-level artefacts owned by an agency and addressable by URN.
pub trait Maintainable: Identifiable + Versionable {
    fn maintenance(&self) -> &Maintenance;

    fn structure_class(&self) -> StructureClass;

    fn agency_id(&self) -> &str {
        &self.maintenance().agency_id
    }

    /// `AGENCY:ID(VERSION)`.
    fn unique_id(&self) -> String {
        format!("{}:{}({})", self.agency_id(), self.id(), self.version())
    }

    fn structure_ref(&self) -> StructureRef {
        StructureRef::new(
            self.structure_class(),
            self.agency_id(),
            self.id(),
            self.version(),
        )
    }
}

/// Implements the capability traits for a type holding `id`, `naming` and
/// `annotations` fields.
macro_rules! nameable_artefact {
    ($ty:ty $(, [$($generics:tt)*])?) => {
        impl$(<$($generics)*>)? $crate::base::Nameable for $ty {
            fn naming(&self) -> &$crate::base::Naming {
                &self.naming
            }

            fn naming_mut(&mut self) -> &mut $crate::base::Naming {
                &mut self.naming
            }
        }

        impl$(<$($generics)*>)? $crate::base::Annotable for $ty {
            fn annotations(&self) -> &[$crate::base::Annotation] {
                &self.annotations
            }

            fn add_annotation(&mut self, annotation: $crate::base::Annotation) {
                self.annotations.push(annotation);
            }
        }
    };
}

/// Additionally implements identity, versioning and maintenance for a type
/// holding `versioning` and `maintenance` fields.
macro_rules! maintainable_artefact {
    ($ty:ty, $class:expr $(, [$($generics:tt)*])?) => {
        $crate::base::nameable_artefact!($ty $(, [$($generics)*])?);

        impl$(<$($generics)*>)? $crate::base::Identifiable for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn urn(&self) -> Option<String> {
                Some($crate::base::Maintainable::structure_ref(self).urn())
            }
        }

        impl$(<$($generics)*>)? $crate::base::Versionable for $ty {
            fn versioning(&self) -> &$crate::base::Versioning {
                &self.versioning
            }
        }

        impl$(<$($generics)*>)? $crate::base::Maintainable for $ty {
            fn maintenance(&self) -> &$crate::base::Maintenance {
                &self.maintenance
            }

            fn structure_class(&self) -> $crate::urn::StructureClass {
                $class
            }
        }
    };
}

pub(crate) use maintainable_artefact;
pub(crate) use nameable_artefact;
