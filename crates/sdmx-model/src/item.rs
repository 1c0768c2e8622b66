//! Items and item schemes.
//!
//! An [`ItemScheme`] exclusively owns its items in declaration order. Items
//! keep only back-references: the scheme they were appended to and the id
//! of their parent item, both resolved through the scheme.

use std::collections::HashMap;

use tracing::debug;

use crate::base::{
    Annotable, Annotation, Identifiable, Maintenance, Nameable, Naming, Versioning,
    maintainable_artefact, nameable_artefact,
};
use crate::error::{Result, SdmxError};
use crate::representation::Representation;
use crate::urn::{StructureClass, StructureRef};

/// An item that can live in an [`ItemScheme`].
pub trait SchemeItem: Identifiable + Nameable + Annotable {
    /// Class of the scheme holding this kind of item.
    const SCHEME_CLASS: StructureClass;

    fn parent(&self) -> Option<&str>;

    /// Scheme this item was appended to.
    fn scheme(&self) -> Option<&StructureRef>;

    fn set_scheme(&mut self, scheme: StructureRef);

    fn set_parent(&mut self, parent: Option<String>);
}

macro_rules! scheme_item {
    ($ty:ident, $class:expr) => {
        nameable_artefact!($ty);

        impl Identifiable for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn urn(&self) -> Option<String> {
                self.scheme.as_ref().map(|s| s.item(self.id.as_str()).urn())
            }
        }

        impl SchemeItem for $ty {
            const SCHEME_CLASS: StructureClass = $class;

            fn parent(&self) -> Option<&str> {
                self.parent.as_deref()
            }

            fn scheme(&self) -> Option<&StructureRef> {
                self.scheme.as_ref()
            }

            fn set_scheme(&mut self, scheme: StructureRef) {
                self.scheme = Some(scheme);
            }

            fn set_parent(&mut self, parent: Option<String>) {
                self.parent = parent;
            }
        }

        impl $ty {
            #[must_use]
            pub fn with_name(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
                self.naming.name.set(locale, text);
                self
            }

            #[must_use]
            pub fn with_description(
                mut self,
                locale: impl Into<String>,
                text: impl Into<String>,
            ) -> Self {
                self.naming.description.set(locale, text);
                self
            }

            #[must_use]
            pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
                self.parent = Some(parent.into());
                self
            }
        }
    };
}

/// A member of a codelist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Code {
    id: String,
    naming: Naming,
    annotations: Vec<Annotation>,
    parent: Option<String>,
    scheme: Option<StructureRef>,
}

impl Code {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

scheme_item!(Code, StructureClass::Codelist);

/// A statistical concept, optionally carrying its default representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Concept {
    id: String,
    naming: Naming,
    annotations: Vec<Annotation>,
    parent: Option<String>,
    scheme: Option<StructureRef>,
    pub core_representation: Option<Representation>,
}

impl Concept {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_core_representation(mut self, representation: Representation) -> Self {
        self.core_representation = Some(representation);
        self
    }
}

scheme_item!(Concept, StructureClass::ConceptScheme);

/// An organisation maintaining artefacts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agency {
    id: String,
    naming: Naming,
    annotations: Vec<Annotation>,
    parent: Option<String>,
    scheme: Option<StructureRef>,
}

impl Agency {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

scheme_item!(Agency, StructureClass::AgencyScheme);

/// A maintained, ordered collection of items.
#[derive(Debug, Clone)]
pub struct ItemScheme<T> {
    id: String,
    naming: Naming,
    versioning: Versioning,
    maintenance: Maintenance,
    annotations: Vec<Annotation>,
    pub is_partial: bool,
    items: Vec<T>,
    index: HashMap<String, usize>,
}

pub type Codelist = ItemScheme<Code>;
pub type ConceptScheme = ItemScheme<Concept>;
pub type AgencyScheme = ItemScheme<Agency>;

maintainable_artefact!(ItemScheme<T>, T::SCHEME_CLASS, [T: SchemeItem]);

impl<T: SchemeItem> ItemScheme<T> {
    pub fn new(agency_id: impl Into<String>, id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            naming: Naming::default(),
            versioning: Versioning::new(version),
            maintenance: Maintenance::new(agency_id),
            annotations: Vec::new(),
            is_partial: false,
            items: Vec::new(),
            index: HashMap::new(),
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

    /// Appends an item. A duplicate id is rejected and leaves the scheme
    /// unchanged.
    pub fn append(&mut self, mut item: T) -> Result<()> {
        if self.index.contains_key(item.id()) {
            return Err(SdmxError::structural(format!(
                "duplicate item id {} in {}",
                item.id(),
                crate::base::Maintainable::unique_id(self)
            )));
        }
        item.set_scheme(crate::base::Maintainable::structure_ref(self));
        self.index.insert(item.id().to_string(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Appends items, stopping at the first duplicate.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) -> Result<()> {
        for item in items {
            self.append(item)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&idx| &self.items[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Identifiable::id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Direct children of the given item, in declaration order.
    pub fn children<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a T> {
        self.items
            .iter()
            .filter(move |item| item.parent() == Some(parent_id))
    }

    /// Items without a parent.
    pub fn roots(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|item| item.parent().is_none())
    }

    /// Checks that every parent id names an item of this scheme.
    pub fn check_hierarchy(&self) -> Result<()> {
        let scheme = crate::base::Maintainable::structure_ref(self);
        for item in &self.items {
            if let Some(parent) = item.parent()
                && !self.contains(parent)
            {
                return Err(SdmxError::reference(scheme.item(parent).urn()));
            }
        }
        debug!(
            scheme = %scheme.unique_id(),
            items = self.items.len(),
            "item hierarchy checked"
        );
        Ok(())
    }
}
