//! Structure message reader.

use std::io::BufRead;

use sdmx_model::{
    Agency, Annotable, Annotation, AttributeRelationship, Code, Component, Concept,
    DEFAULT_VERSION, DataFlowDefinition, DataStructureDefinition, DescriptorRole, Facet,
    FacetType, FacetValueType, FormatPosition, GroupDimensionDescriptor, Header, ItemRef,
    ItemScheme, Maintainable, Maintenance, Nameable, Naming, Representation, Result,
    SchemeItem, SdmxError, StructureClass, StructureRef, StructureRegistry, UsageStatus,
    Versioning, parse_timestamp,
};

use super::TEXT_TYPE;
use crate::header::{localised, missing, read_header, read_ref};
use crate::source::{Element, XmlSource};

/// Read a structure message into a new registry.
///
/// Every cross reference must resolve inside the document: a dataflow
/// pointing at an unknown data structure fails with a reference error.
pub fn read_structure<R: BufRead>(input: R) -> Result<(Header, StructureRegistry)> {
    let mut registry = StructureRegistry::new();
    let header = read_structure_into(input, &mut registry)?;
    Ok((header, registry))
}

/// Read a structure message into an existing registry.
///
/// References may point at artefacts registered earlier, which allows a
/// structure graph to be split across documents.
pub fn read_structure_into<R: BufRead>(input: R, registry: &mut StructureRegistry) -> Result<Header> {
    let mut src = XmlSource::new(input);
    let root = src.root()?;
    if root.local_name() != "Structure" {
        return Err(src.error(format!("<{}> is not a structure message", root.name)));
    }
    let document = src.read_element(root)?;
    let header = match document.child("Header") {
        Some(element) => read_header(element)?.0,
        None => Header::default(),
    };
    let structures = document
        .child("Structures")
        .ok_or_else(|| missing("Structures"))?;

    let before = registry.len();
    for section in &structures.children {
        match section.name.as_str() {
            "OrganisationSchemes" => {
                for element in section.children_named("AgencyScheme") {
                    registry.insert(read_scheme(element, "Agency", |item| {
                        read_item(item, Agency::new)
                    })?)?;
                }
            }
            "Codelists" => {
                for element in section.children_named("Codelist") {
                    registry.insert(read_scheme(element, "Code", |item| {
                        read_item(item, Code::new)
                    })?)?;
                }
            }
            "Concepts" => {
                for element in section.children_named("ConceptScheme") {
                    registry.insert(read_scheme(element, "Concept", read_concept)?)?;
                }
            }
            "DataStructures" => {
                for element in section.children_named("DataStructure") {
                    registry.insert(read_data_structure(element)?)?;
                }
            }
            "Dataflows" => {
                for element in section.children_named("Dataflow") {
                    registry.insert(read_dataflow(element)?)?;
                }
            }
            other => tracing::warn!(section = other, "Skipping unsupported structure section"),
        }
    }
    registry.check_references()?;
    tracing::info!(
        artefacts = registry.len() - before,
        "Read SDMX-ML structure message"
    );
    Ok(header)
}

fn format_error(message: String) -> SdmxError {
    SdmxError::format(message, FormatPosition::Unknown)
}

fn required<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element
        .attr(name)
        .ok_or_else(|| missing(&format!("{}/@{name}", element.name)))
}

fn flag(element: &Element, name: &str) -> bool {
    element.attr(name) == Some("true")
}

fn timestamp(element: &Element, name: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    element
        .attr(name)
        .map(|value| {
            parse_timestamp(value)
                .ok_or_else(|| format_error(format!("invalid {name} timestamp {value}")))
        })
        .transpose()
}

/// Identity, version and ownership shared by every maintainable element.
struct MaintainableHead {
    id: String,
    versioning: Versioning,
    maintenance: Maintenance,
}

impl MaintainableHead {
    fn read(element: &Element) -> Result<Self> {
        let agency_id = required(element, "agencyID")?;
        let version = element.attr("version").unwrap_or(DEFAULT_VERSION);
        let versioning = Versioning::new(version)
            .with_validity(timestamp(element, "validFrom")?, timestamp(element, "validTo")?)?;
        Ok(Self {
            id: required(element, "id")?.to_string(),
            versioning,
            maintenance: Maintenance {
                agency_id: agency_id.to_string(),
                is_final: flag(element, "isFinal"),
                is_external_reference: flag(element, "isExternalReference"),
            },
        })
    }

    fn version(&self) -> &str {
        self.versioning.version()
    }
}

fn read_naming(element: &Element, naming: &mut Naming) {
    naming.name = localised(element, "Name");
    naming.description = localised(element, "Description");
}

fn read_annotations(element: &Element, target: &mut impl Annotable) {
    let Some(list) = element.child("Annotations") else {
        return;
    };
    for annotation in list.children_named("Annotation") {
        let text = |name: &str| annotation.child_text(name).map(str::to_string);
        target.add_annotation(Annotation {
            id: annotation.attr("id").map(str::to_string),
            title: text("AnnotationTitle"),
            annotation_type: text("AnnotationType"),
            url: text("AnnotationURL"),
            text: localised(annotation, "AnnotationText"),
        });
    }
}

/// Id of the `Ref` child of `element`.
fn ref_id(element: &Element) -> Option<&str> {
    element.child("Ref")?.attr("id")
}

fn read_scheme<T: SchemeItem>(
    element: &Element,
    item_name: &str,
    read: impl Fn(&Element) -> Result<T>,
) -> Result<ItemScheme<T>> {
    let head = MaintainableHead::read(element)?;
    let mut scheme = ItemScheme::new(
        head.maintenance.agency_id.clone(),
        head.id.clone(),
        head.version(),
    )
    .with_versioning(head.versioning)
    .with_maintenance(head.maintenance);
    scheme.is_partial = flag(element, "isPartial");
    read_annotations(element, &mut scheme);
    read_naming(element, scheme.naming_mut());
    for item in element.children_named(item_name) {
        scheme.append(read(item)?)?;
    }
    scheme.check_hierarchy()?;
    tracing::debug!(
        scheme = %scheme.unique_id(),
        items = scheme.len(),
        "Read item scheme"
    );
    Ok(scheme)
}

fn read_item<T: SchemeItem>(element: &Element, new: impl Fn(String) -> T) -> Result<T> {
    let mut item = new(required(element, "id")?.to_string());
    read_annotations(element, &mut item);
    read_naming(element, item.naming_mut());
    item.set_parent(
        element
            .child("Parent")
            .and_then(ref_id)
            .map(str::to_string),
    );
    Ok(item)
}

fn read_concept(element: &Element) -> Result<Concept> {
    let mut concept = read_item(element, Concept::new)?;
    concept.core_representation = read_representation(element.child("CoreRepresentation"))?;
    Ok(concept)
}

fn read_representation(element: Option<&Element>) -> Result<Option<Representation>> {
    let Some(element) = element else {
        return Ok(None);
    };
    let mut representation = match element.child("Enumeration") {
        Some(enumeration) => Representation::enumerated(read_ref(enumeration, StructureClass::Codelist)?),
        None => Representation::default(),
    };
    let format = element
        .child("TextFormat")
        .or_else(|| element.child("EnumerationFormat"));
    if let Some(format) = format {
        for (key, value) in &format.attributes {
            if key == TEXT_TYPE {
                let text_type = FacetValueType::parse(value)
                    .ok_or_else(|| format_error(format!("unknown textType {value}")))?;
                representation = representation.with_text_type(text_type);
            } else if let Some(facet_type) = FacetType::parse(key) {
                representation.set_facet(Facet::new(facet_type, value.as_str()));
            }
        }
    }
    Ok(Some(representation))
}

fn read_concept_identity(element: &Element) -> Result<Option<ItemRef>> {
    let Some(identity) = element.child("ConceptIdentity") else {
        return Ok(None);
    };
    if let Some(reference) = identity.child("Ref") {
        let scheme = StructureRef::new(
            StructureClass::ConceptScheme,
            required(reference, "agencyID")?,
            required(reference, "maintainableParentID")?,
            reference
                .attr("maintainableParentVersion")
                .unwrap_or(DEFAULT_VERSION),
        );
        return Ok(Some(scheme.item(required(reference, "id")?)));
    }
    identity
        .child_text("URN")
        .map(str::parse::<ItemRef>)
        .transpose()
}

fn read_component(element: &Element, mut component: Component) -> Result<Component> {
    read_annotations(element, &mut component);
    component.concept_identity = read_concept_identity(element)?;
    component.local_representation = read_representation(element.child("LocalRepresentation"))?;
    Ok(component)
}

fn read_relationship(element: Option<&Element>) -> AttributeRelationship {
    let Some(element) = element else {
        return AttributeRelationship::DataSet;
    };
    if element.child("PrimaryMeasure").is_some() {
        return AttributeRelationship::PrimaryMeasure;
    }
    if let Some(group) = element.child("Group").and_then(ref_id) {
        return AttributeRelationship::Group(group.to_string());
    }
    let dimensions: Vec<String> = element
        .children_named("Dimension")
        .filter_map(ref_id)
        .map(str::to_string)
        .collect();
    if dimensions.is_empty() {
        AttributeRelationship::DataSet
    } else {
        AttributeRelationship::Dimensions(dimensions)
    }
}

fn read_data_structure(element: &Element) -> Result<DataStructureDefinition> {
    let head = MaintainableHead::read(element)?;
    let mut dsd = DataStructureDefinition::new(
        head.maintenance.agency_id.clone(),
        head.id.clone(),
        head.version(),
    )
    .with_versioning(head.versioning)
    .with_maintenance(head.maintenance);
    read_annotations(element, &mut dsd);
    read_naming(element, dsd.naming_mut());

    let components = element
        .child("DataStructureComponents")
        .ok_or_else(|| missing("DataStructureComponents"))?;
    let list_id = |name: &str, role: DescriptorRole| {
        components
            .child(name)
            .and_then(|list| list.attr("id"))
            .unwrap_or(role.default_id())
            .to_string()
    };
    dsd.set_descriptor_ids(
        list_id("DimensionList", DescriptorRole::Dimension),
        list_id("AttributeList", DescriptorRole::Attribute),
        list_id("MeasureList", DescriptorRole::Measure),
    );

    if let Some(list) = components.child("DimensionList") {
        for child in &list.children {
            let id = match child.name.as_str() {
                "Dimension" | "TimeDimension" | "MeasureDimension" => required(child, "id")?,
                _ => continue,
            };
            let component = match child.name.as_str() {
                "TimeDimension" => Component::time_dimension(id),
                "MeasureDimension" => Component::measure_dimension(id),
                _ => Component::dimension(id),
            };
            let position = match child.attr("position") {
                Some(value) => value
                    .parse()
                    .map_err(|_| format_error(format!("invalid position {value} of {id}")))?,
                None => 0,
            };
            dsd.add_dimension(read_component(child, component.with_position(position))?)?;
        }
    }
    for group in components.children_named("Group") {
        let dimensions = group
            .children_named("GroupDimension")
            .filter_map(|member| member.child("DimensionReference").and_then(ref_id))
            .map(str::to_string)
            .collect();
        let mut descriptor = GroupDimensionDescriptor::new(required(group, "id")?, dimensions);
        read_annotations(group, &mut descriptor);
        dsd.add_group(descriptor)?;
    }
    if let Some(list) = components.child("AttributeList") {
        for child in list.children_named("Attribute") {
            let usage = child
                .attr("assignmentStatus")
                .and_then(UsageStatus::parse)
                .unwrap_or(UsageStatus::Conditional);
            let component = Component::attribute(
                required(child, "id")?,
                usage,
                read_relationship(child.child("AttributeRelationship")),
            );
            dsd.add_attribute(read_component(child, component)?)?;
        }
    }
    if let Some(list) = components.child("MeasureList") {
        for child in list.children_named("PrimaryMeasure") {
            let component = Component::primary_measure(required(child, "id")?);
            dsd.add_measure(read_component(child, component)?)?;
        }
    }
    dsd.check()?;
    Ok(dsd)
}

fn read_dataflow(element: &Element) -> Result<DataFlowDefinition> {
    let head = MaintainableHead::read(element)?;
    let structure = element
        .child("Structure")
        .ok_or_else(|| missing("Dataflow/Structure"))?;
    let structure = read_ref(structure, StructureClass::DataStructure)?;
    let mut flow = DataFlowDefinition::new(
        head.maintenance.agency_id.clone(),
        head.id.clone(),
        head.version(),
        structure,
    )?
    .with_versioning(head.versioning)
    .with_maintenance(head.maintenance);
    read_annotations(element, &mut flow);
    read_naming(element, flow.naming_mut());
    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(xml: &str) -> Element {
        let mut src = XmlSource::new(std::io::Cursor::new(xml.as_bytes().to_vec()));
        let root = src.root().expect("root");
        src.read_element(root).expect("element")
    }

    #[test]
    fn test_relationship_variants() {
        let none = element("<AttributeRelationship><None/></AttributeRelationship>");
        assert_eq!(read_relationship(Some(&none)), AttributeRelationship::DataSet);

        let dims = element(
            r#"<AttributeRelationship><Dimension><Ref id="FREQ"/></Dimension><Dimension><Ref id="REF_AREA"/></Dimension></AttributeRelationship>"#,
        );
        assert_eq!(
            read_relationship(Some(&dims)),
            AttributeRelationship::Dimensions(vec!["FREQ".to_string(), "REF_AREA".to_string()])
        );

        let measure =
            element(r#"<AttributeRelationship><PrimaryMeasure><Ref id="OBS_VALUE"/></PrimaryMeasure></AttributeRelationship>"#);
        assert_eq!(read_relationship(Some(&measure)), AttributeRelationship::PrimaryMeasure);
    }

    #[test]
    fn test_text_format_facets() {
        let repr = element(
            r#"<LocalRepresentation><TextFormat textType="String" maxLength="5" pattern="[A-Z]+"/></LocalRepresentation>"#,
        );
        let repr = read_representation(Some(&repr)).expect("read").expect("present");
        assert_eq!(repr.text_type(), Some(FacetValueType::String));
        assert_eq!(repr.facet(FacetType::MaxLength).and_then(Facet::as_usize), Some(5));
        assert!(repr.facet(FacetType::Pattern).is_some());
    }

    #[test]
    fn test_unknown_text_type_is_format_error() {
        let repr = element(r#"<CoreRepresentation><TextFormat textType="Colour"/></CoreRepresentation>"#);
        assert!(matches!(
            read_representation(Some(&repr)),
            Err(SdmxError::Format { .. })
        ));
    }

    #[test]
    fn test_concept_identity_from_ref() {
        let dim = element(
            r#"<Dimension id="FREQ"><ConceptIdentity><Ref maintainableParentID="CS" maintainableParentVersion="2.0" agencyID="ECB" id="FREQ" class="Concept"/></ConceptIdentity></Dimension>"#,
        );
        let concept = read_concept_identity(&dim).expect("read").expect("present");
        assert_eq!(
            concept.urn(),
            "urn:sdmx:org.sdmx.infomodel.conceptscheme.Concept=ECB:CS(2.0).FREQ"
        );
    }
}
