//! Structure message writer.

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use sdmx_model::{
    AgencyScheme, Annotable, Artefact, AttributeRelationship, Codelist, Component, ComponentKind,
    ConceptScheme, DataFlowDefinition, DataStructureDefinition, Header, Identifiable, ItemRef,
    ItemScheme, Maintainable, Nameable, Representation, Result, SchemeItem, StructureRegistry,
};

use super::TEXT_TYPE;
use crate::emit::XmlOut;
use crate::header::{write_header, write_ref};
use crate::namespaces;
use crate::options::XmlWriterOptions;

/// Write every artefact of `registry` as an SDMX-ML structure message.
///
/// Sections follow the schema order (organisation schemes, dataflows,
/// codelists, concepts, data structures); artefacts inside a section are
/// ordered by agency, id and version. Only `options.pretty` applies.
pub fn write_structure<W: Write>(
    writer: W,
    header: &Header,
    registry: &StructureRegistry,
    options: &XmlWriterOptions,
) -> Result<()> {
    let mut out = XmlOut::new(writer, options.pretty);
    out.declaration()?;
    out.start(
        "message:Structure",
        &[
            ("xmlns:message", namespaces::MESSAGE),
            ("xmlns:common", namespaces::COMMON),
            ("xmlns:structure", namespaces::STRUCTURE),
        ],
    )?;
    write_header(&mut out, header, &[], false)?;
    out.start("message:Structures", &[])?;

    let agencies: Vec<&AgencyScheme> = registry
        .artefacts()
        .filter_map(|a| match a {
            Artefact::AgencyScheme(scheme) => Some(scheme.as_ref()),
            _ => None,
        })
        .collect();
    section(&mut out, "structure:OrganisationSchemes", &agencies, |out, scheme| {
        write_scheme(out, "structure:AgencyScheme", "structure:Agency", scheme, |_, _| Ok(()))
    })?;

    let flows: Vec<&DataFlowDefinition> = registry
        .artefacts()
        .filter_map(|a| match a {
            Artefact::Dataflow(flow) => Some(flow.as_ref()),
            _ => None,
        })
        .collect();
    section(&mut out, "structure:Dataflows", &flows, write_dataflow)?;

    let codelists: Vec<&Codelist> = registry
        .artefacts()
        .filter_map(|a| match a {
            Artefact::Codelist(codelist) => Some(codelist.as_ref()),
            _ => None,
        })
        .collect();
    section(&mut out, "structure:Codelists", &codelists, |out, codelist| {
        write_scheme(out, "structure:Codelist", "structure:Code", codelist, |_, _| Ok(()))
    })?;

    let concepts: Vec<&ConceptScheme> = registry
        .artefacts()
        .filter_map(|a| match a {
            Artefact::ConceptScheme(scheme) => Some(scheme.as_ref()),
            _ => None,
        })
        .collect();
    section(&mut out, "structure:Concepts", &concepts, |out, scheme| {
        write_scheme(out, "structure:ConceptScheme", "structure:Concept", scheme, |out, concept| {
            match &concept.core_representation {
                Some(repr) => write_representation(out, "structure:CoreRepresentation", repr),
                None => Ok(()),
            }
        })
    })?;

    let structures: Vec<&DataStructureDefinition> =
        registry.data_structures().map(Arc::as_ref).collect();
    section(&mut out, "structure:DataStructures", &structures, write_data_structure)?;

    out.end("message:Structures")?;
    out.end("message:Structure")?;
    out.into_inner().flush()?;
    tracing::info!(artefacts = registry.len(), "Wrote SDMX-ML structure message");
    Ok(())
}

/// Writes a section wrapper around `items`, or nothing when empty.
fn section<W: Write, T: ?Sized>(
    out: &mut XmlOut<W>,
    name: &str,
    items: &[&T],
    write: impl Fn(&mut XmlOut<W>, &T) -> Result<()>,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    out.start(name, &[])?;
    for &item in items {
        write(out, item)?;
    }
    out.end(name)
}

fn timestamp_text(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Attributes of a maintainable start tag, `extra` placed before `isFinal`.
fn maintainable_attributes(
    artefact: &impl Maintainable,
    extra: &[(&'static str, String)],
) -> Vec<(&'static str, String)> {
    let mut attributes = vec![("id", artefact.id().to_string())];
    if let Some(urn) = artefact.urn() {
        attributes.push(("urn", urn));
    }
    attributes.push(("agencyID", artefact.agency_id().to_string()));
    attributes.push(("version", artefact.version().to_string()));
    attributes.extend(extra.iter().cloned());
    let maintenance = artefact.maintenance();
    attributes.push(("isFinal", bool_text(maintenance.is_final).to_string()));
    if maintenance.is_external_reference {
        attributes.push(("isExternalReference", "true".to_string()));
    }
    let versioning = artefact.versioning();
    if let Some(from) = versioning.valid_from() {
        attributes.push(("validFrom", timestamp_text(from)));
    }
    if let Some(to) = versioning.valid_to() {
        attributes.push(("validTo", timestamp_text(to)));
    }
    attributes
}

fn borrowed<'a>(attributes: &'a [(&'static str, String)]) -> Vec<(&'a str, &'a str)> {
    attributes
        .iter()
        .map(|(key, value)| (*key, value.as_str()))
        .collect()
}

fn write_annotations<W: Write>(out: &mut XmlOut<W>, artefact: &impl Annotable) -> Result<()> {
    let annotations = artefact.annotations();
    if annotations.is_empty() {
        return Ok(());
    }
    out.start("common:Annotations", &[])?;
    for annotation in annotations {
        match &annotation.id {
            Some(id) => out.start("common:Annotation", &[("id", id.as_str())])?,
            None => out.start("common:Annotation", &[])?,
        }
        let fields = [
            ("common:AnnotationTitle", &annotation.title),
            ("common:AnnotationType", &annotation.annotation_type),
            ("common:AnnotationURL", &annotation.url),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                out.text_element(name, &[], value)?;
            }
        }
        out.localised("common:AnnotationText", &annotation.text)?;
        out.end("common:Annotation")?;
    }
    out.end("common:Annotations")
}

/// Annotations, names and descriptions, in schema order.
fn write_nameable<W: Write>(
    out: &mut XmlOut<W>,
    artefact: &(impl Annotable + Nameable),
) -> Result<()> {
    write_annotations(out, artefact)?;
    let naming = artefact.naming();
    out.localised("common:Name", &naming.name)?;
    out.localised("common:Description", &naming.description)
}

fn write_scheme<W: Write, T: SchemeItem>(
    out: &mut XmlOut<W>,
    name: &str,
    item_name: &str,
    scheme: &ItemScheme<T>,
    write_extra: impl Fn(&mut XmlOut<W>, &T) -> Result<()>,
) -> Result<()> {
    let attributes = maintainable_attributes(
        scheme,
        &[("isPartial", bool_text(scheme.is_partial).to_string())],
    );
    out.start(name, &borrowed(&attributes))?;
    write_nameable(out, scheme)?;
    for item in scheme.items() {
        let urn = item.urn();
        let mut attributes = vec![("id", item.id())];
        if let Some(urn) = &urn {
            attributes.push(("urn", urn.as_str()));
        }
        out.start(item_name, &attributes)?;
        write_nameable(out, item)?;
        if let Some(parent) = item.parent() {
            out.start("structure:Parent", &[])?;
            out.empty("Ref", &[("id", parent)])?;
            out.end("structure:Parent")?;
        }
        write_extra(out, item)?;
        out.end(item_name)?;
    }
    out.end(name)?;
    tracing::debug!(scheme = %scheme.unique_id(), items = scheme.len(), "Wrote item scheme");
    Ok(())
}

fn write_representation<W: Write>(
    out: &mut XmlOut<W>,
    name: &str,
    representation: &Representation,
) -> Result<()> {
    let mut format: Vec<(&str, &str)> = Vec::new();
    if let Some(text_type) = representation.text_type() {
        format.push((TEXT_TYPE, text_type.as_str()));
    }
    for facet in representation.facets() {
        format.push((facet.facet_type.as_str(), facet.facet_value.as_str()));
    }
    out.start(name, &[])?;
    match representation.codelist() {
        Some(codelist) => {
            out.start("structure:Enumeration", &[])?;
            write_ref(out, codelist)?;
            out.end("structure:Enumeration")?;
            if !format.is_empty() {
                out.empty("structure:EnumerationFormat", &format)?;
            }
        }
        None => out.empty("structure:TextFormat", &format)?,
    }
    out.end(name)
}

fn write_concept_identity<W: Write>(out: &mut XmlOut<W>, concept: &ItemRef) -> Result<()> {
    out.start("structure:ConceptIdentity", &[])?;
    out.empty(
        "Ref",
        &[
            ("maintainableParentID", concept.scheme.id.as_str()),
            ("maintainableParentVersion", concept.scheme.version.as_str()),
            ("agencyID", concept.scheme.agency_id.as_str()),
            ("id", concept.item_id.as_str()),
            ("package", concept.scheme.class.package()),
            ("class", "Concept"),
        ],
    )?;
    out.end("structure:ConceptIdentity")
}

/// Writes one component; `measure` names the primary measure that
/// measure-related attributes point at.
fn write_component<W: Write>(
    out: &mut XmlOut<W>,
    component: &Component,
    measure: &str,
) -> Result<()> {
    let position = component.position().map(|p| p.to_string());
    let (name, mut attributes) = match &component.kind {
        ComponentKind::Dimension { .. } => ("structure:Dimension", vec![("id", component.id())]),
        ComponentKind::TimeDimension { .. } => {
            ("structure:TimeDimension", vec![("id", component.id())])
        }
        ComponentKind::MeasureDimension { .. } => {
            ("structure:MeasureDimension", vec![("id", component.id())])
        }
        ComponentKind::Attribute { usage_status, .. } => (
            "structure:Attribute",
            vec![
                ("id", component.id()),
                ("assignmentStatus", usage_status.as_str()),
            ],
        ),
        ComponentKind::PrimaryMeasure => ("structure:PrimaryMeasure", vec![("id", component.id())]),
    };
    if let Some(position) = &position {
        attributes.push(("position", position.as_str()));
    }
    out.start(name, &attributes)?;
    write_annotations(out, component)?;
    if let Some(concept) = &component.concept_identity {
        write_concept_identity(out, concept)?;
    }
    if let Some(repr) = &component.local_representation {
        write_representation(out, "structure:LocalRepresentation", repr)?;
    }
    if let Some(relationship) = component.relationship() {
        write_relationship(out, relationship, measure)?;
    }
    out.end(name)
}

fn write_relationship<W: Write>(
    out: &mut XmlOut<W>,
    relationship: &AttributeRelationship,
    measure: &str,
) -> Result<()> {
    out.start("structure:AttributeRelationship", &[])?;
    match relationship {
        AttributeRelationship::DataSet => out.empty("structure:None", &[])?,
        AttributeRelationship::Dimensions(ids) => {
            for id in ids {
                out.start("structure:Dimension", &[])?;
                out.empty("Ref", &[("id", id.as_str())])?;
                out.end("structure:Dimension")?;
            }
        }
        AttributeRelationship::Group(id) => {
            out.start("structure:Group", &[])?;
            out.empty("Ref", &[("id", id.as_str())])?;
            out.end("structure:Group")?;
        }
        AttributeRelationship::PrimaryMeasure => {
            out.start("structure:PrimaryMeasure", &[])?;
            out.empty("Ref", &[("id", measure)])?;
            out.end("structure:PrimaryMeasure")?;
        }
    }
    out.end("structure:AttributeRelationship")
}

fn write_data_structure<W: Write>(out: &mut XmlOut<W>, dsd: &DataStructureDefinition) -> Result<()> {
    let measure = dsd.measure_code().unwrap_or_default();
    let attributes = maintainable_attributes(dsd, &[]);
    out.start("structure:DataStructure", &borrowed(&attributes))?;
    write_nameable(out, dsd)?;
    out.start("structure:DataStructureComponents", &[])?;

    out.start("structure:DimensionList", &[("id", dsd.dimensions().id())])?;
    for component in dsd.dimensions().components() {
        write_component(out, component, measure)?;
    }
    out.end("structure:DimensionList")?;

    for group in dsd.groups() {
        out.start("structure:Group", &[("id", group.id())])?;
        write_annotations(out, group)?;
        for dimension in &group.dimensions {
            out.start("structure:GroupDimension", &[])?;
            out.start("structure:DimensionReference", &[])?;
            out.empty("Ref", &[("id", dimension.as_str())])?;
            out.end("structure:DimensionReference")?;
            out.end("structure:GroupDimension")?;
        }
        out.end("structure:Group")?;
    }

    if !dsd.attributes().is_empty() {
        out.start("structure:AttributeList", &[("id", dsd.attributes().id())])?;
        for component in dsd.attributes().components() {
            write_component(out, component, measure)?;
        }
        out.end("structure:AttributeList")?;
    }

    out.start("structure:MeasureList", &[("id", dsd.measures().id())])?;
    for component in dsd.measures().components() {
        write_component(out, component, measure)?;
    }
    out.end("structure:MeasureList")?;

    out.end("structure:DataStructureComponents")?;
    out.end("structure:DataStructure")
}

fn write_dataflow<W: Write>(out: &mut XmlOut<W>, flow: &DataFlowDefinition) -> Result<()> {
    let attributes = maintainable_attributes(flow, &[]);
    out.start("structure:Dataflow", &borrowed(&attributes))?;
    write_nameable(out, flow)?;
    out.start("structure:Structure", &[])?;
    write_ref(out, flow.structure())?;
    out.end("structure:Structure")?;
    out.end("structure:Dataflow")
}
