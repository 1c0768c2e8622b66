//! Message header codec.

use std::io::Write;

use sdmx_model::{
    Action, Contact, DEFAULT_LOCALE, DEFAULT_VERSION, DimensionAtObservation, FormatPosition,
    Header, InternationalString, Party, Result, SdmxError, StructureClass, StructureRef,
    parse_timestamp,
};

use crate::emit::XmlOut;
use crate::namespaces::structure_specific_namespace;
use crate::source::Element;

/// Binds a `structureID` used by datasets to a structure and an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StructureBinding {
    pub structure_id: String,
    pub reference: StructureRef,
    pub dim_at_obs: DimensionAtObservation,
}

impl StructureBinding {
    pub(crate) fn new(reference: StructureRef, dim_at_obs: DimensionAtObservation) -> Self {
        let structure_id = format!(
            "{}_{}_{}",
            reference.agency_id,
            reference.id,
            reference.version.replace('.', "_")
        );
        Self {
            structure_id,
            reference,
            dim_at_obs,
        }
    }
}

pub(crate) fn read_header(element: &Element) -> Result<(Header, Vec<StructureBinding>)> {
    let mut header = Header {
        id: element
            .child_text("ID")
            .map(str::to_string)
            .ok_or_else(|| missing("Header/ID"))?,
        test: element.child_text("Test") == Some("true"),
        ..Header::default()
    };
    if let Some(prepared) = element.child_text("Prepared") {
        header.prepared = Some(parse_timestamp(prepared).ok_or_else(|| {
            SdmxError::format(
                format!("invalid Prepared timestamp {prepared}"),
                FormatPosition::Unknown,
            )
        })?);
    }
    if let Some(sender) = element.child("Sender") {
        header.sender = read_party(sender)?;
    }
    header.receivers = element
        .children_named("Receiver")
        .map(read_party)
        .collect::<Result<_>>()?;
    if let Some(action) = element.child_text("DataSetAction") {
        header.dataset_action = Some(action.parse()?);
    }
    header.dataset_id = element.child_text("DataSetID").map(str::to_string);
    header.source = localised(element, "Source");

    let bindings = element
        .children_named("Structure")
        .map(read_binding)
        .collect::<Result<_>>()?;
    Ok((header, bindings))
}

pub(crate) fn missing(what: &str) -> SdmxError {
    SdmxError::format(format!("missing {what}"), FormatPosition::Unknown)
}

pub(crate) fn localised(element: &Element, name: &str) -> InternationalString {
    let mut text = InternationalString::new();
    for child in element.children_named(name) {
        text.set(child.attr("lang").unwrap_or(DEFAULT_LOCALE), &child.text);
    }
    text
}

fn read_party(element: &Element) -> Result<Party> {
    let id = element.attr("id").ok_or_else(|| missing("party id"))?;
    let mut party = Party::new(id);
    party.name = localised(element, "Name");
    party.contacts = element
        .children_named("Contact")
        .map(|contact| Contact {
            name: localised(contact, "Name"),
            department: contact.child_text("Department").map(str::to_string),
            role: contact.child_text("Role").map(str::to_string),
            telephone: contact.child_text("Telephone").map(str::to_string),
            email: contact.child_text("Email").map(str::to_string),
        })
        .collect();
    Ok(party)
}

fn read_binding(element: &Element) -> Result<StructureBinding> {
    let structure_id = element
        .attr("structureID")
        .ok_or_else(|| missing("Structure/@structureID"))?;
    let dim_at_obs =
        DimensionAtObservation::from(element.attr("dimensionAtObservation").unwrap_or_default());
    let (wrapper, default_class) = match element.child("StructureUsage") {
        Some(usage) => (usage, StructureClass::Dataflow),
        None => (
            element
                .child("Structure")
                .ok_or_else(|| missing("Structure reference"))?,
            StructureClass::DataStructure,
        ),
    };
    let reference = read_ref(wrapper, default_class)?;
    Ok(StructureBinding {
        structure_id: structure_id.to_string(),
        reference,
        dim_at_obs,
    })
}

/// Reads a `Ref` child or a `URN` child into a structure reference.
pub(crate) fn read_ref(wrapper: &Element, default_class: StructureClass) -> Result<StructureRef> {
    if let Some(reference) = wrapper.child("Ref") {
        let class = reference
            .attr("class")
            .and_then(StructureClass::parse)
            .unwrap_or(default_class);
        let agency_id = reference
            .attr("agencyID")
            .ok_or_else(|| missing("Ref/@agencyID"))?;
        let id = reference.attr("id").ok_or_else(|| missing("Ref/@id"))?;
        let version = reference.attr("version").unwrap_or(DEFAULT_VERSION);
        return Ok(StructureRef::new(class, agency_id, id, version));
    }
    match wrapper.child_text("URN") {
        Some(urn) => urn.parse(),
        None => Err(missing(&format!("{} reference", wrapper.name))),
    }
}

/// Writes a `Ref` element for a maintainable artefact.
pub(crate) fn write_ref<W: Write>(out: &mut XmlOut<W>, reference: &StructureRef) -> Result<()> {
    out.empty(
        "Ref",
        &[
            ("agencyID", reference.agency_id.as_str()),
            ("id", reference.id.as_str()),
            ("version", reference.version.as_str()),
            ("package", reference.class.package()),
            ("class", reference.class.as_str()),
        ],
    )
}

pub(crate) fn write_header<W: Write>(
    out: &mut XmlOut<W>,
    header: &Header,
    bindings: &[StructureBinding],
    structure_specific: bool,
) -> Result<()> {
    out.start("message:Header", &[])?;
    out.text_element("message:ID", &[], &header.id)?;
    out.text_element("message:Test", &[], if header.test { "true" } else { "false" })?;
    if let Some(prepared) = header.prepared_text() {
        out.text_element("message:Prepared", &[], &prepared)?;
    }
    write_party(out, "message:Sender", &header.sender)?;
    for receiver in &header.receivers {
        write_party(out, "message:Receiver", receiver)?;
    }
    for binding in bindings {
        let unique_id = binding.reference.unique_id();
        let namespace = structure_specific_namespace(&unique_id, binding.dim_at_obs.as_str());
        let mut attributes = vec![("structureID", binding.structure_id.as_str())];
        if structure_specific {
            attributes.push(("namespace", namespace.as_str()));
        }
        attributes.push(("dimensionAtObservation", binding.dim_at_obs.as_str()));
        out.start("message:Structure", &attributes)?;
        let wrapper = match binding.reference.class {
            StructureClass::Dataflow => "common:StructureUsage",
            _ => "common:Structure",
        };
        out.start(wrapper, &[])?;
        write_ref(out, &binding.reference)?;
        out.end(wrapper)?;
        out.end("message:Structure")?;
    }
    if let Some(action) = header.dataset_action {
        out.text_element("message:DataSetAction", &[], action.as_str())?;
    }
    if let Some(dataset_id) = &header.dataset_id {
        out.text_element("message:DataSetID", &[], dataset_id)?;
    }
    out.localised("message:Source", &header.source)?;
    out.end("message:Header")
}

fn write_party<W: Write>(out: &mut XmlOut<W>, name: &str, party: &Party) -> Result<()> {
    if party.name.is_empty() && party.contacts.is_empty() {
        return out.empty(name, &[("id", party.id.as_str())]);
    }
    out.start(name, &[("id", party.id.as_str())])?;
    out.localised("common:Name", &party.name)?;
    for contact in &party.contacts {
        out.start("message:Contact", &[])?;
        out.localised("common:Name", &contact.name)?;
        let fields = [
            ("message:Department", &contact.department),
            ("message:Role", &contact.role),
            ("message:Telephone", &contact.telephone),
            ("message:Email", &contact.email),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                out.text_element(field, &[], value)?;
            }
        }
        out.end("message:Contact")?;
    }
    out.end(name)
}

/// Action attribute value of a dataset element.
pub(crate) fn parse_action(value: Option<&str>) -> Result<Action> {
    value.map_or(Ok(Action::default()), str::parse)
}
