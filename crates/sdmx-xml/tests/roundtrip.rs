//! SDMX-ML data and structure round trips.

use std::io::Cursor;

use chrono::{TimeZone, Utc};
use polars::prelude::{Column, DataFrame};
use sdmx_model::{
    Annotable, Annotation, AttributeRelationship, Code, Codelist, Component, Concept, ConceptScheme,
    DataFlowDefinition, DataStructureDefinition, Dataset, DimensionAtObservation, Facet,
    FacetType, FacetValueType, GroupDimensionDescriptor, Header, Maintainable, Message,
    MessageType, Party, Representation, SdmxError, StructureClass, StructureRef,
    StructureRegistry, UsageStatus,
};
use sdmx_xml::{
    DataFlavor, XmlWriterOptions, detect, read_data, read_structure, write_data, write_structure,
};

fn registry() -> StructureRegistry {
    let mut registry = StructureRegistry::new();

    let mut freq = Codelist::new("ECB", "CL_FREQ", "1.0").with_name("en", "Frequency");
    freq.extend([
        Code::new("A").with_name("en", "Annual"),
        Code::new("M").with_name("en", "Monthly"),
    ])
    .expect("codes");
    let freq_ref = registry.insert(freq).expect("codelist");

    let mut concepts = ConceptScheme::new("ECB", "ECB_CONCEPTS", "1.0");
    concepts
        .extend(
            [
                "FREQ",
                "REF_AREA",
                "TIME_PERIOD",
                "OBS_VALUE",
                "OBS_STATUS",
                "TITLE",
                "UNIT_MULT",
                "DECIMALS",
            ]
            .map(|id| Concept::new(id).with_name("en", id)),
        )
        .expect("concepts");
    let concepts_ref = registry.insert(concepts).expect("concepts");
    let concept = |id: &str| concepts_ref.item(id);

    let mut dsd = DataStructureDefinition::new("ECB", "ECB_EXR1", "1.0").with_name("en", "Rates");
    dsd.add_annotation(Annotation::new().with_id("A1").with_text("en", "note"));
    dsd.add_dimension(
        Component::dimension("FREQ")
            .with_concept(concept("FREQ"))
            .with_representation(Representation::enumerated(freq_ref)),
    )
    .expect("FREQ");
    dsd.add_dimension(Component::dimension("REF_AREA").with_concept(concept("REF_AREA")))
        .expect("REF_AREA");
    dsd.add_dimension(
        Component::time_dimension("TIME_PERIOD")
            .with_concept(concept("TIME_PERIOD"))
            .with_representation(Representation::text(FacetValueType::ObservationalTimePeriod)),
    )
    .expect("TIME_PERIOD");
    dsd.add_measure(
        Component::primary_measure("OBS_VALUE")
            .with_concept(concept("OBS_VALUE"))
            .with_representation(Representation::text(FacetValueType::Double)),
    )
    .expect("OBS_VALUE");
    dsd.add_group(GroupDimensionDescriptor::new(
        "SiblingGroup",
        vec!["REF_AREA".to_string()],
    ))
    .expect("group");
    dsd.add_attribute(
        Component::attribute(
            "OBS_STATUS",
            UsageStatus::Mandatory,
            AttributeRelationship::PrimaryMeasure,
        )
        .with_concept(concept("OBS_STATUS")),
    )
    .expect("OBS_STATUS");
    dsd.add_attribute(
        Component::attribute(
            "TITLE",
            UsageStatus::Conditional,
            AttributeRelationship::Dimensions(vec!["FREQ".to_string(), "REF_AREA".to_string()]),
        )
        .with_concept(concept("TITLE"))
        .with_representation(
            Representation::text(FacetValueType::String)
                .with_facet(Facet::new(FacetType::MaxLength, "70")),
        ),
    )
    .expect("TITLE");
    dsd.add_attribute(
        Component::attribute(
            "UNIT_MULT",
            UsageStatus::Conditional,
            AttributeRelationship::Group("SiblingGroup".to_string()),
        )
        .with_concept(concept("UNIT_MULT")),
    )
    .expect("UNIT_MULT");
    dsd.add_attribute(
        Component::attribute("DECIMALS", UsageStatus::Conditional, AttributeRelationship::DataSet)
            .with_concept(concept("DECIMALS")),
    )
    .expect("DECIMALS");
    let dsd_ref = registry.insert(dsd).expect("dsd");

    let flow = DataFlowDefinition::new("ECB", "EXR", "1.0", dsd_ref)
        .expect("flow")
        .with_name("en", "Exchange rates");
    registry.insert(flow).expect("flow");
    registry
}

fn dsd_ref() -> StructureRef {
    StructureRef::new(StructureClass::DataStructure, "ECB", "ECB_EXR1", "1.0")
}

fn frame(columns: &[(&str, &[&str])]) -> DataFrame {
    DataFrame::new(
        columns
            .iter()
            .map(|(name, values)| Column::new((*name).into(), values.to_vec()))
            .collect(),
    )
    .expect("frame")
}

fn message(registry: &StructureRegistry, dim_at_obs: DimensionAtObservation) -> Message {
    let mut dataset = Dataset::from_registry(registry, &dsd_ref()).expect("dataset");
    dataset
        .set_data(frame(&[
            ("FREQ", &["A", "A", "A"]),
            ("REF_AREA", &["DE", "DE", "FR"]),
            ("TIME_PERIOD", &["2020", "2021", "2020"]),
            ("OBS_VALUE", &["1.5", "1.6", "2"]),
            ("OBS_STATUS", &["A", "A", "E"]),
            ("TITLE", &["Germany", "Germany", "France & co"]),
            ("UNIT_MULT", &["0", "0", "3"]),
        ]))
        .expect("data");
    dataset.set_attribute("DECIMALS", "4");
    dataset.set_dim_at_obs(dim_at_obs);

    let mut header = Header::new("IREF000001", Party::new("ECB"));
    header.prepared = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single();
    header.receivers.push(Party::new("BIS"));
    Message::new(MessageType::GenericData, header, vec![dataset])
}

fn write(message: &Message, message_type: MessageType) -> Vec<u8> {
    let mut bytes = Vec::new();
    let options = XmlWriterOptions::default().with_message_type(message_type);
    write_data(&mut bytes, message, &options).expect("write");
    bytes
}

fn time_series() -> DimensionAtObservation {
    DimensionAtObservation::Dimension("TIME_PERIOD".to_string())
}

fn assert_byte_stable(message_type: MessageType, dim_at_obs: DimensionAtObservation) {
    let registry = registry();
    let original = message(&registry, dim_at_obs.clone());
    let first = write(&original, message_type);
    let read = read_data(Cursor::new(first.clone()), &registry).expect("read");
    assert_eq!(read.message_type, message_type);
    assert_eq!(read.datasets().len(), 1);

    let dataset = &read.datasets()[0];
    assert_eq!(dataset.dim_at_obs(), &dim_at_obs);
    assert_eq!(dataset.attribute("DECIMALS"), Some("4"));
    assert_eq!(dataset.height(), 3);
    assert_eq!(dataset.value("TITLE", 2), Some("France & co"));
    assert_eq!(dataset.value("UNIT_MULT", 2), Some("3"));
    assert_eq!(dataset.value("UNIT_MULT", 1), Some("0"));
    assert_eq!(dataset.column_names(), original.datasets()[0].column_names());

    let second = write(&read, message_type);
    assert_eq!(
        String::from_utf8(second).expect("utf8"),
        String::from_utf8(first).expect("utf8")
    );
}

#[test]
fn generic_series_is_byte_stable() {
    assert_byte_stable(MessageType::GenericData, time_series());
}

#[test]
fn generic_flat_is_byte_stable() {
    assert_byte_stable(MessageType::GenericData, DimensionAtObservation::AllDimensions);
}

#[test]
fn structure_specific_series_is_byte_stable() {
    assert_byte_stable(MessageType::StructureSpecificData, time_series());
}

#[test]
fn structure_specific_flat_is_byte_stable() {
    assert_byte_stable(
        MessageType::StructureSpecificData,
        DimensionAtObservation::AllDimensions,
    );
}

#[test]
fn group_attributes_are_written_once_per_group() {
    let registry = registry();
    let bytes = write(
        &message(&registry, time_series()),
        MessageType::StructureSpecificData,
    );
    let xml = String::from_utf8(bytes).expect("utf8");
    assert_eq!(xml.matches("<Group ").count(), 2);
    assert!(xml.contains(r#"<Group xsi:type="ns1:SiblingGroup" REF_AREA="FR" UNIT_MULT="3"/>"#));
    assert_eq!(xml.matches("<Series ").count(), 2);
}

#[test]
fn header_survives_round_trip() {
    let registry = registry();
    let original = message(&registry, time_series());
    let bytes = write(&original, MessageType::GenericData);
    let read = read_data(Cursor::new(bytes), &registry).expect("read");
    assert_eq!(read.header, original.header);
}

#[test]
fn structure_message_is_not_data() {
    let registry = registry();
    let mut bytes = Vec::new();
    write_structure(
        &mut bytes,
        &Header::default(),
        &registry,
        &XmlWriterOptions::default(),
    )
    .expect("write");
    let err = read_data(Cursor::new(bytes), &registry).unwrap_err();
    assert!(matches!(err, SdmxError::Format { .. }), "{err}");
}

#[test]
fn unknown_structure_is_reference_error() {
    let bytes = write(&message(&registry(), time_series()), MessageType::GenericData);
    let err = read_data(Cursor::new(bytes), &StructureRegistry::new()).unwrap_err();
    assert!(matches!(err, SdmxError::Reference { .. }), "{err}");
}

#[test]
fn malformed_xml_is_format_error() {
    let xml = r#"<message:GenericData xmlns:message="m"><message:Header><message:ID>X</message:Header>"#;
    let err = read_data(Cursor::new(xml.as_bytes()), &registry()).unwrap_err();
    assert!(matches!(err, SdmxError::Format { .. }), "{err}");
}

#[test]
fn writer_rejects_missing_measure() {
    let registry = registry();
    let mut dataset = Dataset::from_registry(&registry, &dsd_ref()).expect("dataset");
    dataset
        .set_data(frame(&[
            ("FREQ", &["A"]),
            ("REF_AREA", &["DE"]),
            ("TIME_PERIOD", &["2020"]),
        ]))
        .expect("data");
    let message = Message::new(MessageType::GenericData, Header::default(), vec![dataset]);
    let mut bytes = Vec::new();
    let err = write_data(&mut bytes, &message, &XmlWriterOptions::default()).unwrap_err();
    assert!(matches!(err, SdmxError::SchemaMismatch { .. }), "{err}");
    assert!(bytes.is_empty());
}

#[test]
fn writer_rejects_structure_message_type() {
    let registry = registry();
    let options = XmlWriterOptions::default().with_message_type(MessageType::Structure);
    let err = write_data(Vec::new(), &message(&registry, time_series()), &options).unwrap_err();
    assert!(matches!(err, SdmxError::Structural { .. }));
}

#[test]
fn dataflow_bound_dataset_round_trips() {
    let registry = registry();
    let flow = StructureRef::new(StructureClass::Dataflow, "ECB", "EXR", "1.0");
    let mut dataset = Dataset::from_registry(&registry, &flow).expect("dataset");
    dataset
        .set_data(frame(&[
            ("FREQ", &["M"]),
            ("REF_AREA", &["DE"]),
            ("TIME_PERIOD", &["2020-01"]),
            ("OBS_VALUE", &["7"]),
        ]))
        .expect("data");
    let message = Message::new(MessageType::GenericData, Header::default(), vec![dataset]);
    let bytes = write(&message, MessageType::StructureSpecificData);
    let xml = String::from_utf8(bytes.clone()).expect("utf8");
    assert!(xml.contains("<common:StructureUsage>"));

    let read = read_data(Cursor::new(bytes), &registry).expect("read");
    assert_eq!(read.datasets()[0].structure_ref(), &flow);
    assert_eq!(read.datasets()[0].value("OBS_VALUE", 0), Some("7"));
}

#[test]
fn detect_flavor() {
    assert_eq!(detect("message:GenericData", &[]), Some(DataFlavor::Generic));
    assert_eq!(detect("mes:Structure", &[]), None);
}

#[test]
fn structure_round_trip_is_byte_stable() {
    let registry = registry();
    let header = Header::new("STR1", Party::new("ECB"));
    let options = XmlWriterOptions::default();

    let mut first = Vec::new();
    write_structure(&mut first, &header, &registry, &options).expect("write");
    let (read_header, read_registry) = read_structure(Cursor::new(first.clone())).expect("read");
    assert_eq!(read_header, header);
    assert_eq!(read_registry.len(), registry.len());

    let dsd = read_registry.data_structure(&dsd_ref()).expect("dsd");
    assert_eq!(dsd.dimension_codes(), ["FREQ", "REF_AREA", "TIME_PERIOD"]);
    assert_eq!(dsd.dataset_attribute_codes(), ["DECIMALS"]);
    assert_eq!(dsd.groups().len(), 1);
    assert_eq!(dsd.annotations().len(), 1);
    assert_eq!(dsd.unique_id(), "ECB:ECB_EXR1(1.0)");

    let mut second = Vec::new();
    write_structure(&mut second, &read_header, &read_registry, &options).expect("write");
    assert_eq!(
        String::from_utf8(second).expect("utf8"),
        String::from_utf8(first).expect("utf8")
    );
}

#[test]
fn dataflow_to_unknown_structure_is_reference_error() {
    let xml = r#"<?xml version="1.0"?>
<message:Structure xmlns:message="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message" xmlns:structure="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/structure">
  <message:Header><message:ID>S</message:ID><message:Test>false</message:Test><message:Sender id="X"/></message:Header>
  <message:Structures>
    <structure:Dataflows>
      <structure:Dataflow id="FLOW" agencyID="X" version="1.0">
        <structure:Structure><Ref agencyID="X" id="MISSING" version="1.0" class="DataStructure"/></structure:Structure>
      </structure:Dataflow>
    </structure:Dataflows>
  </message:Structures>
</message:Structure>"#;
    let err = read_structure(Cursor::new(xml.as_bytes())).unwrap_err();
    assert!(matches!(err, SdmxError::Reference { .. }), "{err}");
}
