//! SDMX-JSON round trips.

use std::io::Cursor;

use polars::prelude::{Column, DataFrame};
use proptest::prelude::*;
use sdmx_model::{
    AttributeRelationship, Code, Codelist, Component, DataStructureDefinition, Dataset,
    DimensionAtObservation, FormatPosition, Header, Message, MessageType, Party, Representation,
    SdmxError, StructureRef, StructureRegistry, UsageStatus, parse_timestamp,
};
use sdmx_json::{JsonWriterOptions, read_data, write_data};
use serde_json::Value;

fn registry() -> (StructureRegistry, StructureRef) {
    let mut registry = StructureRegistry::new();
    let mut freq = Codelist::new("ECB", "CL_FREQ", "1.0");
    freq.extend(["A", "M"].map(Code::new)).expect("codes");
    let freq = registry.insert(freq).expect("codelist");

    let mut dsd = DataStructureDefinition::new("ECB", "EXR", "1.0");
    dsd.add_dimension(
        Component::dimension("FREQ").with_representation(Representation::enumerated(freq)),
    )
    .expect("FREQ");
    dsd.add_dimension(Component::dimension("REF_AREA"))
        .expect("REF_AREA");
    dsd.add_dimension(Component::time_dimension("TIME_PERIOD"))
        .expect("TIME_PERIOD");
    dsd.add_measure(Component::primary_measure("OBS_VALUE"))
        .expect("OBS_VALUE");
    dsd.add_attribute(Component::attribute(
        "OBS_STATUS",
        UsageStatus::Mandatory,
        AttributeRelationship::PrimaryMeasure,
    ))
    .expect("OBS_STATUS");
    dsd.add_attribute(Component::attribute(
        "TITLE",
        UsageStatus::Conditional,
        AttributeRelationship::Dimensions(vec!["FREQ".into(), "REF_AREA".into()]),
    ))
    .expect("TITLE");
    dsd.add_attribute(Component::attribute(
        "DECIMALS",
        UsageStatus::Conditional,
        AttributeRelationship::DataSet,
    ))
    .expect("DECIMALS");
    let reference = registry.insert(dsd).expect("dsd");
    (registry, reference)
}

fn frame(columns: &[(&str, Vec<Option<String>>)]) -> DataFrame {
    DataFrame::new(
        columns
            .iter()
            .map(|(name, values)| Column::new((*name).into(), values.clone()))
            .collect(),
    )
    .expect("frame")
}

fn cells(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some((*v).to_string())).collect()
}

fn message(dataset: Dataset) -> Message {
    let mut header = Header::new("JSON1", Party::new("ECB"));
    header.prepared = parse_timestamp("2024-05-01T10:00:00Z");
    Message::new(MessageType::StructureSpecificData, header, vec![dataset])
}

fn sample(registry: &StructureRegistry, reference: &StructureRef) -> Dataset {
    let mut dataset = Dataset::from_registry(registry, reference).expect("dataset");
    dataset
        .set_data(frame(&[
            ("FREQ", cells(&["M", "M", "A", "M"])),
            ("REF_AREA", cells(&["DE", "DE", "DE", "FR"])),
            ("TIME_PERIOD", cells(&["2020-01", "2020-02", "2020", "2020-01"])),
            ("OBS_VALUE", cells(&["1.5", "1.25", "7", "0.5"])),
            ("OBS_STATUS", cells(&["A", "E", "A", "A"])),
            ("TITLE", cells(&["Germany", "Germany", "Germany yearly", "France"])),
        ]))
        .expect("data");
    dataset.set_attribute("DECIMALS", "2");
    dataset.set_dim_at_obs(DimensionAtObservation::Dimension("TIME_PERIOD".into()));
    dataset
}

fn write(message: &Message) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_data(&mut bytes, message, &JsonWriterOptions::default()).expect("write");
    bytes
}

#[test]
fn series_round_trip_is_byte_stable() {
    let (registry, reference) = registry();
    let first = write(&message(sample(&registry, &reference)));
    let read = read_data(Cursor::new(first.clone()), &registry).expect("read");

    let dataset = &read.datasets()[0];
    assert_eq!(dataset.height(), 4);
    assert_eq!(dataset.attribute("DECIMALS"), Some("2"));
    assert_eq!(
        dataset.dim_at_obs(),
        &DimensionAtObservation::Dimension("TIME_PERIOD".into())
    );
    assert_eq!(dataset.value("TITLE", 2), Some("Germany yearly"));
    assert_eq!(dataset.value("OBS_VALUE", 1), Some("1.25"));

    let second = write(&read);
    assert_eq!(
        String::from_utf8(second).expect("utf8"),
        String::from_utf8(first).expect("utf8")
    );
}

#[test]
fn value_tables_follow_first_seen_order() {
    let (registry, reference) = registry();
    let bytes = write(&message(sample(&registry, &reference)));
    let document: Value = serde_json::from_slice(&bytes).expect("json");

    let series_dimensions = &document["data"]["structures"][0]["dimensions"]["series"];
    assert_eq!(series_dimensions[0]["id"], "FREQ");
    assert_eq!(series_dimensions[0]["keyPosition"], 0);
    assert_eq!(series_dimensions[0]["values"][0]["id"], "M");
    assert_eq!(series_dimensions[0]["values"][1]["id"], "A");

    let series = document["data"]["dataSets"][0]["series"]
        .as_object()
        .expect("series");
    let keys: Vec<&str> = series.keys().map(String::as_str).collect();
    assert_eq!(keys, ["0:0", "1:0", "0:1"]);
    assert_eq!(series["0:0"]["observations"]["1"], serde_json::json!(["1.25", 1]));
    assert_eq!(document["data"]["dataSets"][0]["attributes"], serde_json::json!([0]));
}

#[test]
fn flat_observation_reads_back_identical_row() {
    let (registry, reference) = registry();
    let mut dataset = Dataset::from_registry(&registry, &reference).expect("dataset");
    dataset
        .set_data(frame(&[
            ("TIME_PERIOD", cells(&["2020"])),
            ("FREQ", cells(&["A"])),
            ("REF_AREA", cells(&["DE"])),
            ("OBS_VALUE", cells(&["3.5"])),
            ("OBS_STATUS", cells(&["A"])),
        ]))
        .expect("data");
    let bytes = write(&message(dataset.clone()));
    let read = read_data(Cursor::new(bytes), &registry).expect("read");

    let back = &read.datasets()[0];
    assert_eq!(back.dim_at_obs(), &DimensionAtObservation::AllDimensions);
    assert!(back.data().equals_missing(dataset.data()));
}

#[test]
fn time_only_structure_keeps_observation_axis() {
    let mut registry = StructureRegistry::new();
    let mut dsd = DataStructureDefinition::new("ECB", "TS", "1.0");
    dsd.add_dimension(Component::time_dimension("TIME_PERIOD"))
        .expect("TIME_PERIOD");
    dsd.add_measure(Component::primary_measure("OBS_VALUE"))
        .expect("OBS_VALUE");
    let reference = registry.insert(dsd).expect("dsd");

    let mut dataset = Dataset::from_registry(&registry, &reference).expect("dataset");
    dataset
        .set_data(frame(&[
            ("TIME_PERIOD", cells(&["2020", "2021"])),
            ("OBS_VALUE", cells(&["1", "2"])),
        ]))
        .expect("data");
    dataset.set_dim_at_obs(DimensionAtObservation::Dimension("TIME_PERIOD".into()));
    let first = write(&message(dataset));

    let document: Value = serde_json::from_slice(&first).expect("json");
    let series = &document["data"]["dataSets"][0]["series"];
    assert_eq!(series[""]["observations"]["1"], serde_json::json!(["2"]));

    let read = read_data(Cursor::new(first.clone()), &registry).expect("read");
    let back = &read.datasets()[0];
    assert_eq!(
        back.dim_at_obs(),
        &DimensionAtObservation::Dimension("TIME_PERIOD".into())
    );
    assert_eq!(back.value("TIME_PERIOD", 1), Some("2021"));
    assert_eq!(write(&read), first);
}

#[test]
fn missing_attribute_stays_missing() {
    let (registry, reference) = registry();
    let mut dataset = Dataset::from_registry(&registry, &reference).expect("dataset");
    dataset
        .set_data(frame(&[
            ("FREQ", cells(&["A", "A"])),
            ("REF_AREA", cells(&["DE", "DE"])),
            ("TIME_PERIOD", cells(&["2020", "2021"])),
            ("OBS_VALUE", vec![Some("1".into()), None]),
            ("OBS_STATUS", vec![Some("A".into()), Some("M".into())]),
            ("TITLE", vec![None, Some("Germany".into())]),
        ]))
        .expect("data");
    let read = read_data(Cursor::new(write(&message(dataset))), &registry).expect("read");
    let back = &read.datasets()[0];
    assert_eq!(back.value("OBS_VALUE", 1), None);
    assert_eq!(back.value("TITLE", 0), None);
    assert_eq!(back.value("TITLE", 1), Some("Germany"));
}

#[test]
fn index_out_of_range_is_format_error() {
    let (registry, reference) = registry();
    let json = format!(
        r#"{{"meta": {{"id": "X", "sender": {{"id": "ECB"}}}},
            "data": {{
              "structures": [{{
                "links": [{{"rel": "DataStructure", "urn": "{}"}}],
                "dimensions": {{"observation": [
                  {{"id": "FREQ", "values": [{{"id": "A"}}]}},
                  {{"id": "REF_AREA", "values": [{{"id": "DE"}}]}},
                  {{"id": "TIME_PERIOD", "values": [{{"id": "2020"}}]}}
                ]}},
                "measures": {{"observation": [{{"id": "OBS_VALUE"}}]}}
              }}],
              "dataSets": [{{"structure": 0, "observations": {{"0:3:0": ["1"]}}}}]
            }}}}"#,
        reference.urn()
    );
    let err = read_data(Cursor::new(json), &registry).unwrap_err();
    assert!(matches!(err, SdmxError::Format { .. }), "{err}");
    assert!(err.to_string().contains("REF_AREA"), "{err}");
}

#[test]
fn malformed_json_reports_line() {
    let (registry, _) = registry();
    let err = read_data(Cursor::new("{\n\"meta\": [\n"), &registry).unwrap_err();
    match err {
        SdmxError::Format { position, .. } => assert!(matches!(position, FormatPosition::Line(_))),
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn unknown_structure_is_reference_error() {
    let (registry, reference) = registry();
    let bytes = write(&message(sample(&registry, &reference)));
    let err = read_data(Cursor::new(bytes), &StructureRegistry::new()).unwrap_err();
    assert!(matches!(err, SdmxError::Reference { .. }), "{err}");
}

#[test]
fn writer_rejects_missing_dimension() {
    let (registry, reference) = registry();
    let mut dataset = Dataset::from_registry(&registry, &reference).expect("dataset");
    dataset
        .set_data(frame(&[
            ("FREQ", cells(&["A"])),
            ("OBS_VALUE", cells(&["1"])),
        ]))
        .expect("data");
    let mut bytes = Vec::new();
    let err = write_data(&mut bytes, &message(dataset), &JsonWriterOptions::default())
        .unwrap_err();
    assert!(matches!(err, SdmxError::SchemaMismatch { .. }), "{err}");
    assert!(bytes.is_empty());
}

fn rows() -> impl Strategy<Value = Vec<(usize, usize, u16, Option<u8>)>> {
    prop::collection::vec(
        (0usize..2, 0usize..3, 2000u16..2030, prop::option::of(0u8..3)),
        1..20,
    )
}

proptest! {
    #[test]
    fn encoding_is_deterministic(rows in rows(), series in any::<bool>()) {
        let (registry, reference) = registry();
        let mut seen = std::collections::HashSet::new();
        let rows: Vec<_> = rows
            .into_iter()
            .filter(|(f, a, t, _)| seen.insert((*f, *a, *t)))
            .collect();
        let freq: Vec<Option<String>> =
            rows.iter().map(|r| Some(["A", "M"][r.0].to_string())).collect();
        let area: Vec<Option<String>> =
            rows.iter().map(|r| Some(["DE", "FR", "IT"][r.1].to_string())).collect();
        let time: Vec<Option<String>> = rows.iter().map(|r| Some(r.2.to_string())).collect();
        let value: Vec<Option<String>> =
            rows.iter().map(|r| Some(format!("{}.5", r.2))).collect();
        let status: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.3.map(|s| ["A", "E", "M"][usize::from(s)].to_string()))
            .collect();

        let mut dataset = Dataset::from_registry(&registry, &reference).expect("dataset");
        dataset
            .set_data(frame(&[
                ("FREQ", freq),
                ("REF_AREA", area),
                ("TIME_PERIOD", time),
                ("OBS_VALUE", value),
                ("OBS_STATUS", status),
            ]))
            .expect("data");
        if series {
            dataset.set_dim_at_obs(DimensionAtObservation::Dimension("TIME_PERIOD".into()));
        }

        let first = write(&message(dataset));
        let read = read_data(Cursor::new(first.clone()), &registry).expect("read");
        let second = write(&read);
        prop_assert_eq!(first, second);
    }
}
