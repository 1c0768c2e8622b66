//! Plain and SDMX-CSV tables.

use std::io::Cursor;

use polars::prelude::{Column, DataFrame};
use sdmx_model::{
    Action, AttributeRelationship, Component, DataFlowDefinition, DataStructureDefinition,
    Dataset, FormatPosition, Header, Message, MessageType, SdmxError, StructureRef,
    StructureRegistry, UsageStatus,
};
use sdmx_csv::{CsvLayout, CsvOptions, read_data, write_data};

fn registry() -> (StructureRegistry, StructureRef) {
    let mut registry = StructureRegistry::new();
    let mut dsd = DataStructureDefinition::new("ECB", "EXR", "1.0");
    dsd.add_dimension(Component::time_dimension("TIME_PERIOD"))
        .expect("TIME_PERIOD");
    dsd.add_dimension(Component::dimension("FREQ")).expect("FREQ");
    dsd.add_measure(Component::primary_measure("OBS_VALUE"))
        .expect("OBS_VALUE");
    dsd.add_attribute(Component::attribute(
        "OBS_STATUS",
        UsageStatus::Mandatory,
        AttributeRelationship::PrimaryMeasure,
    ))
    .expect("OBS_STATUS");
    dsd.add_attribute(Component::attribute(
        "DECIMALS",
        UsageStatus::Conditional,
        AttributeRelationship::DataSet,
    ))
    .expect("DECIMALS");
    let reference = registry.insert(dsd).expect("dsd");
    let flow = DataFlowDefinition::new("ECB", "EXR_FLOW", "1.0", reference.clone()).expect("flow");
    registry.insert(flow).expect("flow");
    (registry, reference)
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

fn sample(registry: &StructureRegistry, reference: &StructureRef) -> Dataset {
    let mut dataset = Dataset::from_registry(registry, reference).expect("dataset");
    dataset
        .set_data(frame(&[
            ("FREQ", &["A", "A"]),
            ("TIME_PERIOD", &["2020", "2021"]),
            ("OBS_VALUE", &["3.5", ""]),
            ("OBS_STATUS", &["A", "M"]),
        ]))
        .expect("data");
    dataset.set_attribute("DECIMALS", "1");
    dataset
}

fn write(message: &Message, options: &CsvOptions) -> String {
    let mut bytes = Vec::new();
    write_data(&mut bytes, message, options).expect("write");
    String::from_utf8(bytes).expect("utf8")
}

fn message(datasets: Vec<Dataset>) -> Message {
    Message::new(MessageType::StructureSpecificData, Header::default(), datasets)
}

#[test]
fn plain_layout_uses_declared_order() {
    let (registry, reference) = registry();
    let csv = write(&message(vec![sample(&registry, &reference)]), &CsvOptions::default());
    insta::assert_snapshot!(csv, @r"
    TIME_PERIOD,FREQ,OBS_VALUE,OBS_STATUS,DECIMALS
    2020,A,3.5,A,1
    2021,A,,M,1
    ");
}

#[test]
fn sdmx_csv_layout_leads_with_dataflow_and_action() {
    let (registry, reference) = registry();
    let mut dataset = sample(&registry, &reference);
    dataset.action = Action::Append;
    let options = CsvOptions::default()
        .with_layout(CsvLayout::SdmxCsv)
        .with_delimiter(b';');
    let csv = write(&message(vec![dataset]), &options);
    insta::assert_snapshot!(csv, @r"
    DATAFLOW;ACTION;TIME_PERIOD;FREQ;OBS_VALUE;OBS_STATUS;DECIMALS
    ECB:EXR(1.0);A;2020;A;3.5;A;1
    ECB:EXR(1.0);A;2021;A;;M;1
    ");
}

#[test]
fn plain_round_trip_is_byte_stable() {
    let (registry, reference) = registry();
    let options = CsvOptions::default();
    let first = write(&message(vec![sample(&registry, &reference)]), &options);
    let read = read_data(Cursor::new(first.clone()), &registry, Some(&reference), &options)
        .expect("read");

    let dataset = &read.datasets()[0];
    assert_eq!(dataset.attribute("DECIMALS"), Some("1"));
    assert_eq!(dataset.value("OBS_VALUE", 1), None);
    assert_eq!(write(&read, &options), first);
}

#[test]
fn header_order_does_not_matter_on_read() {
    let (registry, reference) = registry();
    let csv = "OBS_STATUS,OBS_VALUE,FREQ,TIME_PERIOD\nA,3.5,A,2020\n";
    let read = read_data(Cursor::new(csv), &registry, Some(&reference), &CsvOptions::default())
        .expect("read");
    let dataset = &read.datasets()[0];
    assert_eq!(
        dataset.column_names(),
        ["TIME_PERIOD", "FREQ", "OBS_VALUE", "OBS_STATUS"]
    );
    assert_eq!(dataset.value("OBS_VALUE", 0), Some("3.5"));
}

#[test]
fn sdmx_csv_splits_datasets_by_structure_and_action() {
    let (registry, _) = registry();
    let csv = "\
DATAFLOW,ACTION,TIME_PERIOD,FREQ,OBS_VALUE,OBS_STATUS
ECB:EXR_FLOW(1.0),A,2020,A,1,A
ECB:EXR(1.0),R,2020,A,2,A
ECB:EXR_FLOW(1.0),A,2021,A,3,A
ECB:EXR_FLOW(1.0),D,2022,A,4,A
";
    let options = CsvOptions::default().with_layout(CsvLayout::SdmxCsv);
    let read = read_data(Cursor::new(csv), &registry, None, &options).expect("read");
    let datasets = read.datasets();
    assert_eq!(datasets.len(), 3);
    assert_eq!(datasets[0].structure_ref().id, "EXR_FLOW");
    assert_eq!(datasets[0].action, Action::Append);
    assert_eq!(datasets[0].height(), 2);
    assert_eq!(datasets[1].structure_ref().id, "EXR");
    assert_eq!(datasets[1].action, Action::Replace);
    assert_eq!(datasets[2].action, Action::Delete);
}

#[test]
fn missing_dimension_column_is_schema_mismatch() {
    let (registry, reference) = registry();
    let csv = "TIME_PERIOD,OBS_VALUE\n2020,1\n";
    let err = read_data(Cursor::new(csv), &registry, Some(&reference), &CsvOptions::default())
        .unwrap_err();
    assert!(matches!(err, SdmxError::SchemaMismatch { .. }), "{err}");
    assert!(err.to_string().contains("FREQ"), "{err}");
}

#[test]
fn undeclared_column_is_schema_mismatch() {
    let (registry, reference) = registry();
    let csv = "TIME_PERIOD,FREQ,OBS_VALUE,COMMENT\n2020,A,1,x\n";
    let err = read_data(Cursor::new(csv), &registry, Some(&reference), &CsvOptions::default())
        .unwrap_err();
    assert!(matches!(err, SdmxError::SchemaMismatch { .. }), "{err}");
}

#[test]
fn ragged_row_reports_line() {
    let (registry, reference) = registry();
    let csv = "TIME_PERIOD,FREQ,OBS_VALUE\n2020,A,1\n2021,A\n";
    let err = read_data(Cursor::new(csv), &registry, Some(&reference), &CsvOptions::default())
        .unwrap_err();
    match err {
        SdmxError::Format { position, .. } => assert_eq!(position, FormatPosition::Line(3)),
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn plain_table_needs_structure() {
    let (registry, _) = registry();
    let err = read_data(
        Cursor::new("TIME_PERIOD,FREQ,OBS_VALUE\n"),
        &registry,
        None,
        &CsvOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SdmxError::Structural { .. }), "{err}");
}

#[test]
fn plain_layout_rejects_several_datasets() {
    let (registry, reference) = registry();
    let message = message(vec![
        sample(&registry, &reference),
        sample(&registry, &reference),
    ]);
    let err = write_data(Vec::new(), &message, &CsvOptions::default()).unwrap_err();
    assert!(matches!(err, SdmxError::Structural { .. }), "{err}");
}
