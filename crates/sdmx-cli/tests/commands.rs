//! End-to-end command runs over files in a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use sdmx_cli::cli::{ConvertArgs, FormatArg, InputArgs, InspectArgs, ValidateArgs};
use sdmx_cli::commands::{resolve_binding, run_convert, run_inspect, run_validate};
use sdmx_core::DataFormat;
use sdmx_model::{
    Action, AttributeRelationship, Code, Codelist, Component, Concept, ConceptScheme,
    DataFlowDefinition, DataStructureDefinition, FacetValueType, Header, Representation,
    StructureClass, StructureRegistry, UsageStatus,
};
use sdmx_xml::{XmlWriterOptions, write_structure};
use tempfile::TempDir;

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
            ["FREQ", "TIME_PERIOD", "OBS_VALUE", "OBS_STATUS"]
                .map(|id| Concept::new(id).with_name("en", id)),
        )
        .expect("concepts");
    let concepts_ref = registry.insert(concepts).expect("concepts");
    let concept = |id: &str| concepts_ref.item(id);

    let mut dsd = DataStructureDefinition::new("ECB", "EXR", "1.0").with_name("en", "Rates");
    dsd.add_dimension(
        Component::dimension("FREQ")
            .with_concept(concept("FREQ"))
            .with_representation(Representation::enumerated(freq_ref)),
    )
    .expect("FREQ");
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
    dsd.add_attribute(
        Component::attribute(
            "OBS_STATUS",
            UsageStatus::Mandatory,
            AttributeRelationship::PrimaryMeasure,
        )
        .with_concept(concept("OBS_STATUS")),
    )
    .expect("OBS_STATUS");
    let dsd_ref = registry.insert(dsd).expect("dsd");

    let flow = DataFlowDefinition::new("ECB", "EXR", "1.0", dsd_ref)
        .expect("flow")
        .with_name("en", "Exchange rates");
    registry.insert(flow).expect("flow");
    registry
}

struct Workspace {
    dir: TempDir,
    structure: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let structure = dir.path().join("structure.xml");
        let mut bytes = Vec::new();
        write_structure(
            &mut bytes,
            &Header::default(),
            &registry(),
            &XmlWriterOptions::default(),
        )
        .expect("write structure");
        fs::write(&structure, bytes).expect("structure file");
        Self { dir, structure }
    }

    fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("data file");
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn bound(structure: &str) -> InputArgs {
    InputArgs {
        format: None,
        bind: Some(structure.to_string()),
        delimiter: None,
    }
}

fn validate_args(input: &Path, structure: &Path) -> ValidateArgs {
    ValidateArgs {
        input: input.to_path_buf(),
        structures: vec![structure.to_path_buf()],
        input_options: bound("ECB:EXR(1.0)"),
        fail_fast: false,
        no_duplicate_check: false,
        report: None,
    }
}

const VALID: &str = "FREQ,TIME_PERIOD,OBS_VALUE,OBS_STATUS\nA,2020,1.5,A\nA,2021,,M\n";

#[test]
fn validate_clean_csv_writes_empty_report() {
    let ws = Workspace::new();
    let input = ws.file("exr.csv", VALID);
    let report = ws.path("report.json");
    let mut args = validate_args(&input, &ws.structure);
    args.report = Some(report.clone());

    let result = run_validate(&args).expect("validate");
    assert_eq!(result.format, DataFormat::Csv);
    assert_eq!(result.reports.len(), 1);
    assert!(!result.has_errors(), "{:?}", result.reports);
    assert_eq!(result.reports[0].rows, 2);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report).expect("report")).expect("json");
    assert_eq!(json[0]["dataset"], "ECB:EXR(1.0)");
    assert_eq!(json[0]["violations"], serde_json::json!([]));
}

#[test]
fn validate_flags_unknown_code() {
    let ws = Workspace::new();
    let input = ws.file(
        "exr.csv",
        "FREQ;TIME_PERIOD;OBS_VALUE;OBS_STATUS\nX;2020;1.5;A\nA;2021-Q5;2;A\n",
    );
    let result = run_validate(&validate_args(&input, &ws.structure)).expect("validate");

    assert!(result.has_errors());
    let codes = result.reports[0].counts_by_code();
    assert_eq!(codes.get("SS04"), Some(&1));
    assert_eq!(codes.get("SS09"), Some(&1));
}

#[test]
fn validate_fails_for_missing_structure_file() {
    let ws = Workspace::new();
    let input = ws.file("exr.csv", VALID);
    let args = validate_args(&input, &ws.path("missing.xml"));
    let error = run_validate(&args).expect_err("missing structure");
    assert!(format!("{error:#}").contains("missing.xml"), "{error:#}");
}

#[test]
fn convert_csv_to_json_then_inspect() {
    let ws = Workspace::new();
    let input = ws.file("exr.csv", VALID);
    let output = ws.path("exr.json");
    let args = ConvertArgs {
        input,
        output: output.clone(),
        structures: vec![ws.structure.clone()],
        input_options: bound("ECB:EXR(1.0)"),
        to: None,
        dim_at_obs: Some("TIME_PERIOD".to_string()),
        output_delimiter: b',',
        compact: false,
    };
    let result = run_convert(&args).expect("convert");
    assert_eq!(result.conversion.from, DataFormat::Csv);
    assert_eq!(result.conversion.to, DataFormat::Json);
    assert_eq!(result.conversion.observations, 2);

    let inspect = run_inspect(&InspectArgs {
        paths: vec![ws.structure.clone(), output.clone()],
        structures: Vec::new(),
        input_options: InputArgs {
            format: None,
            bind: None,
            delimiter: None,
        },
    })
    .expect("inspect");
    assert_eq!(inspect.structures.len(), 4);
    let dsd = inspect
        .structures
        .iter()
        .find(|a| a.class == StructureClass::DataStructure)
        .expect("dsd summary");
    assert_eq!(dsd.contents, "2 dimensions, 1 measure, 1 attribute");

    let [file] = inspect.data.as_slice() else {
        panic!("expected one data file");
    };
    assert_eq!(file.path, output);
    assert_eq!(file.format, DataFormat::Json);
    assert_eq!(file.datasets[0].rows, 2);
    assert_eq!(file.datasets[0].action, Action::Replace);
    assert_eq!(file.datasets[0].dim_at_obs, "TIME_PERIOD");
}

#[test]
fn convert_to_generic_xml_and_back_to_csv() {
    let ws = Workspace::new();
    let input = ws.file("exr.csv", VALID);
    let xml = ws.path("exr.xml");
    let args = ConvertArgs {
        input,
        output: xml.clone(),
        structures: vec![ws.structure.clone()],
        input_options: bound("ECB:EXR(1.0)"),
        to: Some(FormatArg::GenericXml),
        dim_at_obs: None,
        output_delimiter: b',',
        compact: true,
    };
    run_convert(&args).expect("to xml");
    assert!(
        fs::read_to_string(&xml)
            .expect("xml")
            .contains("GenericData")
    );

    let back = ws.path("back.csv");
    let args = ConvertArgs {
        input: xml,
        output: back.clone(),
        structures: vec![ws.structure.clone()],
        input_options: InputArgs {
            format: None,
            bind: None,
            delimiter: None,
        },
        to: None,
        dim_at_obs: None,
        output_delimiter: b',',
        compact: false,
    };
    let result = run_convert(&args).expect("to csv");
    assert_eq!(result.conversion.from, DataFormat::GenericXml);
    let csv = fs::read_to_string(back).expect("csv");
    assert!(csv.starts_with("FREQ,TIME_PERIOD,OBS_VALUE,OBS_STATUS"), "{csv}");
    assert!(csv.contains("A,2021,,M"), "{csv}");
}

#[test]
fn convert_needs_a_target_format() {
    let ws = Workspace::new();
    let input = ws.file("exr.csv", VALID);
    let args = ConvertArgs {
        input,
        output: ws.path("exr.out"),
        structures: vec![ws.structure.clone()],
        input_options: bound("ECB:EXR(1.0)"),
        to: None,
        dim_at_obs: None,
        output_delimiter: b',',
        compact: false,
    };
    let error = run_convert(&args).expect_err("no target");
    assert!(error.to_string().contains("--to"), "{error}");
    assert!(!ws.path("exr.out").exists());
}

#[test]
fn convert_refuses_spreadsheet_output() {
    let ws = Workspace::new();
    let input = ws.file("exr.csv", VALID);
    let args = ConvertArgs {
        input,
        output: ws.path("exr.xlsx"),
        structures: vec![ws.structure.clone()],
        input_options: bound("ECB:EXR(1.0)"),
        to: None,
        dim_at_obs: None,
        output_delimiter: b',',
        compact: false,
    };
    let error = run_convert(&args).expect_err("spreadsheet output");
    assert!(error.to_string().contains("spreadsheet"), "{error}");
    assert!(!ws.path("exr.xlsx").exists());
}

#[test]
fn binding_prefers_dataflow_over_structure() {
    let registry = registry();
    let flow = resolve_binding(&registry, "ECB:EXR(1.0)").expect("flow");
    assert_eq!(flow.class, StructureClass::Dataflow);

    let urn = "urn:sdmx:org.sdmx.infomodel.datastructure.DataStructure=ECB:EXR(1.0)";
    let dsd = resolve_binding(&registry, urn).expect("dsd");
    assert_eq!(dsd.class, StructureClass::DataStructure);

    assert!(resolve_binding(&registry, "ECB:OTHER(1.0)").is_err());
}
