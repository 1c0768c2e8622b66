use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use sdmx_core::{
    DataFormat, DocumentKind, ReadOptions, SNIFF_LEN, WriteOptions, convert, load_structures,
    read_file, sniff,
};
use sdmx_model::{
    Artefact, DimensionAtObservation, Maintainable, Message, Nameable, StructureClass,
    StructureRef, StructureRegistry,
};
use sdmx_validate::{ValidationMode, ValidationOptions, ValidationReport, Validator};
use tracing::{debug, info, info_span};

use crate::cli::{ConvertArgs, InputArgs, InspectArgs, ValidateArgs};
use crate::types::{
    ArtefactSummary, ConvertResult, DataFileSummary, DatasetSummary, InspectResult,
    ValidateResult,
};

pub fn run_inspect(args: &InspectArgs) -> Result<InspectResult> {
    let mut structure_files = args.structures.clone();
    let mut data_files = Vec::new();
    for path in &args.paths {
        if is_structure_file(path)? {
            structure_files.push(path.clone());
        } else {
            data_files.push(path.clone());
        }
    }
    debug!(
        structures = structure_files.len(),
        data = data_files.len(),
        "classified inputs"
    );

    let registry = load_structures(&structure_files).context("load structures")?;
    let structures = registry.artefacts().map(artefact_summary).collect();

    let options = read_options(&args.input_options, &registry)?;
    let mut data = Vec::with_capacity(data_files.len());
    for path in data_files {
        let span = info_span!("inspect", path = %path.display());
        let _guard = span.enter();
        let (format, message) = read_file(&path, &registry, &options)
            .with_context(|| format!("read {}", path.display()))?;
        data.push(DataFileSummary {
            path,
            format,
            datasets: dataset_summaries(&message),
        });
    }
    Ok(InspectResult { structures, data })
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateResult> {
    let span = info_span!("validate", input = %args.input.display());
    let _guard = span.enter();

    let registry = load_structures(&args.structures).context("load structures")?;
    let options = read_options(&args.input_options, &registry)?;
    let (format, message) = read_file(&args.input, &registry, &options)
        .with_context(|| format!("read {}", args.input.display()))?;

    let mode = if args.fail_fast {
        ValidationMode::FailFast
    } else {
        ValidationMode::CollectAll
    };
    let validation = ValidationOptions::default()
        .with_mode(mode)
        .with_duplicate_check(!args.no_duplicate_check);
    let reports = Validator::new(&registry)
        .with_options(validation)
        .validate_message(&message)
        .context("validate datasets")?;
    info!(
        datasets = reports.len(),
        errors = reports.iter().map(ValidationReport::error_count).sum::<usize>(),
        warnings = reports.iter().map(ValidationReport::warning_count).sum::<usize>(),
        "validation finished"
    );

    if let Some(path) = &args.report {
        write_report(path, &reports)?;
    }
    Ok(ValidateResult {
        input: args.input.clone(),
        format,
        reports,
    })
}

pub fn run_convert(args: &ConvertArgs) -> Result<ConvertResult> {
    let to = match args.to {
        Some(format) => DataFormat::from(format),
        None => DataFormat::from_extension(&args.output).with_context(|| {
            format!(
                "cannot infer the output format of {}; pass --to",
                args.output.display()
            )
        })?,
    };
    if !to.is_writable() {
        bail!("{to} can be read but not written");
    }

    let registry = load_structures(&args.structures).context("load structures")?;
    let read = read_options(&args.input_options, &registry)?;
    let mut write = WriteOptions::default()
        .with_pretty(!args.compact)
        .with_delimiter(args.output_delimiter);
    if let Some(dim_at_obs) = &args.dim_at_obs {
        write = write.with_dim_at_obs(DimensionAtObservation::from(dim_at_obs.as_str()));
    }

    let conversion = convert(&args.input, &args.output, to, &registry, &read, &write)
        .with_context(|| {
            format!(
                "convert {} to {}",
                args.input.display(),
                args.output.display()
            )
        })?;
    Ok(ConvertResult {
        input: args.input.clone(),
        output: args.output.clone(),
        conversion,
    })
}

fn is_structure_file(path: &Path) -> Result<bool> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)
        .and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut head))
        .with_context(|| format!("open {}", path.display()))?;
    Ok(sniff(&head) == Some(DocumentKind::Structure))
}

fn read_options(args: &InputArgs, registry: &StructureRegistry) -> Result<ReadOptions> {
    let mut options = ReadOptions::default();
    if let Some(format) = args.format {
        options = options.with_format(format.into());
    }
    if let Some(bind) = &args.bind {
        options = options.with_structure(resolve_binding(registry, bind)?);
    }
    if let Some(delimiter) = args.delimiter {
        options = options.with_delimiter(delimiter);
    }
    Ok(options)
}

/// A URN, or the unique id of a loaded dataflow or data structure, the
/// dataflow winning when both exist.
pub fn resolve_binding(registry: &StructureRegistry, text: &str) -> Result<StructureRef> {
    let text = text.trim();
    if text.starts_with("urn:") {
        let reference: StructureRef = text
            .parse()
            .with_context(|| format!("parse structure URN {text}"))?;
        if !registry.contains(&reference) {
            bail!("{text} is not in the loaded structures");
        }
        return Ok(reference);
    }
    for class in [StructureClass::Dataflow, StructureClass::DataStructure] {
        let reference = StructureRef::from_unique_id(class, text)
            .with_context(|| format!("parse structure id {text}"))?;
        if registry.contains(&reference) {
            return Ok(reference);
        }
    }
    bail!("no dataflow or data structure {text} is loaded")
}

fn artefact_summary(artefact: &Artefact) -> ArtefactSummary {
    let (unique_id, name, contents) = match artefact {
        Artefact::AgencyScheme(scheme) => (
            scheme.unique_id(),
            scheme.name(),
            plural(scheme.len(), "agency", "agencies"),
        ),
        Artefact::Codelist(codelist) => (
            codelist.unique_id(),
            codelist.name(),
            plural(codelist.len(), "code", "codes"),
        ),
        Artefact::ConceptScheme(scheme) => (
            scheme.unique_id(),
            scheme.name(),
            plural(scheme.len(), "concept", "concepts"),
        ),
        Artefact::DataStructure(dsd) => (
            dsd.unique_id(),
            dsd.name(),
            format!(
                "{}, {}, {}",
                plural(dsd.dimensions().len(), "dimension", "dimensions"),
                plural(dsd.measures().len(), "measure", "measures"),
                plural(dsd.attributes().len(), "attribute", "attributes"),
            ),
        ),
        Artefact::Dataflow(flow) => (
            flow.unique_id(),
            flow.name(),
            format!("uses {}", flow.structure().unique_id()),
        ),
    };
    ArtefactSummary {
        class: artefact.structure_ref().class,
        unique_id,
        name: name.map(str::to_string),
        contents,
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {one}")
    } else {
        format!("{count} {many}")
    }
}

fn dataset_summaries(message: &Message) -> Vec<DatasetSummary> {
    message
        .datasets()
        .iter()
        .map(|dataset| DatasetSummary {
            structure: dataset.structure_ref().unique_id(),
            action: dataset.action,
            dim_at_obs: dataset.dim_at_obs().to_string(),
            rows: dataset.height(),
            columns: dataset.column_names().len(),
        })
        .collect()
}

fn write_report(path: &Path, reports: &[ValidationReport]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, reports).context("encode validation report")?;
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "validation report written");
    Ok(())
}
