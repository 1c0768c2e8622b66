//! Data message writer.

use std::io::Write;

use sdmx_model::{Dataset, Message, MessageType, Result, SdmxError};

use super::{DataFlavor, Layout, group_rows, row_values};
use crate::emit::XmlOut;
use crate::header::{StructureBinding, write_header};
use crate::namespaces;
use crate::options::XmlWriterOptions;

/// Write a data message as SDMX-ML.
///
/// The encoding follows `options.message_type`. Every dataset must be
/// encodable against its structure: a missing dimension or measure column
/// fails with a schema mismatch before anything is written.
pub fn write_data<W: Write>(writer: W, message: &Message, options: &XmlWriterOptions) -> Result<()> {
    let flavor = match options.message_type {
        MessageType::GenericData => DataFlavor::Generic,
        MessageType::StructureSpecificData => DataFlavor::StructureSpecific,
        other => {
            return Err(SdmxError::structural(format!(
                "{other} is not a data message type"
            )));
        }
    };
    for dataset in message.datasets() {
        dataset.ensure_encodable()?;
    }
    let bindings = bindings(message.datasets());

    let mut out = XmlOut::new(writer, options.pretty);
    out.declaration()?;
    let root = format!("message:{}", options.message_type.as_str());
    let prefixes: Vec<String> = (1..=bindings.len()).map(|i| format!("xmlns:ns{i}")).collect();
    let namespaces_per_binding: Vec<String> = bindings
        .iter()
        .map(|b| {
            namespaces::structure_specific_namespace(
                &b.reference.unique_id(),
                b.dim_at_obs.as_str(),
            )
        })
        .collect();
    let mut attributes = vec![
        ("xmlns:message", namespaces::MESSAGE),
        ("xmlns:common", namespaces::COMMON),
        ("xmlns:xsi", namespaces::XSI),
    ];
    match flavor {
        DataFlavor::Generic => attributes.push(("xmlns:generic", namespaces::GENERIC)),
        DataFlavor::StructureSpecific => {
            attributes.push(("xmlns:ss", namespaces::STRUCTURE_SPECIFIC));
            for (prefix, namespace) in prefixes.iter().zip(&namespaces_per_binding) {
                attributes.push((prefix.as_str(), namespace.as_str()));
            }
        }
    }
    out.start(&root, &attributes)?;
    write_header(
        &mut out,
        &message.header,
        &bindings,
        flavor == DataFlavor::StructureSpecific,
    )?;
    for dataset in message.datasets() {
        let slot = binding_slot(&bindings, dataset);
        let binding = &bindings[slot];
        match flavor {
            DataFlavor::Generic => write_generic(&mut out, dataset, binding)?,
            DataFlavor::StructureSpecific => {
                write_specific(&mut out, dataset, binding, &format!("ns{}", slot + 1))?;
            }
        }
    }
    out.end(&root)?;
    out.into_inner().flush()?;
    tracing::info!(
        message_type = %options.message_type,
        datasets = message.datasets().len(),
        "Wrote SDMX-ML data message"
    );
    Ok(())
}

/// One binding per distinct (structure, axis); ids are made unique.
fn bindings(datasets: &[Dataset]) -> Vec<StructureBinding> {
    let mut bindings: Vec<StructureBinding> = Vec::new();
    for dataset in datasets {
        let mut binding =
            StructureBinding::new(dataset.structure_ref().clone(), dataset.dim_at_obs().clone());
        if bindings.contains(&binding) {
            continue;
        }
        if bindings.iter().any(|b| b.structure_id == binding.structure_id) {
            binding.structure_id = format!("{}_{}", binding.structure_id, bindings.len());
        }
        bindings.push(binding);
    }
    bindings
}

fn binding_slot(bindings: &[StructureBinding], dataset: &Dataset) -> usize {
    bindings
        .iter()
        .position(|b| {
            &b.reference == dataset.structure_ref() && &b.dim_at_obs == dataset.dim_at_obs()
        })
        .unwrap_or_default()
}

fn write_generic<W: Write>(
    out: &mut XmlOut<W>,
    dataset: &Dataset,
    binding: &StructureBinding,
) -> Result<()> {
    let layout = Layout::new(dataset);
    out.start(
        "message:DataSet",
        &[
            ("structureRef", binding.structure_id.as_str()),
            ("action", dataset.action.as_str()),
        ],
    )?;
    let dataset_values = dataset_attribute_values(dataset);
    write_generic_values(out, "generic:Attributes", &dataset_values)?;

    for group in &layout.groups {
        for rows in group_rows(dataset, &group.dimensions) {
            let row = rows[0];
            let values = row_values(dataset, row, &group.attributes);
            if values.is_empty() {
                continue;
            }
            out.start("generic:Group", &[("type", group.id)])?;
            let key = row_values(dataset, row, &group.dimensions);
            write_generic_values(out, "generic:GroupKey", &key)?;
            write_generic_values(out, "generic:Attributes", &values)?;
            out.end("generic:Group")?;
        }
    }

    if layout.is_flat() {
        for row in 0..dataset.height() {
            out.start("generic:Obs", &[])?;
            let key = row_values(dataset, row, &layout.obs_dimensions);
            write_generic_values(out, "generic:ObsKey", &key)?;
            write_generic_observation(out, dataset, &layout, row)?;
            out.end("generic:Obs")?;
        }
    } else {
        for rows in group_rows(dataset, &layout.series_dimensions) {
            let first = rows[0];
            out.start("generic:Series", &[])?;
            write_generic_values(
                out,
                "generic:SeriesKey",
                &row_values(dataset, first, &layout.series_dimensions),
            )?;
            write_generic_values(
                out,
                "generic:Attributes",
                &row_values(dataset, first, &layout.series_attributes),
            )?;
            for row in rows {
                out.start("generic:Obs", &[])?;
                if let Some(value) = layout
                    .obs_dimensions
                    .first()
                    .and_then(|dim| dataset.value(dim, row))
                {
                    out.empty("generic:ObsDimension", &[("value", value)])?;
                }
                write_generic_observation(out, dataset, &layout, row)?;
                out.end("generic:Obs")?;
            }
            out.end("generic:Series")?;
        }
    }
    out.end("message:DataSet")
}

fn write_generic_observation<W: Write>(
    out: &mut XmlOut<W>,
    dataset: &Dataset,
    layout: &Layout<'_>,
    row: usize,
) -> Result<()> {
    if let Some(value) = dataset.value(layout.measure, row) {
        out.empty("generic:ObsValue", &[("value", value)])?;
    }
    write_generic_values(
        out,
        "generic:Attributes",
        &row_values(dataset, row, &layout.obs_attributes),
    )
}

/// `<wrapper><generic:Value id=".." value=".."/>...</wrapper>`, omitted when
/// there is nothing to write.
fn write_generic_values<W: Write>(
    out: &mut XmlOut<W>,
    wrapper: &str,
    values: &[(&str, &str)],
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    out.start(wrapper, &[])?;
    for &(id, value) in values {
        out.empty("generic:Value", &[("id", id), ("value", value)])?;
    }
    out.end(wrapper)
}

/// Dataset-level attributes in structure order.
fn dataset_attribute_values(dataset: &Dataset) -> Vec<(&str, &str)> {
    dataset
        .structure()
        .dataset_attribute_codes()
        .iter()
        .filter_map(|code| {
            dataset
                .attribute(code)
                .map(|value| (code.as_str(), value))
        })
        .collect()
}

fn write_specific<W: Write>(
    out: &mut XmlOut<W>,
    dataset: &Dataset,
    binding: &StructureBinding,
    prefix: &str,
) -> Result<()> {
    let layout = Layout::new(dataset);
    let dataset_type = format!("{prefix}:DataSetType");
    let mut attributes = vec![
        ("ss:structureRef", binding.structure_id.as_str()),
        ("xsi:type", dataset_type.as_str()),
        ("ss:dataScope", "DataStructure"),
        ("action", dataset.action.as_str()),
    ];
    attributes.extend(dataset_attribute_values(dataset));
    out.start("message:DataSet", &attributes)?;

    for group in &layout.groups {
        let group_type = format!("{prefix}:{}", group.id);
        for rows in group_rows(dataset, &group.dimensions) {
            let row = rows[0];
            let values = row_values(dataset, row, &group.attributes);
            if values.is_empty() {
                continue;
            }
            let mut attributes = vec![("xsi:type", group_type.as_str())];
            attributes.extend(row_values(dataset, row, &group.dimensions));
            attributes.extend(values);
            out.empty("Group", &attributes)?;
        }
    }

    let obs_columns: Vec<&str> = layout
        .obs_dimensions
        .iter()
        .copied()
        .chain(std::iter::once(layout.measure))
        .chain(layout.obs_attributes.iter().copied())
        .collect();
    if layout.is_flat() {
        for row in 0..dataset.height() {
            out.empty("Obs", &row_values(dataset, row, &obs_columns))?;
        }
    } else {
        let series_columns: Vec<&str> = layout
            .series_dimensions
            .iter()
            .chain(&layout.series_attributes)
            .copied()
            .collect();
        for rows in group_rows(dataset, &layout.series_dimensions) {
            out.start("Series", &row_values(dataset, rows[0], &series_columns))?;
            for row in rows {
                out.empty("Obs", &row_values(dataset, row, &obs_columns))?;
            }
            out.end("Series")?;
        }
    }
    out.end("message:DataSet")
}
