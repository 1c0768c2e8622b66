//! SDMX-JSON reader.

use std::io::Read;

use sdmx_model::{
    Dataset, DimensionAtObservation, FormatPosition, Header, InternationalString, Message,
    MessageType, Party, Result, RowBuffer, SdmxError, StructureRef, StructureRegistry,
    parse_timestamp,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::document::{ComponentDoc, DataSetDoc, Document, Meta, PartyDoc, StructureDoc};
use crate::json_error;

/// Read an SDMX-JSON data message.
///
/// Each dataset's structure link is resolved through `registry`. Indices
/// that point outside their value table fail with a format error.
/// The whole document is parsed before any dataset is built.
pub fn read_data<R: Read>(input: R, registry: &StructureRegistry) -> Result<Message> {
    let document: Document = serde_json::from_reader(input).map_err(json_error)?;
    let header = header(document.meta)?;
    let mut datasets = Vec::with_capacity(document.data.data_sets.len());
    for data_set in &document.data.data_sets {
        let structure = document
            .data
            .structures
            .get(data_set.structure)
            .ok_or_else(|| invalid(format!("no structure at index {}", data_set.structure)))?;
        datasets.push(decode(structure, data_set, registry)?);
    }
    let message = Message::new(MessageType::StructureSpecificData, header, datasets);
    info!(
        datasets = message.datasets().len(),
        observations = message.observation_count(),
        "SDMX-JSON message read"
    );
    Ok(message)
}

fn invalid(message: impl Into<String>) -> SdmxError {
    SdmxError::format(message, FormatPosition::Unknown)
}

fn header(meta: Meta) -> Result<Header> {
    let prepared = match meta.prepared {
        Some(text) => Some(
            parse_timestamp(&text).ok_or_else(|| invalid(format!("invalid prepared {text}")))?,
        ),
        None => None,
    };
    Ok(Header {
        id: meta.id,
        test: meta.test,
        prepared,
        sender: party(meta.sender),
        receivers: meta.receivers.into_iter().map(party).collect(),
        ..Header::default()
    })
}

fn party(doc: PartyDoc) -> Party {
    let mut name = InternationalString::new();
    for (locale, text) in doc.names.0 {
        name.set(locale, text);
    }
    Party {
        name,
        ..Party::new(doc.id)
    }
}

fn lookup(component: &ComponentDoc, index: usize) -> Result<&str> {
    component
        .values
        .get(index)
        .map(|value| value.id.as_str())
        .ok_or_else(|| invalid(format!("{} has no value at index {index}", component.id)))
}

/// Expands a `"0:1:..."` key against its dimension tables.
fn decode_key<'a>(key: &str, components: &'a [ComponentDoc]) -> Result<Vec<(&'a str, &'a str)>> {
    if components.is_empty() {
        return Ok(Vec::new());
    }
    let parts: Vec<&str> = key.split(':').collect();
    if parts.len() != components.len() {
        return Err(invalid(format!(
            "key {key} has {} positions, expected {}",
            parts.len(),
            components.len()
        )));
    }
    components
        .iter()
        .zip(parts)
        .map(|(component, part)| {
            let index = part
                .parse::<usize>()
                .map_err(|_| invalid(format!("key {key} has a non-numeric position {part}")))?;
            Ok((component.id.as_str(), lookup(component, index)?))
        })
        .collect()
}

fn decode_indices<'a>(
    indices: &[Option<usize>],
    components: &'a [ComponentDoc],
) -> Result<Vec<(&'a str, &'a str)>> {
    let mut values = Vec::new();
    for (component, index) in components.iter().zip(indices) {
        if let Some(index) = *index {
            values.push((component.id.as_str(), lookup(component, index)?));
        }
    }
    Ok(values)
}

/// Measure and attribute values of one observation array.
fn decode_observation<'a>(
    cells: &'a [Value],
    measure: Option<&'a ComponentDoc>,
    attributes: &'a [ComponentDoc],
) -> Result<Vec<(&'a str, String)>> {
    let mut values = Vec::new();
    let mut cells = cells.iter();
    match (cells.next(), measure) {
        (Some(Value::String(text)), Some(measure)) => {
            values.push((measure.id.as_str(), text.clone()));
        }
        (Some(Value::Number(number)), Some(measure)) => {
            values.push((measure.id.as_str(), number.to_string()));
        }
        (Some(Value::Null) | None, _) => {}
        (Some(other), _) => return Err(invalid(format!("unexpected observation value {other}"))),
    }
    for (component, cell) in attributes.iter().zip(cells) {
        match cell {
            Value::Null => {}
            Value::Number(number) => {
                let index = number
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| invalid(format!("invalid index {number} for {}", component.id)))?;
                values.push((component.id.as_str(), lookup(component, index)?.to_string()));
            }
            other => {
                return Err(invalid(format!("invalid index {other} for {}", component.id)));
            }
        }
    }
    Ok(values)
}

fn decode(
    structure: &StructureDoc,
    data_set: &DataSetDoc,
    registry: &StructureRegistry,
) -> Result<Dataset> {
    let link = structure
        .links
        .first()
        .ok_or_else(|| invalid("structure has no links"))?;
    let reference: StructureRef = link.urn.parse()?;
    let mut dataset = Dataset::from_registry(registry, &reference)?;
    dataset.action = data_set.action;

    let dimensions = &structure.dimensions;
    let dim_at_obs = match (&data_set.series, dimensions.observation.as_slice()) {
        (Some(_), [obs]) => DimensionAtObservation::Dimension(obs.id.clone()),
        (Some(_), _) => {
            return Err(invalid("series datasets need exactly one observation dimension"));
        }
        (None, _) => DimensionAtObservation::AllDimensions,
    };
    dataset.set_dim_at_obs(dim_at_obs);

    for (id, value) in decode_indices(&data_set.attributes, &structure.attributes.data_set)? {
        dataset.set_attribute(id, value);
    }

    let measure = structure.measures.observation.first();
    let obs_attributes = &structure.attributes.observation;
    let mut rows = RowBuffer::new();
    for code in dataset.structure().dimension_codes() {
        rows.ensure_column(code);
    }
    if let Some(code) = dataset.structure().measure_code() {
        rows.ensure_column(code);
    }

    if let Some(series) = &data_set.series {
        for (key, doc) in &series.0 {
            let mut series_values = owned(decode_key(key, &dimensions.series)?);
            series_values.extend(owned(decode_indices(
                &doc.attributes,
                &structure.attributes.series,
            )?));
            for (obs_key, cells) in &doc.observations.0 {
                let mut row = series_values.clone();
                row.extend(owned(decode_key(obs_key, &dimensions.observation)?));
                row.extend(decode_observation(cells, measure, obs_attributes)?);
                rows.push_row(row);
            }
        }
    }
    if let Some(observations) = &data_set.observations {
        for (key, cells) in &observations.0 {
            let mut row = owned(decode_key(key, &dimensions.observation)?);
            row.extend(decode_observation(cells, measure, obs_attributes)?);
            rows.push_row(row);
        }
    }

    debug!(dataset = %dataset.label(), rows = rows.len(), "SDMX-JSON dataset decoded");
    dataset.set_data(rows.finish()?)?;
    Ok(dataset)
}

fn owned<'a>(values: Vec<(&'a str, &'a str)>) -> Vec<(&'a str, String)> {
    values
        .into_iter()
        .map(|(id, value)| (id, value.to_string()))
        .collect()
}
