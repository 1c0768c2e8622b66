//! SDMX-JSON writer.

use std::collections::HashMap;
use std::io::Write;

use sdmx_model::{
    AttachmentLevel, Dataset, DimensionAtObservation, Header, Message, Party, Result, SdmxError,
};
use serde_json::Value;
use tracing::info;

use crate::document::{
    ComponentDoc, Data, DataSetDoc, Document, Keyed, Levels, Link, MeasureLevel, Meta,
    Observation, PartyDoc, SeriesDoc, StructureDoc, ValueDoc,
};
use crate::json_error;
use crate::options::JsonWriterOptions;

/// Write a data message as SDMX-JSON.
///
/// Every dataset must carry its dimension and measure columns; nothing is
/// written otherwise.
pub fn write_data<W: Write>(
    writer: W,
    message: &Message,
    options: &JsonWriterOptions,
) -> Result<()> {
    if !message.message_type.is_data() {
        return Err(SdmxError::structural(format!(
            "{} is not a data message",
            message.message_type
        )));
    }
    for dataset in message.datasets() {
        dataset.ensure_encodable()?;
    }

    let mut data = Data::default();
    for (position, dataset) in message.datasets().iter().enumerate() {
        let (structure, data_set) = encode(dataset, position);
        data.structures.push(structure);
        data.data_sets.push(data_set);
    }
    let document = Document {
        meta: meta(&message.header),
        data,
    };
    if options.pretty {
        serde_json::to_writer_pretty(writer, &document).map_err(json_error)?;
    } else {
        serde_json::to_writer(writer, &document).map_err(json_error)?;
    }
    info!(
        datasets = message.datasets().len(),
        observations = message.observation_count(),
        "SDMX-JSON message written"
    );
    Ok(())
}

fn meta(header: &Header) -> Meta {
    Meta {
        id: header.id.clone(),
        test: header.test,
        prepared: header.prepared_text(),
        sender: party(&header.sender),
        receivers: header.receivers.iter().map(party).collect(),
    }
}

fn party(party: &Party) -> PartyDoc {
    PartyDoc {
        id: party.id.clone(),
        names: Keyed(
            party
                .name
                .iter()
                .map(|(locale, text)| (locale.to_string(), text.to_string()))
                .collect(),
        ),
    }
}

/// Distinct values of one component in first-seen order.
#[derive(Debug)]
struct Enumeration<'a> {
    id: &'a str,
    index: HashMap<&'a str, usize>,
    values: Vec<&'a str>,
}

impl<'a> Enumeration<'a> {
    fn new(id: &'a str) -> Self {
        Self {
            id,
            index: HashMap::new(),
            values: Vec::new(),
        }
    }

    fn position(&mut self, value: &'a str) -> usize {
        if let Some(&position) = self.index.get(value) {
            return position;
        }
        let position = self.values.len();
        self.values.push(value);
        self.index.insert(value, position);
        position
    }

    fn into_doc(self, key_position: Option<usize>) -> ComponentDoc {
        ComponentDoc {
            id: self.id.to_string(),
            key_position,
            values: self
                .values
                .into_iter()
                .map(|id| ValueDoc { id: id.to_string() })
                .collect(),
        }
    }
}

/// Enumerations for a list of columns of one dataset.
struct Tables<'a> {
    dataset: &'a Dataset,
    columns: Vec<Enumeration<'a>>,
}

impl<'a> Tables<'a> {
    fn new(dataset: &'a Dataset, ids: &[&'a str]) -> Self {
        Self {
            dataset,
            columns: ids.iter().map(|&id| Enumeration::new(id)).collect(),
        }
    }

    /// Dimension key of a row. A missing dimension value is encoded as the
    /// empty string.
    fn key(&mut self, row: usize) -> String {
        let dataset = self.dataset;
        self.columns
            .iter_mut()
            .map(|column| {
                let value = dataset.value(column.id, row).unwrap_or_default();
                column.position(value).to_string()
            })
            .collect::<Vec<_>>()
            .join(":")
    }

    fn indices(&mut self, row: usize) -> Vec<Option<usize>> {
        let dataset = self.dataset;
        self.columns
            .iter_mut()
            .map(|column| dataset.value(column.id, row).map(|v| column.position(v)))
            .collect()
    }

    fn into_docs(self, key_positions: &[&str]) -> Vec<ComponentDoc> {
        self.columns
            .into_iter()
            .map(|column| {
                let position = key_positions.iter().position(|&id| id == column.id);
                column.into_doc(position)
            })
            .collect()
    }

    fn into_plain_docs(self) -> Vec<ComponentDoc> {
        self.into_docs(&[])
    }
}

fn encode(dataset: &Dataset, position: usize) -> (StructureDoc, DataSetDoc) {
    let dsd = dataset.structure();
    let dim_at_obs = dataset.dim_at_obs();
    let dimension_codes: Vec<&str> = dsd.dimension_codes().iter().map(String::as_str).collect();
    let obs_dimensions: Vec<&str> = match dim_at_obs {
        DimensionAtObservation::AllDimensions => dimension_codes.clone(),
        DimensionAtObservation::Dimension(id) => vec![id.as_str()],
    };
    let series_dimensions = dsd.series_dimension_codes(dim_at_obs);
    let mut series_attributes = dsd.attribute_codes_at(AttachmentLevel::Group, dim_at_obs);
    series_attributes.extend(dsd.attribute_codes_at(AttachmentLevel::Series, dim_at_obs));
    let obs_attributes = dsd.attribute_codes_at(AttachmentLevel::Observation, dim_at_obs);
    let measure = dsd.measure_code().unwrap_or_default();

    let mut series_keys = Tables::new(dataset, &series_dimensions);
    let mut obs_keys = Tables::new(dataset, &obs_dimensions);
    let mut series_values = Tables::new(dataset, &series_attributes);
    let mut obs_values = Tables::new(dataset, &obs_attributes);

    let observation = |obs_values: &mut Tables<'_>, row: usize| -> Observation {
        let mut cells = vec![
            dataset
                .value(measure, row)
                .map_or(Value::Null, |v| Value::String(v.to_string())),
        ];
        cells.extend(
            obs_values
                .indices(row)
                .into_iter()
                .map(|index| index.map_or(Value::Null, Value::from)),
        );
        cells
    };

    // Any observation axis other than all dimensions is written as series,
    // a structure with a single dimension giving one series keyed `""`.
    let (series, observations) = if matches!(dim_at_obs, DimensionAtObservation::AllDimensions) {
        let mut observations = Keyed::default();
        for row in 0..dataset.height() {
            let key = obs_keys.key(row);
            observations.0.push((key, observation(&mut obs_values, row)));
        }
        (None, Some(observations))
    } else {
        // Observation tables are filled series by series, the row order a
        // decoded dataset comes back in.
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut members: Vec<(String, Vec<usize>)> = Vec::new();
        for row in 0..dataset.height() {
            let key = series_keys.key(row);
            match slots.get(&key) {
                Some(&slot) => members[slot].1.push(row),
                None => {
                    slots.insert(key.clone(), members.len());
                    members.push((key, vec![row]));
                }
            }
        }
        let mut series: Keyed<SeriesDoc> = Keyed::default();
        for (key, rows) in members {
            let mut doc = SeriesDoc {
                attributes: series_values.indices(rows[0]),
                observations: Keyed::default(),
            };
            for row in rows {
                let obs_key = obs_keys.key(row);
                let cells = observation(&mut obs_values, row);
                doc.observations.0.push((obs_key, cells));
            }
            series.0.push((key, doc));
        }
        (Some(series), None)
    };

    let mut dataset_attributes = Vec::new();
    let mut attribute_indices = Vec::new();
    for code in dsd.dataset_attribute_codes() {
        let mut enumeration = Enumeration::new(code);
        attribute_indices.push(dataset.attribute(code).map(|v| enumeration.position(v)));
        dataset_attributes.push(enumeration.into_doc(None));
    }
    if attribute_indices.iter().all(Option::is_none) {
        attribute_indices.clear();
    }

    let reference = dataset.structure_ref();
    let structure = StructureDoc {
        links: vec![Link {
            rel: reference.class.as_str().to_string(),
            urn: reference.urn(),
        }],
        dimensions: Levels {
            data_set: Vec::new(),
            series: series_keys.into_docs(&dimension_codes),
            observation: obs_keys.into_docs(&dimension_codes),
        },
        attributes: Levels {
            data_set: dataset_attributes,
            series: series_values.into_plain_docs(),
            observation: obs_values.into_plain_docs(),
        },
        measures: MeasureLevel {
            observation: vec![Enumeration::new(measure).into_doc(None)],
        },
    };
    let data_set = DataSetDoc {
        structure: position,
        action: dataset.action,
        attributes: attribute_indices,
        series,
        observations,
    };
    (structure, data_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_is_first_seen() {
        let mut enumeration = Enumeration::new("FREQ");
        assert_eq!(enumeration.position("M"), 0);
        assert_eq!(enumeration.position("A"), 1);
        assert_eq!(enumeration.position("M"), 0);
        let doc = enumeration.into_doc(Some(0));
        let ids: Vec<&str> = doc.values.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["M", "A"]);
        assert_eq!(doc.key_position, Some(0));
    }
}
