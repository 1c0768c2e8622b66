//! Data message reader.
//!
//! Observations are streamed into a [`RowBuffer`]; only the header and
//! individual generic `Obs`/`Group` elements are held as element trees.

use std::io::BufRead;

use sdmx_model::{
    Dataset, DimensionAtObservation, Header, Message, MessageType, Result, RowBuffer,
    StructureRegistry,
};

use super::DataFlavor;
use crate::header::{StructureBinding, parse_action, read_header};
use crate::source::{Element, Node, Tag, XmlSource, local};

/// Detect the data encoding from the root element.
///
/// The root name decides; a root with another name is accepted when it
/// declares exactly one of the two data namespaces.
pub fn detect(root_name: &str, namespaces: &[&str]) -> Option<DataFlavor> {
    match local(root_name) {
        "GenericData" | "GenericTimeSeriesData" => Some(DataFlavor::Generic),
        "StructureSpecificData" | "StructureSpecificTimeSeriesData" => {
            Some(DataFlavor::StructureSpecific)
        }
        _ => {
            let generic = namespaces.iter().any(|ns| ns.ends_with("/data/generic"));
            let specific = namespaces
                .iter()
                .any(|ns| ns.ends_with("/data/structurespecific"));
            match (generic, specific) {
                (true, false) => Some(DataFlavor::Generic),
                (false, true) => Some(DataFlavor::StructureSpecific),
                _ => None,
            }
        }
    }
}

/// Read a generic or structure-specific data message.
///
/// Structures named in the header are resolved through `registry`; an
/// unknown structure fails with a reference error. Anything that is not an
/// SDMX-ML data message fails with a format error.
pub fn read_data<R: BufRead>(input: R, registry: &StructureRegistry) -> Result<Message> {
    let mut src = XmlSource::new(input);
    let root = src.root()?;
    let declared: Vec<&str> = root
        .attributes
        .iter()
        .filter(|(key, _)| key.starts_with("xmlns"))
        .map(|(_, value)| value.as_str())
        .collect();
    let Some(flavor) = detect(&root.name, &declared) else {
        return Err(src.error(format!(
            "<{}> is neither a generic nor a structure-specific data message",
            root.name
        )));
    };
    let message_type = match flavor {
        DataFlavor::Generic => MessageType::GenericData,
        DataFlavor::StructureSpecific => MessageType::StructureSpecificData,
    };

    let mut header: Option<Header> = None;
    let mut bindings: Vec<StructureBinding> = Vec::new();
    let mut datasets = Vec::new();
    loop {
        match src.next()? {
            Node::Start(tag) => match tag.local_name() {
                "Header" => {
                    let element = src.read_element(tag)?;
                    let (read, read_bindings) = read_header(&element)?;
                    header = Some(read);
                    bindings = read_bindings;
                }
                "DataSet" => {
                    let binding = find_binding(&src, &tag, &bindings)?;
                    let dataset = match flavor {
                        DataFlavor::Generic => read_generic(&mut src, &tag, binding, registry)?,
                        DataFlavor::StructureSpecific => {
                            read_specific(&mut src, &tag, binding, registry)?
                        }
                    };
                    datasets.push(dataset);
                }
                other => {
                    tracing::warn!(element = other, "Skipping unsupported element");
                    src.skip_element()?;
                }
            },
            Node::End(_) => break,
            Node::Text(_) => {}
            Node::Eof => return Err(src.error("unexpected end of document")),
        }
    }
    let Some(header) = header else {
        return Err(src.error("missing Header"));
    };
    tracing::info!(
        message_type = %message_type,
        datasets = datasets.len(),
        "Read SDMX-ML data message"
    );
    Ok(Message::new(message_type, header, datasets))
}

fn find_binding<'a, R: BufRead>(
    src: &XmlSource<R>,
    tag: &Tag,
    bindings: &'a [StructureBinding],
) -> Result<&'a StructureBinding> {
    let found = match tag.attr("structureRef") {
        Some(id) => bindings.iter().find(|b| b.structure_id == id),
        None if bindings.len() == 1 => bindings.first(),
        None => None,
    };
    found.ok_or_else(|| src.error("DataSet does not reference a structure declared in the header"))
}

/// Rows, dataset-level values and group values collected from a DataSet.
struct Collected {
    dataset: Dataset,
    rows: RowBuffer,
    groups: Vec<GroupValues>,
}

#[derive(Debug, Default)]
struct GroupValues {
    key: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
}

impl Collected {
    fn new(tag: &Tag, binding: &StructureBinding, registry: &StructureRegistry) -> Result<Self> {
        let mut dataset = Dataset::from_registry(registry, &binding.reference)?;
        dataset.set_dim_at_obs(binding.dim_at_obs.clone());
        dataset.action = parse_action(tag.attr("action"))?;
        Ok(Self {
            dataset,
            rows: RowBuffer::new(),
            groups: Vec::new(),
        })
    }

    fn obs_dimension(&self) -> Option<&str> {
        match self.dataset.dim_at_obs() {
            DimensionAtObservation::AllDimensions => None,
            DimensionAtObservation::Dimension(id) => Some(id.as_str()),
        }
    }

    /// Pads key and measure columns, merges group attributes into matching
    /// rows and hands the table to the dataset.
    fn finish(mut self) -> Result<Dataset> {
        let dsd = std::sync::Arc::clone(self.dataset.structure());
        for code in dsd.dimension_codes() {
            self.rows.ensure_column(code);
        }
        if let Some(measure) = dsd.measure_code() {
            self.rows.ensure_column(measure);
        }
        for group in &self.groups {
            for row in 0..self.rows.len() {
                let matches = group
                    .key
                    .iter()
                    .all(|(dim, value)| self.rows.get(row, dim) == Some(value.as_str()));
                if matches {
                    for (id, value) in &group.attributes {
                        self.rows.set(row, id, value.as_str());
                    }
                }
            }
        }
        let rows = self.rows.len();
        let data = self.rows.finish()?;
        self.dataset.set_data(data)?;
        tracing::debug!(dataset = %self.dataset.label(), rows, "Read dataset");
        Ok(self.dataset)
    }
}

fn values_of(element: Option<&Element>) -> Vec<(String, String)> {
    element
        .map(|wrapper| {
            wrapper
                .children_named("Value")
                .filter_map(|v| Some((v.attr("id")?.to_string(), v.attr("value")?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn read_generic<R: BufRead>(
    src: &mut XmlSource<R>,
    tag: &Tag,
    binding: &StructureBinding,
    registry: &StructureRegistry,
) -> Result<Dataset> {
    let mut collected = Collected::new(tag, binding, registry)?;
    loop {
        match src.next()? {
            Node::Start(child) => match child.local_name() {
                "Attributes" => {
                    let element = src.read_element(child)?;
                    for (id, value) in values_of(Some(&element)) {
                        collected.dataset.set_attribute(id, value);
                    }
                }
                "Group" => {
                    let element = src.read_element(child)?;
                    collected.groups.push(GroupValues {
                        key: values_of(element.child("GroupKey")),
                        attributes: values_of(element.child("Attributes")),
                    });
                }
                "Series" => read_generic_series(src, &mut collected)?,
                "Obs" => {
                    let element = src.read_element(child)?;
                    let row = generic_observation(src, &collected, &element, Vec::new())?;
                    collected.rows.push_row(row);
                }
                _ => src.skip_element()?,
            },
            Node::End(_) => break,
            Node::Text(_) => {}
            Node::Eof => return Err(src.error("unexpected end of document")),
        }
    }
    collected.finish()
}

fn read_generic_series<R: BufRead>(src: &mut XmlSource<R>, collected: &mut Collected) -> Result<()> {
    let mut series: Vec<(String, String)> = Vec::new();
    loop {
        match src.next()? {
            Node::Start(child) => match child.local_name() {
                "SeriesKey" | "Attributes" => {
                    let element = src.read_element(child)?;
                    series.extend(values_of(Some(&element)));
                }
                "Obs" => {
                    let element = src.read_element(child)?;
                    let row = generic_observation(src, collected, &element, series.clone())?;
                    collected.rows.push_row(row);
                }
                _ => src.skip_element()?,
            },
            Node::End(_) => return Ok(()),
            Node::Text(_) => {}
            Node::Eof => return Err(src.error("unexpected end of document")),
        }
    }
}

fn generic_observation<R: BufRead>(
    src: &XmlSource<R>,
    collected: &Collected,
    element: &Element,
    mut row: Vec<(String, String)>,
) -> Result<Vec<(String, String)>> {
    row.extend(values_of(element.child("ObsKey")));
    if let Some(dimension) = element.child("ObsDimension") {
        let id = match (dimension.attr("id"), collected.obs_dimension()) {
            (Some(id), _) | (None, Some(id)) => id,
            (None, None) => {
                return Err(src.error("ObsDimension in a dataset without an observation dimension"));
            }
        };
        if let Some(value) = dimension.attr("value") {
            row.push((id.to_string(), value.to_string()));
        }
    }
    if let Some(value) = element.child("ObsValue").and_then(|v| v.attr("value")) {
        let measure = collected.dataset.structure().measure_code().unwrap_or_default();
        row.push((measure.to_string(), value.to_string()));
    }
    row.extend(values_of(element.child("Attributes")));
    Ok(row)
}

fn plain_values(tag: &Tag) -> Vec<(String, String)> {
    tag.plain_attributes()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn read_specific<R: BufRead>(
    src: &mut XmlSource<R>,
    tag: &Tag,
    binding: &StructureBinding,
    registry: &StructureRegistry,
) -> Result<Dataset> {
    let mut collected = Collected::new(tag, binding, registry)?;
    let dsd = std::sync::Arc::clone(collected.dataset.structure());
    for (key, value) in tag.plain_attributes() {
        if dsd.dataset_attribute_codes().iter().any(|code| code == key) {
            collected.dataset.set_attribute(key, value);
        }
    }
    loop {
        match src.next()? {
            Node::Start(child) => {
                match child.local_name() {
                    "Series" => {
                        read_specific_series(src, &mut collected, &plain_values(&child))?;
                        continue;
                    }
                    "Obs" => collected.rows.push_row(plain_values(&child)),
                    "Group" => {
                        let group_id = child.attr("type").map(local).unwrap_or_default();
                        let dimensions = dsd
                            .group(group_id)
                            .map(|g| g.dimensions.clone())
                            .unwrap_or_default();
                        let (key, attributes): (Vec<_>, Vec<_>) = plain_values(&child)
                            .into_iter()
                            .partition(|(id, _)| dimensions.contains(id));
                        collected.groups.push(GroupValues { key, attributes });
                    }
                    _ => {}
                }
                src.skip_element()?;
            }
            Node::End(_) => break,
            Node::Text(_) => {}
            Node::Eof => return Err(src.error("unexpected end of document")),
        }
    }
    collected.finish()
}

fn read_specific_series<R: BufRead>(
    src: &mut XmlSource<R>,
    collected: &mut Collected,
    series: &[(String, String)],
) -> Result<()> {
    loop {
        match src.next()? {
            Node::Start(child) => {
                if child.local_name() == "Obs" {
                    let mut row = series.to_vec();
                    row.extend(plain_values(&child));
                    collected.rows.push_row(row);
                }
                src.skip_element()?;
            }
            Node::End(_) => return Ok(()),
            Node::Text(_) => {}
            Node::Eof => return Err(src.error("unexpected end of document")),
        }
    }
}
