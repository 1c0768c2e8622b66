//! Serde shapes of an SDMX-JSON data message.
//!
//! Only the parts this crate writes are modelled. Unknown members are
//! ignored on input.

use std::fmt;
use std::marker::PhantomData;

use sdmx_model::Action;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Document {
    pub meta: Meta,
    #[serde(default)]
    pub data: Data,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Meta {
    pub id: String,
    #[serde(default)]
    pub test: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared: Option<String>,
    pub sender: PartyDoc,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<PartyDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PartyDoc {
    pub id: String,
    #[serde(default, skip_serializing_if = "Keyed::is_empty")]
    pub names: Keyed<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Data {
    #[serde(default)]
    pub structures: Vec<StructureDoc>,
    #[serde(default)]
    pub data_sets: Vec<DataSetDoc>,
}

/// Component tables of one dataset. Every value in the data part is an
/// index into the `values` of the matching component.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StructureDoc {
    pub links: Vec<Link>,
    #[serde(default)]
    pub dimensions: Levels,
    #[serde(default)]
    pub attributes: Levels,
    #[serde(default)]
    pub measures: MeasureLevel,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Link {
    pub rel: String,
    pub urn: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Levels {
    #[serde(default)]
    pub data_set: Vec<ComponentDoc>,
    #[serde(default)]
    pub series: Vec<ComponentDoc>,
    #[serde(default)]
    pub observation: Vec<ComponentDoc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct MeasureLevel {
    #[serde(default)]
    pub observation: Vec<ComponentDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ComponentDoc {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_position: Option<usize>,
    #[serde(default)]
    pub values: Vec<ValueDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ValueDoc {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DataSetDoc {
    #[serde(default)]
    pub structure: usize,
    #[serde(default)]
    pub action: Action,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Option<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Keyed<SeriesDoc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Keyed<Observation>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SeriesDoc {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Option<usize>>,
    #[serde(default)]
    pub observations: Keyed<Observation>,
}

/// Measure value followed by one index per observation attribute.
pub(crate) type Observation = Vec<Value>;

/// A JSON object read and written in document order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Keyed<V>(pub Vec<(String, V)>);

impl<V> Default for Keyed<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Keyed<V> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for Keyed<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, value)| (key, value)))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Keyed<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for KeyedVisitor<V> {
            type Value = Keyed<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(Keyed(entries))
            }
        }

        deserializer.deserialize_map(KeyedVisitor(PhantomData))
    }
}
