//! Message envelope: a header plus its datasets.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::base::InternationalString;
use crate::dataset::{Action, Dataset, DimensionAtObservation};

/// Default sender id when none is supplied.
pub const DEFAULT_SENDER: &str = "Unknown";

/// Kind of SDMX message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    GenericData,
    StructureSpecificData,
    Metadata,
    Structure,
    Error,
}

impl MessageType {
    /// Root element name in SDMX-ML.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenericData => "GenericData",
            Self::StructureSpecificData => "StructureSpecificData",
            Self::Metadata => "GenericMetadata",
            Self::Structure => "Structure",
            Self::Error => "Error",
        }
    }

    pub fn is_data(self) -> bool {
        matches!(self, Self::GenericData | Self::StructureSpecificData)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details of a party.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub name: InternationalString,
    pub department: Option<String>,
    pub role: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
}

/// Sender or receiver of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    pub id: String,
    pub name: InternationalString,
    pub contacts: Vec<Contact>,
}

impl Party {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Transmission metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: String,
    pub test: bool,
    pub prepared: Option<DateTime<Utc>>,
    pub sender: Party,
    pub receivers: Vec<Party>,
    pub source: InternationalString,
    pub dataset_action: Option<Action>,
    pub dataset_id: Option<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            id: "IREF000001".to_string(),
            test: false,
            prepared: None,
            sender: Party::new(DEFAULT_SENDER),
            receivers: Vec::new(),
            source: InternationalString::new(),
            dataset_action: None,
            dataset_id: None,
        }
    }
}

impl Header {
    pub fn new(id: impl Into<String>, sender: Party) -> Self {
        Self {
            id: id.into(),
            sender,
            ..Self::default()
        }
    }

    /// `Prepared` rendered with second precision, as written by every
    /// encoder.
    pub fn prepared_text(&self) -> Option<String> {
        self.prepared
            .map(|p| p.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Parses an SDMX timestamp (RFC 3339, or a bare date-time taken as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

/// A header plus an ordered sequence of datasets.
#[derive(Debug, Clone)]
pub struct Message {
    pub message_type: MessageType,
    pub header: Header,
    datasets: Vec<Dataset>,
}

impl Message {
    /// Bundles datasets, stamping the preparation time if absent.
    pub fn new(message_type: MessageType, mut header: Header, datasets: Vec<Dataset>) -> Self {
        if header.prepared.is_none() {
            header.prepared = Some(Utc::now());
        }
        Self {
            message_type,
            header,
            datasets,
        }
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn datasets_mut(&mut self) -> &mut [Dataset] {
        &mut self.datasets
    }

    pub fn push_dataset(&mut self, dataset: Dataset) {
        self.datasets.push(dataset);
    }

    pub fn into_datasets(self) -> Vec<Dataset> {
        self.datasets
    }

    /// Sets the observation axis on every dataset.
    pub fn set_dimension_at_observation(&mut self, dim_at_obs: &DimensionAtObservation) {
        for dataset in &mut self.datasets {
            dataset.set_dim_at_obs(dim_at_obs.clone());
        }
    }

    /// Total observation count across datasets.
    pub fn observation_count(&self) -> usize {
        self.datasets.iter().map(Dataset::height).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::component::Component;
    use crate::dsd::DataStructureDefinition;

    fn dataset() -> Dataset {
        let mut dsd = DataStructureDefinition::new("TEST", "DSD", "1.0");
        dsd.add_dimension(Component::time_dimension("TIME_PERIOD"))
            .expect("TIME_PERIOD");
        dsd.add_measure(Component::primary_measure("OBS_VALUE"))
            .expect("OBS_VALUE");
        Dataset::new(Arc::new(dsd))
    }

    #[test]
    fn test_prepared_stamped_if_absent() {
        let message = Message::new(MessageType::GenericData, Header::default(), vec![]);
        assert!(message.header.prepared.is_some());

        let fixed = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).single();
        let header = Header {
            prepared: fixed,
            ..Header::default()
        };
        let message = Message::new(MessageType::GenericData, header, vec![]);
        assert_eq!(message.header.prepared, fixed);
        assert_eq!(
            message.header.prepared_text().as_deref(),
            Some("2021-03-04T05:06:07Z")
        );
    }

    #[test]
    fn test_set_dimension_at_observation_applies_to_all() {
        let mut message = Message::new(
            MessageType::StructureSpecificData,
            Header::default(),
            vec![dataset(), dataset()],
        );
        let axis = DimensionAtObservation::from("TIME_PERIOD");
        message.set_dimension_at_observation(&axis);
        assert!(message.datasets().iter().all(|d| d.dim_at_obs() == &axis));
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).single();
        assert_eq!(parse_timestamp("2021-03-04T05:06:07Z"), expected);
        assert_eq!(parse_timestamp("2021-03-04T05:06:07"), expected);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
