//! Data encodings and format sniffing.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use sdmx_model::{MessageType, Result, SdmxError};
use sdmx_xml::{DataFlavor, detect};

/// A data encoding this workspace reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// SDMX-ML generic data.
    GenericXml,
    /// SDMX-ML structure-specific data.
    StructureSpecificXml,
    /// SDMX-JSON data.
    Json,
    /// Plain CSV with one column per component.
    Csv,
    /// SDMX-CSV with a leading `DATAFLOW` column.
    SdmxCsv,
    /// First worksheet of a workbook, laid out like a CSV table. Read only.
    Spreadsheet,
}

impl DataFormat {
    pub const ALL: [Self; 6] = [
        Self::GenericXml,
        Self::StructureSpecificXml,
        Self::Json,
        Self::Csv,
        Self::SdmxCsv,
        Self::Spreadsheet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenericXml => "generic-xml",
            Self::StructureSpecificXml => "structure-specific-xml",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::SdmxCsv => "sdmx-csv",
            Self::Spreadsheet => "spreadsheet",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::GenericXml | Self::StructureSpecificXml => "xml",
            Self::Json => "json",
            Self::Csv | Self::SdmxCsv => "csv",
            Self::Spreadsheet => "xlsx",
        }
    }

    /// Message type a message carries once encoded in this format.
    pub fn message_type(self) -> MessageType {
        match self {
            Self::GenericXml => MessageType::GenericData,
            _ => MessageType::StructureSpecificData,
        }
    }

    pub fn is_xml(self) -> bool {
        matches!(self, Self::GenericXml | Self::StructureSpecificXml)
    }

    pub fn is_csv(self) -> bool {
        matches!(self, Self::Csv | Self::SdmxCsv)
    }

    pub fn is_writable(self) -> bool {
        self != Self::Spreadsheet
    }

    /// Format implied by a file extension. XML is ambiguous between the two
    /// data encodings and yields the structure-specific one.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xml" => Some(Self::StructureSpecificXml),
            "json" => Some(Self::Json),
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = SdmxError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| SdmxError::structural(format!("unknown data format {value}")))
    }
}

/// What the first bytes of a document look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// An SDMX-ML structure message.
    Structure,
    Data(DataFormat),
}

/// Zip container (xlsx, ods) and OLE compound file (xls) signatures.
const WORKBOOK_MAGIC: [&[u8]; 2] = [b"PK\x03\x04", b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1"];

/// Guess the kind of document from its first bytes.
pub fn sniff(head: &[u8]) -> Option<DocumentKind> {
    if WORKBOOK_MAGIC.iter().any(|magic| head.starts_with(magic)) {
        return Some(DocumentKind::Data(DataFormat::Spreadsheet));
    }
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    match text.chars().next()? {
        '<' => sniff_xml(text),
        '{' => Some(DocumentKind::Data(DataFormat::Json)),
        _ => sniff_csv(text),
    }
}

fn sniff_xml(text: &str) -> Option<DocumentKind> {
    let mut rest = text;
    loop {
        let start = rest.find('<')?;
        rest = &rest[start + 1..];
        if let Some(comment) = rest.strip_prefix("!--") {
            rest = &comment[comment.find("-->")? + 3..];
            continue;
        }
        if rest.starts_with('?') || rest.starts_with('!') {
            rest = &rest[rest.find('>')? + 1..];
            continue;
        }
        break;
    }
    let tag = &rest[..rest.find('>').unwrap_or(rest.len())];
    let name = tag
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default();
    let local = name.rsplit(':').next().unwrap_or(name);
    if local == "Structure" {
        return Some(DocumentKind::Structure);
    }
    let namespaces: Vec<&str> = tag.split('"').skip(1).step_by(2).collect();
    let format = match detect(name, &namespaces)? {
        DataFlavor::Generic => DataFormat::GenericXml,
        DataFlavor::StructureSpecific => DataFormat::StructureSpecificXml,
    };
    Some(DocumentKind::Data(format))
}

fn sniff_csv(text: &str) -> Option<DocumentKind> {
    let header = text.lines().next()?;
    let delimiter = char::from(sniff_delimiter(header.as_bytes()));
    if !header.contains(delimiter) {
        return None;
    }
    let first = header.split(delimiter).next().unwrap_or_default();
    let first = first.trim().trim_matches('"');
    let format = if first == sdmx_csv::DATAFLOW_COLUMN {
        DataFormat::SdmxCsv
    } else {
        DataFormat::Csv
    };
    Some(DocumentKind::Data(format))
}

/// The most frequent of `,`, `;`, tab and `|` on the first line, ties going
/// to the earlier one; `,` when none occurs.
pub fn sniff_delimiter(head: &[u8]) -> u8 {
    let line = head.split(|&b| b == b'\n').next().unwrap_or_default();
    [b',', b';', b'\t', b'|']
        .into_iter()
        .rev()
        .map(|candidate| (line.iter().filter(|&&b| b == candidate).count(), candidate))
        .filter(|&(count, _)| count > 0)
        .max_by_key(|&(count, _)| count)
        .map_or(b',', |(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_xml_flavours() {
        let generic = br#"<?xml version="1.0"?>
<!-- produced by a test -->
<message:GenericData xmlns:message="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message">"#;
        assert_eq!(
            sniff(generic),
            Some(DocumentKind::Data(DataFormat::GenericXml))
        );

        let specific = br#"<mes:StructureSpecificData xmlns:mes="x">"#;
        assert_eq!(
            sniff(specific),
            Some(DocumentKind::Data(DataFormat::StructureSpecificXml))
        );

        let structure = b"\xef\xbb\xbf<message:Structure xmlns:message=\"m\">";
        assert_eq!(sniff(structure), Some(DocumentKind::Structure));
    }

    #[test]
    fn test_sniff_xml_by_namespace() {
        let head = br#"<Data xmlns="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/data/generic">"#;
        assert_eq!(sniff(head), Some(DocumentKind::Data(DataFormat::GenericXml)));
        assert_eq!(sniff(b"<html>"), None);
    }

    #[test]
    fn test_sniff_json_and_csv() {
        assert_eq!(
            sniff(b"  {\"meta\": {}}"),
            Some(DocumentKind::Data(DataFormat::Json))
        );
        assert_eq!(
            sniff(b"DATAFLOW;ACTION;FREQ\n"),
            Some(DocumentKind::Data(DataFormat::SdmxCsv))
        );
        assert_eq!(
            sniff(b"FREQ,TIME_PERIOD,OBS_VALUE\nA,2020,1\n"),
            Some(DocumentKind::Data(DataFormat::Csv))
        );
        assert_eq!(sniff(b"plain text"), None);
        assert_eq!(sniff(b""), None);
    }

    #[test]
    fn test_sniff_workbooks() {
        let spreadsheet = Some(DocumentKind::Data(DataFormat::Spreadsheet));
        assert_eq!(sniff(b"PK\x03\x04\x14\x00\x06\x00"), spreadsheet);
        assert_eq!(sniff(b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1\x00"), spreadsheet);
        assert_eq!(
            DataFormat::from_extension(Path::new("obs.XLSX")),
            Some(DataFormat::Spreadsheet)
        );
        assert_eq!(
            DataFormat::from_extension(Path::new("obs.ods")),
            Some(DataFormat::Spreadsheet)
        );
        assert!(!DataFormat::Spreadsheet.is_writable());
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"A;B;C,D\n1,2"), b';');
        assert_eq!(sniff_delimiter(b"A\tB"), b'\t');
        assert_eq!(sniff_delimiter(b"A"), b',');
    }

    #[test]
    fn test_format_names() {
        for format in DataFormat::ALL {
            assert_eq!(format.as_str().parse::<DataFormat>().unwrap(), format);
        }
        assert_eq!(
            "SDMX_CSV".parse::<DataFormat>().unwrap(),
            DataFormat::SdmxCsv
        );
        assert!("xlsx".parse::<DataFormat>().is_err());
        assert_eq!(
            "spreadsheet".parse::<DataFormat>().unwrap(),
            DataFormat::Spreadsheet
        );
        assert_eq!(
            DataFormat::from_extension(Path::new("data/obs.JSON")),
            Some(DataFormat::Json)
        );
    }
}
