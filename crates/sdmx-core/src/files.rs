//! Reading, writing and converting data files.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use sdmx_csv::{CsvLayout, CsvOptions};
use sdmx_json::JsonWriterOptions;
use sdmx_model::{DimensionAtObservation, Message, SdmxError, StructureRef, StructureRegistry};
use sdmx_xml::XmlWriterOptions;
use tempfile::NamedTempFile;
use tracing::{debug, info, info_span};

use crate::error::{CoreError, Result};
use crate::format::{DataFormat, DocumentKind, sniff, sniff_delimiter};

/// Bytes inspected when sniffing a file.
pub const SNIFF_LEN: usize = 4096;

/// How to read a data file.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Skip sniffing and read as this format.
    pub format: Option<DataFormat>,
    /// Structure a plain table binds to, or an override for SDMX-CSV.
    pub structure: Option<StructureRef>,
    /// CSV delimiter; sniffed from the header when absent.
    pub delimiter: Option<u8>,
}

impl ReadOptions {
    #[must_use]
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn with_structure(mut self, structure: StructureRef) -> Self {
        self.structure = Some(structure);
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// How to write a data file.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Indent XML and JSON output.
    pub pretty: bool,
    pub delimiter: u8,
    /// Observation axis applied to every dataset before writing.
    pub dim_at_obs: Option<DimensionAtObservation>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            delimiter: b',',
            dim_at_obs: None,
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_dim_at_obs(mut self, dim_at_obs: DimensionAtObservation) -> Self {
        self.dim_at_obs = Some(dim_at_obs);
        self
    }
}

/// Outcome of [`convert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub from: DataFormat,
    pub to: DataFormat,
    pub datasets: usize,
    pub observations: usize,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| CoreError::file(path, e))
}

fn head(path: &Path) -> Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(|e| CoreError::file(path, e))?;
    Ok(head)
}

/// Load structure messages into one registry.
///
/// References are checked per file, so a file may only refer to artefacts
/// in itself or in files loaded before it.
pub fn load_structures<P: AsRef<Path>>(paths: &[P]) -> Result<StructureRegistry> {
    let mut registry = StructureRegistry::new();
    for path in paths {
        let path = path.as_ref();
        let header = sdmx_xml::read_structure_into(open(path)?, &mut registry)
            .map_err(|e| CoreError::sdmx(path, e))?;
        debug!(path = %path.display(), message = %header.id, "structure file loaded");
    }
    info!(
        files = paths.len(),
        artefacts = registry.len(),
        "structures loaded"
    );
    Ok(registry)
}

/// Detect the data format of a file: sniffed content first, extension
/// second.
pub fn detect_format(path: &Path) -> Result<DataFormat> {
    match sniff(&head(path)?) {
        Some(DocumentKind::Data(format)) => Ok(format),
        Some(DocumentKind::Structure) => Err(CoreError::UnknownFormat {
            path: path.to_path_buf(),
        }),
        None => DataFormat::from_extension(path).ok_or_else(|| CoreError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a data message from any supported encoding.
///
/// Workbooks are random-access containers and are read into memory first.
pub fn read_data<R: BufRead>(
    mut input: R,
    format: DataFormat,
    registry: &StructureRegistry,
    options: &ReadOptions,
) -> sdmx_model::Result<Message> {
    match format {
        DataFormat::GenericXml | DataFormat::StructureSpecificXml => {
            sdmx_xml::read_data(input, registry)
        }
        DataFormat::Json => sdmx_json::read_data(input, registry),
        DataFormat::Csv | DataFormat::SdmxCsv => {
            let csv = csv_options(format, options.delimiter.unwrap_or(b','));
            sdmx_csv::read_data(input, registry, options.structure.as_ref(), &csv)
        }
        DataFormat::Spreadsheet => {
            let mut bytes = Vec::new();
            input.read_to_end(&mut bytes)?;
            sdmx_csv::read_spreadsheet(Cursor::new(bytes), registry, options.structure.as_ref())
        }
    }
}

/// Write a data message in the given encoding.
pub fn write_data<W: Write>(
    writer: W,
    message: &Message,
    format: DataFormat,
    options: &WriteOptions,
) -> sdmx_model::Result<()> {
    match format {
        DataFormat::GenericXml | DataFormat::StructureSpecificXml => {
            let xml = XmlWriterOptions::default()
                .with_message_type(format.message_type())
                .with_pretty(options.pretty);
            sdmx_xml::write_data(writer, message, &xml)
        }
        DataFormat::Json => {
            let json = JsonWriterOptions::default().with_pretty(options.pretty);
            sdmx_json::write_data(writer, message, &json)
        }
        DataFormat::Csv | DataFormat::SdmxCsv => {
            sdmx_csv::write_data(writer, message, &csv_options(format, options.delimiter))
        }
        DataFormat::Spreadsheet => Err(SdmxError::structural(format!(
            "{format} is an input format only"
        ))),
    }
}

fn csv_options(format: DataFormat, delimiter: u8) -> CsvOptions {
    let layout = if format == DataFormat::SdmxCsv {
        CsvLayout::SdmxCsv
    } else {
        CsvLayout::Plain
    };
    CsvOptions::default()
        .with_delimiter(delimiter)
        .with_layout(layout)
}

/// Read a data file, detecting its format unless one is given.
pub fn read_file(
    path: &Path,
    registry: &StructureRegistry,
    options: &ReadOptions,
) -> Result<(DataFormat, Message)> {
    let format = match options.format {
        Some(format) => format,
        None => detect_format(path)?,
    };
    let mut options = options.clone();
    if format.is_csv() && options.delimiter.is_none() {
        options.delimiter = Some(sniff_delimiter(&head(path)?));
    }
    let message =
        read_data(open(path)?, format, registry, &options).map_err(|e| CoreError::sdmx(path, e))?;
    info!(
        path = %path.display(),
        format = %format,
        datasets = message.datasets().len(),
        observations = message.observation_count(),
        "data file read"
    );
    Ok((format, message))
}

/// Write a data file.
///
/// Output goes to a temporary file next to `path`, which replaces `path`
/// only once the message is fully encoded; a failed write leaves nothing
/// behind.
pub fn write_file(
    path: &Path,
    message: &Message,
    format: DataFormat,
    options: &WriteOptions,
) -> Result<()> {
    if !format.is_writable() {
        return Err(CoreError::sdmx(
            path,
            SdmxError::structural(format!("{format} is an input format only")),
        ));
    }
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir).map_err(|e| CoreError::file(path, e))?;
    let mut writer = BufWriter::new(temp);
    write_data(&mut writer, message, format, options).map_err(|e| CoreError::sdmx(path, e))?;
    let temp = writer
        .into_inner()
        .map_err(|e| CoreError::file(path, e.into_error()))?;
    temp.persist(path)
        .map_err(|e| CoreError::file(path, e.error))?;
    debug!(path = %path.display(), format = %format, "data file written");
    Ok(())
}

/// Convert a data file between encodings.
///
/// The written message carries the target's message type, and the
/// observation axis from `write` when one is set.
pub fn convert(
    input: &Path,
    output: &Path,
    to: DataFormat,
    registry: &StructureRegistry,
    read: &ReadOptions,
    write: &WriteOptions,
) -> Result<Conversion> {
    let span = info_span!("convert", input = %input.display(), output = %output.display());
    let _guard = span.enter();

    let (from, mut message) = read_file(input, registry, read)?;
    message.message_type = to.message_type();
    if let Some(dim_at_obs) = &write.dim_at_obs {
        message.set_dimension_at_observation(dim_at_obs);
    }
    write_file(output, &message, to, write)?;

    let conversion = Conversion {
        from,
        to,
        datasets: message.datasets().len(),
        observations: message.observation_count(),
    };
    info!(
        from = %from,
        to = %to,
        observations = conversion.observations,
        "conversion finished"
    );
    Ok(conversion)
}
