//! CLI argument definitions for the `sdmx` tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use sdmx_core::DataFormat;

#[derive(Parser)]
#[command(
    name = "sdmx",
    version,
    about = "Inspect, validate and convert SDMX files",
    long_about = "Inspect, validate and convert SDMX files.\n\n\
                  Reads SDMX-ML 2.1 structure messages, and data as SDMX-ML \
                  (generic or structure-specific), SDMX-JSON, plain CSV or SDMX-CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Summarise structure and data files.
    Inspect(InspectArgs),

    /// Validate a data file against its data structure.
    Validate(ValidateArgs),

    /// Convert a data file to another encoding.
    Convert(ConvertArgs),

    /// List the supported data formats.
    Formats,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Structure or data files. Structure files are loaded first and used
    /// to read the data files.
    #[arg(value_name = "FILE", required = true)]
    pub paths: Vec<PathBuf>,

    /// Additional structure files needed to read the data files.
    #[arg(short = 's', long = "structure", value_name = "FILE")]
    pub structures: Vec<PathBuf>,

    #[command(flatten)]
    pub input_options: InputArgs,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Data file to validate.
    #[arg(value_name = "DATA")]
    pub input: PathBuf,

    /// Structure files holding the data structure and its codelists.
    #[arg(short = 's', long = "structure", value_name = "FILE", required = true)]
    pub structures: Vec<PathBuf>,

    #[command(flatten)]
    pub input_options: InputArgs,

    /// Stop at the first error-severity violation.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Skip the duplicated-observation check.
    #[arg(long = "no-duplicate-check")]
    pub no_duplicate_check: bool,

    /// Write the validation reports as JSON.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Data file to read.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// File to write.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Structure files holding the data structure.
    #[arg(short = 's', long = "structure", value_name = "FILE", required = true)]
    pub structures: Vec<PathBuf>,

    #[command(flatten)]
    pub input_options: InputArgs,

    /// Target format (default: implied by the output extension).
    #[arg(long = "to", value_enum)]
    pub to: Option<FormatArg>,

    /// Observation axis of the output: a dimension id or `AllDimensions`.
    #[arg(long = "dim-at-obs", value_name = "DIMENSION")]
    pub dim_at_obs: Option<String>,

    /// Delimiter for CSV output.
    #[arg(
        long = "output-delimiter",
        value_name = "CHAR",
        value_parser = parse_delimiter,
        default_value = ","
    )]
    pub output_delimiter: u8,

    /// Write XML and JSON without indentation.
    #[arg(long = "compact")]
    pub compact: bool,
}

/// How to read a data file.
#[derive(Parser)]
pub struct InputArgs {
    /// Input format (default: detected from content, then extension).
    #[arg(long = "format", value_enum)]
    pub format: Option<FormatArg>,

    /// Structure a plain table binds to: a URN or `AGENCY:ID(VERSION)`
    /// of a dataflow or data structure.
    #[arg(long = "bind", value_name = "STRUCTURE")]
    pub bind: Option<String>,

    /// CSV delimiter (default: detected from the header line).
    #[arg(long = "delimiter", value_name = "CHAR", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

/// CLI data format choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    GenericXml,
    StructureSpecificXml,
    Json,
    Csv,
    SdmxCsv,
    Spreadsheet,
}

impl From<FormatArg> for DataFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::GenericXml => DataFormat::GenericXml,
            FormatArg::StructureSpecificXml => DataFormat::StructureSpecificXml,
            FormatArg::Json => DataFormat::Json,
            FormatArg::Csv => DataFormat::Csv,
            FormatArg::SdmxCsv => DataFormat::SdmxCsv,
            FormatArg::Spreadsheet => DataFormat::Spreadsheet,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// Accepts a single ASCII character, or `tab`.
pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() && !byte.is_ascii_alphanumeric() => Ok(*byte),
            _ => Err(format!("expected one punctuation character or `tab`, got {value:?}")),
        },
    }
}
