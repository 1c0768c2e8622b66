//! Reader and writer options.

/// Column layout of a CSV file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvLayout {
    /// One column per component id, nothing else.
    #[default]
    Plain,
    /// SDMX-CSV: a leading `DATAFLOW` column holding the structure's
    /// unique id, then an `ACTION` column with the dataset action letter.
    SdmxCsv,
}

/// Options shared by the CSV reader and writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub layout: CsvLayout,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            layout: CsvLayout::Plain,
        }
    }
}

impl CsvOptions {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: CsvLayout) -> Self {
        self.layout = layout;
        self
    }
}
