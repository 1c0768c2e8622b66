//! Writer options.

/// Options for SDMX-JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonWriterOptions {
    /// Indent nested values by two spaces.
    pub pretty: bool,
}

impl Default for JsonWriterOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonWriterOptions {
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
