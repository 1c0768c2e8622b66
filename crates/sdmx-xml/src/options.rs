//! Writer options.

use sdmx_model::MessageType;

/// Options for SDMX-ML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlWriterOptions {
    /// `GenericData` or `StructureSpecificData` for data messages.
    pub message_type: MessageType,
    /// Indent nested elements by two spaces.
    pub pretty: bool,
}

impl Default for XmlWriterOptions {
    fn default() -> Self {
        Self {
            message_type: MessageType::StructureSpecificData,
            pretty: true,
        }
    }
}

impl XmlWriterOptions {
    #[must_use]
    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
