//! Thin event writer over `quick_xml::Writer`.

use std::fmt::Display;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use sdmx_model::{InternationalString, Result, SdmxError};

pub(crate) struct XmlOut<W: Write> {
    writer: Writer<W>,
}

fn write_error(err: impl Display) -> SdmxError {
    SdmxError::Io(std::io::Error::other(err.to_string()))
}

impl<W: Write> XmlOut<W> {
    pub(crate) fn new(inner: W, pretty: bool) -> Self {
        let writer = if pretty {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };
        Self { writer }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(write_error)
    }

    pub(crate) fn declaration(&mut self) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn tag<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for &attribute in attributes {
            start.push_attribute(attribute);
        }
        start
    }

    pub(crate) fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Start(Self::tag(name, attributes)))
    }

    pub(crate) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Empty(Self::tag(name, attributes)))
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// `<name attrs>text</name>`.
    pub(crate) fn text_element(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<()> {
        self.start(name, attributes)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// One element per locale, with `xml:lang`.
    pub(crate) fn localised(&mut self, name: &str, text: &InternationalString) -> Result<()> {
        for (locale, value) in text.iter() {
            self.text_element(name, &[("xml:lang", locale)], value)?;
        }
        Ok(())
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}
