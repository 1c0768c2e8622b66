//! Pull-based XML event source and a small element tree.
//!
//! Data sections are read event by event so observations go straight into
//! the row buffer. Headers and structure documents are small and are read
//! into [`Element`] trees instead.

use std::collections::VecDeque;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use sdmx_model::{FormatPosition, Result, SdmxError};

/// An owned parse event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Start(Tag),
    End(String),
    Text(String),
    Eof,
}

/// Start tag with qualified name and attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl Tag {
    pub(crate) fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Attribute value by local name, ignoring any prefix.
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local(key) == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attributes written without a prefix (component values in
    /// structure-specific data).
    pub(crate) fn plain_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|(key, _)| !key.contains(':') && key != "xmlns")
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Local part of a qualified name.
pub(crate) fn local(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

pub(crate) struct XmlSource<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: VecDeque<Node>,
}

impl<R: BufRead> XmlSource<R> {
    pub(crate) fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            buf: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn position(&self) -> FormatPosition {
        FormatPosition::Offset(self.reader.buffer_position())
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> SdmxError {
        SdmxError::format(message, self.position())
    }

    pub(crate) fn next(&mut self) -> Result<Node> {
        if let Some(node) = self.pending.pop_front() {
            return Ok(node);
        }
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => {
                    return Err(SdmxError::format(
                        err.to_string(),
                        FormatPosition::Offset(self.reader.error_position()),
                    ));
                }
            };
            let node = match event {
                Event::Start(start) => Node::Start(tag(&start, &self.reader)?),
                Event::Empty(start) => {
                    let tag = tag(&start, &self.reader)?;
                    self.pending.push_back(Node::End(tag.name.clone()));
                    Node::Start(tag)
                }
                Event::End(end) => Node::End(utf8(end.name().as_ref(), &self.reader)?.to_string()),
                Event::Text(text) => Node::Text(utf8(&text, &self.reader)?.to_string()),
                Event::CData(data) => Node::Text(utf8(&data, &self.reader)?.to_string()),
                Event::GeneralRef(reference) => {
                    let name = utf8(&reference, &self.reader)?;
                    let resolved = resolve_entity(name).ok_or_else(|| {
                        SdmxError::format(
                            format!("unknown entity &{name};"),
                            FormatPosition::Offset(self.reader.buffer_position()),
                        )
                    })?;
                    Node::Text(resolved.to_string())
                }
                Event::Eof => Node::Eof,
                _ => continue,
            };
            return Ok(node);
        }
    }

    /// First start tag of the document.
    pub(crate) fn root(&mut self) -> Result<Tag> {
        loop {
            match self.next()? {
                Node::Start(tag) => return Ok(tag),
                Node::Text(text) if text.trim().is_empty() => {}
                Node::Text(_) => return Err(self.error("text before the root element")),
                Node::End(name) => return Err(self.error(format!("unexpected </{name}>"))),
                Node::Eof => return Err(self.error("empty document")),
            }
        }
    }

    /// Reads the rest of an element whose start tag was just returned.
    pub(crate) fn read_element(&mut self, tag: Tag) -> Result<Element> {
        let mut stack = vec![Element::from_tag(tag)];
        loop {
            match self.next()? {
                Node::Start(tag) => stack.push(Element::from_tag(tag)),
                Node::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Node::End(_) => {
                    let Some(mut done) = stack.pop() else {
                        return Err(self.error("unbalanced end tag"));
                    };
                    done.text = done.text.trim().to_string();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                }
                Node::Eof => return Err(self.error("unexpected end of document")),
            }
        }
    }

    /// Skips the rest of an element whose start tag was just returned.
    pub(crate) fn skip_element(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Node::Start(_) => depth += 1,
                Node::End(_) => depth -= 1,
                Node::Text(_) => {}
                Node::Eof => return Err(self.error("unexpected end of document")),
            }
        }
        Ok(())
    }
}

fn utf8<'a, R>(bytes: &'a [u8], reader: &Reader<R>) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|err| {
        SdmxError::format(
            format!("invalid UTF-8: {err}"),
            FormatPosition::Offset(reader.buffer_position()),
        )
    })
}

fn tag<R>(start: &BytesStart<'_>, reader: &Reader<R>) -> Result<Tag> {
    let name = utf8(start.name().as_ref(), reader)?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| {
            SdmxError::format(err.to_string(), FormatPosition::Offset(reader.buffer_position()))
        })?;
        let key = utf8(attr.key.as_ref(), reader)?.to_string();
        let value = attr.unescape_value().map_err(|err| {
            SdmxError::format(err.to_string(), FormatPosition::Offset(reader.buffer_position()))
        })?;
        attributes.push((key, value.into_owned()));
    }
    Ok(Tag { name, attributes })
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// An element tree node. Names are local, prefixes are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    fn from_tag(tag: Tag) -> Self {
        Self {
            name: local(&tag.name).to_string(),
            attributes: tag
                .attributes
                .into_iter()
                .map(|(key, value)| (local(&key).to_string(), value))
                .collect(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub(crate) fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub(crate) fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }
}
