//! Cursor-style XML reader.
//!
//! [`XmlRead`] exposes a document as a sequence of [`XmlEvent`]s with one current
//! node, the way the serializer walks it. [`QuickXmlReader`] implements it over a
//! byte slice with `quick_xml::NsReader`, resolving namespaces and keeping the byte
//! offset of every node so errors can report a line and column.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::node::{XmlAttribute, XmlElement, XmlNode};
use crate::{Error, Position, Result, XmlName};

/// Input settings for readers and the read path of the serializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Stricter well-formedness checks: comments are validated and nothing but
    /// whitespace, comments and processing instructions may surround the root.
    pub validate: bool,
    /// Maximum element nesting the serializer descends into. `None` is unbounded.
    pub max_depth: Option<usize>,
}

impl ReaderOptions {
    /// Enable or disable strict checking.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Bound the nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// A start tag with its resolved name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: XmlName,
    pub prefix: Option<String>,
    /// Attributes in document order. Namespace declarations are not included.
    pub attributes: Vec<XmlAttribute>,
    /// Whether the tag is self-closing. No [`XmlEvent::EndElement`] follows it.
    pub is_empty: bool,
}

impl StartElement {
    /// A childless captured element with this tag's name and attributes.
    pub fn to_element(&self) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            prefix: self.prefix.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }
}

/// The node a reader is positioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Nothing has been read yet.
    None,
    StartElement(StartElement),
    EndElement(XmlName),
    Text(String),
    CData(String),
    /// Text made only of XML whitespace.
    Whitespace(String),
    /// Declarations, comments, processing instructions and doctypes.
    Other,
    Eof,
}

/// A forward-only XML cursor.
pub trait XmlRead {
    /// The current node.
    fn node(&self) -> &XmlEvent;

    /// Advance to the next node. Returns `false` once the end of input is reached.
    fn read(&mut self) -> Result<bool>;

    /// Line and column of the current node.
    fn position(&self) -> Option<Position>;

    /// Move past the current node. On a start element, the whole subtree is skipped.
    fn skip(&mut self) -> Result<()> {
        let open = matches!(self.node(), XmlEvent::StartElement(start) if !start.is_empty);
        if open {
            let mut depth = 1usize;
            while depth > 0 {
                if !self.read()? {
                    return Err(Error::UnexpectedEof);
                }
                match self.node() {
                    XmlEvent::StartElement(start) if !start.is_empty => depth += 1,
                    XmlEvent::EndElement(_) => depth -= 1,
                    _ => {}
                }
            }
        }
        self.read()?;
        Ok(())
    }

    /// Read the text of a text-only element and move past its end tag.
    ///
    /// Fails if the reader is not on a start element or the element has child
    /// elements.
    fn read_element_content_as_string(&mut self) -> Result<String> {
        let is_empty = match self.node() {
            XmlEvent::StartElement(start) => start.is_empty,
            _ => return Err(Error::NoCurrentElement),
        };

        let mut text = String::new();
        if !is_empty {
            loop {
                if !self.read()? {
                    return Err(Error::UnexpectedEof);
                }
                match self.node() {
                    XmlEvent::Text(t) | XmlEvent::CData(t) | XmlEvent::Whitespace(t) => text.push_str(t),
                    XmlEvent::EndElement(_) => break,
                    XmlEvent::StartElement(start) => {
                        return Err(Error::xml(
                            format!("element '{}' is not allowed in text-only content", start.name),
                            self.position(),
                        ));
                    }
                    _ => {}
                }
            }
        }
        self.read()?;
        Ok(text)
    }

    /// Capture the current element and its subtree.
    ///
    /// The reader is left on the element's end tag, or on the start tag itself when
    /// it is self-closing. Whitespace-only text is not captured.
    fn read_subtree(&mut self) -> Result<XmlElement> {
        let root = match self.node() {
            XmlEvent::StartElement(start) if start.is_empty => return Ok(start.to_element()),
            XmlEvent::StartElement(start) => start.to_element(),
            _ => return Err(Error::NoCurrentElement),
        };

        let mut stack = vec![root];
        loop {
            if !self.read()? {
                return Err(Error::UnexpectedEof);
            }
            let node = match self.node() {
                XmlEvent::StartElement(start) if start.is_empty => XmlNode::Element(start.to_element()),
                XmlEvent::StartElement(start) => {
                    stack.push(start.to_element());
                    continue;
                }
                XmlEvent::EndElement(_) => {
                    let done = stack.pop().ok_or(Error::NoCurrentElement)?;
                    if stack.is_empty() {
                        return Ok(done);
                    }
                    XmlNode::Element(done)
                }
                XmlEvent::Text(text) => XmlNode::Text(text.clone()),
                XmlEvent::CData(text) => XmlNode::CData(text.clone()),
                _ => continue,
            };
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            }
        }
    }
}

/// [`XmlRead`] implementation over an in-memory document.
///
/// # Example
///
/// ```
/// use xbind_common::{QuickXmlReader, XmlEvent, XmlName, XmlRead};
///
/// let mut reader = QuickXmlReader::new(br#"<a xmlns="urn:x" id="1"/>"#);
/// assert!(reader.read().unwrap());
/// match reader.node() {
///     XmlEvent::StartElement(start) => {
///         assert_eq!(start.name, XmlName::new("urn:x", "a"));
///         assert_eq!(start.attributes.len(), 1);
///         assert!(start.is_empty);
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub struct QuickXmlReader<'a> {
    input: &'a [u8],
    reader: NsReader<&'a [u8]>,
    node: XmlEvent,
    offset: usize,
    depth: usize,
    root_closed: bool,
    validate: bool,
}

impl<'a> QuickXmlReader<'a> {
    /// Create a reader with default options.
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, &ReaderOptions::default())
    }

    /// Create a reader with the given options.
    pub fn with_options(input: &'a [u8], options: &ReaderOptions) -> Self {
        let mut reader = NsReader::from_reader(input);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = true;
        config.check_comments = options.validate;

        Self {
            input,
            reader,
            node: XmlEvent::None,
            offset: 0,
            depth: 0,
            root_closed: false,
            validate: options.validate,
        }
    }

    /// Number of elements currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::xml(message, Some(Position::from_offset(self.input, self.offset)))
    }

    fn next_event(&mut self) -> Result<XmlEvent> {
        self.offset = self.reader.buffer_position() as usize;

        let (namespace, event) = match self.reader.read_resolved_event() {
            Ok((resolved, event)) => (resolve(resolved), event),
            Err(error) => {
                let offset = self.reader.error_position() as usize;
                return Err(Error::xml(
                    error.to_string(),
                    Some(Position::from_offset(self.input, offset)),
                ));
            }
        };

        let namespace = namespace.map_err(|message| self.error_here(message))?;
        let event = match event {
            Event::Start(start) => {
                let start = self.start_element(&start, namespace, false)?;
                XmlEvent::StartElement(start)
            }
            Event::Empty(start) => {
                let start = self.start_element(&start, namespace, true)?;
                XmlEvent::StartElement(start)
            }
            Event::End(end) => {
                let local = utf8(end.local_name().into_inner())?;
                XmlEvent::EndElement(XmlName::new(namespace.unwrap_or_default(), local))
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| self.error_here(e.to_string()))?;
                if text.chars().all(is_xml_whitespace) {
                    XmlEvent::Whitespace(text.into_owned())
                } else {
                    XmlEvent::Text(text.into_owned())
                }
            }
            Event::CData(data) => XmlEvent::CData(std::str::from_utf8(&data)?.to_owned()),
            Event::Eof => XmlEvent::Eof,
            _ => XmlEvent::Other,
        };

        self.track(&event)?;
        Ok(event)
    }

    /// Update nesting state and apply the strict-mode document rules.
    fn track(&mut self, event: &XmlEvent) -> Result<()> {
        match event {
            XmlEvent::StartElement(start) => {
                if self.depth == 0 && self.validate && self.root_closed {
                    return Err(self.error_here(format!(
                        "element '{}' follows the root element",
                        start.name
                    )));
                }
                if start.is_empty {
                    if self.depth == 0 {
                        self.root_closed = true;
                    }
                } else {
                    self.depth += 1;
                }
            }
            XmlEvent::EndElement(_) => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.root_closed = true;
                }
            }
            XmlEvent::Text(_) | XmlEvent::CData(_) if self.depth == 0 && self.validate => {
                return Err(self.error_here("text is not allowed outside the root element"));
            }
            XmlEvent::Eof if self.depth > 0 => {
                return Err(self.error_here(format!(
                    "unexpected end of document, {} element(s) still open",
                    self.depth
                )));
            }
            _ => {}
        }
        Ok(())
    }

    fn start_element(
        &self,
        start: &BytesStart<'_>,
        namespace: Option<String>,
        is_empty: bool,
    ) -> Result<StartElement> {
        let local = utf8(start.local_name().into_inner())?;
        let prefix = match start.name().prefix() {
            Some(prefix) => Some(utf8(prefix.into_inner())?.to_owned()),
            None => None,
        };

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| self.error_here(e.to_string()))?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }

            let (resolved, local_name) = self.reader.resolve_attribute(attribute.key);
            let attribute_namespace = resolve(resolved).map_err(|message| self.error_here(message))?;
            let name = XmlName::new(
                attribute_namespace.unwrap_or_default(),
                utf8(local_name.into_inner())?,
            );
            let prefix = match attribute.key.prefix() {
                Some(prefix) => Some(utf8(prefix.into_inner())?.to_owned()),
                None => None,
            };
            let value = attribute
                .unescape_value()
                .map_err(|e| self.error_here(e.to_string()))?;

            attributes.push(XmlAttribute {
                name,
                prefix,
                value: Cow::into_owned(value),
            });
        }

        Ok(StartElement {
            name: XmlName::new(namespace.unwrap_or_default(), local),
            prefix,
            attributes,
            is_empty,
        })
    }
}

impl XmlRead for QuickXmlReader<'_> {
    #[inline]
    fn node(&self) -> &XmlEvent {
        &self.node
    }

    fn read(&mut self) -> Result<bool> {
        if self.node == XmlEvent::Eof {
            return Ok(false);
        }
        self.node = self.next_event()?;
        Ok(self.node != XmlEvent::Eof)
    }

    fn position(&self) -> Option<Position> {
        match self.node {
            XmlEvent::None => None,
            _ => Some(Position::from_offset(self.input, self.offset)),
        }
    }
}

fn resolve(resolved: ResolveResult<'_>) -> std::result::Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            Ok(Some(String::from_utf8_lossy(namespace.into_inner()).into_owned()))
        }
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(format!(
            "namespace prefix '{}' is not declared",
            String::from_utf8_lossy(&prefix)
        )),
    }
}

#[inline]
fn utf8(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

#[inline]
fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
