//! Sink-style XML writer.
//!
//! [`XmlWrite`] is the interface the serializer writes through. [`QuickXmlWriter`]
//! implements it on top of `quick_xml::Writer`, taking care of namespace
//! declarations: element names are written unprefixed with `xmlns` declarations
//! whenever the default namespace changes, and namespaced attributes get a prefix
//! that is declared on the element carrying them.

use std::io::Write;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::name::XML_NAMESPACE;
use crate::node::XmlElement;
use crate::{Error, Result, XmlName};

/// Output settings for [`QuickXmlWriter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterOptions {
    /// Indent nested elements by this many spaces. `None` writes everything on one line.
    pub indent: Option<usize>,
    /// Emit an `<?xml version="1.0" encoding="utf-8"?>` declaration first.
    pub declaration: bool,
}

impl WriterOptions {
    /// Indent nested elements.
    pub fn with_indent(mut self, spaces: usize) -> Self {
        self.indent = Some(spaces);
        self
    }

    /// Emit an XML declaration.
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// A sink for XML output.
///
/// Calls follow document order: a start element, its attributes, then content, then
/// the matching end element.
pub trait XmlWrite {
    /// Open an element.
    fn write_start_element(&mut self, name: &XmlName) -> Result<()>;

    /// Add an attribute to the element opened last. Must precede any content.
    fn write_attribute(&mut self, name: &XmlName, value: &str) -> Result<()> {
        self.write_prefixed_attribute(None, name, value)
    }

    /// Add an attribute, preferring `prefix` when its namespace needs one.
    fn write_prefixed_attribute(&mut self, prefix: Option<&str>, name: &XmlName, value: &str) -> Result<()>;

    /// Write escaped text.
    fn write_string(&mut self, text: &str) -> Result<()>;

    /// Write a CDATA section.
    fn write_cdata(&mut self, text: &str) -> Result<()>;

    /// Write a complete element containing only text.
    fn write_element_string(&mut self, name: &XmlName, text: &str) -> Result<()> {
        self.write_start_element(name)?;
        if !text.is_empty() {
            self.write_string(text)?;
        }
        self.write_end_element()
    }

    /// Close the element opened last.
    fn write_end_element(&mut self) -> Result<()>;

    /// Write a captured element and its subtree.
    fn write_node(&mut self, element: &XmlElement) -> Result<()> {
        element.write_to(self)
    }
}

/// Namespace state of one open element.
#[derive(Debug, Default)]
struct Scope {
    qname: String,
    default_namespace: Option<String>,
    prefixes: Vec<(String, String)>,
}

/// An element whose start tag has not been written yet.
#[derive(Debug)]
struct PendingStart {
    scope: Scope,
    attributes: Vec<(String, String)>,
}

/// [`XmlWrite`] implementation over any `std::io::Write`.
///
/// # Example
///
/// ```
/// use xbind_common::{QuickXmlWriter, XmlName, XmlWrite};
///
/// let mut writer = QuickXmlWriter::new(Vec::new());
/// writer.write_start_element(&XmlName::new("http://test.com", "Person")).unwrap();
/// writer.write_attribute(&XmlName::local("Id"), "123").unwrap();
/// writer.write_end_element().unwrap();
///
/// let xml = String::from_utf8(writer.into_inner()).unwrap();
/// assert_eq!(xml, r#"<Person xmlns="http://test.com" Id="123"/>"#);
/// ```
pub struct QuickXmlWriter<W: Write> {
    writer: Writer<W>,
    declaration: bool,
    pending: Option<PendingStart>,
    open: Vec<Scope>,
    next_prefix: usize,
}

impl<W: Write> QuickXmlWriter<W> {
    /// Create a writer with default options.
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, &WriterOptions::default())
    }

    /// Create a writer with the given options.
    pub fn with_options(inner: W, options: &WriterOptions) -> Self {
        let writer = match options.indent {
            Some(spaces) => Writer::new_with_indent(inner, b' ', spaces),
            None => Writer::new(inner),
        };
        Self {
            writer,
            declaration: options.declaration,
            pending: None,
            open: Vec::new(),
            next_prefix: 1,
        }
    }

    /// Number of elements opened and not yet closed.
    pub fn depth(&self) -> usize {
        self.open.len() + usize::from(self.pending.is_some())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Default namespace in effect for the next element.
    fn current_default_namespace(&self) -> Option<&str> {
        match &self.pending {
            Some(pending) => pending.scope.default_namespace.as_deref(),
            None => self.open.last().and_then(|s| s.default_namespace.as_deref()),
        }
    }

    /// Innermost-first lookup of a prefix binding.
    fn lookup_prefix(&self, prefix: &str) -> Option<&str> {
        let pending = self.pending.iter().map(|p| &p.scope);
        pending
            .chain(self.open.iter().rev())
            .flat_map(|scope| scope.prefixes.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// A prefix currently bound to `namespace`, if it is still in effect.
    fn prefix_for(&self, namespace: &str) -> Option<String> {
        let pending = self.pending.iter().map(|p| &p.scope);
        pending
            .chain(self.open.iter().rev())
            .flat_map(|scope| scope.prefixes.iter().rev())
            .find(|(prefix, uri)| uri == namespace && self.lookup_prefix(prefix) == Some(namespace))
            .map(|(prefix, _)| prefix.clone())
    }

    fn allocate_prefix(&mut self, hint: Option<&str>) -> String {
        if let Some(hint) = hint {
            let usable = !hint.is_empty()
                && !hint.eq_ignore_ascii_case("xml")
                && !hint.eq_ignore_ascii_case("xmlns")
                && self.lookup_prefix(hint).is_none();
            if usable {
                return hint.to_owned();
            }
        }
        loop {
            let candidate = format!("p{}", self.next_prefix);
            self.next_prefix += 1;
            if self.lookup_prefix(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn write_declaration(&mut self) -> Result<()> {
        if self.declaration {
            self.declaration = false;
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        }
        Ok(())
    }

    /// Write the pending start tag, self-closed when `empty`.
    fn flush_pending(&mut self, empty: bool) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        let mut start = BytesStart::new(pending.scope.qname.as_str());
        for (key, value) in &pending.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if empty {
            self.writer.write_event(Event::Empty(start))?;
        } else {
            self.writer.write_event(Event::Start(start))?;
            self.open.push(pending.scope);
        }
        Ok(())
    }
}

impl<W: Write> XmlWrite for QuickXmlWriter<W> {
    fn write_start_element(&mut self, name: &XmlName) -> Result<()> {
        self.write_declaration()?;
        self.flush_pending(false)?;

        let namespace = name.namespace_uri();
        let mut attributes = Vec::new();
        if self.current_default_namespace() != namespace {
            attributes.push(("xmlns".to_owned(), namespace.unwrap_or_default().to_owned()));
        }

        self.pending = Some(PendingStart {
            scope: Scope {
                qname: name.local_name().to_owned(),
                default_namespace: namespace.map(str::to_owned),
                prefixes: Vec::new(),
            },
            attributes,
        });
        Ok(())
    }

    fn write_prefixed_attribute(&mut self, prefix: Option<&str>, name: &XmlName, value: &str) -> Result<()> {
        if self.pending.is_none() {
            return Err(Error::NoOpenElement("attribute"));
        }

        let key = match name.namespace_uri() {
            None => name.local_name().to_owned(),
            Some(XML_NAMESPACE) => format!("xml:{}", name.local_name()),
            Some(namespace) => {
                let prefix = match self.prefix_for(namespace) {
                    Some(prefix) => prefix,
                    None => {
                        let prefix = self.allocate_prefix(prefix);
                        if let Some(pending) = self.pending.as_mut() {
                            pending
                                .attributes
                                .push((format!("xmlns:{prefix}"), namespace.to_owned()));
                            pending.scope.prefixes.push((prefix.clone(), namespace.to_owned()));
                        }
                        prefix
                    }
                };
                format!("{prefix}:{}", name.local_name())
            }
        };

        if let Some(pending) = self.pending.as_mut() {
            pending.attributes.push((key, value.to_owned()));
        }
        Ok(())
    }

    fn write_string(&mut self, text: &str) -> Result<()> {
        if self.depth() == 0 {
            return Err(Error::NoOpenElement("text"));
        }
        if text.is_empty() {
            return Ok(());
        }
        self.flush_pending(false)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn write_cdata(&mut self, text: &str) -> Result<()> {
        if self.depth() == 0 {
            return Err(Error::NoOpenElement("CDATA"));
        }
        self.flush_pending(false)?;
        // `]]>` cannot appear inside a section; end it after `]]` and reopen
        let mut rest = text;
        while let Some(at) = rest.find("]]>") {
            self.writer
                .write_event(Event::CData(BytesCData::new(&rest[..at + 2])))?;
            rest = &rest[at + 2..];
        }
        self.writer.write_event(Event::CData(BytesCData::new(rest)))?;
        Ok(())
    }

    fn write_end_element(&mut self) -> Result<()> {
        if self.pending.is_some() {
            return self.flush_pending(true);
        }
        let scope = self.open.pop().ok_or(Error::NoOpenElement("end element"))?;
        self.writer
            .write_event(Event::End(BytesEnd::new(scope.qname.as_str())))?;
        Ok(())
    }
}
