//! Catch-all XML nodes.
//!
//! These types hold content the schema does not describe: unmatched attributes and
//! elements captured by any-attribute and any-element bindings. They are a capture
//! format, not a document model, and only support building, inspecting and writing
//! back what was read.

use crate::writer::XmlWrite;
use crate::{Result, XmlName};

/// A captured attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XmlAttribute {
    /// Resolved attribute name.
    pub name: XmlName,
    /// Prefix the attribute carried in the source document, used as a hint on write.
    pub prefix: Option<String>,
    /// Unescaped value.
    pub value: String,
}

impl XmlAttribute {
    /// Create an attribute without a prefix hint.
    pub fn new(name: impl Into<XmlName>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            value: value.into(),
        }
    }

    /// Set the prefix hint.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Write this attribute onto the writer's open element.
    pub fn write_to<W: XmlWrite + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_prefixed_attribute(self.prefix.as_deref(), &self.name, &self.value)
    }
}

/// A node inside a captured element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
}

/// A captured element with its attributes and content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XmlElement {
    /// Resolved element name.
    pub name: XmlName,
    /// Prefix the element carried in the source document.
    pub prefix: Option<String>,
    /// Attributes in document order, namespace declarations excluded.
    pub attributes: Vec<XmlAttribute>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(name: impl Into<XmlName>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<XmlName>, value: impl Into<String>) -> Self {
        self.attributes.push(XmlAttribute::new(name, value));
        self
    }

    /// Add a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Add a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Value of the attribute with the given name.
    pub fn attribute(&self, name: &XmlName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text of this element and all descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Element(element) => element.collect_text(out),
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
            }
        }
    }

    /// Write this element and its subtree.
    ///
    /// The element prefix is not reused: the writer declares namespaces itself.
    pub fn write_to<W: XmlWrite + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_start_element(&self.name)?;
        for attribute in &self.attributes {
            attribute.write_to(writer)?;
        }
        for node in &self.children {
            match node {
                XmlNode::Element(element) => element.write_to(writer)?,
                XmlNode::Text(text) => writer.write_string(text)?,
                XmlNode::CData(text) => writer.write_cdata(text)?,
            }
        }
        writer.write_end_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_concatenated_depth_first() {
        let element = XmlElement::new("a")
            .with_text("one ")
            .with_child(XmlElement::new("b").with_text("two"))
            .with_text(" three");
        assert_eq!(element.text(), "one two three");
        assert_eq!(element.elements().count(), 1);
    }

    #[test]
    fn test_attribute_lookup_uses_namespace() {
        let element = XmlElement::new("a")
            .with_attribute("{urn:x}id", "1")
            .with_attribute("id", "2");
        assert_eq!(element.attribute(&XmlName::new("urn:x", "id")), Some("1"));
        assert_eq!(element.attribute(&XmlName::local("id")), Some("2"));
        assert_eq!(element.attribute(&XmlName::local("missing")), None);
    }
}
