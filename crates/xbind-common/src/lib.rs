//! Common building blocks for xbind.
//!
//! This crate provides the types shared by the schema and serializer crates:
//!
//! - [`XmlName`] / [`Namespace`] - namespace-qualified XML names
//! - [`Position`] - line/column diagnostics
//! - [`convert`] - the value conversion table ([`Converter`], [`ConverterTable`])
//! - [`XmlElement`] / [`XmlAttribute`] - catch-all capture of unmapped content
//! - [`XmlRead`] / [`XmlWrite`] - cursor and sink interfaces, implemented over
//!   quick-xml by [`QuickXmlReader`] and [`QuickXmlWriter`]

mod error;
mod name;
mod node;
mod position;
mod reader;
mod writer;

pub mod convert;

pub use convert::{ConversionError, Converter, ConverterTable, ReadFn, WriteFn, XmlEnum};
pub use error::{Error, Result};
pub use name::{Namespace, XmlName, XMLNS_NAMESPACE, XML_NAMESPACE};
pub use node::{XmlAttribute, XmlElement, XmlNode};
pub use position::Position;
pub use reader::{QuickXmlReader, ReaderOptions, StartElement, XmlEvent, XmlRead};
pub use writer::{QuickXmlWriter, WriterOptions, XmlWrite};

/// Re-export quick-xml for callers that need lower-level access
pub use quick_xml;
