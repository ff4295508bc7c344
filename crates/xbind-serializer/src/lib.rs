//! Schema-driven XML serializer.
//!
//! A [`Serializer`] walks a [`SchemaDescription`] to turn XML into object graphs and
//! back. Unknown content is skipped on read (or captured by catch-all bindings), and
//! documents that do not fit the schema fail with an [`XmlFormatError`] carrying the
//! line and column of the offending node.
//!
//! # Example
//!
//! ```
//! use xbind_schema::{property, ElementScope, FluentSchemaDescription};
//! use xbind_serializer::Serializer;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     id: i32,
//!     first_name: String,
//!     is_enabled: bool,
//! }
//!
//! let schema = FluentSchemaDescription::new()
//!     .element::<Person>("{http://test.com}Person")
//!         .attribute("Id", property!(Person, id))
//!         .attribute("FirstName", property!(Person, first_name))
//!         .text_element("{http://test.com}IsEnabled", property!(Person, is_enabled))
//!     .end_element()
//!     .build()?;
//!
//! let serializer = Serializer::new(schema);
//! let person: Person = serializer.from_str(
//!     "<Person xmlns='http://test.com' Id='123' FirstName='James'><IsEnabled>true</IsEnabled></Person>",
//! )?;
//! assert_eq!(person, Person { id: 123, first_name: "James".into(), is_enabled: true });
//!
//! let xml = serializer.to_string(&person)?;
//! assert_eq!(
//!     xml,
//!     r#"<Person xmlns="http://test.com" Id="123" FirstName="James"><IsEnabled>true</IsEnabled></Person>"#
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod options;
mod read;
mod write;

use std::any::type_name;
use std::io::{Read, Write};
use std::sync::Arc;

use tracing::debug;
use xbind_common::{QuickXmlReader, QuickXmlWriter, XmlEvent, XmlRead, XmlWrite};
use xbind_schema::{ElementMapping, SchemaDescription};

pub use error::{Error, Result, XmlFormatError};
pub use options::SerializerOptions;

/// Reads and writes objects described by a schema.
///
/// Cheap to clone; clones share the schema.
#[derive(Debug, Clone)]
pub struct Serializer {
    schema: Arc<SchemaDescription>,
    options: SerializerOptions,
}

impl Serializer {
    /// Create a serializer with default options.
    pub fn new(schema: impl Into<Arc<SchemaDescription>>) -> Self {
        Self::with_options(schema, SerializerOptions::default())
    }

    pub fn with_options(schema: impl Into<Arc<SchemaDescription>>, options: SerializerOptions) -> Self {
        Self {
            schema: schema.into(),
            options,
        }
    }

    #[inline]
    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }

    #[inline]
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    fn mapping<T: 'static>(&self) -> Result<&ElementMapping> {
        self.schema
            .try_find_mapping_for_type::<T>()
            .map(|mapping| &**mapping)
            .ok_or(Error::UnmappedType {
                type_name: type_name::<T>(),
            })
    }

    /// Write `item` to an XML sink.
    pub fn serialize<T, W>(&self, writer: &mut W, item: &T) -> Result<()>
    where
        T: 'static,
        W: XmlWrite + ?Sized,
    {
        write::write_item(self.mapping::<T>()?, writer, item)
    }

    /// Write `item` as a document to an `io::Write`.
    pub fn serialize_to<T: 'static, W: Write>(&self, output: W, item: &T) -> Result<()> {
        let mut output = self.write_document(output, item)?;
        output.flush().map_err(xbind_common::Error::from)?;
        Ok(())
    }

    /// Write `item` as a document to a string.
    pub fn to_string<T: 'static>(&self, item: &T) -> Result<String> {
        let bytes = self.write_document(Vec::new(), item)?;
        String::from_utf8(bytes).map_err(|e| xbind_common::Error::from(e.utf8_error()).into())
    }

    fn write_document<T: 'static, W: Write>(&self, output: W, item: &T) -> Result<W> {
        let mut writer = QuickXmlWriter::with_options(output, &self.options.writer);
        self.serialize(&mut writer, item)?;
        Ok(writer.into_inner())
    }

    /// Read a `T` from an XML cursor.
    ///
    /// The reader may be positioned before the root; leading non-element nodes are
    /// skipped. On success the reader is left on the root's end tag.
    pub fn deserialize<T, R>(&self, reader: &mut R) -> Result<T>
    where
        T: 'static,
        R: XmlRead + ?Sized,
    {
        let mapping = self.mapping::<T>()?;
        while !matches!(reader.node(), XmlEvent::StartElement(_)) {
            if !reader.read()? {
                return Err(Error::format(
                    format!("expected element <{}>, found end of document", mapping.element_name().local_name()),
                    reader.position(),
                ));
            }
        }

        debug!(element = %mapping.element_name(), type_name = type_name::<T>(), "deserializing");
        let item = read::read_item(mapping, reader, 1, &self.options.reader)?;
        item.downcast::<T>().map(|item| *item).map_err(|_| {
            xbind_schema::Error::TypeMismatch {
                expected: type_name::<T>(),
            }
            .into()
        })
    }

    /// Read a `T` from a document held in memory.
    pub fn from_slice<T: 'static>(&self, input: &[u8]) -> Result<T> {
        let mut reader = QuickXmlReader::with_options(input, &self.options.reader);
        let item = self.deserialize(&mut reader)?;
        if self.options.reader.validate {
            // drain so trailing content is checked too
            while reader.read()? {}
        }
        Ok(item)
    }

    pub fn from_str<T: 'static>(&self, input: &str) -> Result<T> {
        self.from_slice(input.as_bytes())
    }

    /// Read a `T` from an `io::Read`. The whole input is buffered first.
    pub fn from_reader<T: 'static, R: Read>(&self, mut input: R) -> Result<T> {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).map_err(xbind_common::Error::from)?;
        self.from_slice(&buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbind_schema::{property, ElementScope, FluentSchemaDescription};

    #[derive(Debug, Default, PartialEq)]
    struct Counter {
        value: i32,
    }

    #[derive(Debug, Default)]
    struct Unmapped;

    fn serializer(options: SerializerOptions) -> Serializer {
        let schema = FluentSchemaDescription::new()
            .element::<Counter>("Counter")
                .attribute("Value", property!(Counter, value))
            .end_element()
            .build()
            .unwrap();
        Serializer::with_options(schema, options)
    }

    #[test]
    fn test_serializer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Serializer>();
    }

    #[test]
    fn test_unmapped_type() {
        let serializer = serializer(SerializerOptions::default());
        assert!(matches!(serializer.to_string(&Unmapped), Err(Error::UnmappedType { .. })));
        assert!(matches!(
            serializer.from_str::<Unmapped>("<Unmapped/>"),
            Err(Error::UnmappedType { .. })
        ));
    }

    #[test]
    fn test_leading_nodes_are_skipped() {
        let serializer = serializer(SerializerOptions::default());
        let counter: Counter = serializer
            .from_str("<?xml version=\"1.0\"?>\n<!-- hello -->\n<Counter Value=\"5\"/>")
            .unwrap();
        assert_eq!(counter.value, 5);
    }

    #[test]
    fn test_missing_root_is_a_format_error() {
        let serializer = serializer(SerializerOptions::default());
        let error = serializer.from_str::<Counter>("<!-- nothing -->").unwrap_err();
        assert!(matches!(error, Error::Format(_)));
    }

    #[test]
    fn test_validation_checks_trailing_content() {
        let input = "<Counter Value=\"1\"/><Counter Value=\"2\"/>";
        assert!(serializer(SerializerOptions::default()).from_str::<Counter>(input).is_ok());
        let strict = serializer(SerializerOptions::default().with_validation(true));
        assert!(strict.from_str::<Counter>(input).is_err());
    }

    #[test]
    fn test_declaration_and_from_reader() {
        let serializer = serializer(SerializerOptions::default().with_declaration(true));
        let mut output = Vec::new();
        serializer.serialize_to(&mut output, &Counter { value: -3 }).unwrap();
        let xml = String::from_utf8(output).unwrap();
        assert_eq!(xml, "<?xml version=\"1.0\" encoding=\"utf-8\"?><Counter Value=\"-3\"/>");

        let counter: Counter = serializer.from_reader(xml.as_bytes()).unwrap();
        assert_eq!(counter, Counter { value: -3 });
    }
}
