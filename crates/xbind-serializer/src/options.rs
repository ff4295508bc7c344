//! Serializer configuration.

use xbind_common::{ReaderOptions, WriterOptions};

/// Reader and writer settings used by a [`Serializer`](crate::Serializer).
///
/// ```
/// use xbind_serializer::SerializerOptions;
///
/// let options = SerializerOptions::default().with_indent(2).with_max_depth(64);
/// assert_eq!(options.writer.indent, Some(2));
/// assert_eq!(options.reader.max_depth, Some(64));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerOptions {
    pub reader: ReaderOptions,
    pub writer: WriterOptions,
}

impl SerializerOptions {
    pub fn with_reader(mut self, reader: ReaderOptions) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_writer(mut self, writer: WriterOptions) -> Self {
        self.writer = writer;
        self
    }

    /// Strict well-formedness checks while reading.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.reader = self.reader.with_validation(validate);
        self
    }

    /// Fail documents nested deeper than `max_depth` elements.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.reader = self.reader.with_max_depth(max_depth);
        self
    }

    /// Indent written output by `spaces` per level.
    pub fn with_indent(mut self, spaces: usize) -> Self {
        self.writer = self.writer.with_indent(spaces);
        self
    }

    /// Emit an XML declaration before the root.
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.writer = self.writer.with_declaration(declaration);
        self
    }
}
