//! Error types for xbind-common.

use thiserror::Error;

use crate::convert::ConversionError;
use crate::Position;

/// Common error type for XML reading, writing and value conversion.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed XML reported by the tokenizer or writer.
    #[error("XML error{}: {message}", position.map(|p| format!(" at {p}")).unwrap_or_default())]
    Xml {
        message: String,
        position: Option<Position>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A value could not be converted to or from its XML form.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The document ended while an element was still open.
    #[error("unexpected end of document")]
    UnexpectedEof,

    /// An element-level operation was requested while the reader was not on an element.
    #[error("reader is not positioned on an element")]
    NoCurrentElement,

    /// An attribute or text was written outside of an open element.
    #[error("no open element to write {0} into")]
    NoOpenElement(&'static str),
}

impl Error {
    /// Create an XML error with an optional position.
    pub fn xml(message: impl Into<String>, position: Option<Position>) -> Self {
        Self::Xml {
            message: message.into(),
            position,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(io) => Self::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Self::xml(other.to_string(), None),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::xml(error.to_string(), None)
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
