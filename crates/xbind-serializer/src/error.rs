//! Error types for serialization and deserialization.

use std::fmt;

use thiserror::Error;
use xbind_common::Position;

/// The document does not fit the schema, or a value in it does not convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlFormatError {
    pub message: String,
    pub position: Option<Position>,
}

impl XmlFormatError {
    pub fn new(message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for XmlFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} {}", position, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for XmlFormatError {}

/// Errors that can occur while reading or writing mapped objects.
#[derive(Debug, Error)]
pub enum Error {
    /// Reader, writer or conversion error.
    #[error("{0}")]
    Common(#[from] xbind_common::Error),

    /// Binding error.
    #[error("{0}")]
    Schema(#[from] xbind_schema::Error),

    /// The document does not match the mapping.
    #[error("{0}")]
    Format(#[from] XmlFormatError),

    /// No root mapping exists for the requested type.
    #[error("no element mapping is registered for type {type_name}")]
    UnmappedType { type_name: &'static str },

    /// A collection member has a type no collection mapping claims.
    #[error("no collection element mapping claims a member of {type_name}")]
    UnmappedMember { type_name: &'static str },
}

impl Error {
    pub(crate) fn format(message: impl Into<String>, position: Option<Position>) -> Self {
        Self::Format(XmlFormatError::new(message, position))
    }
}

/// Result type for serializer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let error = XmlFormatError::new("unexpected element", Some(Position::new(3, 7)));
        assert_eq!(error.to_string(), "(3,7) unexpected element");
        assert_eq!(XmlFormatError::new("oops", None).to_string(), "oops");
    }
}
