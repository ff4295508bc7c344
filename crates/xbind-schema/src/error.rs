//! Error types for schema construction and bindings.

use thiserror::Error;
use xbind_common::{ConversionError, XmlName};

/// Errors raised while building a schema or applying a binding.
#[derive(Debug, Error)]
pub enum Error {
    /// Two element mappings were registered for the same type.
    #[error("a mapping for {type_name} already exists (element {existing}), cannot also map it to element {element}")]
    DuplicateType {
        type_name: &'static str,
        existing: XmlName,
        element: XmlName,
    },

    /// An element maps the same attribute name twice.
    #[error("element {element} already maps attribute {attribute}")]
    DuplicateAttribute { element: XmlName, attribute: XmlName },

    /// An element maps the same child element name twice, counting child text elements.
    #[error("element {element} already maps child element {child}")]
    DuplicateChildElement { element: XmlName, child: XmlName },

    /// No converter is registered for the type of a bound property.
    #[error("no converter registered for {type_name} (property '{property}' of {container})")]
    NoConverter {
        container: &'static str,
        property: &'static str,
        type_name: &'static str,
    },

    /// A bound value could not be converted.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A binding was handed an object of the wrong type.
    #[error("binding expected a value of type {expected}")]
    TypeMismatch { expected: &'static str },
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, Error>;
