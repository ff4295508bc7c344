//! xbind - declarative XML data binding.
//!
//! Describe how XML elements, attributes and text map onto your types with a fluent
//! schema, then read and write documents with a [`Serializer`](serializer::Serializer).
//!
//! # Crates
//!
//! - [`xbind_common`] - XML names, value converters, reader/writer collaborators
//! - [`xbind_schema`] - mapping model and fluent schema builder
//! - [`xbind_serializer`] - schema-driven read and write paths
//!
//! # Example
//!
//! ```
//! use xbind::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Address {
//!     street_name: String,
//!     city: String,
//! }
//!
//! let ns = Namespace::new("http://test.com");
//! let schema = FluentSchemaDescription::new()
//!     .element::<Address>(ns.name("Address"))
//!         .attribute("StreetName", property!(Address, street_name))
//!         .attribute("City", property!(Address, city))
//!     .end_element()
//!     .build()?;
//!
//! let serializer = Serializer::new(schema);
//! let address: Address = serializer
//!     .from_str("<Address xmlns='http://test.com' StreetName='231 Queen Street' City='Auckland'/>")?;
//! assert_eq!(address.city, "Auckland");
//!
//! // a namespace mismatch is a format error
//! let result = serializer.from_str::<Address>("<Address StreetName='231 Queen Street'/>");
//! assert!(matches!(result, Err(xbind::serializer::Error::Format(_))));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use xbind_common as common;
pub use xbind_schema as schema;
pub use xbind_serializer as serializer;

pub use xbind_common::xml_enum;
pub use xbind_schema::property;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use xbind_common::{
        Converter, ConverterTable, Namespace, XmlAttribute, XmlElement, XmlEnum, XmlName, XmlRead, XmlWrite,
    };
    pub use xbind_schema::{Collection, ElementMappingBuilder, ElementScope, FluentSchemaDescription, SchemaDescription, Variant};
    pub use xbind_serializer::{Serializer, SerializerOptions, XmlFormatError};

    pub use crate::{property, xml_enum};
}

// Re-export commonly used types at the crate root
pub use xbind_serializer::Serializer;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
