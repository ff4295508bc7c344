//! Mapping model and schema builder for xbind.
//!
//! A schema is a set of [`ElementMapping`]s, each tying one XML element to one Rust
//! type. Mappings are described with the fluent builders and frozen into a
//! [`SchemaDescription`] that the serializer walks:
//!
//! - [`FluentSchemaDescription`] - builds a whole schema and owns its converters
//! - [`ElementMappingBuilder`] - builds a single root mapping
//! - [`ElementScope`] - the binding methods every element builder shares
//! - [`property!`] - compile-time checked field accessors

mod access;
mod builder;
mod error;
mod property;
mod schema;

pub mod mapping;

pub use access::{Collection, Variant};
pub use builder::{
    ChildElementMappingBuilder, CollectionChildElementMappingBuilder, ElementMappingBuilder, ElementScope,
};
pub use error::{Error, Result};
pub use mapping::{
    AnyAttributeMapping, AnyElementMapping, AttributeMapping, ChildBinding, ChildRef, CollectionBinding,
    ElementBinding, ElementMapping, Mapping, MappingKind, TextContentMapping, TypeInfo,
};
pub use property::Property;
pub use schema::{FluentSchemaDescription, SchemaDescription};
