//! Builder for root element mappings.

use std::marker::PhantomData;

use xbind_common::{ConverterTable, XmlName};

use super::{ElementScope, Scope, ScopeParts};
use crate::mapping::{ElementBinding, ElementMapping};
use crate::schema::FluentSchemaDescription;
use crate::Result;

/// Builds the mapping of a root element of type `T`.
///
/// Standalone builders (`S = ()`) are finished with [`build`](Self::build). Builders
/// created by [`FluentSchemaDescription::element`] return to the description with
/// [`end_element`](ElementMappingBuilder::end_element).
#[must_use = "finish the mapping with `build` or `end_element`"]
pub struct ElementMappingBuilder<T, S = ()> {
    schema: S,
    name: XmlName,
    parts: ScopeParts,
    _type: PhantomData<fn() -> T>,
}

impl<T: Default + 'static> ElementMappingBuilder<T> {
    /// Start a standalone mapping for an element with the given name.
    pub fn new(name: impl Into<XmlName>) -> Self {
        Self::with_schema((), name.into())
    }

    /// Build the mapping with the default converters.
    pub fn build(self) -> Result<ElementMapping> {
        self.build_with(&ConverterTable::default())
    }

    /// Build the mapping, resolving value converters from `converters`.
    pub fn build_with(self, converters: &ConverterTable) -> Result<ElementMapping> {
        self.parts.freeze::<T>(self.name, ElementBinding::Root, converters)
    }
}

impl<T: Default + 'static> ElementMappingBuilder<T, FluentSchemaDescription> {
    /// Register this mapping with the schema description and continue with it.
    pub fn end_element(self) -> FluentSchemaDescription {
        let Self {
            mut schema,
            name,
            parts,
            ..
        } = self;
        schema.push_root(Box::new(move |converters: &ConverterTable| {
            parts.freeze::<T>(name, ElementBinding::Root, converters)
        }));
        schema
    }
}

impl<T, S> ElementMappingBuilder<T, S> {
    pub(crate) fn with_schema(schema: S, name: XmlName) -> Self {
        Self {
            schema,
            name,
            parts: ScopeParts::default(),
            _type: PhantomData,
        }
    }
}

impl<T: 'static, S> Scope<T> for ElementMappingBuilder<T, S> {
    fn parts_mut(&mut self) -> &mut ScopeParts {
        &mut self.parts
    }
}

impl<T: 'static, S> ElementScope<T> for ElementMappingBuilder<T, S> {}
