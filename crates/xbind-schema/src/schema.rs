//! Schema descriptions: the frozen type-to-mapping table and its fluent builder.

use std::any::TypeId;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use tracing::debug;
use xbind_common::{Converter, ConverterTable, XmlEnum, XmlName};

use crate::builder::{Deferred, ElementMappingBuilder};
use crate::mapping::{ElementMapping, Mapping};
use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Immutable table of element mappings keyed by the mapped type.
#[derive(Debug, Default)]
pub struct SchemaDescription {
    mappings: Vec<Arc<ElementMapping>>,
    by_type: FxHashMap<TypeId, usize>,
}

impl SchemaDescription {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping. Each type may be mapped once.
    pub fn add(&mut self, mapping: Arc<ElementMapping>) -> Result<()> {
        let info = mapping.type_info();
        if let Some(&existing) = self.by_type.get(&info.id) {
            return Err(Error::DuplicateType {
                type_name: info.name,
                existing: self.mappings[existing].element_name().clone(),
                element: mapping.element_name().clone(),
            });
        }

        debug!(
            element = %mapping.element_name(),
            type_name = info.name,
            kind = ?mapping.kind(),
            "registered element mapping"
        );
        self.by_type.insert(info.id, self.mappings.len());
        self.mappings.push(mapping);
        Ok(())
    }

    /// The mapping registered for `T`.
    #[inline]
    pub fn try_find_mapping_for_type<T: 'static>(&self) -> Option<&Arc<ElementMapping>> {
        self.find_mapping(TypeId::of::<T>())
    }

    /// The mapping registered for a type id.
    pub fn find_mapping(&self, type_id: TypeId) -> Option<&Arc<ElementMapping>> {
        self.by_type.get(&type_id).map(|&i| &self.mappings[i])
    }

    /// All mappings in registration order.
    pub fn mappings(&self) -> impl Iterator<Item = &Arc<ElementMapping>> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Fluent construction of a [`SchemaDescription`].
///
/// Owns the converter table the schema's bindings resolve against. Each call to
/// [`element`](Self::element) starts a root mapping; `end_element` hands the
/// description back.
///
/// # Example
///
/// ```
/// use xbind_schema::{property, ElementScope, FluentSchemaDescription};
///
/// #[derive(Default)]
/// struct Address {
///     street_name: String,
///     city: String,
/// }
///
/// let schema = FluentSchemaDescription::new()
///     .element::<Address>("{http://test.com}Address")
///         .attribute("StreetName", property!(Address, street_name))
///         .attribute("City", property!(Address, city))
///     .end_element()
///     .build()
///     .unwrap();
///
/// assert!(schema.try_find_mapping_for_type::<Address>().is_some());
/// ```
pub struct FluentSchemaDescription {
    converters: ConverterTable,
    roots: Vec<Deferred<ElementMapping>>,
}

impl Default for FluentSchemaDescription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FluentSchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FluentSchemaDescription")
            .field("converters", &self.converters)
            .field("roots", &self.roots.len())
            .finish()
    }
}

impl FluentSchemaDescription {
    /// A description using the default converters.
    pub fn new() -> Self {
        Self::with_converters(ConverterTable::default())
    }

    /// A description using a caller-supplied converter table.
    pub fn with_converters(converters: ConverterTable) -> Self {
        Self {
            converters,
            roots: Vec::new(),
        }
    }

    /// Register or replace the converter for `P` (and `Option<P>`).
    pub fn converter<P: 'static>(mut self, converter: Converter<P>) -> Self {
        self.converters.register(converter);
        self
    }

    /// Register name-based conversion for an enum.
    pub fn enumeration<E: XmlEnum>(mut self) -> Self {
        self.converters.register_enum::<E>();
        self
    }

    /// The converter table bindings resolve against.
    pub fn converters(&self) -> &ConverterTable {
        &self.converters
    }

    /// Start a root element mapping for `T`.
    pub fn element<T: Default + 'static>(self, name: impl Into<XmlName>) -> ElementMappingBuilder<T, Self> {
        ElementMappingBuilder::with_schema(self, name.into())
    }

    pub(crate) fn push_root(&mut self, root: Deferred<ElementMapping>) {
        self.roots.push(root);
    }

    /// Freeze every root mapping and register it with all nested element mappings.
    pub fn build(self) -> Result<SchemaDescription> {
        let mut schema = SchemaDescription::new();
        for root in self.roots {
            let root = Arc::new(root(&self.converters)?);
            for nested in root.descendants() {
                schema.add(Arc::clone(nested))?;
            }
            schema.add(root)?;
        }

        debug!(mappings = schema.len(), "schema description built");
        Ok(schema)
    }
}
