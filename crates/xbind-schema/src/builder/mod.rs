//! Fluent builders for element mappings.
//!
//! Every element-kind builder implements [`ElementScope`], the shared set of
//! binding methods. Nested builders take ownership of their parent and hand it back
//! from `end_element`, so a whole tree is described in one expression:
//!
//! ```
//! use xbind_schema::{property, ElementMappingBuilder, ElementScope};
//!
//! #[derive(Default)]
//! struct Address {
//!     street_name: String,
//! }
//!
//! #[derive(Default)]
//! struct Person {
//!     id: i32,
//!     address: Option<Address>,
//! }
//!
//! let mapping = ElementMappingBuilder::<Person>::new("{http://test.com}Person")
//!     .attribute("Id", property!(Person, id))
//!     .element("{http://test.com}Address", property!(Person, address))
//!         .attribute("StreetName", property!(Address, street_name))
//!     .end_element()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(mapping.child_elements().len(), 1);
//! ```
//!
//! Bindings are recorded as deferred build steps. Converters are resolved and
//! names are checked for collisions when the root is built, children first.

mod child;
mod collection;
mod element;

use std::any::{type_name, Any};
use std::sync::Arc;

use xbind_common::{Converter, ConverterTable, XmlAttribute, XmlElement, XmlName};

use crate::access::{
    Collection, CollectionMember, ConvertedValue, NodeList, OptionalChild, ValueAccess, Variant,
};
use crate::mapping::{
    AnyAttributeMapping, AnyElementMapping, AttributeMapping, ChildBinding, CollectionBinding,
    ElementBinding, ElementMapping, ElementParts, TextContentMapping, TypeInfo,
};
use crate::{Error, Property, Result};

pub use child::ChildElementMappingBuilder;
pub use collection::CollectionChildElementMappingBuilder;
pub use element::ElementMappingBuilder;

/// A build step run once the converter table is known.
pub(crate) type Deferred<T> = Box<dyn FnOnce(&ConverterTable) -> Result<T>>;

/// Bindings recorded by one element builder.
#[derive(Default)]
pub struct ScopeParts {
    attributes: Vec<Deferred<AttributeMapping>>,
    any_attribute: Option<AnyAttributeMapping>,
    child_elements: Vec<Deferred<Arc<ElementMapping>>>,
    any_element: Option<AnyElementMapping>,
    text_content: Option<Deferred<TextContentMapping>>,
    child_text_elements: Vec<Deferred<TextContentMapping>>,
}

impl ScopeParts {
    /// Run every recorded step and assemble the mapping for `T`.
    pub(crate) fn freeze<T: Default + 'static>(
        self,
        name: XmlName,
        binding: ElementBinding,
        converters: &ConverterTable,
    ) -> Result<ElementMapping> {
        let attributes = run_all(self.attributes, converters)?;
        let child_elements = run_all(self.child_elements, converters)?;
        let child_text_elements = run_all(self.child_text_elements, converters)?;
        let text_content = self.text_content.map(|step| step(converters)).transpose()?;

        ElementMapping::new(ElementParts {
            name,
            type_info: TypeInfo::of::<T>(),
            binding,
            construct: construct::<T>,
            attributes,
            any_attribute: self.any_attribute,
            child_elements,
            any_element: self.any_element,
            text_content,
            child_text_elements,
        })
    }

    /// Defer freezing until the parent is built.
    pub(crate) fn defer<T: Default + 'static>(self, name: XmlName, binding: ElementBinding) -> Deferred<Arc<ElementMapping>> {
        Box::new(move |converters: &ConverterTable| self.freeze::<T>(name, binding, converters).map(Arc::new))
    }
}

fn run_all<T>(steps: Vec<Deferred<T>>, converters: &ConverterTable) -> Result<Vec<T>> {
    steps.into_iter().map(|step| step(converters)).collect()
}

fn construct<T: Default + 'static>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn resolve<C: 'static, P: 'static>(converters: &ConverterTable, property: &'static str) -> Result<Converter<P>> {
    converters
        .converter_for::<P>()
        .ok_or_else(|| Error::NoConverter {
            container: type_name::<C>(),
            property,
            type_name: type_name::<P>(),
        })
}

fn value_access<C: 'static, P: 'static>(property: Property<C, P>, converter: &Converter<P>) -> Box<dyn ValueAccess> {
    Box::new(ConvertedValue::new(property, converter.reader(), converter.writer()))
}

mod sealed {
    /// Access to the bindings a builder records.
    pub trait Scope<T> {
        fn parts_mut(&mut self) -> &mut super::ScopeParts;
    }
}

pub(crate) use sealed::Scope;

/// Binding methods shared by every element builder, where `T` is the element type.
pub trait ElementScope<T: 'static>: Scope<T> + Sized {
    /// Map an attribute to a property, converted with the schema's converter for `P`.
    fn attribute<P: 'static>(mut self, name: impl Into<XmlName>, property: Property<T, P>) -> Self {
        let name = name.into();
        self.parts_mut()
            .attributes
            .push(Box::new(move |converters: &ConverterTable| -> Result<AttributeMapping> {
                let converter = resolve::<T, P>(converters, property.name())?;
                Ok(AttributeMapping::new(
                    name,
                    TypeInfo::of::<T>(),
                    property.name(),
                    value_access(property, &converter),
                ))
            }));
        self
    }

    /// Map an attribute to a property with an explicit converter.
    fn attribute_with<P: 'static>(
        mut self,
        name: impl Into<XmlName>,
        property: Property<T, P>,
        converter: Converter<P>,
    ) -> Self {
        let name = name.into();
        self.parts_mut()
            .attributes
            .push(Box::new(move |_: &ConverterTable| -> Result<AttributeMapping> {
                Ok(AttributeMapping::new(
                    name,
                    TypeInfo::of::<T>(),
                    property.name(),
                    value_access(property, &converter),
                ))
            }));
        self
    }

    /// Map the element's text content to a property.
    ///
    /// # Panics
    ///
    /// Panics if text content is already mapped for this element.
    fn text_content<P: 'static>(mut self, property: Property<T, P>) -> Self {
        let parts = self.parts_mut();
        assert!(
            parts.text_content.is_none(),
            "text content is already mapped for {}",
            type_name::<T>()
        );
        parts.text_content = Some(Box::new(move |converters: &ConverterTable| -> Result<TextContentMapping> {
            let converter = resolve::<T, P>(converters, property.name())?;
            Ok(TextContentMapping::new(
                None,
                TypeInfo::of::<T>(),
                property.name(),
                value_access(property, &converter),
            ))
        }));
        self
    }

    /// Map the element's text content to a property with an explicit converter.
    ///
    /// # Panics
    ///
    /// Panics if text content is already mapped for this element.
    fn text_content_with<P: 'static>(mut self, property: Property<T, P>, converter: Converter<P>) -> Self {
        let parts = self.parts_mut();
        assert!(
            parts.text_content.is_none(),
            "text content is already mapped for {}",
            type_name::<T>()
        );
        parts.text_content = Some(Box::new(move |_: &ConverterTable| -> Result<TextContentMapping> {
            Ok(TextContentMapping::new(
                None,
                TypeInfo::of::<T>(),
                property.name(),
                value_access(property, &converter),
            ))
        }));
        self
    }

    /// Map a text-only child element to a property.
    fn text_element<P: 'static>(mut self, name: impl Into<XmlName>, property: Property<T, P>) -> Self {
        let name = name.into();
        self.parts_mut()
            .child_text_elements
            .push(Box::new(move |converters: &ConverterTable| -> Result<TextContentMapping> {
                let converter = resolve::<T, P>(converters, property.name())?;
                Ok(TextContentMapping::new(
                    Some(name),
                    TypeInfo::of::<T>(),
                    property.name(),
                    value_access(property, &converter),
                ))
            }));
        self
    }

    /// Map a text-only child element to a property with an explicit converter.
    fn text_element_with<P: 'static>(
        mut self,
        name: impl Into<XmlName>,
        property: Property<T, P>,
        converter: Converter<P>,
    ) -> Self {
        let name = name.into();
        self.parts_mut()
            .child_text_elements
            .push(Box::new(move |_: &ConverterTable| -> Result<TextContentMapping> {
                Ok(TextContentMapping::new(
                    Some(name),
                    TypeInfo::of::<T>(),
                    property.name(),
                    value_access(property, &converter),
                ))
            }));
        self
    }

    /// Collect attributes no other binding claims.
    ///
    /// # Panics
    ///
    /// Panics if a catch-all attribute binding already exists for this element.
    fn any_attribute<X>(self, property: Property<T, X>) -> Self
    where
        X: Collection<Member = XmlAttribute>,
    {
        self.any_attribute_with(property, std::convert::identity, XmlAttribute::clone)
    }

    /// Collect unclaimed attributes, converting them to and from a custom member type.
    ///
    /// # Panics
    ///
    /// Panics if a catch-all attribute binding already exists for this element.
    fn any_attribute_with<X, F, G>(mut self, property: Property<T, X>, from_node: F, to_node: G) -> Self
    where
        X: Collection,
        F: Fn(XmlAttribute) -> X::Member + Send + Sync + 'static,
        G: Fn(&X::Member) -> XmlAttribute + Send + Sync + 'static,
    {
        let parts = self.parts_mut();
        assert!(
            parts.any_attribute.is_none(),
            "a catch-all attribute binding already exists for {}",
            type_name::<T>()
        );
        let access = NodeList::<T, X, XmlAttribute>::new(property, Arc::new(from_node), Arc::new(to_node));
        parts.any_attribute = Some(AnyAttributeMapping::new(
            TypeInfo::of::<T>(),
            property.name(),
            Box::new(access),
        ));
        self
    }

    /// Collect child elements no other binding claims.
    ///
    /// # Panics
    ///
    /// Panics if a catch-all element binding already exists for this element.
    fn any_element<X>(self, property: Property<T, X>) -> Self
    where
        X: Collection<Member = XmlElement>,
    {
        self.any_element_with(property, std::convert::identity, XmlElement::clone)
    }

    /// Collect unclaimed child elements, converting them to and from a custom member type.
    ///
    /// # Panics
    ///
    /// Panics if a catch-all element binding already exists for this element.
    fn any_element_with<X, F, G>(mut self, property: Property<T, X>, from_node: F, to_node: G) -> Self
    where
        X: Collection,
        F: Fn(XmlElement) -> X::Member + Send + Sync + 'static,
        G: Fn(&X::Member) -> XmlElement + Send + Sync + 'static,
    {
        let parts = self.parts_mut();
        assert!(
            parts.any_element.is_none(),
            "a catch-all element binding already exists for {}",
            type_name::<T>()
        );
        let access = NodeList::<T, X, XmlElement>::new(property, Arc::new(from_node), Arc::new(to_node));
        parts.any_element = Some(AnyElementMapping::new(
            TypeInfo::of::<T>(),
            property.name(),
            Box::new(access),
        ));
        self
    }

    /// Map a single nested element stored in an optional property.
    fn element<P>(self, name: impl Into<XmlName>, property: Property<T, Option<P>>) -> ChildElementMappingBuilder<T, P, Self>
    where
        P: Default + 'static,
    {
        let binding = ChildBinding::new(
            TypeInfo::of::<T>(),
            property.name(),
            Box::new(OptionalChild::new(property)),
        );
        ChildElementMappingBuilder::new(self, name.into(), ElementBinding::Child(binding))
    }

    /// Map a repeated element whose type is the collection's member type.
    fn collection_element<X>(
        self,
        name: impl Into<XmlName>,
        property: Property<T, X>,
    ) -> CollectionChildElementMappingBuilder<T, X::Member, X::Member, Self>
    where
        X: Collection,
        X::Member: Default,
    {
        self.variant_element::<X::Member, X>(name, property)
    }

    /// Map a repeated element of type `U` stored in a collection of `U`'s variant type.
    ///
    /// Several variant elements may target the same collection; members keep
    /// document order.
    fn variant_element<U, X>(
        self,
        name: impl Into<XmlName>,
        property: Property<T, X>,
    ) -> CollectionChildElementMappingBuilder<T, X::Member, U, Self>
    where
        X: Collection,
        X::Member: Variant<U>,
        U: Default + 'static,
    {
        let binding = CollectionBinding::new(
            TypeInfo::of::<T>(),
            Some(property.name()),
            Box::new(CollectionMember::<T, X, U>::new(Some(property))),
        );
        CollectionChildElementMappingBuilder::new(self, name.into(), ElementBinding::Collection(binding))
    }

    /// Map a repeated element of type `U` appended to the element itself, for elements
    /// whose type is a collection.
    fn member_element<U>(self, name: impl Into<XmlName>) -> CollectionChildElementMappingBuilder<T, T::Member, U, Self>
    where
        T: Collection,
        T::Member: Variant<U>,
        U: Default + 'static,
    {
        let binding = CollectionBinding::new(
            TypeInfo::of::<T>(),
            None,
            Box::new(CollectionMember::<T, T, U>::new(None)),
        );
        CollectionChildElementMappingBuilder::new(self, name.into(), ElementBinding::Collection(binding))
    }
}
