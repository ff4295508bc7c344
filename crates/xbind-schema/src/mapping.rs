//! The mapping node model.
//!
//! An [`ElementMapping`] describes how one element maps to one type: its attribute
//! mappings, text bindings, nested element mappings and catch-all bindings. Mappings
//! are immutable once built. Lookup indices over attribute and child names are
//! computed at construction, which is also where name collisions are rejected.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use xbind_common::{XmlAttribute, XmlElement, XmlName};

use crate::access::{ChildAccess, CollectionAccess, NodeAccess, ValueAccess};
use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// The kind of a mapping node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    RootElement,
    ChildElement,
    CollectionChildElement,
    Attribute,
    TextContent,
    ChildTextElement,
    AnyAttribute,
    AnyElement,
}

/// Identity of a bound Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeInfo {
    /// Type information for `T`.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Capabilities shared by every mapping node.
pub trait Mapping {
    fn kind(&self) -> MappingKind;

    /// The element's own type for element mappings, the container type otherwise.
    fn type_info(&self) -> TypeInfo;

    /// XML name, absent for catch-all bindings and un-named text content.
    fn name(&self) -> Option<&XmlName>;

    fn local_name(&self) -> Option<&str> {
        self.name().map(XmlName::local_name)
    }

    fn namespace_uri(&self) -> Option<&str> {
        self.name().and_then(XmlName::namespace_uri)
    }
}

/// One attribute bound to one property.
pub struct AttributeMapping {
    name: XmlName,
    container: TypeInfo,
    property: &'static str,
    access: Box<dyn ValueAccess>,
}

impl AttributeMapping {
    pub(crate) fn new(
        name: XmlName,
        container: TypeInfo,
        property: &'static str,
        access: Box<dyn ValueAccess>,
    ) -> Self {
        Self {
            name,
            container,
            property,
            access,
        }
    }

    #[inline]
    pub fn attribute_name(&self) -> &XmlName {
        &self.name
    }

    /// Name of the bound property.
    pub fn property_name(&self) -> &'static str {
        self.property
    }

    /// Convert `text` and store it on the container.
    pub fn set_value_from_xml(&self, container: &mut dyn Any, text: &str) -> Result<()> {
        self.access.set_from_xml(container, text)
    }

    /// The property value in XML form, `None` when it is absent.
    pub fn value_in_xml_form(&self, container: &dyn Any) -> Result<Option<String>> {
        self.access.to_xml(container)
    }
}

impl Mapping for AttributeMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Attribute
    }

    fn type_info(&self) -> TypeInfo {
        self.container
    }

    fn name(&self) -> Option<&XmlName> {
        Some(&self.name)
    }
}

impl fmt::Debug for AttributeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMapping")
            .field("name", &self.name)
            .field("container", &self.container.name)
            .field("property", &self.property)
            .finish()
    }
}

/// Text bound to a property: the element's own text content, or the whole text of
/// a named child element.
pub struct TextContentMapping {
    name: Option<XmlName>,
    container: TypeInfo,
    property: &'static str,
    access: Box<dyn ValueAccess>,
}

impl TextContentMapping {
    pub(crate) fn new(
        name: Option<XmlName>,
        container: TypeInfo,
        property: &'static str,
        access: Box<dyn ValueAccess>,
    ) -> Self {
        Self {
            name,
            container,
            property,
            access,
        }
    }

    pub fn property_name(&self) -> &'static str {
        self.property
    }

    pub fn set_value_from_xml(&self, container: &mut dyn Any, text: &str) -> Result<()> {
        self.access.set_from_xml(container, text)
    }

    pub fn value_in_xml_form(&self, container: &dyn Any) -> Result<Option<String>> {
        self.access.to_xml(container)
    }
}

impl Mapping for TextContentMapping {
    fn kind(&self) -> MappingKind {
        if self.name.is_some() {
            MappingKind::ChildTextElement
        } else {
            MappingKind::TextContent
        }
    }

    fn type_info(&self) -> TypeInfo {
        self.container
    }

    fn name(&self) -> Option<&XmlName> {
        self.name.as_ref()
    }
}

impl fmt::Debug for TextContentMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextContentMapping")
            .field("name", &self.name)
            .field("container", &self.container.name)
            .field("property", &self.property)
            .finish()
    }
}

/// Catch-all for attributes no attribute mapping claims.
pub struct AnyAttributeMapping {
    container: TypeInfo,
    property: &'static str,
    access: Box<dyn NodeAccess<XmlAttribute>>,
}

impl AnyAttributeMapping {
    pub(crate) fn new(container: TypeInfo, property: &'static str, access: Box<dyn NodeAccess<XmlAttribute>>) -> Self {
        Self {
            container,
            property,
            access,
        }
    }

    pub fn property_name(&self) -> &'static str {
        self.property
    }

    /// Append a captured attribute to the container.
    pub fn add_attribute(&self, container: &mut dyn Any, attribute: XmlAttribute) -> Result<()> {
        self.access.add(container, attribute)
    }

    /// The captured attributes stored on the container.
    pub fn attributes(&self, container: &dyn Any) -> Result<Vec<XmlAttribute>> {
        self.access.nodes(container)
    }
}

impl Mapping for AnyAttributeMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::AnyAttribute
    }

    fn type_info(&self) -> TypeInfo {
        self.container
    }

    fn name(&self) -> Option<&XmlName> {
        None
    }
}

impl fmt::Debug for AnyAttributeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyAttributeMapping")
            .field("container", &self.container.name)
            .field("property", &self.property)
            .finish()
    }
}

/// Catch-all for child elements no element mapping claims.
pub struct AnyElementMapping {
    container: TypeInfo,
    property: &'static str,
    access: Box<dyn NodeAccess<XmlElement>>,
}

impl AnyElementMapping {
    pub(crate) fn new(container: TypeInfo, property: &'static str, access: Box<dyn NodeAccess<XmlElement>>) -> Self {
        Self {
            container,
            property,
            access,
        }
    }

    pub fn property_name(&self) -> &'static str {
        self.property
    }

    /// Append a captured element to the container.
    pub fn add_element(&self, container: &mut dyn Any, element: XmlElement) -> Result<()> {
        self.access.add(container, element)
    }

    /// The captured elements stored on the container.
    pub fn elements(&self, container: &dyn Any) -> Result<Vec<XmlElement>> {
        self.access.nodes(container)
    }
}

impl Mapping for AnyElementMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::AnyElement
    }

    fn type_info(&self) -> TypeInfo {
        self.container
    }

    fn name(&self) -> Option<&XmlName> {
        None
    }
}

impl fmt::Debug for AnyElementMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyElementMapping")
            .field("container", &self.container.name)
            .field("property", &self.property)
            .finish()
    }
}

/// Binding of a single nested element to an `Option<P>` field of its container.
pub struct ChildBinding {
    container: TypeInfo,
    property: &'static str,
    access: Box<dyn ChildAccess>,
}

impl ChildBinding {
    pub(crate) fn new(container: TypeInfo, property: &'static str, access: Box<dyn ChildAccess>) -> Self {
        Self {
            container,
            property,
            access,
        }
    }

    pub fn container(&self) -> TypeInfo {
        self.container
    }

    pub fn property_name(&self) -> &'static str {
        self.property
    }

    /// Store a read element on its container.
    pub fn set_on_container(&self, container: &mut dyn Any, child: Box<dyn Any>) -> Result<()> {
        self.access.set(container, child)
    }

    /// The element stored on the container, if set.
    pub fn get_from_container<'a>(&self, container: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
        self.access.get(container)
    }
}

/// Binding of a repeated element to a collection.
pub struct CollectionBinding {
    container: TypeInfo,
    property: Option<&'static str>,
    access: Box<dyn CollectionAccess>,
}

impl CollectionBinding {
    pub(crate) fn new(container: TypeInfo, property: Option<&'static str>, access: Box<dyn CollectionAccess>) -> Self {
        Self {
            container,
            property,
            access,
        }
    }

    pub fn container(&self) -> TypeInfo {
        self.container
    }

    /// Name of the collection property, `None` when the container is the collection.
    pub fn property_name(&self) -> Option<&'static str> {
        self.property
    }

    /// The collection's member type.
    pub fn member_type(&self) -> TypeInfo {
        self.access.member_type()
    }

    /// Wrap a read element as a member and append it.
    pub fn add_to_collection(&self, container: &mut dyn Any, item: Box<dyn Any>) -> Result<()> {
        self.access.add(container, item)
    }

    /// Identity of the backing collection, equal for every binding that targets it.
    pub fn collection_id(&self, container: &dyn Any) -> Result<usize> {
        self.access.identity(container)
    }

    pub fn collection_members<'a>(&self, container: &'a dyn Any) -> Result<Vec<&'a dyn Any>> {
        self.access.members(container)
    }

    /// The element this binding would write for `member`, if it claims it.
    pub fn project_member<'a>(&self, member: &'a dyn Any) -> Option<&'a dyn Any> {
        self.access.project(member)
    }
}

/// How an element mapping is attached to its container.
pub enum ElementBinding {
    /// A document root.
    Root,
    Child(ChildBinding),
    Collection(CollectionBinding),
}

impl fmt::Debug for ElementBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Child(binding) => write!(f, "Child({}.{})", binding.container, binding.property),
            Self::Collection(binding) => match binding.property {
                Some(property) => write!(f, "Collection({}.{})", binding.container, property),
                None => write!(f, "Collection({})", binding.container),
            },
        }
    }
}

/// Entry of the child lookup index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    Element(usize),
    Text(usize),
}

/// Result of a child lookup.
#[derive(Debug, Clone, Copy)]
pub enum ChildRef<'a> {
    Element(&'a Arc<ElementMapping>),
    Text(&'a TextContentMapping),
}

/// The parts an element mapping is assembled from.
pub(crate) struct ElementParts {
    pub name: XmlName,
    pub type_info: TypeInfo,
    pub binding: ElementBinding,
    pub construct: fn() -> Box<dyn Any>,
    pub attributes: Vec<AttributeMapping>,
    pub any_attribute: Option<AnyAttributeMapping>,
    pub child_elements: Vec<Arc<ElementMapping>>,
    pub any_element: Option<AnyElementMapping>,
    pub text_content: Option<TextContentMapping>,
    pub child_text_elements: Vec<TextContentMapping>,
}

/// Mapping between an element and a type.
pub struct ElementMapping {
    name: XmlName,
    type_info: TypeInfo,
    binding: ElementBinding,
    construct: fn() -> Box<dyn Any>,
    attributes: Vec<AttributeMapping>,
    any_attribute: Option<AnyAttributeMapping>,
    child_elements: Vec<Arc<ElementMapping>>,
    any_element: Option<AnyElementMapping>,
    text_content: Option<TextContentMapping>,
    child_text_elements: Vec<TextContentMapping>,
    attribute_index: FxHashMap<XmlName, usize>,
    element_index: FxHashMap<XmlName, ChildSlot>,
    collection_table: Vec<Arc<ElementMapping>>,
}

impl ElementMapping {
    /// Assemble a mapping, indexing attribute and child names.
    pub(crate) fn new(parts: ElementParts) -> Result<Self> {
        let mut attribute_index = FxHashMap::default();
        for (i, attribute) in parts.attributes.iter().enumerate() {
            if attribute_index.insert(attribute.name.clone(), i).is_some() {
                return Err(Error::DuplicateAttribute {
                    element: parts.name,
                    attribute: attribute.name.clone(),
                });
            }
        }

        let mut element_index = FxHashMap::default();
        let element_slots = parts
            .child_elements
            .iter()
            .enumerate()
            .map(|(i, child)| (&child.name, ChildSlot::Element(i)));
        let text_slots = parts
            .child_text_elements
            .iter()
            .enumerate()
            .filter_map(|(i, text)| text.name.as_ref().map(|name| (name, ChildSlot::Text(i))));
        for (name, slot) in element_slots.chain(text_slots) {
            if element_index.insert(name.clone(), slot).is_some() {
                return Err(Error::DuplicateChildElement {
                    element: parts.name,
                    child: name.clone(),
                });
            }
        }

        let mut collection_table: Vec<Arc<ElementMapping>> = Vec::new();
        for child in &parts.child_elements {
            if matches!(child.binding, ElementBinding::Collection(_))
                && !collection_table.iter().any(|m| m.type_info.id == child.type_info.id)
            {
                collection_table.push(Arc::clone(child));
            }
        }

        Ok(Self {
            name: parts.name,
            type_info: parts.type_info,
            binding: parts.binding,
            construct: parts.construct,
            attributes: parts.attributes,
            any_attribute: parts.any_attribute,
            child_elements: parts.child_elements,
            any_element: parts.any_element,
            text_content: parts.text_content,
            child_text_elements: parts.child_text_elements,
            attribute_index,
            element_index,
            collection_table,
        })
    }

    /// The element name.
    #[inline]
    pub fn element_name(&self) -> &XmlName {
        &self.name
    }

    #[inline]
    pub fn binding(&self) -> &ElementBinding {
        &self.binding
    }

    /// A new default instance of the mapped type.
    #[inline]
    pub fn create_instance(&self) -> Box<dyn Any> {
        (self.construct)()
    }

    pub fn attributes(&self) -> &[AttributeMapping] {
        &self.attributes
    }

    pub fn any_attribute(&self) -> Option<&AnyAttributeMapping> {
        self.any_attribute.as_ref()
    }

    /// Nested element mappings in declaration order.
    pub fn child_elements(&self) -> &[Arc<ElementMapping>] {
        &self.child_elements
    }

    pub fn any_element(&self) -> Option<&AnyElementMapping> {
        self.any_element.as_ref()
    }

    pub fn text_content(&self) -> Option<&TextContentMapping> {
        self.text_content.as_ref()
    }

    pub fn child_text_elements(&self) -> &[TextContentMapping] {
        &self.child_text_elements
    }

    /// Collection child mappings, one per element type, first declared wins.
    pub fn collection_table(&self) -> &[Arc<ElementMapping>] {
        &self.collection_table
    }

    /// Whether this element's namespace and local name match `name`. An element
    /// mapped without a namespace matches on the local name alone.
    pub fn matches(&self, name: &XmlName) -> bool {
        self.name.local_name() == name.local_name()
            && (!self.name.has_namespace() || self.name.namespace_uri() == name.namespace_uri())
    }

    pub fn find_attribute(&self, name: &XmlName) -> Option<&AttributeMapping> {
        self.attribute_index.get(name).map(|&i| &self.attributes[i])
    }

    pub fn find_child(&self, name: &XmlName) -> Option<ChildRef<'_>> {
        match self.element_index.get(name)? {
            ChildSlot::Element(i) => Some(ChildRef::Element(&self.child_elements[*i])),
            ChildSlot::Text(i) => Some(ChildRef::Text(&self.child_text_elements[*i])),
        }
    }

    pub fn find_child_element(&self, name: &XmlName) -> Option<&Arc<ElementMapping>> {
        match self.find_child(name)? {
            ChildRef::Element(mapping) => Some(mapping),
            ChildRef::Text(_) => None,
        }
    }

    pub fn find_child_text_element(&self, name: &XmlName) -> Option<&TextContentMapping> {
        match self.find_child(name)? {
            ChildRef::Text(mapping) => Some(mapping),
            ChildRef::Element(_) => None,
        }
    }

    /// Every nested element mapping below this one, depth-first in declaration order.
    pub fn descendants(&self) -> Vec<&Arc<ElementMapping>> {
        let mut out = Vec::new();
        for child in &self.child_elements {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }
}

impl Mapping for ElementMapping {
    fn kind(&self) -> MappingKind {
        match self.binding {
            ElementBinding::Root => MappingKind::RootElement,
            ElementBinding::Child(_) => MappingKind::ChildElement,
            ElementBinding::Collection(_) => MappingKind::CollectionChildElement,
        }
    }

    fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    fn name(&self) -> Option<&XmlName> {
        Some(&self.name)
    }
}

impl fmt::Debug for ElementMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementMapping")
            .field("name", &self.name)
            .field("type", &self.type_info.name)
            .field("binding", &self.binding)
            .field("attributes", &self.attributes)
            .field("any_attribute", &self.any_attribute)
            .field("text_content", &self.text_content)
            .field("child_text_elements", &self.child_text_elements)
            .field("child_elements", &self.child_elements)
            .field("any_element", &self.any_element)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{property, ElementMappingBuilder, ElementScope, Variant};

    #[derive(Debug, Default)]
    struct Line {
        text: String,
    }

    #[derive(Debug, Default)]
    struct Heading {
        text: String,
    }

    #[derive(Debug)]
    enum Block {
        Line(Line),
        Heading(Heading),
    }

    impl Variant<Line> for Block {
        fn wrap(value: Line) -> Self {
            Block::Line(value)
        }
        fn peek(&self) -> Option<&Line> {
            match self {
                Block::Line(line) => Some(line),
                _ => None,
            }
        }
    }

    impl Variant<Heading> for Block {
        fn wrap(value: Heading) -> Self {
            Block::Heading(value)
        }
        fn peek(&self) -> Option<&Heading> {
            match self {
                Block::Heading(heading) => Some(heading),
                _ => None,
            }
        }
    }

    #[derive(Debug, Default)]
    struct Page {
        number: u32,
        title: String,
        blocks: Vec<Block>,
        notes: Vec<Block>,
    }

    #[test]
    fn test_duplicate_attribute() {
        let result = ElementMappingBuilder::<Page>::new("Page")
            .attribute("Number", property!(Page, number))
            .attribute("Number", property!(Page, number))
            .build();
        assert!(matches!(result, Err(Error::DuplicateAttribute { .. })));
    }

    #[test]
    fn test_child_and_text_element_names_collide() {
        let result = ElementMappingBuilder::<Page>::new("Page")
            .text_element("Title", property!(Page, title))
            .variant_element::<Line, _>("Title", property!(Page, blocks))
                .text_content(property!(Line, text))
            .end_element()
            .build();
        match result {
            Err(Error::DuplicateChildElement { child, .. }) => assert_eq!(child.local_name(), "Title"),
            other => panic!("expected duplicate child error, got {other:?}"),
        }
    }

    #[test]
    fn test_lookups_use_exact_names() {
        let mapping = ElementMappingBuilder::<Page>::new("{urn:book}Page")
            .attribute("Number", property!(Page, number))
            .text_element("{urn:book}Title", property!(Page, title))
            .variant_element::<Line, _>("{urn:book}Line", property!(Page, blocks))
                .text_content(property!(Line, text))
            .end_element()
            .build()
            .unwrap();

        assert_eq!(mapping.kind(), MappingKind::RootElement);
        assert_eq!(mapping.find_attribute(&"Number".into()).unwrap().property_name(), "number");
        assert!(mapping.find_attribute(&"{urn:book}Number".into()).is_none());

        let title = XmlName::new("urn:book", "Title");
        assert!(matches!(mapping.find_child(&title), Some(ChildRef::Text(_))));
        assert!(mapping.find_child_element(&title).is_none());
        assert!(mapping.find_child_text_element(&"Title".into()).is_none());

        let line = mapping.find_child_element(&XmlName::new("urn:book", "Line")).unwrap();
        assert_eq!(line.kind(), MappingKind::CollectionChildElement);
        assert_eq!(line.text_content().unwrap().kind(), MappingKind::TextContent);
    }

    #[test]
    fn test_matches_ignores_namespace_only_when_unmapped() {
        let qualified = ElementMappingBuilder::<Line>::new("{urn:book}Line").build().unwrap();
        assert!(qualified.matches(&XmlName::new("urn:book", "Line")));
        assert!(!qualified.matches(&XmlName::new("urn:other", "Line")));
        assert!(!qualified.matches(&XmlName::local("Line")));

        let plain = ElementMappingBuilder::<Line>::new("Line").build().unwrap();
        assert!(plain.matches(&XmlName::new("urn:other", "Line")));
        assert!(!plain.matches(&XmlName::local("Heading")));
    }

    #[test]
    fn test_collection_table_keeps_first_mapping_per_type() {
        let mapping = ElementMappingBuilder::<Page>::new("Page")
            .variant_element::<Line, _>("Line", property!(Page, blocks))
                .text_content(property!(Line, text))
            .end_element()
            .variant_element::<Heading, _>("Heading", property!(Page, blocks))
                .text_content(property!(Heading, text))
            .end_element()
            .variant_element::<Line, _>("Note", property!(Page, notes))
                .text_content(property!(Line, text))
            .end_element()
            .build()
            .unwrap();

        let table: Vec<_> = mapping
            .collection_table()
            .iter()
            .map(|m| m.element_name().local_name())
            .collect();
        assert_eq!(table, ["Line", "Heading"]);
        assert_eq!(mapping.child_elements().len(), 3);
        assert_eq!(mapping.descendants().len(), 3);
    }

    #[test]
    fn test_collection_binding_projects_members() {
        let mapping = ElementMappingBuilder::<Page>::new("Page")
            .variant_element::<Line, _>("Line", property!(Page, blocks))
            .end_element()
            .variant_element::<Heading, _>("Heading", property!(Page, blocks))
            .end_element()
            .build()
            .unwrap();

        let page = Page {
            blocks: vec![Block::Heading(Heading::default()), Block::Line(Line::default())],
            ..Page::default()
        };
        let bindings: Vec<_> = mapping
            .child_elements()
            .iter()
            .map(|child| match child.binding() {
                ElementBinding::Collection(binding) => binding,
                other => panic!("unexpected binding {other:?}"),
            })
            .collect();

        assert_eq!(
            bindings[0].collection_id(&page).unwrap(),
            bindings[1].collection_id(&page).unwrap()
        );
        assert_eq!(bindings[0].member_type(), TypeInfo::of::<Block>());
        let members = bindings[0].collection_members(&page).unwrap();
        assert!(bindings[0].project_member(members[0]).is_none());
        assert!(bindings[1].project_member(members[0]).is_some());
        assert!(bindings[0].project_member(members[1]).is_some());
    }
}
