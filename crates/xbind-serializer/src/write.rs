//! Write path: object graph to XML sink.

use std::any::{Any, TypeId};
use std::hash::BuildHasherDefault;

use hashbrown::HashSet as FastHashSet;
use rustc_hash::FxHasher;
use xbind_common::XmlWrite;
use xbind_schema::{CollectionBinding, ElementBinding, ElementMapping, Mapping};

use crate::{Error, Result};

type FxHashSet<T> = FastHashSet<T, BuildHasherDefault<FxHasher>>;

/// A backing collection: its address and member type.
type CollectionKey = (usize, TypeId);

/// Write `item` as the element described by `mapping`.
pub(crate) fn write_item<W>(mapping: &ElementMapping, writer: &mut W, item: &dyn Any) -> Result<()>
where
    W: XmlWrite + ?Sized,
{
    writer.write_start_element(mapping.element_name())?;

    for attribute in mapping.attributes() {
        if let Some(value) = attribute.value_in_xml_form(item)? {
            writer.write_attribute(attribute.attribute_name(), &value)?;
        }
    }

    if let Some(any_attribute) = mapping.any_attribute() {
        for attribute in any_attribute.attributes(item)? {
            attribute.write_to(writer)?;
        }
    }

    if let Some(text_content) = mapping.text_content() {
        if let Some(value) = text_content.value_in_xml_form(item)? {
            writer.write_string(&value)?;
        }
    }

    for text_element in mapping.child_text_elements() {
        if let (Some(name), Some(value)) = (text_element.name(), text_element.value_in_xml_form(item)?) {
            writer.write_element_string(name, &value)?;
        }
    }

    let mut written: FxHashSet<CollectionKey> = FxHashSet::default();
    for child in mapping.child_elements() {
        match child.binding() {
            ElementBinding::Collection(binding) => {
                let key = collection_key(binding, item)?;
                if !written.insert(key) {
                    continue;
                }
                for member in binding.collection_members(item)? {
                    let (member_mapping, element) =
                        claim(mapping, child, item, key, member)?.ok_or_else(|| Error::UnmappedMember {
                            type_name: binding.member_type().name,
                        })?;
                    write_item(member_mapping, writer, element)?;
                }
            }
            ElementBinding::Child(binding) => {
                if let Some(child_item) = binding.get_from_container(item)? {
                    write_item(child, writer, child_item)?;
                }
            }
            ElementBinding::Root => {}
        }
    }

    if let Some(any_element) = mapping.any_element() {
        for element in any_element.elements(item)? {
            writer.write_node(&element)?;
        }
    }

    writer.write_end_element()?;
    Ok(())
}

fn collection_key(binding: &CollectionBinding, item: &dyn Any) -> Result<CollectionKey> {
    Ok((binding.collection_id(item)?, binding.member_type().id))
}

/// The first mapping that claims `member`: the mapping being iterated, then the
/// parent's per-type collection table, then every collection mapping of the parent
/// in declaration order. Only mappings onto the same backing collection count.
///
/// The per-type table keeps one mapping per element type across all collections,
/// so a second collection reusing those types is only reached by the last step.
fn claim<'m, 'a>(
    parent: &'m ElementMapping,
    first: &'m ElementMapping,
    item: &dyn Any,
    key: CollectionKey,
    member: &'a dyn Any,
) -> Result<Option<(&'m ElementMapping, &'a dyn Any)>> {
    let candidates = std::iter::once(first)
        .chain(parent.collection_table().iter().map(|m| &**m))
        .chain(parent.child_elements().iter().map(|m| &**m));
    for candidate in candidates {
        let ElementBinding::Collection(binding) = candidate.binding() else {
            continue;
        };
        if collection_key(binding, item)? != key {
            continue;
        }
        if let Some(element) = binding.project_member(member) {
            return Ok(Some((candidate, element)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::read_item;
    use xbind_common::{QuickXmlReader, QuickXmlWriter, ReaderOptions, XmlAttribute, XmlRead};
    use xbind_schema::{property, ElementMappingBuilder, ElementScope, Variant};

    #[derive(Debug, Default)]
    struct Circle {
        radius: u32,
    }

    #[derive(Debug, Default)]
    struct Square {
        side: u32,
    }

    #[derive(Debug, Default)]
    struct Triangle;

    #[derive(Debug)]
    enum Shape {
        Circle(Circle),
        Square(Square),
        Triangle(Triangle),
    }

    impl Variant<Circle> for Shape {
        fn wrap(value: Circle) -> Self {
            Shape::Circle(value)
        }
        fn peek(&self) -> Option<&Circle> {
            match self {
                Shape::Circle(circle) => Some(circle),
                _ => None,
            }
        }
    }

    impl Variant<Square> for Shape {
        fn wrap(value: Square) -> Self {
            Shape::Square(value)
        }
        fn peek(&self) -> Option<&Square> {
            match self {
                Shape::Square(square) => Some(square),
                _ => None,
            }
        }
    }

    #[derive(Debug, Default)]
    struct Drawing {
        title: Option<String>,
        shapes: Vec<Shape>,
        sketches: Vec<Shape>,
        extra: Vec<XmlAttribute>,
    }

    fn drawing_mapping() -> ElementMapping {
        ElementMappingBuilder::<Drawing>::new("Drawing")
            .attribute("Title", property!(Drawing, title))
            .any_attribute(property!(Drawing, extra))
            .variant_element::<Circle, _>("Circle", property!(Drawing, shapes))
                .attribute("Radius", property!(Circle, radius))
            .end_element()
            .variant_element::<Square, _>("Square", property!(Drawing, shapes))
                .attribute("Side", property!(Square, side))
            .end_element()
            .build()
            .unwrap()
    }

    fn sketchbook_mapping() -> ElementMapping {
        ElementMappingBuilder::<Drawing>::new("Drawing")
            .variant_element::<Circle, _>("Circle", property!(Drawing, shapes))
                .attribute("Radius", property!(Circle, radius))
            .end_element()
            .variant_element::<Square, _>("Square", property!(Drawing, shapes))
                .attribute("Side", property!(Square, side))
            .end_element()
            .variant_element::<Circle, _>("SketchCircle", property!(Drawing, sketches))
                .attribute("Radius", property!(Circle, radius))
            .end_element()
            .variant_element::<Square, _>("SketchSquare", property!(Drawing, sketches))
                .attribute("Side", property!(Square, side))
            .end_element()
            .build()
            .unwrap()
    }

    fn write(mapping: &ElementMapping, drawing: &Drawing) -> Result<String> {
        let mut writer = QuickXmlWriter::new(Vec::new());
        write_item(mapping, &mut writer, drawing)?;
        Ok(String::from_utf8(writer.into_inner()).unwrap())
    }

    #[test]
    fn test_shared_collection_is_written_once_in_order() {
        let drawing = Drawing {
            title: None,
            shapes: vec![
                Shape::Square(Square { side: 2 }),
                Shape::Circle(Circle { radius: 1 }),
                Shape::Square(Square { side: 3 }),
            ],
            extra: vec![XmlAttribute::new("{urn:x}tag", "a")],
            ..Drawing::default()
        };
        let xml = write(&drawing_mapping(), &drawing).unwrap();
        assert_eq!(
            xml,
            r#"<Drawing xmlns:p1="urn:x" p1:tag="a"><Square Side="2"/><Circle Radius="1"/><Square Side="3"/></Drawing>"#
        );
    }

    #[test]
    fn test_unclaimed_member_is_an_error() {
        let drawing = Drawing {
            shapes: vec![Shape::Triangle(Triangle)],
            ..Drawing::default()
        };
        let error = write(&drawing_mapping(), &drawing).unwrap_err();
        assert!(matches!(error, Error::UnmappedMember { type_name } if type_name.ends_with("Shape")));
    }

    #[test]
    fn test_collections_sharing_element_types() {
        let mapping = sketchbook_mapping();
        let drawing = Drawing {
            shapes: vec![Shape::Circle(Circle { radius: 1 })],
            sketches: vec![Shape::Square(Square { side: 4 }), Shape::Circle(Circle { radius: 5 })],
            ..Drawing::default()
        };
        let xml = write(&mapping, &drawing).unwrap();
        assert_eq!(
            xml,
            r#"<Drawing><Circle Radius="1"/><SketchSquare Side="4"/><SketchCircle Radius="5"/></Drawing>"#
        );

        let mut reader = QuickXmlReader::new(xml.as_bytes());
        reader.read().unwrap();
        let item = read_item(&mapping, &mut reader, 1, &ReaderOptions::default()).unwrap();
        let again = item.downcast::<Drawing>().unwrap();
        assert!(matches!(again.shapes.as_slice(), [Shape::Circle(Circle { radius: 1 })]));
        assert!(matches!(
            again.sketches.as_slice(),
            [Shape::Square(Square { side: 4 }), Shape::Circle(Circle { radius: 5 })]
        ));
    }

    #[test]
    fn test_absent_values_are_omitted() {
        let drawing = Drawing {
            title: Some("Plan".to_owned()),
            ..Drawing::default()
        };
        assert_eq!(write(&drawing_mapping(), &drawing).unwrap(), r#"<Drawing Title="Plan"/>"#);
    }
}
