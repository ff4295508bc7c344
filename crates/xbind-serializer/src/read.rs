//! Read path: XML cursor to object graph.

use std::any::Any;

use tracing::trace;
use xbind_common::{Position, ReaderOptions, XmlEvent, XmlRead};
use xbind_schema::{ChildRef, ElementBinding, ElementMapping};

use crate::{Error, Result};

/// Read the element the reader is positioned on into a new instance of the mapped
/// type.
///
/// On return the reader is on the element's end tag, or on its start tag when the
/// element is self-closing. `depth` is the nesting level of the element, 1 for the
/// root.
pub(crate) fn read_item<R>(
    mapping: &ElementMapping,
    reader: &mut R,
    depth: usize,
    options: &ReaderOptions,
) -> Result<Box<dyn Any>>
where
    R: XmlRead + ?Sized,
{
    let position = reader.position();
    let start = match reader.node() {
        XmlEvent::StartElement(start) => start.clone(),
        _ => {
            return Err(Error::format(
                format!("expected element <{}> at this position", mapping.element_name().local_name()),
                position,
            ))
        }
    };

    let expected = mapping.element_name();
    if start.name.local_name() != expected.local_name() {
        return Err(Error::format(
            format!("expected element <{}> at this position", expected.local_name()),
            position,
        ));
    }
    if !mapping.matches(&start.name) {
        return Err(Error::format(
            format!(
                "expected element <{}> to have a namespace of '{}' at this position",
                expected.local_name(),
                expected.namespace_uri().unwrap_or_default()
            ),
            position,
        ));
    }
    if let Some(max_depth) = options.max_depth {
        if depth > max_depth {
            return Err(Error::format(
                format!("element <{}> exceeds the maximum depth of {max_depth}", expected.local_name()),
                position,
            ));
        }
    }

    let mut item = mapping.create_instance();

    for attribute in start.attributes {
        if let Some(attribute_mapping) = mapping.find_attribute(&attribute.name) {
            attribute_mapping
                .set_value_from_xml(&mut *item, &attribute.value)
                .map_err(|e| value_error(e, format!("attribute '{}'", attribute.name), position))?;
        } else if let Some(any_attribute) = mapping.any_attribute() {
            any_attribute.add_attribute(&mut *item, attribute)?;
        } else {
            trace!(attribute = %attribute.name, element = %expected, "ignoring unmapped attribute");
        }
    }

    if start.is_empty {
        return Ok(item);
    }

    let mut text: Option<String> = None;
    let mut skipped = false;
    loop {
        if skipped {
            skipped = false;
        } else if !reader.read()? {
            return Err(xbind_common::Error::UnexpectedEof.into());
        }

        let name = match reader.node() {
            XmlEvent::StartElement(child) => child.name.clone(),
            XmlEvent::Text(content) | XmlEvent::CData(content) | XmlEvent::Whitespace(content) => {
                if mapping.text_content().is_some() {
                    text.get_or_insert_with(String::new).push_str(content);
                }
                continue;
            }
            XmlEvent::EndElement(_) => break,
            XmlEvent::Eof => return Err(xbind_common::Error::UnexpectedEof.into()),
            XmlEvent::None | XmlEvent::Other => continue,
        };

        match mapping.find_child(&name) {
            Some(ChildRef::Element(child_mapping)) => {
                let position = reader.position();
                let child = read_item(child_mapping, reader, depth + 1, options)?;
                attach(child_mapping, &mut *item, child, position)?;
            }
            Some(ChildRef::Text(text_mapping)) => {
                let position = reader.position();
                let content = reader.read_element_content_as_string()?;
                text_mapping
                    .set_value_from_xml(&mut *item, &content)
                    .map_err(|e| value_error(e, format!("element <{}>", name.local_name()), position))?;
                skipped = true;
            }
            None => {
                if let Some(any_element) = mapping.any_element() {
                    let element = reader.read_subtree()?;
                    any_element.add_element(&mut *item, element)?;
                } else {
                    trace!(element = %name, parent = %expected, "skipping unmapped element");
                    reader.skip()?;
                    skipped = true;
                }
            }
        }
    }

    if let (Some(text_mapping), Some(text)) = (mapping.text_content(), text) {
        text_mapping
            .set_value_from_xml(&mut *item, &text)
            .map_err(|e| value_error(e, format!("text content of <{}>", expected.local_name()), position))?;
    }

    Ok(item)
}

/// Store a read child on its container according to the child's binding.
fn attach(
    mapping: &ElementMapping,
    container: &mut dyn Any,
    child: Box<dyn Any>,
    position: Option<Position>,
) -> Result<()> {
    match mapping.binding() {
        ElementBinding::Child(binding) => Ok(binding.set_on_container(container, child)?),
        ElementBinding::Collection(binding) => Ok(binding.add_to_collection(container, child)?),
        ElementBinding::Root => Err(Error::format(
            format!(
                "element <{}> is mapped as a document root and cannot be nested",
                mapping.element_name().local_name()
            ),
            position,
        )),
    }
}

/// Conversion failures become format errors at the node's position.
fn value_error(error: xbind_schema::Error, context: String, position: Option<Position>) -> Error {
    match error {
        xbind_schema::Error::Conversion(conversion) => Error::format(format!("invalid {context}: {conversion}"), position),
        other => other.into(),
    }
}
