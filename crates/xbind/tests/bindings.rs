//! Attribute, text and catch-all bindings through the public API.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use xbind::common::ConversionError;
use xbind::prelude::*;
use xbind::schema::Error as SchemaError;
use xbind::serializer::Error;

#[derive(Debug, Default, PartialEq)]
struct Person {
    id: i32,
    first_name: String,
    is_enabled: bool,
}

fn person_serializer() -> Serializer {
    let schema = FluentSchemaDescription::new()
        .element::<Person>("{http://test.com}Person")
            .attribute("Id", property!(Person, id))
            .attribute("FirstName", property!(Person, first_name))
            .text_element("{http://test.com}IsEnabled", property!(Person, is_enabled))
        .end_element()
        .build()
        .unwrap();
    Serializer::new(schema)
}

#[test]
fn test_person_round_trip() {
    let serializer = person_serializer();
    let person: Person = serializer
        .from_str("<Person xmlns='http://test.com' Id='123' FirstName='James'><IsEnabled>true</IsEnabled></Person>")
        .unwrap();
    assert_eq!(
        person,
        Person {
            id: 123,
            first_name: "James".into(),
            is_enabled: true,
        }
    );

    assert_eq!(
        serializer.to_string(&person).unwrap(),
        r#"<Person xmlns="http://test.com" Id="123" FirstName="James"><IsEnabled>true</IsEnabled></Person>"#
    );
}

#[test]
fn test_missing_attribute_keeps_default() {
    let person: Person = person_serializer()
        .from_str("<Person xmlns='http://test.com' FirstName='Ann'/>")
        .unwrap();
    assert_eq!(person.id, 0);
    assert_eq!(person.first_name, "Ann");
    assert!(!person.is_enabled);
}

#[test]
fn test_unknown_content_is_skipped() {
    let person: Person = person_serializer()
        .from_str(
            "<Person xmlns='http://test.com' Id='5' Nickname='Jim'>\
               <Hobby><Name>chess</Name></Hobby>\
               <IsEnabled>1</IsEnabled>\
               <Extra/>\
             </Person>",
        )
        .unwrap();
    assert_eq!(person.id, 5);
    assert!(person.is_enabled);
}

#[test]
fn test_text_element_with_child_elements_fails() {
    let result = person_serializer()
        .from_str::<Person>("<Person xmlns='http://test.com'><IsEnabled><b>true</b></IsEnabled></Person>");
    assert!(matches!(result, Err(Error::Common(_))));
}

#[test]
fn test_missing_root() {
    let result = person_serializer().from_str::<Person>("<?xml version='1.0'?>");
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_malformed_document_reports_position() {
    let result = person_serializer().from_str::<Person>("<Person xmlns='http://test.com'>\n  <IsEnabled>true</Wrong>\n</Person>");
    match result {
        Err(Error::Common(xbind::common::Error::Xml { position, .. })) => {
            assert_eq!(position.map(|p| p.line), Some(2));
        }
        other => panic!("expected an XML error, got {other:?}"),
    }
}

#[derive(Debug, Default)]
struct Widget {
    name: String,
    extra: Vec<XmlAttribute>,
    children: Option<Vec<XmlElement>>,
}

fn widget_serializer() -> Serializer {
    let schema = FluentSchemaDescription::new()
        .element::<Widget>("Widget")
            .attribute("Name", property!(Widget, name))
            .any_attribute(property!(Widget, extra))
            .any_element(property!(Widget, children))
        .end_element()
        .build()
        .unwrap();
    Serializer::new(schema)
}

#[test]
fn test_any_attributes_are_captured_in_order() {
    let serializer = widget_serializer();
    let widget: Widget = serializer
        .from_str("<Widget xmlns:ui='urn:ui' Color='red' Name='knob' ui:Size='3'><Part id='a'>x</Part></Widget>")
        .unwrap();

    assert_eq!(widget.name, "knob");
    let names: Vec<_> = widget.extra.iter().map(|a| a.name.to_string()).collect();
    assert_eq!(names, ["Color", "{urn:ui}Size"]);
    assert_eq!(widget.extra[1].prefix.as_deref(), Some("ui"));

    let children = widget.children.as_deref().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].attribute(&XmlName::local("id")), Some("a"));
    assert_eq!(children[0].text(), "x");

    assert_eq!(
        serializer.to_string(&widget).unwrap(),
        r#"<Widget Name="knob" Color="red" xmlns:ui="urn:ui" ui:Size="3"><Part id="a">x</Part></Widget>"#
    );
}

#[derive(Debug, Default, PartialEq)]
struct Reading {
    taken: Option<NaiveDateTime>,
    amount: Decimal,
    ratio: f64,
    grade: char,
    note: String,
}

#[test]
fn test_value_types_round_trip() {
    let schema = FluentSchemaDescription::new()
        .element::<Reading>("Reading")
            .attribute("Taken", property!(Reading, taken))
            .attribute("Amount", property!(Reading, amount))
            .attribute("Ratio", property!(Reading, ratio))
            .attribute("Grade", property!(Reading, grade))
            .text_content(property!(Reading, note))
        .end_element()
        .build()
        .unwrap();
    let serializer = Serializer::new(schema);

    let reading: Reading = serializer
        .from_str("<Reading Taken='2011-03-04T05:06:07' Amount='12.50' Ratio='-INF' Grade='B'>a &amp; <![CDATA[b]]></Reading>")
        .unwrap();
    let taken = NaiveDate::from_ymd_opt(2011, 3, 4).and_then(|d| d.and_hms_opt(5, 6, 7));
    assert_eq!(reading.taken, taken);
    assert_eq!(reading.amount, Decimal::new(1250, 2));
    assert_eq!(reading.ratio, f64::NEG_INFINITY);
    assert_eq!(reading.grade, 'B');
    assert_eq!(reading.note, "a & b");

    let xml = serializer.to_string(&reading).unwrap();
    assert_eq!(
        xml,
        r#"<Reading Taken="2011-03-04T05:06:07" Amount="12.50" Ratio="-INF" Grade="B">a &amp; b</Reading>"#
    );

    let sparse = Reading {
        grade: 'A',
        ..Reading::default()
    };
    assert_eq!(
        serializer.to_string(&sparse).unwrap(),
        r#"<Reading Amount="0" Ratio="0" Grade="A"/>"#
    );
}

#[derive(Debug, Default, PartialEq)]
struct Temperature {
    celsius: i32,
}

#[test]
fn test_custom_converter() {
    let kelvin = Converter::<i32>::new(
        |text: &str| {
            let kelvin: i32 = text
                .strip_suffix('K')
                .and_then(|k| k.parse().ok())
                .ok_or_else(|| ConversionError::custom(format!("'{text}' is not a kelvin value")))?;
            Ok(kelvin - 273)
        },
        |celsius: &i32| format!("{}K", celsius + 273),
    );
    let schema = FluentSchemaDescription::new()
        .element::<Temperature>("Temperature")
            .attribute_with("Value", property!(Temperature, celsius), kelvin)
        .end_element()
        .build()
        .unwrap();
    let serializer = Serializer::new(schema);

    let temperature: Temperature = serializer.from_str("<Temperature Value='300K'/>").unwrap();
    assert_eq!(temperature.celsius, 27);
    assert_eq!(serializer.to_string(&temperature).unwrap(), r#"<Temperature Value="300K"/>"#);

    let error = serializer.from_str::<Temperature>("<Temperature Value='300'/>").unwrap_err();
    assert!(error.to_string().contains("'300' is not a kelvin value"));
}

#[test]
fn test_missing_converter() {
    let result = FluentSchemaDescription::with_converters(ConverterTable::empty())
        .element::<Temperature>("Temperature")
            .attribute("Value", property!(Temperature, celsius))
        .end_element()
        .build();
    assert!(matches!(result, Err(SchemaError::NoConverter { property: "celsius", .. })));
}

#[test]
fn test_duplicate_child_names() {
    let result = FluentSchemaDescription::new()
        .element::<Person>("Person")
            .text_element("Name", property!(Person, first_name))
            .text_element("Name", property!(Person, id))
        .end_element()
        .build();
    assert!(matches!(result, Err(SchemaError::DuplicateChildElement { .. })));
}

#[test]
fn test_indented_output() {
    let schema = FluentSchemaDescription::new()
        .element::<Person>("Person")
            .attribute("Id", property!(Person, id))
            .text_element("FirstName", property!(Person, first_name))
        .end_element()
        .build()
        .unwrap();
    let serializer = Serializer::with_options(schema, SerializerOptions::default().with_indent(2));
    let person = Person {
        id: 1,
        first_name: "Ann".into(),
        is_enabled: false,
    };
    assert_eq!(
        serializer.to_string(&person).unwrap(),
        "<Person Id=\"1\">\n  <FirstName>Ann</FirstName>\n</Person>"
    );
}
