//! Conversion between property values and their XML string forms.
//!
//! A [`ConverterTable`] maps a value type to a [`Converter`], a reader/writer pair of
//! functions. Tables are owned by a schema and consulted once, while mappings are
//! being built, so no lookup happens during reads or writes.
//!
//! The default table knows `bool`, the signed and unsigned integer family, `f32`,
//! `f64`, [`Decimal`], `char`, [`NaiveDateTime`] and `String`, each also in its
//! nullable `Option<_>` form. Enums implementing [`XmlEnum`] are added with
//! [`ConverterTable::register_enum`].

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::BuildHasherDefault;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use hashbrown::HashMap as FastHashMap;
use rust_decimal::Decimal;
use rustc_hash::FxHasher;
use thiserror::Error;

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Characters XML treats as whitespace around simple values.
const XML_WHITESPACE: &[char] = &[' ', '\t', '\r', '\n'];

/// Format used when writing date-time values.
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Shared function reading a value from its XML form.
pub type ReadFn<P> = Arc<dyn Fn(&str) -> Result<P, ConversionError> + Send + Sync>;

/// Shared function writing a value in XML form. `None` means the value is absent.
pub type WriteFn<P> = Arc<dyn Fn(&P) -> Option<String> + Send + Sync>;

/// Errors raised while converting a value to or from its XML form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The text is not a valid representation of the expected type.
    #[error("unable to convert '{value}' to {expected}")]
    Invalid {
        value: String,
        expected: &'static str,
    },

    /// No enum variant has the given name.
    #[error("'{value}' is not a valid value of enum {enum_type}")]
    UnknownVariant {
        value: String,
        enum_type: &'static str,
    },

    /// Failure reported by a caller-supplied converter.
    #[error("{0}")]
    Custom(String),
}

impl ConversionError {
    /// An invalid-value error for the target type `P`.
    pub fn invalid<P>(value: &str) -> Self {
        Self::Invalid {
            value: value.to_owned(),
            expected: type_name::<P>(),
        }
    }

    /// A free-form error from a custom converter.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// An enum whose variants are written by name.
///
/// Reading matches names case-insensitively. Use [`xml_enum!`](crate::xml_enum) to
/// implement it for a field-less enum.
pub trait XmlEnum: Sized + Clone + 'static {
    /// Every variant, in declaration order.
    const VARIANTS: &'static [Self];

    /// The XML name of this variant.
    fn name(&self) -> &'static str;

    /// Look up a variant by name, ignoring ASCII case.
    fn from_name(text: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|variant| variant.name().eq_ignore_ascii_case(text))
            .cloned()
    }
}

/// Implement [`XmlEnum`] for a field-less enum, using variant identifiers as names.
///
/// ```
/// use xbind_common::{xml_enum, XmlEnum};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Kind {
///     Email,
///     HomePhone,
/// }
///
/// xml_enum!(Kind { Email, HomePhone });
///
/// assert_eq!(Kind::HomePhone.name(), "HomePhone");
/// assert_eq!(Kind::from_name("email"), Some(Kind::Email));
/// ```
#[macro_export]
macro_rules! xml_enum {
    ($enum:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::XmlEnum for $enum {
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

/// A reader/writer pair converting `P` to and from XML text.
pub struct Converter<P> {
    read: ReadFn<P>,
    write: WriteFn<P>,
}

impl<P> Clone for Converter<P> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }
}

impl<P> fmt::Debug for Converter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("type", &type_name::<P>())
            .finish()
    }
}

impl<P: 'static> Converter<P> {
    /// Create a converter from a parse function and a formatting function.
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn(&str) -> Result<P, ConversionError> + Send + Sync + 'static,
        W: Fn(&P) -> String + Send + Sync + 'static,
    {
        Self {
            read: Arc::new(read),
            write: Arc::new(move |value: &P| Some(write(value))),
        }
    }

    /// Create a converter from shared reader and writer functions.
    pub fn from_parts(read: ReadFn<P>, write: WriteFn<P>) -> Self {
        Self { read, write }
    }

    /// Parse a value from XML text.
    #[inline]
    pub fn read(&self, text: &str) -> Result<P, ConversionError> {
        (self.read)(text)
    }

    /// Format a value as XML text, or `None` when the value is absent.
    #[inline]
    pub fn write(&self, value: &P) -> Option<String> {
        (self.write)(value)
    }

    /// The shared reader function.
    pub fn reader(&self) -> ReadFn<P> {
        Arc::clone(&self.read)
    }

    /// The shared writer function.
    pub fn writer(&self) -> WriteFn<P> {
        Arc::clone(&self.write)
    }

    /// Lift this converter to `Option<P>`: empty or whitespace-only text reads as
    /// `None`, and `None` writes as absent.
    pub fn nullable(self) -> Converter<Option<P>> {
        let read = self.read;
        let write = self.write;
        Converter {
            read: Arc::new(move |text: &str| {
                if text.trim_matches(XML_WHITESPACE).is_empty() {
                    Ok(None)
                } else {
                    read(text).map(Some)
                }
            }),
            write: Arc::new(move |value: &Option<P>| value.as_ref().and_then(|v| write(v))),
        }
    }
}

impl<E: XmlEnum> Converter<E> {
    /// Converter writing variant names and reading them case-insensitively.
    pub fn enumeration() -> Self {
        Self::new(
            |text: &str| {
                E::from_name(text.trim_matches(XML_WHITESPACE)).ok_or_else(|| {
                    ConversionError::UnknownVariant {
                        value: text.to_owned(),
                        enum_type: type_name::<E>(),
                    }
                })
            },
            |value: &E| value.name().to_owned(),
        )
    }
}

/// Type-indexed table of converters.
#[derive(Clone)]
pub struct ConverterTable {
    converters: FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ConverterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterTable")
            .field("len", &self.converters.len())
            .finish()
    }
}

impl Default for ConverterTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.register_defaults();
        table
    }
}

macro_rules! register_parsed {
    ($table:expr, $($ty:ty),+ $(,)?) => {
        $(
            $table.register(Converter::<$ty>::new(parse_trimmed::<$ty>, |value: &$ty| value.to_string()));
        )+
    };
}

impl ConverterTable {
    /// A table without any converters.
    pub fn empty() -> Self {
        Self {
            converters: FxHashMap::default(),
        }
    }

    /// Register a converter for `P` and its nullable form `Option<P>`.
    ///
    /// A converter registered later for the same type replaces the earlier one.
    pub fn register<P: 'static>(&mut self, converter: Converter<P>) -> &mut Self {
        self.insert(converter.clone().nullable());
        self.insert(converter);
        self
    }

    /// Register name-based conversion for an enum and its nullable form.
    pub fn register_enum<E: XmlEnum>(&mut self) -> &mut Self {
        self.register(Converter::<E>::enumeration())
    }

    /// Whether a converter exists for `P`.
    pub fn contains<P: 'static>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<P>())
    }

    /// The converter registered for `P`.
    pub fn converter_for<P: 'static>(&self) -> Option<Converter<P>> {
        self.converters
            .get(&TypeId::of::<P>())?
            .downcast_ref::<Converter<P>>()
            .cloned()
    }

    /// The reader registered for `P`.
    pub fn reader_for<P: 'static>(&self) -> Option<ReadFn<P>> {
        self.converter_for::<P>().map(|c| c.reader())
    }

    /// The writer registered for `P`.
    pub fn writer_for<P: 'static>(&self) -> Option<WriteFn<P>> {
        self.converter_for::<P>().map(|c| c.writer())
    }

    /// Number of registered types, nullable forms included.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    fn insert<P: 'static>(&mut self, converter: Converter<P>) {
        self.converters.insert(TypeId::of::<P>(), Arc::new(converter));
    }

    fn register_defaults(&mut self) {
        self.register(Converter::<bool>::new(parse_bool, |value: &bool| value.to_string()));
        register_parsed!(self, i8, i16, i32, i64, u8, u16, u32, u64);
        self.register(Converter::<f32>::new(parse_float::<f32>, |value: &f32| {
            format_float(f64::from(*value), value.to_string())
        }));
        self.register(Converter::<f64>::new(parse_float::<f64>, |value: &f64| {
            format_float(*value, value.to_string())
        }));
        self.register(Converter::<Decimal>::new(parse_decimal, |value: &Decimal| value.to_string()));
        self.register(Converter::<char>::new(parse_char, |value: &char| value.to_string()));
        self.register(Converter::<NaiveDateTime>::new(parse_date_time, |value: &NaiveDateTime| {
            value.format(DATE_TIME_FORMAT).to_string()
        }));
        self.register(Converter::<String>::new(
            |text: &str| Ok(text.to_owned()),
            |value: &String| value.clone(),
        ));
    }
}

fn parse_trimmed<P: FromStr>(text: &str) -> Result<P, ConversionError> {
    text.trim_matches(XML_WHITESPACE)
        .parse()
        .map_err(|_| ConversionError::invalid::<P>(text))
}

fn parse_bool(text: &str) -> Result<bool, ConversionError> {
    let trimmed = text.trim_matches(XML_WHITESPACE);
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        Ok(false)
    } else {
        Err(ConversionError::invalid::<bool>(text))
    }
}

fn parse_float<F: FromStr + FloatLimits>(text: &str) -> Result<F, ConversionError> {
    match text.trim_matches(XML_WHITESPACE) {
        "INF" | "+INF" => Ok(F::INFINITY),
        "-INF" => Ok(F::NEG_INFINITY),
        "NaN" => Ok(F::NAN),
        other => other.parse().map_err(|_| ConversionError::invalid::<F>(text)),
    }
}

/// Special values shared by `f32` and `f64`.
trait FloatLimits {
    const INFINITY: Self;
    const NEG_INFINITY: Self;
    const NAN: Self;
}

impl FloatLimits for f32 {
    const INFINITY: Self = f32::INFINITY;
    const NEG_INFINITY: Self = f32::NEG_INFINITY;
    const NAN: Self = f32::NAN;
}

impl FloatLimits for f64 {
    const INFINITY: Self = f64::INFINITY;
    const NEG_INFINITY: Self = f64::NEG_INFINITY;
    const NAN: Self = f64::NAN;
}

/// Rust's `Display` already prints the shortest round-trip form; only the special
/// values need XML spellings.
fn format_float(value: f64, shortest: String) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value == f64::INFINITY {
        "INF".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_owned()
    } else {
        shortest
    }
}

fn parse_decimal(text: &str) -> Result<Decimal, ConversionError> {
    Decimal::from_str(text.trim_matches(XML_WHITESPACE))
        .map_err(|_| ConversionError::invalid::<Decimal>(text))
}

fn parse_char(text: &str) -> Result<char, ConversionError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConversionError::invalid::<char>(text)),
    }
}

fn parse_date_time(text: &str) -> Result<NaiveDateTime, ConversionError> {
    let trimmed = text.trim_matches(XML_WHITESPACE);

    if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT) {
        return Ok(value);
    }
    // An explicit offset is dropped, the wall-clock time is kept as written.
    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(value.naive_local());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ConversionError::invalid::<NaiveDateTime>(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<P: 'static>(table: &ConverterTable, text: &str) -> Option<String> {
        let converter = table.converter_for::<P>().unwrap();
        let value = converter.read(text).unwrap();
        converter.write(&value)
    }

    #[test]
    fn test_bool_is_case_insensitive() {
        let table = ConverterTable::default();
        let read = table.reader_for::<bool>().unwrap();
        assert!(read("True").unwrap());
        assert!(read("TRUE").unwrap());
        assert!(read("1").unwrap());
        assert!(!read("false").unwrap());
        assert!(read("yes").is_err());

        let write = table.writer_for::<bool>().unwrap();
        assert_eq!(write(&true).as_deref(), Some("true"));
    }

    #[test]
    fn test_integers_reject_overflow() {
        let table = ConverterTable::default();
        assert_eq!(table.reader_for::<u8>().unwrap()("255").unwrap(), 255);
        let err = table.reader_for::<u8>().unwrap()("256").unwrap_err();
        assert_eq!(
            err,
            ConversionError::Invalid {
                value: "256".to_owned(),
                expected: "u8"
            }
        );
        assert!(table.reader_for::<i64>().unwrap()("12x").is_err());
        assert_eq!(table.reader_for::<i32>().unwrap()(" 123\n").unwrap(), 123);
    }

    #[test]
    fn test_float_special_values() {
        let table = ConverterTable::default();
        let read = table.reader_for::<f64>().unwrap();
        assert_eq!(read("INF").unwrap(), f64::INFINITY);
        assert_eq!(read("-INF").unwrap(), f64::NEG_INFINITY);
        assert!(read("NaN").unwrap().is_nan());

        let write = table.writer_for::<f64>().unwrap();
        assert_eq!(write(&f64::NEG_INFINITY).as_deref(), Some("-INF"));
        assert_eq!(write(&0.1).as_deref(), Some("0.1"));
        assert_eq!(round_trip::<f32>(&table, "1.5E2").as_deref(), Some("150"));
        assert_eq!(round_trip::<f32>(&table, "INF").as_deref(), Some("INF"));
    }

    #[test]
    fn test_decimal_and_char() {
        let table = ConverterTable::default();
        assert_eq!(round_trip::<Decimal>(&table, "12.50").as_deref(), Some("12.50"));
        assert_eq!(round_trip::<char>(&table, "x").as_deref(), Some("x"));
        assert!(table.reader_for::<char>().unwrap()("xy").is_err());
        assert!(table.reader_for::<char>().unwrap()("").is_err());
    }

    #[test]
    fn test_date_time_has_no_zone_conversion() {
        let table = ConverterTable::default();
        let read = table.reader_for::<NaiveDateTime>().unwrap();
        let write = table.writer_for::<NaiveDateTime>().unwrap();

        let value = read("2012-03-04T05:06:07").unwrap();
        assert_eq!(write(&value).as_deref(), Some("2012-03-04T05:06:07"));

        let offset = read("2012-03-04T05:06:07+02:00").unwrap();
        assert_eq!(offset, value);

        let fractional = read("2012-03-04T05:06:07.25").unwrap();
        assert_eq!(write(&fractional).as_deref(), Some("2012-03-04T05:06:07.250"));

        let date_only = read("2012-03-04").unwrap();
        assert_eq!(write(&date_only).as_deref(), Some("2012-03-04T00:00:00"));
    }

    #[test]
    fn test_nullable_forms() {
        let table = ConverterTable::default();
        let read = table.reader_for::<Option<i32>>().unwrap();
        assert_eq!(read("").unwrap(), None);
        assert_eq!(read(" \r\n\t").unwrap(), None);
        assert_eq!(read(" 42 ").unwrap(), Some(42));
        assert_eq!(read("42").unwrap(), Some(42));
        assert!(read("abc").is_err());

        let write = table.writer_for::<Option<i32>>().unwrap();
        assert_eq!(write(&None), None);
        assert_eq!(write(&Some(7)).as_deref(), Some("7"));
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Colour {
        Red,
        DarkBlue,
    }

    xml_enum!(Colour { Red, DarkBlue });

    #[test]
    fn test_enum_lookup() {
        let mut table = ConverterTable::empty();
        assert!(!table.contains::<Colour>());
        table.register_enum::<Colour>();
        assert!(table.contains::<Colour>());
        assert!(table.contains::<Option<Colour>>());

        let read = table.reader_for::<Colour>().unwrap();
        assert_eq!(read("darkblue").unwrap(), Colour::DarkBlue);
        match read("Green").unwrap_err() {
            ConversionError::UnknownVariant { value, enum_type } => {
                assert_eq!(value, "Green");
                assert!(enum_type.ends_with("Colour"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let nullable = table.reader_for::<Option<Colour>>().unwrap();
        assert_eq!(nullable("").unwrap(), None);
        assert_eq!(nullable("red").unwrap(), Some(Colour::Red));
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut table = ConverterTable::default();
        table.register(Converter::<bool>::new(
            |text: &str| Ok(text == "yes"),
            |value: &bool| if *value { "yes".to_owned() } else { "no".to_owned() },
        ));
        assert_eq!(table.writer_for::<bool>().unwrap()(&false).as_deref(), Some("no"));
        assert_eq!(table.writer_for::<Option<bool>>().unwrap()(&Some(true)).as_deref(), Some("yes"));
    }

    #[test]
    fn test_unknown_type_has_no_converter() {
        struct Opaque;
        let table = ConverterTable::default();
        assert!(table.converter_for::<Opaque>().is_none());
        assert!(table.reader_for::<Vec<u8>>().is_none());
    }
}
