use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use http::Uri;

use crate::fields::FieldParseError;
use crate::fields::field::{DynField, HeaderField};
use crate::fields::grammar::split_list;

/// Converts between the textual form of a header field value and a typed value.
///
/// Converters are stateless values; they are passed explicitly wherever a typed
/// view of a field is requested, see [`converters`](crate::fields::converters)
/// for the well-known ones.
pub trait Converter: Clone + fmt::Debug + Send + Sync + 'static {
    type Value: Clone + fmt::Debug + 'static;

    fn parse(&self, text: &str) -> Result<Self::Value, FieldParseError>;

    fn serialize(&self, value: &Self::Value) -> String;

    /// Parses all lines a field was received with, in wire order.
    ///
    /// The default joins the lines with `", "` (RFC 7230, section 3.2.2).
    fn parse_lines(&self, lines: &[String]) -> Result<Self::Value, FieldParseError> {
        match lines {
            [line] => self.parse(line),
            lines => self.parse(&lines.join(", ")),
        }
    }

    /// The lines emitted for `value` when the field is encoded.
    fn field_lines(&self, value: &Self::Value) -> Vec<String> {
        vec![self.serialize(value)]
    }
}

/// A converter whose value is a container of items.
pub trait MultiValueConverter: Converter {
    type Item;
    type ItemConverter: Converter<Value = Self::Item>;

    fn empty(&self) -> Self::Value;

    fn append(&self, container: &mut Self::Value, item: Self::Item);

    fn item_converter(&self) -> &Self::ItemConverter;

    /// Whether each item is emitted as a header line of its own (`Set-Cookie`)
    /// instead of being joined into one line.
    fn separate_values(&self) -> bool;
}

/// Type erased converter, as returned by
/// [`lookup_converter`](crate::fields::lookup_converter).
pub trait FieldConverter: fmt::Debug + Send + Sync {
    /// Parses the lines of a field named `name` into a typed field.
    fn to_field(&self, name: &str, lines: &[String]) -> Result<Box<dyn DynField>, FieldParseError>;
}

impl<C: Converter> FieldConverter for C {
    fn to_field(&self, name: &str, lines: &[String]) -> Result<Box<dyn DynField>, FieldParseError> {
        let value = self.parse_lines(lines)?;
        Ok(Box::new(HeaderField::new(name, value, self.clone())))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl Converter for StringConverter {
    type Value = String;

    fn parse(&self, text: &str) -> Result<String, FieldParseError> {
        Ok(text.trim().to_owned())
    }

    fn serialize(&self, value: &String) -> String {
        value.clone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LongConverter;

impl Converter for LongConverter {
    type Value = i64;

    fn parse(&self, text: &str) -> Result<i64, FieldParseError> {
        text.trim().parse().map_err(|e| FieldParseError::new(text, format!("not a number: {e}")))
    }

    fn serialize(&self, value: &i64) -> String {
        value.to_string()
    }
}

/// HTTP-date (RFC 7231, section 7.1.1.1).
///
/// Accepts IMF-fixdate, the obsolete RFC 850 and asctime formats and the
/// `Expires` format used by cookies; always serializes as IMF-fixdate. The
/// day name is not checked against the date.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeConverter;

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

// two digit years must be tried first, `%Y` would accept them as well
const WITHOUT_DAY_NAME: [&str; 3] = ["%d %b %Y %H:%M:%S GMT", "%d-%b-%y %H:%M:%S GMT", "%d-%b-%Y %H:%M:%S GMT"];

const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

impl Converter for DateTimeConverter {
    type Value = DateTime<Utc>;

    fn parse(&self, text: &str) -> Result<DateTime<Utc>, FieldParseError> {
        let text = text.trim();
        let parsed = match text.split_once(',') {
            Some((_day_name, date)) => {
                let date = date.trim();
                WITHOUT_DAY_NAME.iter().find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
            }
            None => NaiveDateTime::parse_from_str(text, ASCTIME).ok(),
        };
        parsed.map(|date| date.and_utc()).ok_or_else(|| FieldParseError::new(text, "not an HTTP-date"))
    }

    fn serialize(&self, value: &DateTime<Utc>) -> String {
        value.format(IMF_FIXDATE).to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UriConverter;

impl Converter for UriConverter {
    type Value = Uri;

    fn parse(&self, text: &str) -> Result<Uri, FieldParseError> {
        text.trim().parse().map_err(|e| FieldParseError::new(text, format!("invalid uri: {e}")))
    }

    fn serialize(&self, value: &Uri) -> String {
        value.to_string()
    }
}

/// A list of items separated by `delimiter`, each handled by the item converter.
#[derive(Debug, Clone, Copy)]
pub struct ListConverter<C> {
    item_converter: C,
    delimiter: u8,
    separate_values: bool,
}

impl<C> ListConverter<C> {
    /// A comma separated list, emitted as one line.
    pub const fn new(item_converter: C) -> Self {
        Self { item_converter, delimiter: b',', separate_values: false }
    }

    pub const fn with_delimiter(item_converter: C, delimiter: u8) -> Self {
        Self { item_converter, delimiter, separate_values: false }
    }

    /// A list whose items are each received and emitted as a line of their own.
    pub const fn separated(item_converter: C) -> Self {
        Self { item_converter, delimiter: b',', separate_values: true }
    }

    fn joiner(&self) -> &'static str {
        if self.delimiter == b';' { "; " } else { ", " }
    }
}

impl<C: Converter> Converter for ListConverter<C> {
    type Value = Vec<C::Value>;

    fn parse(&self, text: &str) -> Result<Self::Value, FieldParseError> {
        if self.separate_values {
            return Ok(vec![self.item_converter.parse(text.trim())?]);
        }
        split_list(text, self.delimiter).into_iter().map(|item| self.item_converter.parse(item)).collect()
    }

    fn serialize(&self, value: &Self::Value) -> String {
        let items: Vec<String> = value.iter().map(|item| self.item_converter.serialize(item)).collect();
        items.join(self.joiner())
    }

    fn parse_lines(&self, lines: &[String]) -> Result<Self::Value, FieldParseError> {
        let mut result = Vec::new();
        for line in lines {
            result.extend(self.parse(line)?);
        }
        Ok(result)
    }

    fn field_lines(&self, value: &Self::Value) -> Vec<String> {
        if self.separate_values {
            value.iter().map(|item| self.item_converter.serialize(item)).collect()
        } else {
            vec![self.serialize(value)]
        }
    }
}

impl<C: Converter> MultiValueConverter for ListConverter<C> {
    type Item = C::Value;
    type ItemConverter = C;

    fn empty(&self) -> Self::Value {
        Vec::new()
    }

    fn append(&self, container: &mut Self::Value, item: Self::Item) {
        container.push(item);
    }

    fn item_converter(&self) -> &C {
        &self.item_converter
    }

    fn separate_values(&self) -> bool {
        self.separate_values
    }
}
