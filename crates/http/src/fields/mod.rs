//! Header fields and their typed values.
//!
//! Fields are received as text and stay text until a typed view is requested
//! with a [`Converter`]. Each converter parses one grammar (a date, a list of
//! media ranges, cookies, ...) and serializes values back to text. The
//! converters for the well-known field names are collected in [`converters`],
//! [`lookup_converter`] maps a field name to its converter.
//!
//! ```
//! use micro_http_codec::fields::{converters, sort_by_preference};
//! use micro_http_codec::fields::Converter;
//!
//! let mut ranges = converters::MEDIA_RANGE_LIST.parse("text/plain; q=0.5, text/html").unwrap();
//! sort_by_preference(&mut ranges);
//! assert_eq!(ranges[0].to_string(), "text/html");
//! ```

use thiserror::Error;

mod converter;
pub use converter::Converter;
pub use converter::DateTimeConverter;
pub use converter::FieldConverter;
pub use converter::ListConverter;
pub use converter::LongConverter;
pub use converter::MultiValueConverter;
pub use converter::StringConverter;
pub use converter::UriConverter;

mod field;
pub use field::DynField;
pub use field::HeaderField;
pub use field::RawField;

mod parameterized;
pub use parameterized::Parameters;
pub use parameterized::Quality;

mod media;
pub use media::MediaRange;
pub use media::MediaRangeConverter;
pub use media::MediaType;
pub use media::MediaTypeConverter;
pub use media::sort_by_preference;

mod language;
pub use language::LanguageRange;
pub use language::LanguageRangeConverter;

mod cookie;
pub use cookie::Cookie;
pub use cookie::CookieList;
pub use cookie::CookieListConverter;
pub use cookie::CookiePairConverter;
pub use cookie::SetCookieConverter;
pub use cookie::SetCookieListConverter;

mod product;
pub use product::CommentedValue;
pub use product::ProductDescriptionsConverter;

pub mod converters;
pub mod names;
pub use names::canonical_name;
pub use names::lookup_converter;

pub(crate) mod grammar;

/// A field value does not match the grammar of its converter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {text:?}: {reason}")]
pub struct FieldParseError {
    text: String,
    reason: String,
}

impl FieldParseError {
    pub fn new<S: ToString>(text: &str, reason: S) -> Self {
        Self { text: text.to_owned(), reason: reason.to_string() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
