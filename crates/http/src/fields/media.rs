//! Media types (`Content-Type`) and media ranges (`Accept`).
//!
//! Both are parsed with the [`mime`] crate and kept as primary type, subtype
//! and ordered parameters, parameter values unquoted.

use std::cmp::Ordering;
use std::fmt;

use mime::Mime;

use crate::fields::FieldParseError;
use crate::fields::converter::Converter;
use crate::fields::grammar::unquote;
use crate::fields::parameterized::{Parameters, Quality, quality_of};

fn parse_media(text: &str) -> Result<(String, String, Parameters), FieldParseError> {
    let text = text.trim();
    let mime: Mime = text.parse().map_err(|e| FieldParseError::new(text, format!("invalid media type: {e}")))?;
    let (top_level, subtype) =
        mime.essence_str().split_once('/').ok_or_else(|| FieldParseError::new(text, "missing subtype"))?;
    let parameters = mime
        .params()
        .map(|(name, value)| (name.as_str().to_owned(), unquote(value.as_str()).into_owned()))
        .collect();
    Ok((top_level.to_owned(), subtype.to_owned(), parameters))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    top_level: String,
    subtype: String,
    parameters: Parameters,
}

impl MediaType {
    pub fn new(top_level: &str, subtype: &str) -> Self {
        Self {
            top_level: top_level.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: Parameters::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.set(name, value);
        self
    }

    pub fn top_level_type(&self) -> &str {
        &self.top_level
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }
}

impl std::str::FromStr for MediaType {
    type Err = FieldParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (top_level, subtype, parameters) = parse_media(text)?;
        Ok(Self { top_level, subtype, parameters })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.top_level, self.subtype, self.parameters)
    }
}

/// A media range from an `Accept` field, with an implicit quality of 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    top_level: String,
    subtype: String,
    parameters: Parameters,
    quality: Quality,
}

impl MediaRange {
    pub fn new(top_level: &str, subtype: &str) -> Self {
        Self {
            top_level: top_level.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: Parameters::new(),
            quality: Quality::MAX,
        }
    }

    /// `*/*`
    pub fn all() -> Self {
        Self::new("*", "*")
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Result<Self, FieldParseError> {
        if name.eq_ignore_ascii_case("q") {
            self.quality = Quality::parse(value)?;
        }
        self.parameters.set(name, value);
        Ok(self)
    }

    pub fn top_level_type(&self) -> &str {
        &self.top_level
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// 2 for `type/subtype`, 1 for `type/*`, 0 for `*/*`.
    pub fn specificity(&self) -> u8 {
        match (self.top_level.as_str(), self.subtype.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }

    /// Whether `media` falls into this range: the type and subtype are equal or
    /// wildcards, and every parameter of the range except `q` is present on
    /// `media` with the same value.
    pub fn matches(&self, media: &MediaType) -> bool {
        (self.top_level == "*" || self.top_level == media.top_level)
            && (self.subtype == "*" || self.subtype == media.subtype)
            && self.parameters.iter().filter(|(name, _)| *name != "q").all(|(name, value)| media.parameter(name) == Some(value))
    }

    /// Orders by descending preference: quality, then specificity, then number
    /// of parameters.
    pub fn preference_cmp(&self, other: &Self) -> Ordering {
        let key = |range: &Self| (range.quality, range.specificity(), range.parameters.count_without_quality());
        key(other).cmp(&key(self))
    }
}

/// Sorts ranges by descending preference, ranges of equal preference keep their order.
pub fn sort_by_preference(ranges: &mut [MediaRange]) {
    ranges.sort_by(MediaRange::preference_cmp);
}

impl std::str::FromStr for MediaRange {
    type Err = FieldParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (top_level, subtype, parameters) = parse_media(text)?;
        let quality = quality_of(&parameters)?;
        Ok(Self { top_level, subtype, parameters, quality })
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.top_level, self.subtype, self.parameters)
    }
}

impl From<MediaType> for MediaRange {
    fn from(media: MediaType) -> Self {
        Self { top_level: media.top_level, subtype: media.subtype, parameters: media.parameters, quality: Quality::MAX }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MediaTypeConverter;

impl Converter for MediaTypeConverter {
    type Value = MediaType;

    fn parse(&self, text: &str) -> Result<MediaType, FieldParseError> {
        text.parse()
    }

    fn serialize(&self, value: &MediaType) -> String {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MediaRangeConverter;

impl Converter for MediaRangeConverter {
    type Value = MediaRange;

    fn parse(&self, text: &str) -> Result<MediaRange, FieldParseError> {
        text.parse()
    }

    fn serialize(&self, value: &MediaRange) -> String {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fields::converters::MEDIA_RANGE_LIST;

    fn sorted(accept: &str) -> Vec<String> {
        let mut ranges = MEDIA_RANGE_LIST.parse(accept).unwrap();
        sort_by_preference(&mut ranges);
        ranges.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn sorts_by_quality() {
        assert_eq!(
            sorted("text/plain; q=0.5, text/html, text/x-dvi; q=0.8, text/x-c"),
            vec!["text/html", "text/x-c", "text/x-dvi; q=0.8", "text/plain; q=0.5"]
        );
        assert_eq!(sorted("audio/*; q=0.2, audio/basic"), vec!["audio/basic", "audio/*; q=0.2"]);
    }

    #[test]
    fn sorts_by_specificity_and_parameters() {
        assert_eq!(
            sorted("text/*, text/plain, text/plain;format=flowed, */*"),
            vec!["text/plain; format=flowed", "text/plain", "text/*", "*/*"]
        );
        assert_eq!(
            sorted("text/plain; q=1; format=flowed, text/plain;format=flowed, */*, */*, audio/*"),
            vec!["text/plain; q=1; format=flowed", "text/plain; format=flowed", "audio/*", "*/*", "*/*"]
        );
    }

    #[test]
    fn matches_media_types() {
        let html: MediaType = "text/html; charset=utf-8".parse().unwrap();
        let plain = MediaType::new("text", "plain");
        let audio = MediaType::new("audio", "basic");

        assert!(MediaRange::all().matches(&html));
        assert!("text/*; q=0.5".parse::<MediaRange>().unwrap().matches(&html));
        assert!(!"audio/*".parse::<MediaRange>().unwrap().matches(&html));
        assert!("audio/*".parse::<MediaRange>().unwrap().matches(&audio));
        assert!("text/html".parse::<MediaRange>().unwrap().matches(&html));
        assert!("text/*; charset=utf-8".parse::<MediaRange>().unwrap().matches(&html));
        assert!(!"text/*; charset=utf-8".parse::<MediaRange>().unwrap().matches(&plain));
        assert!(!"*/*; special=true".parse::<MediaRange>().unwrap().matches(&html));
    }

    #[test]
    fn media_type_round_trip() {
        let media: MediaType = "text/html; charset=\"utf-8\"".parse().unwrap();
        assert_eq!(media.top_level_type(), "text");
        assert_eq!(media.subtype(), "html");
        assert_eq!(media.parameter("charset"), Some("utf-8"));
        assert_eq!(media.to_string(), "text/html; charset=utf-8");

        let svg: MediaType = "image/svg+xml".parse().unwrap();
        assert_eq!(svg.subtype(), "svg+xml");

        let built = MediaType::new("multipart", "form-data").with_parameter("boundary", "a b");
        assert_eq!(built.to_string(), "multipart/form-data; boundary=\"a b\"");
    }

    #[test]
    fn rejects_invalid_ranges() {
        assert!("text".parse::<MediaRange>().is_err());
        assert!("text/html; q=2".parse::<MediaRange>().is_err());
    }
}
