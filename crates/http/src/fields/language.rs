use std::cmp::Ordering;
use std::fmt;

use crate::fields::FieldParseError;
use crate::fields::converter::Converter;
use crate::fields::parameterized::{Parameters, Quality, quality_of};

/// A language range from `Accept-Language` (RFC 4647 basic range plus parameters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRange {
    tag: String,
    parameters: Parameters,
    quality: Quality,
}

impl LanguageRange {
    pub fn new(tag: &str) -> Self {
        Self { tag: tag.to_owned(), parameters: Parameters::new(), quality: Quality::MAX }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Basic filtering: `*` matches everything, otherwise the range must equal
    /// the tag or be one of its prefixes ending at a `-`.
    pub fn matches(&self, tag: &str) -> bool {
        if self.tag == "*" {
            return true;
        }
        tag.get(..self.tag.len()).is_some_and(|prefix| prefix.eq_ignore_ascii_case(&self.tag))
            && matches!(tag.as_bytes().get(self.tag.len()), None | Some(b'-'))
    }

    /// Orders by descending quality.
    pub fn preference_cmp(&self, other: &Self) -> Ordering {
        other.quality.cmp(&self.quality)
    }
}

impl std::str::FromStr for LanguageRange {
    type Err = FieldParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (tag, rest) = text.split_once(';').unwrap_or((text, ""));
        let tag = tag.trim();
        let valid = tag == "*"
            || (!tag.is_empty()
                && tag.split('-').all(|part| (1..=8).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_alphanumeric())));
        if !valid {
            return Err(FieldParseError::new(text, "invalid language range"));
        }
        let parameters = Parameters::parse(rest)?;
        let quality = quality_of(&parameters)?;
        Ok(Self { tag: tag.to_owned(), parameters, quality })
    }
}

impl fmt::Display for LanguageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag, self.parameters)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageRangeConverter;

impl Converter for LanguageRangeConverter {
    type Value = LanguageRange;

    fn parse(&self, text: &str) -> Result<LanguageRange, FieldParseError> {
        text.parse()
    }

    fn serialize(&self, value: &LanguageRange) -> String {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::converters::LANGUAGE_LIST;

    #[test]
    fn parses_accept_language() {
        let mut ranges = LANGUAGE_LIST.parse("da, en-gb;q=0.8, en;q=0.7, *;q=0.1").unwrap();
        ranges.sort_by(LanguageRange::preference_cmp);
        let tags: Vec<_> = ranges.iter().map(LanguageRange::tag).collect();
        assert_eq!(tags, vec!["da", "en-gb", "en", "*"]);
        assert_eq!(ranges[1].quality().per_mille(), 800);
        assert_eq!(LANGUAGE_LIST.serialize(&ranges), "da, en-gb; q=0.8, en; q=0.7, *; q=0.1");
    }

    #[test]
    fn matches_prefixes() {
        let en = LanguageRange::new("en");
        assert!(en.matches("en"));
        assert!(en.matches("en-US"));
        assert!(!en.matches("eng"));
        assert!(LanguageRange::new("*").matches("fr"));
    }

    #[test]
    fn rejects_invalid_tags() {
        assert!("en_US".parse::<LanguageRange>().is_err());
        assert!("en;q=x".parse::<LanguageRange>().is_err());
    }
}
