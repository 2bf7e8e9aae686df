use std::fmt;

use crate::fields::FieldParseError;
use crate::fields::grammar::{is_token, quote_if_needed, split_list, unquote};

/// Ordered `name=value` parameters of a value such as a media type.
///
/// Names are compared case-insensitively and stored lower case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Replaces an existing parameter in place, or appends it.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of parameters besides the quality `q`.
    pub(crate) fn count_without_quality(&self) -> usize {
        self.0.iter().filter(|(n, _)| n != "q").count()
    }

    /// Parses `; name=value` pairs, `text` starting after the primary value.
    pub(crate) fn parse(text: &str) -> Result<Self, FieldParseError> {
        let mut parameters = Self::new();
        for pair in split_list(text, b';') {
            let (name, value) = pair.split_once('=').ok_or_else(|| FieldParseError::new(pair, "missing '='"))?;
            let name = name.trim();
            if !is_token(name) {
                return Err(FieldParseError::new(pair, "invalid parameter name"));
            }
            parameters.set(name, unquote(value.trim()));
        }
        Ok(parameters)
    }
}

impl FromIterator<(String, String)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut parameters = Self::new();
        for (name, value) in iter {
            parameters.set(&name, value);
        }
        parameters
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.0 {
            write!(f, "; {}={}", name, quote_if_needed(value))?;
        }
        Ok(())
    }
}

/// A quality value (RFC 7231, section 5.3.1) in thousandths, `1000` being `q=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u16);

impl Quality {
    pub const MAX: Quality = Quality(1000);
    pub const MIN: Quality = Quality(0);

    pub fn from_per_mille(value: u16) -> Option<Self> {
        (value <= 1000).then_some(Self(value))
    }

    pub fn per_mille(self) -> u16 {
        self.0
    }

    pub fn parse(text: &str) -> Result<Self, FieldParseError> {
        let invalid = || FieldParseError::new(text, "invalid quality value");
        let (int, fraction) = text.split_once('.').unwrap_or((text, ""));
        if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let thousandths = fraction.bytes().chain(std::iter::repeat(b'0')).take(3).fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
        match int {
            "0" => Ok(Self(thousandths)),
            "1" if thousandths == 0 => Ok(Self::MAX),
            _ => Err(invalid()),
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => f.write_str("1"),
            0 => f.write_str("0"),
            v => {
                let text = format!("{v:03}");
                write!(f, "0.{}", text.trim_end_matches('0'))
            }
        }
    }
}

/// The quality of a value carrying a `q` parameter, [`Quality::MAX`] when absent.
pub(crate) fn quality_of(parameters: &Parameters) -> Result<Quality, FieldParseError> {
    parameters.get("q").map_or(Ok(Quality::MAX), Quality::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quality_values() {
        assert_eq!(Quality::parse("1").unwrap(), Quality::MAX);
        assert_eq!(Quality::parse("1.000").unwrap(), Quality::MAX);
        assert_eq!(Quality::parse("0").unwrap(), Quality::MIN);
        assert_eq!(Quality::parse("0.5").unwrap().per_mille(), 500);
        assert_eq!(Quality::parse("0.125").unwrap().per_mille(), 125);
        assert!(Quality::parse("1.5").is_err());
        assert!(Quality::parse("0.1234").is_err());
        assert!(Quality::parse("high").is_err());
    }

    #[test]
    fn displays_quality_values() {
        assert_eq!(Quality::parse("0.50").unwrap().to_string(), "0.5");
        assert_eq!(Quality::parse("0.125").unwrap().to_string(), "0.125");
        assert_eq!(Quality::MAX.to_string(), "1");
    }

    #[test]
    fn parameters_keep_order() {
        let mut parameters = Parameters::parse(" charset=\"utf-8\"; Format=flowed").unwrap();
        assert_eq!(parameters.get("CHARSET"), Some("utf-8"));
        parameters.set("q", "0.5");
        assert_eq!(parameters.to_string(), "; charset=utf-8; format=flowed; q=0.5");
        assert_eq!(parameters.count_without_quality(), 2);
        assert_eq!(parameters.remove("format").as_deref(), Some("flowed"));
        assert_eq!(parameters.len(), 2);
    }
}
