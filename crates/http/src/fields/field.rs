use std::any::Any;
use std::fmt;

use crate::fields::converter::Converter;
use crate::fields::grammar::is_token;
use crate::fields::{FieldParseError, canonical_name};

/// A header field as stored in a [`MessageHeader`](crate::protocol::MessageHeader),
/// either still raw text or already converted to a typed [`HeaderField`].
pub trait DynField: fmt::Debug {
    fn name(&self) -> &str;

    /// The value lines emitted when encoding, without the field name.
    fn field_lines(&self) -> Vec<String>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn clone_box(&self) -> Box<dyn DynField>;
}

impl Clone for Box<dyn DynField> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A field holding the text lines it was received with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    name: String,
    lines: Vec<String>,
}

impl RawField {
    pub fn new(name: &str, line: impl Into<String>) -> Self {
        Self { name: canonical_name(name).to_owned(), lines: vec![line.into()] }
    }

    pub(crate) fn from_lines(name: &str, lines: Vec<String>) -> Self {
        Self { name: canonical_name(name).to_owned(), lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

impl DynField for RawField {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn DynField> {
        Box::new(self.clone())
    }
}

/// A header field with a typed value and the converter for its textual form.
#[derive(Debug, Clone)]
pub struct HeaderField<C: Converter> {
    name: String,
    value: C::Value,
    converter: C,
}

impl<C: Converter> HeaderField<C> {
    /// Creates a field, the name is canonicalized if it is a well-known one.
    pub fn new(name: &str, value: C::Value, converter: C) -> Self {
        Self { name: canonical_name(name).to_owned(), value, converter }
    }

    /// Parses a complete header line such as `"Content-Length: 42"`.
    pub fn from_line(line: &str, converter: C) -> Result<Self, FieldParseError> {
        let (name, text) = line.split_once(':').ok_or_else(|| FieldParseError::new(line, "missing ':'"))?;
        if !is_token(name) {
            return Err(FieldParseError::new(line, "invalid field name"));
        }
        let value = converter.parse(text.trim())?;
        Ok(Self::new(name, value, converter))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &C::Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut C::Value {
        &mut self.value
    }

    pub fn set_value(&mut self, value: C::Value) {
        self.value = value;
    }

    pub fn into_value(self) -> C::Value {
        self.value
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// The value in its textual form.
    pub fn as_field_value(&self) -> String {
        self.converter.serialize(&self.value)
    }
}

impl<C: Converter> fmt::Display for HeaderField<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.converter.field_lines(&self.value).iter().enumerate() {
            if i > 0 {
                f.write_str("\r\n")?;
            }
            write!(f, "{}: {}", self.name, line)?;
        }
        Ok(())
    }
}

impl<C: Converter> DynField for HeaderField<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_lines(&self) -> Vec<String> {
        self.converter.field_lines(&self.value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn DynField> {
        Box::new(self.clone())
    }
}
