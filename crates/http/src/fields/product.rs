use std::fmt;

use crate::fields::FieldParseError;
use crate::fields::converter::Converter;

/// A value followed by comments, as in `Apache/2.4.18 (Ubuntu)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentedValue<T> {
    value: T,
    comments: Vec<String>,
}

impl<T> CommentedValue<T> {
    pub fn new(value: T) -> Self {
        Self { value, comments: Vec::new() }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

impl<T: fmt::Display> fmt::Display for CommentedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        for comment in &self.comments {
            write!(f, " ({comment})")?;
        }
        Ok(())
    }
}

/// `Server` and `User-Agent` (RFC 7231, section 5.5.3): whitespace separated
/// product tokens, each optionally followed by comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductDescriptionsConverter;

/// Returns the text inside the comment starting at `text[0] == '('` and the
/// number of bytes the comment occupies.
fn comment(text: &str) -> Result<(&str, usize), FieldParseError> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&text[1..i], i + 1));
                }
            }
            _ => {}
        }
    }
    Err(FieldParseError::new(text, "unterminated comment"))
}

impl Converter for ProductDescriptionsConverter {
    type Value = Vec<CommentedValue<String>>;

    fn parse(&self, text: &str) -> Result<Self::Value, FieldParseError> {
        let mut products: Vec<CommentedValue<String>> = Vec::new();
        let mut rest = text.trim_start();
        while !rest.is_empty() {
            if rest.starts_with('(') {
                let (inner, consumed) = comment(rest)?;
                let product = products.last_mut().ok_or_else(|| FieldParseError::new(text, "comment without product"))?;
                product.comments.push(inner.to_owned());
                rest = &rest[consumed..];
            } else {
                let end = rest.find(|c: char| c.is_ascii_whitespace() || c == '(').unwrap_or(rest.len());
                products.push(CommentedValue::new(rest[..end].to_owned()));
                rest = &rest[end..];
            }
            rest = rest.trim_start();
        }
        Ok(products)
    }

    fn serialize(&self, value: &Self::Value) -> String {
        value.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
    }

    fn parse_lines(&self, lines: &[String]) -> Result<Self::Value, FieldParseError> {
        self.parse(&lines.join(" "))
    }
}
