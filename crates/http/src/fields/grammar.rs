//! Token, quoted-string and list helpers (RFC 7230, section 3.2.6 and 7).

use std::borrow::Cow;

#[inline]
pub(crate) fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

pub(crate) fn is_token(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(is_tchar)
}

/// Splits `text` at `delimiter`, ignoring delimiters inside quoted strings and
/// comments. Elements are trimmed, empty elements dropped.
pub(crate) fn split_list(text: &str, delimiter: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut comment_depth = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_quotes || comment_depth > 0 => escaped = true,
            b'"' if comment_depth == 0 => in_quotes = !in_quotes,
            b'(' if !in_quotes => comment_depth += 1,
            b')' if !in_quotes => comment_depth = comment_depth.saturating_sub(1),
            _ if b == delimiter && !in_quotes && comment_depth == 0 => {
                push_item(&mut items, &text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_item(&mut items, &text[start..]);
    items
}

fn push_item<'a>(items: &mut Vec<&'a str>, item: &'a str) {
    let item = item.trim();
    if !item.is_empty() {
        items.push(item);
    }
}

/// Removes surrounding double quotes and backslash escapes, if any.
pub(crate) fn unquote(text: &str) -> Cow<'_, str> {
    let Some(inner) = text.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) else {
        return Cow::Borrowed(text);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => result.extend(chars.next()),
            c => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Returns `value` unchanged if it is a token, else as quoted string.
pub(crate) fn quote_if_needed(value: &str) -> Cow<'_, str> {
    if is_token(value) {
        return Cow::Borrowed(value);
    }

    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result.push('"');
    Cow::Owned(result)
}
