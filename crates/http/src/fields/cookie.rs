//! `Cookie` and `Set-Cookie` values (RFC 6265).

use std::fmt;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};

use crate::fields::FieldParseError;
use crate::fields::converter::{Converter, DateTimeConverter, MultiValueConverter};
use crate::fields::grammar::{is_token, split_list, unquote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    expires: Option<DateTime<Utc>>,
    max_age: Option<i64>,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            max_age: None,
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    pub fn max_age(&self) -> Option<i64> {
        self.max_age
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    pub fn same_site(&self) -> Option<&str> {
        self.same_site.as_deref()
    }

    #[must_use]
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: impl Into<String>) -> Self {
        self.same_site = Some(same_site.into());
        self
    }

    fn write_pair(&self, f: &mut impl fmt::Write) -> fmt::Result {
        let needs_quotes =
            self.value.bytes().any(|b| matches!(b, b' ' | b'"' | b',' | b';' | b'\\') || b.is_ascii_control());
        if needs_quotes {
            write!(f, "{}=\"{}\"", self.name, self.value.replace('\\', "\\\\").replace('"', "\\\""))
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }

    fn parse_pair(text: &str) -> Result<Self, FieldParseError> {
        let (name, value) = text.split_once('=').ok_or_else(|| FieldParseError::new(text, "missing '=' in cookie"))?;
        let name = name.trim();
        if !is_token(name) {
            return Err(FieldParseError::new(text, "invalid cookie name"));
        }
        Ok(Self::new(name, unquote(value.trim())))
    }
}

/// Emits the `Set-Cookie` form, including attributes.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_pair(f)?;
        if let Some(expires) = &self.expires {
            write!(f, "; Expires={}", DateTimeConverter.serialize(expires))?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if let Some(same_site) = &self.same_site {
            write!(f, "; SameSite={same_site}")?;
        }
        Ok(())
    }
}

/// The cookies of a `Cookie` or merged `Set-Cookie` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieList(Vec<Cookie>);

impl CookieList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of the first cookie named `name`.
    pub fn value_for_name(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|cookie| cookie.name == name).map(Cookie::value)
    }

    pub fn into_inner(self) -> Vec<Cookie> {
        self.0
    }
}

impl Deref for CookieList {
    type Target = Vec<Cookie>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CookieList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Cookie>> for CookieList {
    fn from(cookies: Vec<Cookie>) -> Self {
        Self(cookies)
    }
}

impl FromIterator<Cookie> for CookieList {
    fn from_iter<T: IntoIterator<Item = Cookie>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CookieList {
    type Item = Cookie;
    type IntoIter = std::vec::IntoIter<Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A single `name=value` pair as sent in `Cookie`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePairConverter;

impl Converter for CookiePairConverter {
    type Value = Cookie;

    fn parse(&self, text: &str) -> Result<Cookie, FieldParseError> {
        Cookie::parse_pair(text)
    }

    fn serialize(&self, value: &Cookie) -> String {
        let mut text = String::new();
        let _ = value.write_pair(&mut text);
        text
    }
}

/// `Cookie`: pairs separated by `"; "`, attributes are never sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieListConverter;

impl Converter for CookieListConverter {
    type Value = CookieList;

    fn parse(&self, text: &str) -> Result<CookieList, FieldParseError> {
        split_list(text, b';').into_iter().map(Cookie::parse_pair).collect()
    }

    fn serialize(&self, value: &CookieList) -> String {
        value.iter().map(|cookie| CookiePairConverter.serialize(cookie)).collect::<Vec<_>>().join("; ")
    }

    fn parse_lines(&self, lines: &[String]) -> Result<CookieList, FieldParseError> {
        let mut cookies = CookieList::new();
        for line in lines {
            cookies.extend(self.parse(line)?);
        }
        Ok(cookies)
    }
}

impl MultiValueConverter for CookieListConverter {
    type Item = Cookie;
    type ItemConverter = CookiePairConverter;

    fn empty(&self) -> CookieList {
        CookieList::new()
    }

    fn append(&self, container: &mut CookieList, item: Cookie) {
        container.push(item);
    }

    fn item_converter(&self) -> &CookiePairConverter {
        &CookiePairConverter
    }

    fn separate_values(&self) -> bool {
        false
    }
}

/// One `Set-Cookie` line: a pair followed by attributes.
///
/// Unknown attributes and attributes with invalid values are ignored
/// (RFC 6265, section 5.2).
#[derive(Debug, Clone, Copy, Default)]
pub struct SetCookieConverter;

impl Converter for SetCookieConverter {
    type Value = Cookie;

    fn parse(&self, text: &str) -> Result<Cookie, FieldParseError> {
        let mut parts = split_list(text, b';').into_iter();
        let pair = parts.next().ok_or_else(|| FieldParseError::new(text, "empty cookie"))?;
        let mut cookie = Cookie::parse_pair(pair)?;

        for attribute in parts {
            let (name, value) = match attribute.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => (attribute, ""),
            };
            match name.to_ascii_lowercase().as_str() {
                "expires" => cookie.expires = DateTimeConverter.parse(value).ok().or(cookie.expires),
                "max-age" => cookie.max_age = value.parse().ok().or(cookie.max_age),
                "domain" if !value.is_empty() => cookie.domain = Some(value.trim_start_matches('.').to_owned()),
                "path" if value.starts_with('/') => cookie.path = Some(value.to_owned()),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => cookie.same_site = Some(value.to_owned()),
                _ => {}
            }
        }
        Ok(cookie)
    }

    fn serialize(&self, value: &Cookie) -> String {
        value.to_string()
    }
}

/// `Set-Cookie`: every cookie is a header line of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetCookieListConverter;

impl Converter for SetCookieListConverter {
    type Value = CookieList;

    fn parse(&self, text: &str) -> Result<CookieList, FieldParseError> {
        Ok(CookieList(vec![SetCookieConverter.parse(text)?]))
    }

    fn serialize(&self, value: &CookieList) -> String {
        self.field_lines(value).join(", ")
    }

    fn parse_lines(&self, lines: &[String]) -> Result<CookieList, FieldParseError> {
        lines.iter().map(|line| SetCookieConverter.parse(line)).collect()
    }

    fn field_lines(&self, value: &CookieList) -> Vec<String> {
        value.iter().map(|cookie| SetCookieConverter.serialize(cookie)).collect()
    }
}

impl MultiValueConverter for SetCookieListConverter {
    type Item = Cookie;
    type ItemConverter = SetCookieConverter;

    fn empty(&self) -> CookieList {
        CookieList::new()
    }

    fn append(&self, container: &mut CookieList, item: Cookie) {
        container.push(item);
    }

    fn item_converter(&self) -> &SetCookieConverter {
        &SetCookieConverter
    }

    fn separate_values(&self) -> bool {
        true
    }
}
