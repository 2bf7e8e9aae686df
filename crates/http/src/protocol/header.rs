//! The field container shared by request and response headers.
//!
//! Fields are kept in insertion order. Decoded fields are stored as
//! [`RawField`]s; the first typed access converts a field with the given
//! [`Converter`] and replaces the stored entry, so later accesses with the
//! same converter return the cached value. A field that cannot be converted
//! is reported as absent by the typed accessors while its text remains
//! available through [`MessageHeader::find_string_value`].

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, TimeDelta, Utc};
use http::Version;
use tracing::trace;

use crate::fields::converters::{DATE_TIME, STRING_LIST};
use crate::fields::names::{CONNECTION, DATE, RETRY_AFTER, UPGRADE};
use crate::fields::{Converter, DynField, FieldParseError, HeaderField, RawField, lookup_converter};

#[derive(Debug, Clone)]
pub struct MessageHeader {
    version: Version,
    fields: Vec<Box<dyn DynField>>,
    has_payload: bool,
}

impl MessageHeader {
    pub fn new(version: Version, has_payload: bool) -> Self {
        Self { version, fields: Vec::new(), has_payload }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) -> &mut Self {
        self.version = version;
        self
    }

    /// Whether a payload follows the header.
    pub fn has_payload(&self) -> bool {
        self.has_payload
    }

    pub fn set_has_payload(&mut self, has_payload: bool) -> &mut Self {
        self.has_payload = has_payload;
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &(dyn DynField + 'static)> {
        self.fields.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name().eq_ignore_ascii_case(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replaces the field with the same name in place, or appends it.
    fn put(&mut self, field: Box<dyn DynField>) -> usize {
        match self.position(field.name()) {
            Some(index) => {
                self.fields[index] = field;
                index
            }
            None => {
                self.fields.push(field);
                self.fields.len() - 1
            }
        }
    }

    /// Sets a typed field, replacing any field with the same name.
    ///
    /// Setting `Upgrade` also makes sure `Connection` lists `Upgrade`.
    pub fn set_field<C: Converter>(&mut self, field: HeaderField<C>) -> &mut Self {
        let is_upgrade = field.name().eq_ignore_ascii_case(UPGRADE);
        self.put(Box::new(field));
        if is_upgrade {
            self.ensure_connection_upgrade();
        }
        self
    }

    pub fn set_value<C: Converter>(&mut self, name: &str, value: C::Value, converter: C) -> &mut Self {
        self.set_field(HeaderField::new(name, value, converter))
    }

    /// Parses `text` with the converter registered for `name` and sets the
    /// resulting field.
    pub fn set_text(&mut self, name: &str, text: &str) -> Result<&mut Self, FieldParseError> {
        let field = lookup_converter(name).to_field(name, &[text.to_owned()])?;
        let is_upgrade = field.name().eq_ignore_ascii_case(UPGRADE);
        self.put(field);
        if is_upgrade {
            self.ensure_connection_upgrade();
        }
        Ok(self)
    }

    /// Sets a field from text without checking it.
    pub fn set_raw(&mut self, name: &str, text: impl Into<String>) -> &mut Self {
        self.put(Box::new(RawField::new(name, text)));
        self
    }

    /// Adds a received line to a field, merging it with earlier lines of the
    /// same field in wire order.
    pub fn append_raw(&mut self, name: &str, text: impl Into<String>) -> &mut Self {
        let Some(index) = self.position(name) else {
            self.fields.push(Box::new(RawField::new(name, text)));
            return self;
        };

        let existing = &mut self.fields[index];
        if let Some(raw) = existing.as_any_mut().downcast_mut::<RawField>() {
            raw.push_line(text);
        } else {
            let mut lines = existing.field_lines();
            lines.push(text.into());
            *existing = Box::new(RawField::from_lines(existing.name(), lines));
        }
        self
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Box<dyn DynField>> {
        self.position(name).map(|index| self.fields.remove(index))
    }

    pub fn clear_fields(&mut self) {
        self.fields.clear();
    }

    /// Returns the index of `name` after making sure the entry is a
    /// `HeaderField<C>`, converting it from its text if needed.
    fn typed_index<C: Converter>(&mut self, name: &str, converter: &C) -> Option<usize> {
        let index = self.position(name)?;
        if self.fields[index].as_any().is::<HeaderField<C>>() {
            return Some(index);
        }

        let name = self.fields[index].name().to_owned();
        match converter.parse_lines(&self.fields[index].field_lines()) {
            Ok(value) => {
                trace!(field = name, "converted field to typed value");
                self.fields[index] = Box::new(HeaderField::new(&name, value, converter.clone()));
                Some(index)
            }
            Err(e) => {
                trace!(field = name, cause = %e, "field cannot be converted");
                None
            }
        }
    }

    fn typed_at<C: Converter>(&mut self, index: usize) -> &mut HeaderField<C> {
        match self.fields[index].as_any_mut().downcast_mut::<HeaderField<C>>() {
            Some(field) => field,
            None => unreachable!("field at {index} has been converted before"),
        }
    }

    /// The field `name` converted with `converter`, `None` if absent or not
    /// convertible.
    pub fn find_field<C: Converter>(&mut self, name: &str, converter: C) -> Option<&HeaderField<C>> {
        self.find_field_mut(name, converter).map(|field| &*field)
    }

    pub fn find_field_mut<C: Converter>(&mut self, name: &str, converter: C) -> Option<&mut HeaderField<C>> {
        let index = self.typed_index(name, &converter)?;
        Some(self.typed_at(index))
    }

    pub fn find_value<C: Converter>(&mut self, name: &str, converter: C) -> Option<&C::Value> {
        self.find_field(name, converter).map(HeaderField::value)
    }

    /// Converts the field without caching the result.
    pub fn parse_value<C: Converter>(&self, name: &str, converter: C) -> Option<C::Value> {
        let index = self.position(name)?;
        let field = &self.fields[index];
        if let Some(typed) = field.as_any().downcast_ref::<HeaderField<C>>() {
            return Some(typed.value().clone());
        }
        converter.parse_lines(&field.field_lines()).ok()
    }

    /// The text of the field, lines joined with `", "`.
    pub fn find_string_value(&self, name: &str) -> Option<String> {
        self.position(name).map(|index| self.fields[index].field_lines().join(", "))
    }

    /// The value of `name`, set to `init()` first if the field is absent or
    /// cannot be converted.
    pub fn compute_if_absent<C, F>(&mut self, name: &str, converter: C, init: F) -> &mut C::Value
    where
        C: Converter,
        F: FnOnce() -> C::Value,
    {
        let index = match self.typed_index(name, &converter) {
            Some(index) => index,
            None => self.put(Box::new(HeaderField::new(name, init(), converter))),
        };
        self.typed_at::<C>(index).value_mut()
    }

    /// Whether the connection is closed after this message (`Connection: close`).
    pub fn is_final(&self) -> bool {
        self.has_connection_token("close")
    }

    pub(crate) fn has_connection_token(&self, token: &str) -> bool {
        self.parse_value(CONNECTION, STRING_LIST)
            .is_some_and(|tokens| tokens.iter().any(|t| t.eq_ignore_ascii_case(token)))
    }

    pub(crate) fn ensure_connection_upgrade(&mut self) {
        let connection = self.compute_if_absent(CONNECTION, STRING_LIST, Vec::new);
        if !connection.iter().any(|token| token.eq_ignore_ascii_case(UPGRADE)) {
            connection.push(UPGRADE.to_owned());
        }
    }

    /// `Retry-After` as a point in time; delta-seconds are resolved against
    /// `Date` (or now, if there is no `Date`).
    pub fn retry_after(&mut self) -> Option<DateTime<Utc>> {
        self.resolve_retry_after();
        self.find_value(RETRY_AFTER, DATE_TIME).copied()
    }

    /// Replaces a delta-seconds `Retry-After` with the date it denotes.
    pub(crate) fn resolve_retry_after(&mut self) {
        let Some(text) = self.find_string_value(RETRY_AFTER) else {
            return;
        };
        let Ok(seconds) = text.trim().parse::<i64>() else {
            return;
        };
        let base = self.find_value(DATE, DATE_TIME).copied().unwrap_or_else(Utc::now);
        if let Some(at) = TimeDelta::try_seconds(seconds).and_then(|delta| base.checked_add_signed(delta)) {
            self.set_value(RETRY_AFTER, at, DATE_TIME);
        }
    }

    /// Writes `Name: value\r\n` for every line of every field.
    pub(crate) fn write_fields(&self, dst: &mut BytesMut) {
        for field in &self.fields {
            for line in field.field_lines() {
                dst.put_slice(field.name().as_bytes());
                dst.put_slice(b": ");
                dst.put_slice(line.as_bytes());
                dst.put_slice(b"\r\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::fields::converters::{LONG, MEDIA_TYPE, SET_COOKIE_LIST, STRING};
    use crate::fields::names::{CONTENT_LENGTH, CONTENT_TYPE, SET_COOKIE};

    #[test]
    fn converts_raw_fields_once() {
        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.append_raw("content-length", "42");

        assert_eq!(header.find_value(CONTENT_LENGTH, LONG), Some(&42));
        assert!(header.fields().next().unwrap().as_any().is::<HeaderField<crate::fields::LongConverter>>());
        assert_eq!(header.find_string_value(CONTENT_LENGTH).as_deref(), Some("42"));
    }

    #[test]
    fn unconvertible_fields_are_absent() {
        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.append_raw(CONTENT_TYPE, "not a media type");
        assert!(header.find_value(CONTENT_TYPE, MEDIA_TYPE).is_none());
        assert_eq!(header.find_string_value(CONTENT_TYPE).as_deref(), Some("not a media type"));
        assert!(header.set_text(CONTENT_LENGTH, "abc").is_err());
        assert!(!header.has_field(CONTENT_LENGTH));
    }

    #[test]
    fn merges_repeated_lines() {
        let mut header = MessageHeader::new(Version::HTTP_11, true);
        header.append_raw("Set-Cookie", "a=1; Path=/");
        header.append_raw("set-cookie", "b=2");
        assert_eq!(header.len(), 1);

        let cookies = header.find_value(SET_COOKIE, SET_COOKIE_LIST).unwrap();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.value_for_name("b"), Some("2"));

        header.append_raw(SET_COOKIE, "c=3");
        assert_eq!(header.find_value(SET_COOKIE, SET_COOKIE_LIST).unwrap().len(), 3);
    }

    #[test]
    fn upgrade_adds_connection_token() {
        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.set_value(CONNECTION, vec!["keep-alive".to_owned()], STRING_LIST);
        header.set_value(UPGRADE, vec!["websocket".to_owned()], STRING_LIST);
        assert_eq!(header.find_string_value(CONNECTION).as_deref(), Some("keep-alive, Upgrade"));

        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.set_text("upgrade", "websocket").unwrap();
        assert_eq!(header.find_string_value(CONNECTION).as_deref(), Some("Upgrade"));
    }

    #[test]
    fn compute_if_absent_initializes_once() {
        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.compute_if_absent("X-Trace", STRING, || "first".to_owned());
        let value = header.compute_if_absent("X-Trace", STRING, || "second".to_owned());
        assert_eq!(value, "first");
    }

    #[test]
    fn detects_final_messages() {
        let mut header = MessageHeader::new(Version::HTTP_11, false);
        assert!(!header.is_final());
        header.append_raw(CONNECTION, "Close");
        assert!(header.is_final());
    }

    #[test]
    fn resolves_retry_after_seconds() {
        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.append_raw(DATE, "Sat, 23 Jul 2016 16:54:54 GMT");
        header.append_raw(RETRY_AFTER, "120");
        assert_eq!(header.retry_after(), Some(Utc.with_ymd_and_hms(2016, 7, 23, 16, 56, 54).unwrap()));

        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.append_raw(RETRY_AFTER, "Fri, 31 Dec 1999 23:59:59 GMT");
        assert_eq!(header.retry_after(), Some(Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn writes_fields_in_order() {
        let mut header = MessageHeader::new(Version::HTTP_11, false);
        header.set_raw("Host", "example.com");
        header.append_raw(SET_COOKIE, "a=1");
        header.append_raw(SET_COOKIE, "b=2");
        let mut dst = BytesMut::new();
        header.write_fields(&mut dst);
        assert_eq!(&dst[..], b"Host: example.com\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n");
    }
}
