//! HTTP response header.

use std::ops::{Deref, DerefMut};

use http::{StatusCode, Version};

use crate::protocol::MessageHeader;

/// The status line and fields of an HTTP response.
///
/// Derefs to [`MessageHeader`] for field access.
#[derive(Debug, Clone)]
pub struct ResponseHeader {
    status: StatusCode,
    reason_phrase: Option<String>,
    header: MessageHeader,
}

impl ResponseHeader {
    pub fn new(status: StatusCode, version: Version, has_payload: bool) -> Self {
        Self { status, reason_phrase: None, header: MessageHeader::new(version, has_payload) }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// The reason phrase received or set, else the canonical one for the status.
    pub fn reason_phrase(&self) -> &str {
        self.reason_phrase.as_deref().or_else(|| self.status.canonical_reason()).unwrap_or("")
    }

    pub fn set_reason_phrase(&mut self, reason_phrase: impl Into<String>) -> &mut Self {
        self.reason_phrase = Some(reason_phrase.into());
        self
    }

    /// Informational, `204 No Content` and `304 Not Modified` responses never
    /// have a payload.
    pub fn is_bodyless_status(&self) -> bool {
        self.status.is_informational() || self.status == StatusCode::NO_CONTENT || self.status == StatusCode::NOT_MODIFIED
    }

    pub fn into_inner(self) -> MessageHeader {
        self.header
    }
}

impl Deref for ResponseHeader {
    type Target = MessageHeader;

    fn deref(&self) -> &MessageHeader {
        &self.header
    }
}

impl DerefMut for ResponseHeader {
    fn deref_mut(&mut self) -> &mut MessageHeader {
        &mut self.header
    }
}

impl AsRef<MessageHeader> for ResponseHeader {
    fn as_ref(&self) -> &MessageHeader {
        &self.header
    }
}

impl AsMut<MessageHeader> for ResponseHeader {
    fn as_mut(&mut self) -> &mut MessageHeader {
        &mut self.header
    }
}
