//! HTTP request header.

use std::ops::{Deref, DerefMut};

use http::{Method, Uri, Version};

use crate::protocol::MessageHeader;

/// The start line and fields of an HTTP request.
///
/// Derefs to [`MessageHeader`] for field access.
#[derive(Debug, Clone)]
pub struct RequestHeader {
    method: Method,
    uri: Uri,
    header: MessageHeader,
}

impl RequestHeader {
    pub fn new(method: Method, uri: Uri, version: Version, has_payload: bool) -> Self {
        Self { method, uri, header: MessageHeader::new(version, has_payload) }
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns a reference to the request target.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn set_uri(&mut self, uri: Uri) -> &mut Self {
        self.uri = uri;
        self
    }

    pub fn into_inner(self) -> MessageHeader {
        self.header
    }
}

impl Deref for RequestHeader {
    type Target = MessageHeader;

    fn deref(&self) -> &MessageHeader {
        &self.header
    }
}

impl DerefMut for RequestHeader {
    fn deref_mut(&mut self) -> &mut MessageHeader {
        &mut self.header
    }
}

impl AsRef<MessageHeader> for RequestHeader {
    fn as_ref(&self) -> &MessageHeader {
        &self.header
    }
}

impl AsMut<MessageHeader> for RequestHeader {
    fn as_mut(&mut self) -> &mut MessageHeader {
        &mut self.header
    }
}
