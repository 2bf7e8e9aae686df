//! Coordination between the two directions of an HTTP connection.
//!
//! A response can only be framed correctly when its request is known: the
//! response to `HEAD` never has a body and an HTTP/1.0 client without
//! keep-alive expects the connection to be closed. The request side of a
//! connection records every request in a [`SharedExchange`], the response side
//! looks up the oldest unanswered one and retires it with the final response.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use http::{Method, Version};
use tracing::trace;

use crate::protocol::{MessageHeader, RequestHeader};

/// What the response side needs to know about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    pub version: Version,
    pub keep_alive: bool,
}

impl RequestInfo {
    pub fn of(request: &RequestHeader) -> Self {
        Self { method: request.method().clone(), version: request.version(), keep_alive: is_keep_alive(request) }
    }
}

/// Whether the connection may carry another message after this one.
pub(crate) fn is_keep_alive(header: &MessageHeader) -> bool {
    if header.version() == Version::HTTP_10 {
        header.has_connection_token("keep-alive")
    } else {
        !header.is_final()
    }
}

/// Requests awaiting their final response, shared by an engine and its peer.
#[derive(Debug, Clone, Default)]
pub struct SharedExchange(Rc<RefCell<VecDeque<RequestInfo>>>);

impl SharedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_request(&self, info: RequestInfo) {
        trace!(method = %info.method, version = ?info.version, "request recorded");
        self.0.borrow_mut().push_back(info);
    }

    /// The oldest request without a final response.
    pub fn current_request(&self) -> Option<RequestInfo> {
        self.0.borrow().front().cloned()
    }

    /// Retires the oldest request once its final response has started.
    pub(crate) fn complete_request(&self) -> Option<RequestInfo> {
        self.0.borrow_mut().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.0.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::names::CONNECTION;

    fn request(method: Method, version: Version, connection: Option<&str>) -> RequestHeader {
        let mut header = RequestHeader::new(method, "/".parse().unwrap(), version, false);
        if let Some(connection) = connection {
            header.set_raw(CONNECTION, connection);
        }
        header
    }

    #[test]
    fn keep_alive_depends_on_version() {
        assert!(RequestInfo::of(&request(Method::GET, Version::HTTP_11, None)).keep_alive);
        assert!(!RequestInfo::of(&request(Method::GET, Version::HTTP_11, Some("close"))).keep_alive);
        assert!(!RequestInfo::of(&request(Method::GET, Version::HTTP_10, None)).keep_alive);
        assert!(RequestInfo::of(&request(Method::GET, Version::HTTP_10, Some("Keep-Alive"))).keep_alive);
    }

    #[test]
    fn requests_are_answered_in_order() {
        let exchange = SharedExchange::new();
        let peer = exchange.clone();
        exchange.push_request(RequestInfo::of(&request(Method::HEAD, Version::HTTP_11, None)));
        exchange.push_request(RequestInfo::of(&request(Method::GET, Version::HTTP_11, None)));

        assert_eq!(peer.current_request().map(|info| info.method), Some(Method::HEAD));
        assert_eq!(peer.complete_request().map(|info| info.method), Some(Method::HEAD));
        assert_eq!(peer.current_request().map(|info| info.method), Some(Method::GET));
        assert_eq!(exchange.pending(), 1);
    }
}
