//! HTTP request decoder (server side).
//!
//! The decoder operates in two phases per request:
//! 1. Head parsing: the head is collected until its blank line and parsed
//!    into a [`RequestHeader`], which is reported with `header_completed`
//! 2. Payload parsing: the body, if any, is copied to the caller's buffer
//!
//! After the body the decoder waits for the next request on the connection.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_http_codec::codec::{Decoder, HttpRequestDecoder};
//!
//! let mut decoder = HttpRequestDecoder::new();
//! let mut src = BytesMut::from("POST /submit HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello");
//! let mut body = BytesMut::new();
//!
//! let result = decoder.decode(&mut src, Some(&mut body), false).unwrap();
//! assert!(result.is_header_completed());
//! assert_eq!(decoder.header().unwrap().uri().path(), "/submit");
//! assert_eq!(&body[..], b"hello");
//! ```

use bytes::{Buf, BufMut};
use tracing::trace;

use super::contract::{CodecResult, Decoder};
use super::exchange::{RequestInfo, SharedExchange};
use super::header::{HeadLimits, parse_payload, parse_request_head};
use super::message_decoder::MessageDecoder;
use super::response_encoder::HttpResponseEncoder;
use crate::protocol::{ParseError, RequestHeader};

/// A decoder for HTTP requests that handles both heads and payloads.
#[derive(Debug)]
pub struct HttpRequestDecoder {
    core: MessageDecoder,
    header: Option<RequestHeader>,
    exchange: Option<SharedExchange>,
}

impl HttpRequestDecoder {
    pub fn new() -> Self {
        Self::with_limits(HeadLimits::default())
    }

    pub fn with_limits(limits: HeadLimits) -> Self {
        Self { core: MessageDecoder::new(limits), header: None, exchange: None }
    }

    /// Links this decoder with the encoder of the responses, so that the
    /// encoder knows which request it is answering.
    pub fn set_peer_encoder(&mut self, encoder: &mut HttpResponseEncoder) {
        let exchange = self.exchange.get_or_insert_with(SharedExchange::new).clone();
        encoder.set_exchange(exchange);
    }

    pub(crate) fn set_exchange(&mut self, exchange: SharedExchange) {
        self.exchange = Some(exchange);
    }
}

impl Default for HttpRequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for HttpRequestDecoder {
    type Header = RequestHeader;
    type Response = ();

    fn decode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: Option<&mut dyn BufMut>,
        end_of_input: bool,
    ) -> Result<CodecResult, ParseError> {
        let mut header_completed = false;

        if self.core.is_reading_head() {
            let Some(head) = self.core.read_head(src, end_of_input)? else {
                return Ok(CodecResult::needs_input().with_close_connection(end_of_input));
            };

            let mut header = parse_request_head(&head, self.core.limits())?;
            let payload_size = parse_payload(&header, false)?;
            header.set_has_payload(!payload_size.is_empty());
            trace!(method = %header.method(), uri = %header.uri(), ?payload_size, "decoded request head");

            if let Some(exchange) = &self.exchange {
                exchange.push_request(RequestInfo::of(&header));
            }
            self.core.start_body(payload_size);
            self.header = Some(header);
            header_completed = true;
        }

        let result = match self.header.as_mut() {
            Some(header) => self.core.decode_body(src, dst, end_of_input, header)?,
            None => CodecResult::needs_input(),
        };
        Ok(result.with_header_completed(header_completed))
    }

    fn header(&self) -> Option<&RequestHeader> {
        self.header.as_ref()
    }

    fn header_mut(&mut self) -> Option<&mut RequestHeader> {
        self.header.as_mut()
    }
}
