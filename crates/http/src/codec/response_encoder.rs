//! HTTP response encoder (server side).
//!
//! The framing of a response depends on the request it answers. Linked with
//! the request decoder (see [`HttpResponseEncoder::set_peer_decoder`]) the
//! encoder omits the body of responses to `HEAD` and closes the connection
//! after answering an HTTP/1.0 client that did not ask for keep-alive.

use bytes::{Buf, BufMut};
use http::{Method, StatusCode, Version};
use tracing::debug;

use super::contract::{CodecResult, Encoder};
use super::exchange::SharedExchange;
use super::header::write_response_head;
use super::message_encoder::{MessageEncoder, prepare_framing};
use super::request_decoder::HttpRequestDecoder;
use super::body::PayloadEncoder;
use crate::fields::converters::{LONG, STRING_LIST};
use crate::fields::names::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::protocol::{ResponseHeader, SendError};

#[derive(Debug)]
pub struct HttpResponseEncoder {
    core: MessageEncoder,
    header: Option<ResponseHeader>,
    exchange: Option<SharedExchange>,
}

impl HttpResponseEncoder {
    pub fn new() -> Self {
        Self { core: MessageEncoder::new(), header: None, exchange: None }
    }

    /// Links this encoder with the decoder of the requests being answered.
    pub fn set_peer_decoder(&mut self, decoder: &mut HttpRequestDecoder) {
        let exchange = self.exchange.get_or_insert_with(SharedExchange::new).clone();
        decoder.set_exchange(exchange);
    }

    pub(crate) fn set_exchange(&mut self, exchange: SharedExchange) {
        self.exchange = Some(exchange);
    }
}

impl Default for HttpResponseEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for HttpResponseEncoder {
    type Header = ResponseHeader;

    fn set_header(&mut self, mut header: ResponseHeader) -> Result<(), SendError> {
        let status = header.status();
        let request = self.exchange.as_ref().and_then(|exchange| {
            let request = exchange.current_request();
            if !status.is_informational() || status == StatusCode::SWITCHING_PROTOCOLS {
                exchange.complete_request();
            }
            request
        });

        let answers_head = request.as_ref().is_some_and(|request| request.method == Method::HEAD);
        let peer_keep_alive = request.as_ref().is_none_or(|request| request.keep_alive);
        let peer_http10 = request.as_ref().is_some_and(|request| request.version == Version::HTTP_10);

        let payload = if header.is_bodyless_status() {
            header.set_has_payload(false);
            PayloadEncoder::empty()
        } else if answers_head {
            PayloadEncoder::discard()
        } else {
            let has_length = header.has_field(CONTENT_LENGTH) || header.has_field(TRANSFER_ENCODING);
            if !header.has_payload() && !has_length {
                header.set_value(CONTENT_LENGTH, 0, LONG);
            }
            if peer_http10 && header.has_payload() && !header.has_field(CONTENT_LENGTH) {
                // HTTP/1.0 clients do not understand chunked
                header.remove_field(TRANSFER_ENCODING);
                PayloadEncoder::until_close()
            } else {
                prepare_framing(&mut header, true)?
            }
        };

        let close = header.is_final() || !peer_keep_alive || payload.is_until_close();
        if close && !header.is_final() && header.version() == Version::HTTP_11 {
            header.compute_if_absent(CONNECTION, STRING_LIST, Vec::new).push("close".to_owned());
        }
        debug!(%status, close, "encoding response");

        write_response_head(&header, self.core.head_buffer()?)?;
        self.core.start(payload, close);
        self.header = Some(header);
        Ok(())
    }

    fn encode<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut, end_of_input: bool) -> Result<CodecResult, SendError> {
        self.core.encode(src, dst, end_of_input)
    }

    fn header(&self) -> Option<&ResponseHeader> {
        self.header.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::codec::Decoder;

    fn linked_pair(request: &str) -> HttpResponseEncoder {
        let mut decoder = HttpRequestDecoder::new();
        let mut encoder = HttpResponseEncoder::new();
        decoder.set_peer_encoder(&mut encoder);
        decoder.decode(&mut BytesMut::from(request), None, false).unwrap();
        encoder
    }

    fn encode_all(encoder: &mut HttpResponseEncoder, header: ResponseHeader, body: &[u8]) -> (String, CodecResult) {
        encoder.set_header(header).unwrap();
        let mut dst = BytesMut::new();
        let mut src = body;
        let result = encoder.encode(&mut src, &mut dst, true).unwrap();
        (String::from_utf8(dst.to_vec()).unwrap(), result)
    }

    #[test]
    fn writes_content_length_for_empty_response() {
        let header = ResponseHeader::new(StatusCode::OK, Version::HTTP_11, false);
        let (text, result) = encode_all(&mut HttpResponseEncoder::new(), header, b"");
        assert_eq!(text, "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        assert!(!result.close_connection());
    }

    #[test]
    fn chunks_body_without_length() {
        let header = ResponseHeader::new(StatusCode::OK, Version::HTTP_11, true);
        let mut encoder = HttpResponseEncoder::new();
        encoder.set_header(header).unwrap();

        let mut dst = BytesMut::new();
        let result = encoder.encode(&mut &b"Hello"[..], &mut dst, false).unwrap();
        assert!(result.is_underflow());
        let result = encoder.encode(&mut &b" World!"[..], &mut dst, true).unwrap();
        assert!(!result.is_underflow() && !result.is_overflow());
        assert_eq!(
            std::str::from_utf8(&dst).unwrap(),
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n7\r\n World!\r\n0\r\n\r\n"
        );
    }

    #[test]
    fn omits_body_for_head_requests() {
        let mut encoder = linked_pair("HEAD / HTTP/1.1\r\nHost: h\r\n\r\n");
        let mut header = ResponseHeader::new(StatusCode::OK, Version::HTTP_11, true);
        header.set_raw(CONTENT_LENGTH, "12");
        let (text, result) = encode_all(&mut encoder, header, b"Hello World!");
        assert_eq!(text, "HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\n");
        assert!(!result.close_connection());
    }

    #[test]
    fn closes_after_http10_request() {
        let mut encoder = linked_pair("GET / HTTP/1.0\r\n\r\n");
        let header = ResponseHeader::new(StatusCode::OK, Version::HTTP_11, true);
        let (text, result) = encode_all(&mut encoder, header, b"data");
        assert_eq!(text, "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\ndata");
        assert!(result.close_connection());
    }

    #[test]
    fn closes_on_connection_close() {
        let mut header = ResponseHeader::new(StatusCode::NOT_FOUND, Version::HTTP_11, false);
        header.set_raw(CONNECTION, "close");
        let (_, result) = encode_all(&mut HttpResponseEncoder::new(), header, b"");
        assert!(result.close_connection());
    }

    #[test]
    fn interim_response_keeps_request_pending() {
        let mut encoder = linked_pair("HEAD / HTTP/1.1\r\nExpect: 100-continue\r\n\r\n");
        let (text, _) = encode_all(&mut encoder, ResponseHeader::new(StatusCode::CONTINUE, Version::HTTP_11, false), b"");
        assert_eq!(text, "HTTP/1.1 100 Continue\r\n\r\n");

        let mut header = ResponseHeader::new(StatusCode::OK, Version::HTTP_11, true);
        header.set_raw(CONTENT_LENGTH, "3");
        let (text, _) = encode_all(&mut encoder, header, b"abc");
        assert_eq!(text, "HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\n");
    }

    #[test]
    fn body_exceeding_content_length_is_an_error() {
        let mut header = ResponseHeader::new(StatusCode::OK, Version::HTTP_11, true);
        header.set_raw(CONTENT_LENGTH, "2");
        let mut encoder = HttpResponseEncoder::new();
        encoder.set_header(header).unwrap();
        let result = encoder.encode(&mut &b"abc"[..], &mut BytesMut::new(), true);
        assert!(matches!(result, Err(SendError::InvalidBody { .. })));
    }
}
