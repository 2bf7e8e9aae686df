//! HTTP response decoder (client side).
//!
//! Whether a response has a body depends on the request it answers: the
//! response to `HEAD` never has one. Link the decoder with the request encoder
//! through [`HttpResponseDecoder::set_peer_encoder`] to have this taken into
//! account; an unlinked decoder assumes `GET`.

use bytes::{Buf, BufMut};
use http::{Method, StatusCode};
use tracing::trace;

use super::contract::{CodecResult, Decoder};
use super::exchange::{SharedExchange, is_keep_alive};
use super::header::{HeadLimits, parse_payload, parse_response_head};
use super::message_decoder::MessageDecoder;
use super::request_encoder::HttpRequestEncoder;
use crate::protocol::{ParseError, PayloadSize, ResponseHeader};

#[derive(Debug)]
pub struct HttpResponseDecoder {
    core: MessageDecoder,
    header: Option<ResponseHeader>,
    exchange: Option<SharedExchange>,
    close_after_message: bool,
}

impl HttpResponseDecoder {
    pub fn new() -> Self {
        Self::with_limits(HeadLimits::default())
    }

    pub fn with_limits(limits: HeadLimits) -> Self {
        Self { core: MessageDecoder::new(limits), header: None, exchange: None, close_after_message: false }
    }

    /// Links this decoder with the encoder of the requests being answered.
    pub fn set_peer_encoder(&mut self, encoder: &mut HttpRequestEncoder) {
        let exchange = self.exchange.get_or_insert_with(SharedExchange::new).clone();
        encoder.set_exchange(exchange);
    }

    pub(crate) fn set_exchange(&mut self, exchange: SharedExchange) {
        self.exchange = Some(exchange);
    }

    fn payload_size(&self, header: &ResponseHeader) -> Result<PayloadSize, ParseError> {
        let answers_head = self
            .exchange
            .as_ref()
            .and_then(SharedExchange::current_request)
            .is_some_and(|request| request.method == Method::HEAD);

        if answers_head || header.is_bodyless_status() {
            return Ok(PayloadSize::Empty);
        }
        parse_payload(header, true)
    }

    fn retire_request(&self, status: StatusCode) {
        // interim responses precede the final one
        if status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS {
            return;
        }
        if let Some(exchange) = &self.exchange {
            exchange.complete_request();
        }
    }
}

impl Default for HttpResponseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for HttpResponseDecoder {
    type Header = ResponseHeader;
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

            let mut header = parse_response_head(&head, self.core.limits())?;
            let payload_size = self.payload_size(&header)?;
            header.set_has_payload(!payload_size.is_empty());
            header.resolve_retry_after();
            trace!(status = %header.status(), ?payload_size, "decoded response head");

            self.retire_request(header.status());
            self.close_after_message = payload_size.is_until_close() || !is_keep_alive(&header);
            self.core.start_body(payload_size);
            self.header = Some(header);
            header_completed = true;
        }

        let result = match self.header.as_mut() {
            Some(header) => self.core.decode_body(src, dst, end_of_input, header)?,
            None => CodecResult::needs_input(),
        };
        let complete = !result.is_overflow() && !result.is_underflow();
        Ok(result.with_header_completed(header_completed).with_close_connection(complete && self.close_after_message))
    }

    fn header(&self) -> Option<&ResponseHeader> {
        self.header.as_ref()
    }

    fn header_mut(&mut self) -> Option<&mut ResponseHeader> {
        self.header.as_mut()
    }
}
