//! State shared by the request and response encoders: the serialized head
//! waiting to be written and the payload framing of the current message.

use std::cmp;

use bytes::{Buf, BufMut, BytesMut};
use http::Version;
use tracing::{debug, error};

use super::body::{BodyProgress, PayloadEncoder};
use super::contract::CodecResult;
use super::header::is_chunked;
use crate::fields::converters::LONG;
use crate::fields::names::{CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::protocol::{MessageHeader, SendError};

#[derive(Debug)]
pub(crate) struct MessageEncoder {
    pending: BytesMut,
    payload: Option<PayloadEncoder>,
    close_after_message: bool,
}

impl MessageEncoder {
    pub(crate) fn new() -> Self {
        Self { pending: BytesMut::new(), payload: None, close_after_message: false }
    }

    /// Checks that no message is in progress and returns the buffer the next
    /// head is to be serialized into.
    pub(crate) fn head_buffer(&mut self) -> Result<&mut BytesMut, SendError> {
        if self.payload.is_some() {
            error!("header set before the previous message was complete");
            return Err(SendError::invalid_header("previous message has not been completely encoded"));
        }
        self.pending.clear();
        Ok(&mut self.pending)
    }

    pub(crate) fn start(&mut self, payload: PayloadEncoder, close_after_message: bool) {
        self.payload = Some(payload);
        self.close_after_message = close_after_message;
    }

    pub(crate) fn encode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: &mut dyn BufMut,
        end_of_input: bool,
    ) -> Result<CodecResult, SendError> {
        let Some(payload) = self.payload.as_mut() else {
            error!("encode called without header");
            return Err(SendError::MissingHeader);
        };

        if !self.pending.is_empty() {
            let n = cmp::min(self.pending.len(), dst.remaining_mut());
            dst.put_slice(&self.pending[..n]);
            self.pending.advance(n);
            if !self.pending.is_empty() {
                return Ok(CodecResult::needs_output());
            }
        }

        match payload.encode(src, dst, end_of_input)? {
            BodyProgress::Complete => {
                self.payload = None;
                Ok(CodecResult::complete().with_close_connection(self.close_after_message))
            }
            BodyProgress::NeedInput => Ok(CodecResult::needs_input()),
            BodyProgress::NeedOutput => Ok(CodecResult::needs_output()),
        }
    }
}

/// Chooses the payload framing of `header` and makes its framing fields agree
/// with it.
///
/// A payload without length information is chunked on HTTP/1.1. On HTTP/1.0
/// it is delimited by closing the connection if `until_close_allowed`, which
/// only holds for responses.
pub(crate) fn prepare_framing(header: &mut MessageHeader, until_close_allowed: bool) -> Result<PayloadEncoder, SendError> {
    if let Some(transfer_encoding) = header.find_string_value(TRANSFER_ENCODING) {
        if is_chunked(&transfer_encoding) {
            header.remove_field(CONTENT_LENGTH);
            debug!("payload framed as chunked");
            return Ok(PayloadEncoder::chunked());
        }
        if until_close_allowed {
            header.remove_field(CONTENT_LENGTH);
            return Ok(PayloadEncoder::until_close());
        }
        error!(%transfer_encoding, "request transfer-encoding must end with chunked");
        return Err(SendError::invalid_header(format!("transfer-encoding {transfer_encoding} without final chunked")));
    }

    if header.has_field(CONTENT_LENGTH) {
        let length = header
            .parse_value(CONTENT_LENGTH, LONG)
            .and_then(|length| u64::try_from(length).ok())
            .ok_or_else(|| SendError::invalid_header("content-length is not a valid length"))?;
        debug!(length, "payload framed by content-length");
        return Ok(PayloadEncoder::fix_length(length));
    }

    if !header.has_payload() {
        return Ok(PayloadEncoder::empty());
    }

    if header.version() == Version::HTTP_11 {
        header.set_raw(TRANSFER_ENCODING, "chunked");
        debug!("payload without length framed as chunked");
        Ok(PayloadEncoder::chunked())
    } else if until_close_allowed {
        debug!("payload without length framed until close");
        Ok(PayloadEncoder::until_close())
    } else {
        error!(version = ?header.version(), "request payload needs content-length");
        Err(SendError::invalid_header("HTTP/1.0 request payload requires content-length"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_chunked_coding_on_http11() {
        let mut header = MessageHeader::new(Version::HTTP_11, true);
        let payload = prepare_framing(&mut header, true).unwrap();
        assert!(!payload.is_until_close());
        assert_eq!(header.find_string_value(TRANSFER_ENCODING).as_deref(), Some("chunked"));

        let mut header = MessageHeader::new(Version::HTTP_10, true);
        assert!(prepare_framing(&mut header, true).unwrap().is_until_close());
        assert!(!header.has_field(TRANSFER_ENCODING));
        assert!(prepare_framing(&mut header, false).is_err());
    }

    #[test]
    fn content_length_must_be_valid() {
        let mut header = MessageHeader::new(Version::HTTP_11, true);
        header.set_raw(CONTENT_LENGTH, "-3");
        assert!(prepare_framing(&mut header, true).is_err());
    }

    #[test]
    fn head_is_flushed_before_payload() {
        let mut encoder = MessageEncoder::new();
        encoder.head_buffer().unwrap().put_slice(b"HEAD\r\n\r\n");
        encoder.start(PayloadEncoder::fix_length(4), false);

        let mut dst = BytesMut::new().limit(5);
        let result = encoder.encode(&mut &b"body"[..], &mut dst, true).unwrap();
        assert!(result.is_overflow());
        assert!(encoder.head_buffer().is_err());

        let mut dst = BytesMut::new();
        let result = encoder.encode(&mut &b"body"[..], &mut dst, true).unwrap();
        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(&dst[..], b"\r\n\r\nbody");
    }
}
