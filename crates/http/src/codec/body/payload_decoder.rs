//! Decoder for HTTP message payloads.
//!
//! Dispatches to the decoding strategy chosen from the message head:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Payloads delimited by the end of the connection
//! - Messages with no body

use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use super::{BodyProgress, ChunkedDecoder, LengthDecoder, transfer};
use crate::codec::header::HeadLimits;
use crate::protocol::{ParseError, PayloadSize};

#[derive(Debug)]
pub(crate) struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Everything up to the end of input
    UntilClose,

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    pub(crate) fn new(payload_size: PayloadSize, limits: HeadLimits) -> Self {
        let kind = match payload_size {
            PayloadSize::Length(0) | PayloadSize::Empty => Kind::NoBody,
            PayloadSize::Length(n) => Kind::Length(LengthDecoder::new(n)),
            PayloadSize::Chunked => Kind::Chunked(ChunkedDecoder::new(limits)),
            PayloadSize::UntilClose => Kind::UntilClose,
        };
        Self { kind }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    /// The trailer section of a completed chunked body.
    pub(crate) fn take_trailer(&mut self) -> Option<BytesMut> {
        match &mut self.kind {
            Kind::Chunked(decoder) => decoder.take_trailer(),
            _ => None,
        }
    }

    pub(crate) fn decode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: &mut dyn BufMut,
        end_of_input: bool,
    ) -> Result<BodyProgress, ParseError> {
        let progress = match &mut self.kind {
            Kind::Length(decoder) => decoder.decode(src, dst)?,
            Kind::Chunked(decoder) => decoder.decode(src, dst)?,
            Kind::UntilClose => {
                let read = transfer(src, dst, u64::MAX);
                trace!(read, "read body until close");
                if src.has_remaining() {
                    BodyProgress::NeedOutput
                } else if end_of_input {
                    BodyProgress::Complete
                } else {
                    BodyProgress::NeedInput
                }
            }
            Kind::NoBody => BodyProgress::Complete,
        };

        if progress == BodyProgress::NeedInput && end_of_input {
            return Err(ParseError::invalid_body("connection closed before the body was complete"));
        }
        Ok(progress)
    }
}
