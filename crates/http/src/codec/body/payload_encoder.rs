use bytes::{Buf, BufMut};
use tracing::{error, trace};

use super::{BodyProgress, ChunkedEncoder, LengthEncoder, transfer};
use crate::protocol::SendError;

/// Encodes the payload of a message with the framing chosen for its head.
#[derive(Debug)]
pub(crate) struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    /// content-length payload
    Length(LengthEncoder),

    /// transfer-encoding chunked payload
    Chunked(ChunkedEncoder),

    /// payload ends when the connection is closed
    UntilClose,

    /// the message has no body
    NoBody,

    /// payload is accepted but not sent (response to HEAD)
    Discard,
}

impl PayloadEncoder {
    pub(crate) fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub(crate) fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    pub(crate) fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    pub(crate) fn until_close() -> Self {
        Self { kind: Kind::UntilClose }
    }

    pub(crate) fn discard() -> Self {
        Self { kind: Kind::Discard }
    }

    pub(crate) fn is_until_close(&self) -> bool {
        matches!(self.kind, Kind::UntilClose)
    }

    pub(crate) fn encode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: &mut dyn BufMut,
        end_of_input: bool,
    ) -> Result<BodyProgress, SendError> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(src, dst, end_of_input),
            Kind::Chunked(encoder) => encoder.encode(src, dst, end_of_input),
            Kind::UntilClose => {
                let written = transfer(src, dst, u64::MAX);
                trace!(written, "wrote body until close");
                Ok(if src.has_remaining() {
                    BodyProgress::NeedOutput
                } else if end_of_input {
                    BodyProgress::Complete
                } else {
                    BodyProgress::NeedInput
                })
            }
            Kind::NoBody => {
                if src.has_remaining() {
                    error!(remaining = src.remaining(), "payload passed for a message without body");
                    return Err(SendError::invalid_body("message has no body"));
                }
                Ok(if end_of_input { BodyProgress::Complete } else { BodyProgress::NeedInput })
            }
            Kind::Discard => {
                src.advance(src.remaining());
                Ok(if end_of_input { BodyProgress::Complete } else { BodyProgress::NeedInput })
            }
        }
    }
}
