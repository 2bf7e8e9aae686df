//! Decoder for payloads with a known `Content-Length`.

use bytes::{Buf, BufMut};
use tracing::trace;

use super::{BodyProgress, transfer};
use crate::protocol::ParseError;

/// Copies exactly `length` payload bytes to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LengthDecoder {
    /// Remaining bytes to read
    length: u64,
}

impl LengthDecoder {
    pub(crate) fn new(length: u64) -> Self {
        Self { length }
    }

    pub(crate) fn decode<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut) -> Result<BodyProgress, ParseError> {
        if self.length > 0 {
            let read = transfer(src, dst, self.length);
            self.length -= read;
            trace!(read, remaining = self.length, "read fixed length body");
        }

        if self.length == 0 {
            Ok(BodyProgress::Complete)
        } else if !src.has_remaining() {
            Ok(BodyProgress::NeedInput)
        } else {
            Ok(BodyProgress::NeedOutput)
        }
    }
}
