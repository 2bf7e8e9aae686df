use bytes::{Buf, BufMut};
use tracing::error;

use super::{BodyProgress, transfer};
use crate::protocol::SendError;

/// Writes a payload of exactly `length` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LengthEncoder {
    length: u64,
}

impl LengthEncoder {
    pub(crate) fn new(length: u64) -> Self {
        Self { length }
    }

    pub(crate) fn encode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: &mut dyn BufMut,
        end_of_input: bool,
    ) -> Result<BodyProgress, SendError> {
        if src.remaining() as u64 > self.length {
            error!(remaining = src.remaining(), length = self.length, "payload exceeds content-length");
            return Err(SendError::invalid_body(format!(
                "{} payload bytes left but only {} allowed by content-length",
                src.remaining(),
                self.length
            )));
        }

        self.length -= transfer(src, dst, self.length);

        if self.length == 0 {
            Ok(BodyProgress::Complete)
        } else if src.has_remaining() {
            Ok(BodyProgress::NeedOutput)
        } else if end_of_input {
            error!(missing = self.length, "payload shorter than content-length");
            Err(SendError::invalid_body(format!("payload ended {} bytes short of content-length", self.length)))
        } else {
            Ok(BodyProgress::NeedInput)
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn streams_exact_length() {
        let mut encoder = LengthEncoder::new(5);
        let mut dst = BytesMut::new();
        assert_eq!(encoder.encode(&mut &b"hel"[..], &mut dst, false).unwrap(), BodyProgress::NeedInput);
        assert_eq!(encoder.encode(&mut &b"lo"[..], &mut dst, true).unwrap(), BodyProgress::Complete);
        assert_eq!(&dst[..], b"hello");
    }

    #[test]
    fn rejects_wrong_lengths() {
        let mut encoder = LengthEncoder::new(2);
        assert!(matches!(
            encoder.encode(&mut &b"abc"[..], &mut BytesMut::new(), true),
            Err(SendError::InvalidBody { .. })
        ));

        let mut encoder = LengthEncoder::new(4);
        assert!(matches!(
            encoder.encode(&mut &b"abc"[..], &mut BytesMut::new(), true),
            Err(SendError::InvalidBody { .. })
        ));
    }
}
