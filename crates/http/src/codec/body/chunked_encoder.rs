use std::cmp;
use std::io::Write;

use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use super::{BodyProgress, transfer};
use crate::protocol::SendError;

/// Frames the payload as chunks; every call's available input becomes one chunk.
///
/// Size lines and delimiters are staged in a small buffer so that they can be
/// written out over several calls when the output is short of space.
#[derive(Debug)]
pub(crate) struct ChunkedEncoder {
    pending: BytesMut,
    chunk_remaining: u64,
    eof: bool,
}

impl ChunkedEncoder {
    pub(crate) fn new() -> Self {
        Self { pending: BytesMut::new(), chunk_remaining: 0, eof: false }
    }

    pub(crate) fn encode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: &mut dyn BufMut,
        end_of_input: bool,
    ) -> Result<BodyProgress, SendError> {
        loop {
            if !self.pending.is_empty() {
                let n = cmp::min(self.pending.len(), dst.remaining_mut());
                dst.put_slice(&self.pending[..n]);
                self.pending.advance(n);
                if !self.pending.is_empty() {
                    return Ok(BodyProgress::NeedOutput);
                }
            }

            if self.chunk_remaining > 0 {
                if !src.has_remaining() {
                    return Ok(BodyProgress::NeedInput);
                }
                if !dst.has_remaining_mut() {
                    return Ok(BodyProgress::NeedOutput);
                }
                self.chunk_remaining -= transfer(src, dst, self.chunk_remaining);
                if self.chunk_remaining == 0 {
                    self.pending.put_slice(b"\r\n");
                }
                continue;
            }

            if self.eof {
                return Ok(BodyProgress::Complete);
            }

            if src.has_remaining() {
                let size = src.remaining();
                trace!(size, "start writing chunk");
                write!(helper::Writer(&mut self.pending), "{size:X}\r\n").map_err(SendError::invalid_body)?;
                self.chunk_remaining = size as u64;
            } else if end_of_input {
                self.eof = true;
                self.pending.put_slice(b"0\r\n\r\n");
            } else {
                return Ok(BodyProgress::NeedInput);
            }
        }
    }
}

mod helper {
    use std::io;

    use bytes::{BufMut, BytesMut};

    pub(super) struct Writer<'a>(pub(super) &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_each_call_as_a_chunk() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        assert_eq!(encoder.encode(&mut &b"hello"[..], &mut dst, false).unwrap(), BodyProgress::NeedInput);
        assert_eq!(encoder.encode(&mut &b", world!!!!!"[..], &mut dst, true).unwrap(), BodyProgress::Complete);
        assert_eq!(&dst[..], b"5\r\nhello\r\nC\r\n, world!!!!!\r\n0\r\n\r\n");
    }

    #[test]
    fn resumes_with_small_output() {
        let mut encoder = ChunkedEncoder::new();
        let mut src = &b"abcdef"[..];
        let mut out = Vec::new();

        loop {
            let mut dst = BytesMut::new().limit(3);
            let progress = encoder.encode(&mut src, &mut dst, true).unwrap();
            out.extend_from_slice(&dst.into_inner());
            match progress {
                BodyProgress::NeedOutput => continue,
                BodyProgress::Complete => break,
                BodyProgress::NeedInput => panic!("all input was provided"),
            }
        }
        assert_eq!(&out[..], b"6\r\nabcdef\r\n0\r\n\r\n");
    }
}
