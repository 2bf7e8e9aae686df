//! HTTP body handling for the message engines.
//!
//! Every body codec moves bytes from a [`Buf`] into a [`BufMut`] and reports a
//! [`BodyProgress`]; none of them buffers payload data.
//!
//! ## Decoders
//! - [`ChunkedDecoder`]: chunked transfer coding, including the trailer section
//! - [`LengthDecoder`]: payloads delimited by `Content-Length`
//! - [`PayloadDecoder`]: dispatches on [`PayloadSize`](crate::protocol::PayloadSize)
//!
//! ## Encoders
//! - [`ChunkedEncoder`]: one chunk per call's available input
//! - [`LengthEncoder`]: checks the payload against `Content-Length`
//! - [`PayloadEncoder`]: dispatches on the framing chosen by the message encoder

use std::cmp;

use bytes::{Buf, BufMut};

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub(crate) use chunked_decoder::ChunkedDecoder;
pub(crate) use chunked_encoder::ChunkedEncoder;
pub(crate) use length_decoder::LengthDecoder;
pub(crate) use length_encoder::LengthEncoder;
pub(crate) use payload_decoder::PayloadDecoder;
pub(crate) use payload_encoder::PayloadEncoder;

/// What a body codec needs after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyProgress {
    /// The body is complete.
    Complete,
    /// All input has been consumed.
    NeedInput,
    /// The output buffer is full.
    NeedOutput,
}

/// Copies at most `limit` bytes from `src` to `dst`, returns the number copied.
pub(crate) fn transfer<B: Buf + ?Sized>(src: &mut B, dst: &mut dyn BufMut, limit: u64) -> u64 {
    let mut copied = 0u64;
    while copied < limit && src.has_remaining() && dst.has_remaining_mut() {
        let chunk = src.chunk();
        let left = usize::try_from(limit - copied).unwrap_or(usize::MAX);
        let n = cmp::min(cmp::min(chunk.len(), left), dst.remaining_mut());
        dst.put_slice(&chunk[..n]);
        src.advance(n);
        copied += n as u64;
    }
    copied
}
