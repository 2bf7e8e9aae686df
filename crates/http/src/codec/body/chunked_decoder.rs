//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module decodes HTTP messages that use chunked transfer encoding as
//! specified in [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! The chunked encoding allows the sender to transmit message data in a series of chunks,
//! indicating the size of each chunk before its data. The trailer section following the
//! last chunk is collected and handed to the message decoder, which appends its fields
//! to the message header.

use std::task::Poll;

use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use super::{BodyProgress, transfer};
use crate::codec::header::{HeadLimits, HeadReader};
use crate::protocol::ParseError;
use ChunkedState::*;

/// A decoder for handling HTTP chunked transfer encoding.
///
/// The decoder processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal
/// - Followed by optional extensions and CRLF
/// - Then the chunk data and CRLF
/// - A zero-sized chunk is followed by the (possibly empty) trailer section
#[derive(Debug)]
pub(crate) struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
    trailer_reader: HeadReader,
    trailer: Option<BytesMut>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the first hex digit of a chunk size
    SizeStart,
    /// Read the remaining digits of the chunk size
    Size,
    /// Handle whitespace after size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// Read LF after chunk size
    SizeLf,
    /// Read chunk data
    Body,
    /// Read CR after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// Read the trailer section
    Trailer,
    /// Final state after reading the trailer
    End,
}

impl ChunkedDecoder {
    pub(crate) fn new(limits: HeadLimits) -> Self {
        Self { state: SizeStart, remaining_size: 0, trailer_reader: HeadReader::trailer(limits), trailer: None }
    }

    /// The raw trailer section, available once the body is complete.
    pub(crate) fn take_trailer(&mut self) -> Option<BytesMut> {
        self.trailer.take()
    }

    pub(crate) fn decode<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut) -> Result<BodyProgress, ParseError> {
        loop {
            match self.state {
                End => {
                    trace!("finished reading chunked data");
                    return Ok(BodyProgress::Complete);
                }
                Body => {
                    if !src.has_remaining() {
                        return Ok(BodyProgress::NeedInput);
                    }
                    if !dst.has_remaining_mut() {
                        return Ok(BodyProgress::NeedOutput);
                    }
                    let read = transfer(src, dst, self.remaining_size);
                    self.remaining_size -= read;
                    trace!(read, remaining = self.remaining_size, "read chunked bytes");
                    if self.remaining_size == 0 {
                        self.state = BodyCr;
                    }
                }
                Trailer => {
                    if !self.trailer_reader.read(src)? {
                        return Ok(BodyProgress::NeedInput);
                    }
                    self.trailer = Some(self.trailer_reader.take());
                    self.state = End;
                }
                state => {
                    self.state = match state.step(src, &mut self.remaining_size) {
                        Poll::Pending => return Ok(BodyProgress::NeedInput),
                        Poll::Ready(result) => result?,
                    };
                }
            }
        }
    }
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.has_remaining() {
            $src.get_u8()
        } else {
            return Poll::Pending;
        }
    }};
}

impl ChunkedState {
    /// Processes one byte of a size line or chunk delimiter.
    fn step<B: Buf>(self, src: &mut B, remaining_size: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        match self {
            SizeStart => ChunkedState::read_size_start(src, remaining_size),
            Size => ChunkedState::read_size(src, remaining_size),
            SizeLws => ChunkedState::read_size_lws(src),
            Extension => ChunkedState::read_extension(src),
            SizeLf => ChunkedState::read_size_lf(src, *remaining_size),
            BodyCr => ChunkedState::read_body_cr(src),
            BodyLf => ChunkedState::read_body_lf(src),
            Body | Trailer | End => Poll::Ready(Ok(self)),
        }
    }

    /// A size line must start with at least one hex digit.
    fn read_size_start<B: Buf>(src: &mut B, size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b @ (b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F') => {
                *size_per_chunk = u64::from(hex_value(b));
                Poll::Ready(Ok(Size))
            }
            b => Poll::Ready(Err(ParseError::invalid_body(format!("chunk size line starts with {b:#04x}")))),
        }
    }

    /// Reads the chunk size in hexadecimal format, digit by digit.
    ///
    /// # State Transitions
    /// - On hex digit: Stay in Size state to read more digits
    /// - On whitespace (tab/space): Transition to SizeLws state
    /// - On semicolon: Transition to Extension state to handle chunk extensions
    /// - On CR: Transition to SizeLf state to finish size line
    /// - On invalid character: Return error
    fn read_size<B: Buf>(src: &mut B, size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        let digit = match try_next_byte!(src) {
            b @ (b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F') => hex_value(b),
            b'\t' | b' ' => return Poll::Ready(Ok(SizeLws)),
            b';' => return Poll::Ready(Ok(Extension)),
            b'\r' => return Poll::Ready(Ok(SizeLf)),
            b => return Poll::Ready(Err(ParseError::invalid_body(format!("invalid chunk size byte {b:#04x}")))),
        };

        match size_per_chunk.checked_mul(16).and_then(|size| size.checked_add(u64::from(digit))) {
            Some(size) => {
                *size_per_chunk = size;
                Poll::Ready(Ok(Size))
            }
            None => Poll::Ready(Err(ParseError::invalid_body("invalid overflow chunked length"))),
        }
    }

    /// Processes linear whitespace after the chunk size; no more digits can come.
    fn read_size_lws<B: Buf>(src: &mut B) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => Poll::Ready(Err(ParseError::invalid_body("invalid chunk size linear white space"))),
        }
    }

    /// Skips chunk extensions up to the CR ending the size line.
    fn read_extension<B: Buf>(src: &mut B) -> Poll<Result<ChunkedState, ParseError>> {
        // Extensions "end" at the next CRLF. Some implementations may not
        // check for the CR, so extensions containing a plain LF are rejected.
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(Err(ParseError::invalid_body("invalid chunk extension contains newline"))),
            _ => Poll::Ready(Ok(Extension)),
        }
    }

    /// Validates the LF ending the size line; size 0 starts the trailer.
    fn read_size_lf<B: Buf>(src: &mut B, size_per_chunk: u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' if size_per_chunk == 0 => Poll::Ready(Ok(Trailer)),
            b'\n' => {
                trace!(size = size_per_chunk, "start reading chunk");
                Poll::Ready(Ok(Body))
            }
            _ => Poll::Ready(Err(ParseError::invalid_body("invalid chunk size LF"))),
        }
    }

    fn read_body_cr<B: Buf>(src: &mut B) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            _ => Poll::Ready(Err(ParseError::invalid_body("invalid chunk body CR"))),
        }
    }

    fn read_body_lf<B: Buf>(src: &mut B) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(SizeStart)),
            _ => Poll::Ready(Err(ParseError::invalid_body("invalid chunk body LF"))),
        }
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'a'..=b'f' => b + 10 - b'a',
        b'A'..=b'F' => b + 10 - b'A',
        _ => b - b'0',
    }
}
