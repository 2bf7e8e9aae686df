//! State machine shared by the request and response decoders.
//!
//! The decoder alternates between reading a head and reading the body it
//! announces. Once a body is complete the state returns to reading a head, so
//! one decoder handles all messages of a connection.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, trace};

use super::body::{BodyProgress, PayloadDecoder};
use super::contract::CodecResult;
use super::header::{HeadLimits, HeadReader, parse_trailer};
use crate::protocol::{MessageHeader, ParseError, PayloadSize};

#[derive(Debug)]
enum State {
    Head,
    Body(PayloadDecoder),
}

#[derive(Debug)]
pub(crate) struct MessageDecoder {
    state: State,
    reader: HeadReader,
    limits: HeadLimits,
}

impl MessageDecoder {
    pub(crate) fn new(limits: HeadLimits) -> Self {
        Self { state: State::Head, reader: HeadReader::new(limits), limits }
    }

    pub(crate) fn limits(&self) -> &HeadLimits {
        &self.limits
    }

    pub(crate) fn is_reading_head(&self) -> bool {
        matches!(self.state, State::Head)
    }

    /// Reads head bytes; returns the complete head once its blank line has
    /// been seen.
    pub(crate) fn read_head<B: Buf>(&mut self, src: &mut B, end_of_input: bool) -> Result<Option<BytesMut>, ParseError> {
        if self.reader.read(src)? {
            return Ok(Some(self.reader.take()));
        }
        if end_of_input && self.reader.has_started() {
            return Err(ParseError::io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed within message head",
            )));
        }
        Ok(None)
    }

    /// Starts reading the body announced by the head just parsed.
    pub(crate) fn start_body(&mut self, payload_size: PayloadSize) {
        debug!(?payload_size, "message head complete");
        self.state = State::Body(PayloadDecoder::new(payload_size, self.limits));
    }

    /// Moves body bytes from `src` to `dst`. A completed chunked trailer is
    /// appended to `header`.
    pub(crate) fn decode_body<B: Buf>(
        &mut self,
        src: &mut B,
        dst: Option<&mut dyn BufMut>,
        end_of_input: bool,
        header: &mut MessageHeader,
    ) -> Result<CodecResult, ParseError> {
        let State::Body(decoder) = &mut self.state else {
            return Ok(CodecResult::needs_input());
        };

        let progress = match dst {
            _ if decoder.is_empty() => BodyProgress::Complete,
            Some(dst) => decoder.decode(src, dst, end_of_input)?,
            None => BodyProgress::NeedOutput,
        };

        match progress {
            BodyProgress::Complete => {
                if let Some(trailer) = decoder.take_trailer() {
                    parse_trailer(&trailer, header, &self.limits)?;
                }
                trace!("message complete");
                self.state = State::Head;
                Ok(CodecResult::complete())
            }
            BodyProgress::NeedInput => Ok(CodecResult::needs_input()),
            BodyProgress::NeedOutput => Ok(CodecResult::new(true, !src.has_remaining())),
        }
    }
}
