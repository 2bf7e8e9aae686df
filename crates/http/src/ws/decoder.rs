use std::{cmp, io, str};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use super::closing::{ClosingState, SharedClosingState};
use super::encoder::WsEncoder;
use super::frame::{self, COPY_BLOCK, MAX_CONTROL_PAYLOAD, WsFrameHeader};
use super::masking::apply_mask;
use super::utf8::Utf8Validator;
use crate::codec::{CodecResult, Decoder};
use crate::ensure;
use crate::protocol::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Head,
    Length,
    Mask,
    Payload,
    ControlData,
}

/// Decodes WebSocket frames, streaming data message payloads into the output.
///
/// Control frames are buffered and reported through [`Decoder::header`]; a
/// PING is answered by a PONG response, a CLOSE advances the shared
/// [`ClosingState`] and, unless our CLOSE went out first, is echoed.
/// Fragmented messages are reassembled transparently: frames of the same
/// message are decoded in one call as long as input and output space last, and
/// the call completes (no overflow, no underflow) at the end of the message.
/// A control frame arriving before the message header has been reported ends
/// the call with overflow, so the header can be read before it is replaced; a
/// control frame completed inside a message with more input buffered does the
/// same, so that underflow always means the input is used up.
#[derive(Debug)]
pub struct WsDecoder {
    state: State,
    scratch: [u8; 8],
    filled: usize,
    needed: usize,

    fin: bool,
    opcode: u8,
    masked: bool,
    mask: [u8; 4],
    phase: usize,
    remaining: u64,
    control: BytesMut,

    message_open: bool,
    message_text: bool,
    utf8: Utf8Validator,

    header: Option<WsFrameHeader>,
    received_seq: u64,
    reported_seq: u64,

    max_payload_length: Option<u64>,
    closing: SharedClosingState,
}

impl WsDecoder {
    /// A decoder for either side; masked frames are unmasked, unmasked frames pass as is.
    pub fn new() -> Self {
        Self {
            state: State::Head,
            scratch: [0; 8],
            filled: 0,
            needed: 2,
            fin: false,
            opcode: 0,
            masked: false,
            mask: [0; 4],
            phase: 0,
            remaining: 0,
            control: BytesMut::with_capacity(MAX_CONTROL_PAYLOAD),
            message_open: false,
            message_text: false,
            utf8: Utf8Validator::default(),
            header: None,
            received_seq: 0,
            reported_seq: 0,
            max_payload_length: None,
            closing: SharedClosingState::new(),
        }
    }

    /// Rejects data frames with a longer payload.
    #[must_use]
    pub fn with_max_payload_length(mut self, max_payload_length: u64) -> Self {
        self.max_payload_length = Some(max_payload_length);
        self
    }

    pub fn closing_state(&self) -> ClosingState {
        self.closing.get()
    }

    pub fn shared_closing_state(&self) -> &SharedClosingState {
        &self.closing
    }

    /// Shares the closing state with the encoder of the same connection.
    pub fn set_peer_encoder(&mut self, encoder: &mut WsEncoder) {
        encoder.share_closing_state(self.closing.clone());
    }

    pub(crate) fn share_closing_state(&mut self, closing: SharedClosingState) {
        self.closing = closing;
    }

    fn enter(&mut self, state: State, needed: usize) {
        self.state = state;
        self.needed = needed;
        self.filled = 0;
    }

    /// Collects the bytes the current state needs, `false` if the input runs out first.
    fn fill<B: Buf>(&mut self, src: &mut B) -> bool {
        let n = cmp::min(self.needed - self.filled, src.remaining());
        src.copy_to_slice(&mut self.scratch[self.filled..self.filled + n]);
        self.filled += n;
        self.filled == self.needed
    }

    fn read_head(&mut self) -> Result<(), ParseError> {
        let (b0, b1) = (self.scratch[0], self.scratch[1]);
        ensure!(b0 & 0x70 == 0, ParseError::invalid_frame("reserved bits set"));

        self.fin = b0 & 0x80 != 0;
        self.opcode = b0 & 0x0F;
        self.masked = b1 & 0x80 != 0;
        let length = b1 & 0x7F;

        match self.opcode {
            frame::CONTINUATION => {
                ensure!(self.message_open, ParseError::invalid_frame("continuation frame outside a message"));
            }
            frame::TEXT | frame::BINARY => {
                ensure!(!self.message_open, ParseError::invalid_frame("data frame inside an unfinished message"));
            }
            frame::CLOSE | frame::PING | frame::PONG => {
                ensure!(self.fin, ParseError::invalid_frame("fragmented control frame"));
                ensure!(
                    usize::from(length) <= MAX_CONTROL_PAYLOAD,
                    ParseError::invalid_frame("control frame payload longer than 125 bytes")
                );
            }
            opcode => return Err(ParseError::invalid_frame(format!("unknown opcode {opcode:#x}"))),
        }
        trace!(fin = self.fin, opcode = self.opcode, masked = self.masked, "read frame head");

        match length {
            126 => self.enter(State::Length, 2),
            127 => self.enter(State::Length, 8),
            n => self.length_known(u64::from(n))?,
        }
        Ok(())
    }

    fn read_length(&mut self) -> Result<(), ParseError> {
        let length = if self.needed == 2 {
            u64::from(u16::from_be_bytes([self.scratch[0], self.scratch[1]]))
        } else {
            let length = u64::from_be_bytes(self.scratch);
            ensure!(length >> 63 == 0, ParseError::invalid_frame("most significant bit of payload length set"));
            length
        };
        self.length_known(length)
    }

    fn length_known(&mut self, length: u64) -> Result<(), ParseError> {
        if let Some(max_length) = self.max_payload_length {
            let is_data = matches!(self.opcode, frame::CONTINUATION | frame::TEXT | frame::BINARY);
            ensure!(!is_data || length <= max_length, ParseError::FrameTooLarge { length, max_length });
        }
        self.remaining = length;

        if self.masked {
            self.enter(State::Mask, 4);
        } else {
            self.start_payload();
        }
        Ok(())
    }

    fn start_payload(&mut self) {
        self.phase = 0;
        match self.opcode {
            frame::TEXT | frame::BINARY => {
                self.message_open = true;
                self.message_text = self.opcode == frame::TEXT;
                let has_payload = self.remaining > 0 || !self.fin;
                self.header = Some(WsFrameHeader::Message { text: self.message_text, has_payload });
                self.received_seq += 1;
                self.state = State::Payload;
            }
            frame::CONTINUATION => self.state = State::Payload,
            _ => {
                self.control.clear();
                self.state = State::ControlData;
            }
        }
    }

    fn copy_payload<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut) -> Result<(), ParseError> {
        let mut block = [0u8; COPY_BLOCK];
        while self.remaining > 0 && src.has_remaining() && dst.has_remaining_mut() {
            let left = usize::try_from(self.remaining).unwrap_or(usize::MAX);
            let n = cmp::min(cmp::min(left, src.remaining()), cmp::min(dst.remaining_mut(), COPY_BLOCK));
            let piece = &mut block[..n];
            src.copy_to_slice(piece);
            if self.masked {
                self.phase = apply_mask(self.mask, piece, self.phase);
            }
            if self.message_text {
                ensure!(self.utf8.feed(piece), ParseError::InvalidUtf8);
            }
            dst.put_slice(piece);
            self.remaining -= n as u64;
        }
        Ok(())
    }

    fn copy_control<B: Buf>(&mut self, src: &mut B) {
        let left = usize::try_from(self.remaining).unwrap_or(MAX_CONTROL_PAYLOAD);
        let n = cmp::min(left, src.remaining());
        let start = self.control.len();
        self.control.resize(start + n, 0);
        src.copy_to_slice(&mut self.control[start..]);
        if self.masked {
            self.phase = apply_mask(self.mask, &mut self.control[start..], self.phase);
        }
        self.remaining -= n as u64;
    }

    /// `None` while the message continues with further frames.
    fn data_frame_finished(&mut self) -> Result<Option<CodecResult<WsFrameHeader>>, ParseError> {
        self.enter(State::Head, 2);
        if !self.fin {
            trace!("data frame finished, message continues");
            return Ok(None);
        }

        self.message_open = false;
        if self.message_text {
            ensure!(self.utf8.finish(), ParseError::InvalidUtf8);
        }
        trace!(text = self.message_text, "data message finished");
        Ok(Some(self.result(false, false)))
    }

    /// Whether the next input byte starts a control frame while the header of
    /// the open message is still unreported.
    fn control_frame_pending<B: Buf>(&self, src: &B) -> bool {
        self.filled == 0
            && self.message_open
            && self.received_seq != self.reported_seq
            && src.chunk().first().is_some_and(|&b0| b0 & 0x08 != 0)
    }

    /// Within an open message the call ends with overflow if more input is
    /// buffered, with underflow otherwise.
    fn control_frame_finished(&mut self, input_left: bool) -> Result<CodecResult<WsFrameHeader>, ParseError> {
        self.enter(State::Head, 2);
        let (overflow, underflow) = (self.message_open && input_left, self.message_open && !input_left);
        let data = self.control.split().freeze();
        let data = (!data.is_empty()).then_some(data);
        self.received_seq += 1;

        match self.opcode {
            frame::PING => {
                debug!(len = data.as_ref().map_or(0, Bytes::len), "ping received");
                self.header = Some(WsFrameHeader::Ping(data.clone()));
                Ok(self.result(overflow, underflow).with_response(WsFrameHeader::Pong(data), true))
            }
            frame::PONG => {
                self.header = Some(WsFrameHeader::Pong(data));
                Ok(self.result(overflow, underflow))
            }
            _ => self.close_frame_finished(data),
        }
    }

    fn close_frame_finished(&mut self, data: Option<Bytes>) -> Result<CodecResult<WsFrameHeader>, ParseError> {
        let (status, reason) = match data {
            None => (None, None),
            Some(data) => {
                ensure!(data.len() >= 2, ParseError::invalid_frame("close frame payload of a single byte"));
                let status = u16::from_be_bytes([data[0], data[1]]);
                let Ok(reason) = str::from_utf8(&data[2..]) else {
                    return Err(ParseError::InvalidUtf8);
                };
                (Some(status), (!reason.is_empty()).then(|| reason.to_owned()))
            }
        };
        debug!(?status, ?reason, "close frame received");
        self.header = Some(WsFrameHeader::Close { status, reason });

        let before = self.closing.close_received();
        let closed = self.closing.get() == ClosingState::Closed;
        let result = self.result(false, false).with_close_connection(self.masked && closed);
        Ok(match before {
            ClosingState::Open | ClosingState::CloseReceived => {
                result.with_response(WsFrameHeader::Close { status, reason: None }, false)
            }
            ClosingState::CloseSent | ClosingState::Closed => result,
        })
    }

    fn input_exhausted(&mut self, end_of_input: bool) -> Result<CodecResult<WsFrameHeader>, ParseError> {
        if !end_of_input {
            return Ok(self.result(false, true));
        }
        let between_messages = self.state == State::Head && self.filled == 0 && !self.message_open;
        ensure!(
            between_messages,
            ParseError::io(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed within websocket message"))
        );
        Ok(self.result(false, true).with_close_connection(true))
    }

    fn result(&mut self, overflow: bool, underflow: bool) -> CodecResult<WsFrameHeader> {
        let header_completed = self.received_seq != self.reported_seq;
        self.reported_seq = self.received_seq;
        CodecResult::new(overflow, underflow).with_header_completed(header_completed)
    }
}

impl Default for WsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for WsDecoder {
    type Header = WsFrameHeader;
    type Response = WsFrameHeader;

    fn decode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: Option<&mut dyn BufMut>,
        end_of_input: bool,
    ) -> Result<CodecResult<WsFrameHeader>, ParseError> {
        let mut dst = dst;
        loop {
            match self.state {
                State::Head => {
                    if self.control_frame_pending(src) {
                        return Ok(self.result(true, false));
                    }
                    if !self.fill(src) {
                        return self.input_exhausted(end_of_input);
                    }
                    self.read_head()?;
                }
                State::Length => {
                    if !self.fill(src) {
                        return self.input_exhausted(end_of_input);
                    }
                    self.read_length()?;
                }
                State::Mask => {
                    if !self.fill(src) {
                        return self.input_exhausted(end_of_input);
                    }
                    self.mask.copy_from_slice(&self.scratch[..4]);
                    self.start_payload();
                }
                State::Payload => {
                    if self.remaining == 0 {
                        if let Some(result) = self.data_frame_finished()? {
                            return Ok(result);
                        }
                        continue;
                    }
                    let Some(out) = dst.as_deref_mut() else {
                        return Ok(self.result(true, false));
                    };
                    if !src.has_remaining() {
                        return self.input_exhausted(end_of_input);
                    }
                    if !out.has_remaining_mut() {
                        return Ok(self.result(true, false));
                    }
                    self.copy_payload(src, out)?;
                }
                State::ControlData => {
                    self.copy_control(src);
                    if self.remaining > 0 {
                        return self.input_exhausted(end_of_input);
                    }
                    return self.control_frame_finished(src.has_remaining());
                }
            }
        }
    }

    fn header(&self) -> Option<&WsFrameHeader> {
        self.header.as_ref()
    }

    fn header_mut(&mut self) -> Option<&mut WsFrameHeader> {
        self.header.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::iter;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::codec::Encoder;
    use crate::ws::frame::write_frame_head;

    fn frame(fin: bool, opcode: u8, payload: &[u8], mask: Option<[u8; 4]>) -> Vec<u8> {
        let mut out = BytesMut::new();
        write_frame_head(&mut out, fin, opcode, payload.len() as u64, mask);
        let mut payload = payload.to_vec();
        if let Some(mask) = mask {
            apply_mask(mask, &mut payload, 0);
        }
        out.extend_from_slice(&payload);
        out.to_vec()
    }

    #[test]
    fn decodes_unmasked_text() {
        let mut decoder = WsDecoder::new();
        let mut body = BytesMut::new();
        let mut input = &[0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f][..];

        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();

        assert!(result.is_header_completed());
        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::Message { text: true, has_payload: true }));
        assert_eq!(&body[..], b"Hello");
        assert!(input.is_empty());
    }

    #[test]
    fn decodes_masked_text() {
        let mut decoder = WsDecoder::new();
        let mut body = BytesMut::new();
        let mut input = &[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58][..];

        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();

        assert!(result.is_header_completed());
        assert!(!result.is_underflow());
        assert_eq!(&body[..], b"Hello");
    }

    #[test]
    fn reassembles_fragmented_message() {
        let mut decoder = WsDecoder::new();
        let mut body = BytesMut::new();
        let mut input = &[0x01, 0x03, 0x48, 0x65, 0x6c, 0x80, 0x02, 0x6c, 0x6f][..];

        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();

        assert!(result.is_header_completed());
        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::text()));
        assert_eq!(&body[..], b"Hello");
        assert!(input.is_empty());
    }

    #[test]
    fn empty_continuation_does_not_stop_decoding() {
        let mut input = frame(false, frame::BINARY, b"a", None);
        input.extend(frame(false, frame::CONTINUATION, b"", Some([9, 8, 7, 6])));
        input.extend(frame(true, frame::CONTINUATION, b"b", None));
        let mut input = &input[..];
        let mut decoder = WsDecoder::new();
        let mut body = BytesMut::new();

        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();

        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(&body[..], b"ab");
        assert!(input.is_empty());
    }

    #[test]
    fn underflow_only_once_input_is_used_up() {
        let mut decoder = WsDecoder::new();
        let mut body = BytesMut::new();
        let mut input = &[0x01, 0x03, 0x48, 0x65, 0x6c, 0x80, 0x02, 0x6c][..];

        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();

        assert!(result.is_underflow());
        assert!(input.is_empty());
        assert_eq!(&body[..], b"Hell");
    }

    #[test]
    fn waits_for_output_space() {
        let mut decoder = WsDecoder::new();
        let mut input = &frame(true, frame::BINARY, b"0123456789", None)[..];

        let result = decoder.decode(&mut input, None, false).unwrap();
        assert!(result.is_header_completed());
        assert!(result.is_overflow());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::Message { text: false, has_payload: true }));

        let mut body = BytesMut::new().limit(4);
        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();
        assert!(!result.is_header_completed());
        assert!(result.is_overflow());

        let mut rest = BytesMut::new();
        let result = decoder.decode(&mut input, Some(&mut rest), false).unwrap();
        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(&body.get_ref()[..], b"0123");
        assert_eq!(&rest[..], b"456789");
    }

    #[test]
    fn empty_data_frame_completes_at_once() {
        let mut decoder = WsDecoder::new();
        let mut input = &[0x82, 0x00][..];

        let result = decoder.decode(&mut input, None, false).unwrap();

        assert!(result.is_header_completed());
        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::Message { text: false, has_payload: false }));
    }

    #[test]
    fn ping_asks_for_pong() {
        let mut decoder = WsDecoder::new();
        let mut input = &[0x89, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f][..];

        let mut result = decoder.decode(&mut input, None, false).unwrap();

        assert!(result.is_header_completed());
        assert!(result.is_response_only());
        assert_eq!(result.take_response(), Some(WsFrameHeader::Pong(Some(Bytes::from_static(b"Hello")))));
        assert_eq!(decoder.header(), Some(&WsFrameHeader::Ping(Some(Bytes::from_static(b"Hello")))));
    }

    #[test]
    fn pong_needs_no_response() {
        let mut decoder = WsDecoder::new();
        let mut input = &frame(true, frame::PONG, b"", Some([1, 2, 3, 4]))[..];

        let result = decoder.decode(&mut input, None, false).unwrap();

        assert!(result.is_header_completed());
        assert!(result.response().is_none());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::Pong(None)));
    }

    #[test]
    fn control_frame_inside_fragmented_message() {
        let mut input = frame(false, frame::TEXT, b"Hel", None);
        input.extend(frame(true, frame::PING, b"?", None));
        input.extend(frame(true, frame::CONTINUATION, b"lo", None));
        let mut input = &input[..];
        let mut decoder = WsDecoder::new();
        let mut body = BytesMut::new();

        // the message header is handed out before the ping replaces it
        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();
        assert!(result.is_header_completed());
        assert!(result.is_overflow());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::text()));

        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();
        assert!(result.is_header_completed());
        assert!(result.is_overflow() && !result.is_underflow());
        assert!(result.response().is_some());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::Ping(Some(Bytes::from_static(b"?")))));

        let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();
        assert!(!result.is_header_completed());
        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(&body[..], b"Hello");
        assert!(input.is_empty());
    }

    #[test]
    fn close_initiated_by_client() {
        crate::utils::init_test_logging();
        let mut decoder = WsDecoder::new();
        let mut encoder = WsEncoder::server();
        decoder.set_peer_encoder(&mut encoder);
        let mut input = &frame(true, frame::CLOSE, b"\x03\xe8bye", Some([9, 8, 7, 6]))[..];

        let mut result = decoder.decode(&mut input, None, false).unwrap();
        assert!(result.is_header_completed());
        assert!(!result.close_connection());
        assert!(!result.is_response_only());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::close(1000, Some("bye"))));
        assert_eq!(decoder.closing_state(), ClosingState::CloseReceived);

        let response = result.take_response().unwrap();
        assert_eq!(response, WsFrameHeader::Close { status: Some(1000), reason: None });

        let mut out = BytesMut::new();
        encoder.set_header(response).unwrap();
        let result = encoder.encode_header_only(&mut out).unwrap();
        assert!(result.close_connection());
        assert_eq!(&out[..], &[0x88, 0x02, 0x03, 0xe8]);
        assert_eq!(decoder.closing_state(), ClosingState::Closed);
    }

    #[test]
    fn close_initiated_by_server() {
        crate::utils::init_test_logging();
        let mut decoder = WsDecoder::new();
        let mut encoder = WsEncoder::server();
        encoder.set_peer_decoder(&mut decoder);

        let mut out = BytesMut::new();
        encoder.set_header(WsFrameHeader::close(1001, None)).unwrap();
        let result = encoder.encode_header_only(&mut out).unwrap();
        assert!(!result.close_connection());
        assert_eq!(decoder.closing_state(), ClosingState::CloseSent);

        let mut input = &frame(true, frame::CLOSE, b"\x03\xe9", Some([1, 1, 1, 1]))[..];
        let result = decoder.decode(&mut input, None, false).unwrap();
        assert!(result.close_connection());
        assert!(result.response().is_none());
        assert_eq!(decoder.closing_state(), ClosingState::Closed);
    }

    #[test]
    fn client_leaves_closing_the_connection_to_server() {
        let mut decoder = WsDecoder::new();
        let mut encoder = WsEncoder::client();
        decoder.set_peer_encoder(&mut encoder);

        let mut out = BytesMut::new();
        encoder.set_header(WsFrameHeader::Close { status: None, reason: None }).unwrap();
        assert!(!encoder.encode_header_only(&mut out).unwrap().close_connection());

        let mut input = &[0x88, 0x00][..];
        let result = decoder.decode(&mut input, None, false).unwrap();
        assert!(!result.close_connection());
        assert_eq!(decoder.header(), Some(&WsFrameHeader::Close { status: None, reason: None }));
        assert_eq!(decoder.closing_state(), ClosingState::Closed);
    }

    #[test]
    fn rejects_protocol_violations() {
        let cases: &[(&str, Vec<u8>)] = &[
            ("reserved bits", vec![0xC1, 0x00]),
            ("unknown opcode", vec![0x83, 0x00]),
            ("fragmented control", vec![0x09, 0x00]),
            ("long control", vec![0x89, 0x7E, 0x00, 0x7E]),
            ("orphan continuation", vec![0x80, 0x00]),
            ("interleaved message", [frame(false, frame::TEXT, b"a", None), frame(true, frame::BINARY, b"b", None)].concat()),
            ("one byte close", vec![0x88, 0x01, 0x03]),
            ("huge length", vec![0x82, 0x7F, 0x80, 0, 0, 0, 0, 0, 0, 0]),
        ];
        for (name, input) in cases {
            let mut decoder = WsDecoder::new();
            let mut body = BytesMut::new();
            let mut input = &input[..];
            let mut outcome = Ok(CodecResult::needs_input());
            while outcome.is_ok() && !input.is_empty() {
                outcome = decoder.decode(&mut input, Some(&mut body), false);
            }
            assert!(matches!(outcome, Err(ParseError::InvalidFrame { .. })), "{name}: {outcome:?}");
        }
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut decoder = WsDecoder::new();
        let mut input = &frame(true, frame::TEXT, &[0xc3, 0x28], None)[..];
        let error = decoder.decode(&mut input, Some(&mut BytesMut::new()), false).unwrap_err();
        assert_eq!(error.close_status(), 1007);

        // stops inside a code point
        let mut decoder = WsDecoder::new();
        let mut input = &frame(true, frame::TEXT, &[b'a', 0xe2, 0x82], None)[..];
        let error = decoder.decode(&mut input, Some(&mut BytesMut::new()), false).unwrap_err();
        assert!(matches!(error, ParseError::InvalidUtf8));
    }

    #[test]
    fn enforces_payload_limit_on_data_frames_only() {
        let mut decoder = WsDecoder::new().with_max_payload_length(4);
        let mut input = &frame(true, frame::PING, b"longer than four", None)[..];
        assert!(decoder.decode(&mut input, None, false).is_ok());

        let mut input = &frame(true, frame::BINARY, b"12345", None)[..];
        let error = decoder.decode(&mut input, None, false).unwrap_err();
        assert!(matches!(error, ParseError::FrameTooLarge { length: 5, max_length: 4 }));
        assert_eq!(error.close_status(), 1009);
    }

    #[test]
    fn end_of_input_between_and_within_messages() {
        let mut decoder = WsDecoder::new();
        let result = decoder.decode(&mut &b""[..], None, true).unwrap();
        assert!(result.close_connection());

        let mut decoder = WsDecoder::new();
        let mut input = &[0x81, 0x05, b'H'][..];
        let error = decoder.decode(&mut input, Some(&mut BytesMut::new()), true).unwrap_err();
        assert!(matches!(error, ParseError::Io { .. }));
    }

    fn decode_all(input: &[u8], splits: &[usize]) -> (Vec<u8>, Vec<WsFrameHeader>) {
        let mut decoder = WsDecoder::new();
        let mut body = BytesMut::new();
        let mut headers = Vec::new();
        let mut start = 0;
        for end in splits.iter().copied().chain(iter::once(input.len())) {
            let mut piece = &input[start..end];
            loop {
                let result = decoder.decode(&mut piece, Some(&mut body), false).unwrap();
                if result.is_header_completed() {
                    headers.push(decoder.header().unwrap().clone());
                }
                if piece.is_empty() && !result.is_overflow() {
                    break;
                }
            }
            start = end;
        }
        (body.to_vec(), headers)
    }

    proptest! {
        #[test]
        fn decoding_is_independent_of_fragmentation(
            mask in any::<[u8; 4]>(),
            splits in proptest::collection::btree_set(0usize..400, 0..12),
        ) {
            let mut input = frame(false, frame::TEXT, "Grüße, ".as_bytes(), Some(mask));
            input.extend(frame(true, frame::PING, b"ping", Some(mask)));
            input.extend(frame(true, frame::CONTINUATION, &"€".repeat(40).into_bytes(), Some(mask)));
            input.extend(frame(true, frame::BINARY, &[7u8; 300], Some(mask)));

            let splits: Vec<_> = splits.into_iter().filter(|&s| s <= input.len()).collect();
            let (body, headers) = decode_all(&input, &splits);

            let mut expected = format!("Grüße, {}", "€".repeat(40)).into_bytes();
            expected.extend_from_slice(&[7u8; 300]);
            prop_assert_eq!(body, expected);
            prop_assert_eq!(headers, vec![
                WsFrameHeader::text(),
                WsFrameHeader::Ping(Some(Bytes::from_static(b"ping"))),
                WsFrameHeader::binary(),
            ]);
        }
    }
}
