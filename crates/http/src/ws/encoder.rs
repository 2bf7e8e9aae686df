use std::cmp;

use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, error, trace};

use super::closing::{ClosingState, SharedClosingState};
use super::decoder::WsDecoder;
use super::frame::{self, COPY_BLOCK, MAX_CONTROL_PAYLOAD, WsFrameHeader, write_frame_head};
use super::masking::apply_mask;
use super::utf8::Utf8Validator;
use crate::codec::{CodecResult, Encoder};
use crate::ensure;
use crate::protocol::SendError;

/// Progress of the data message being sent.
#[derive(Debug)]
struct DataMessage {
    text: bool,
    started: bool,
    last_frame: bool,
    remaining: u64,
    mask: Option<[u8; 4]>,
    phase: usize,
    utf8: Utf8Validator,
}

impl DataMessage {
    fn new(text: bool) -> Self {
        Self {
            text,
            started: false,
            last_frame: false,
            remaining: 0,
            mask: None,
            phase: 0,
            utf8: Utf8Validator::default(),
        }
    }

    fn next_opcode(&self) -> u8 {
        match (self.started, self.text) {
            (true, _) => frame::CONTINUATION,
            (false, true) => frame::TEXT,
            (false, false) => frame::BINARY,
        }
    }

    fn start_frame(&mut self, length: u64, mask: Option<[u8; 4]>, last_frame: bool) {
        self.started = true;
        self.last_frame = last_frame;
        self.remaining = length;
        self.mask = mask;
        self.phase = 0;
    }

    fn copy_payload<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut) -> Result<(), SendError> {
        let mut block = [0u8; COPY_BLOCK];
        while self.remaining > 0 && src.has_remaining() && dst.has_remaining_mut() {
            let left = usize::try_from(self.remaining).unwrap_or(usize::MAX);
            let n = cmp::min(cmp::min(left, src.remaining()), cmp::min(dst.remaining_mut(), COPY_BLOCK));
            let piece = &mut block[..n];
            src.copy_to_slice(piece);
            if self.text {
                ensure!(self.utf8.feed(piece), SendError::invalid_frame("text message is not valid utf-8"));
            }
            if let Some(mask) = self.mask {
                self.phase = apply_mask(mask, piece, self.phase);
            }
            dst.put_slice(piece);
            self.remaining -= n as u64;
        }
        Ok(())
    }
}

/// Encodes WebSocket frames.
///
/// A data message is sent as one frame per `encode` call that has input, the
/// first one TEXT or BINARY and the following ones CONTINUATION; the frame
/// passed `end_of_input` carries FIN. Control frames are written whole and
/// may be set between the frames of a data message. Clients mask every frame
/// with a fresh key.
#[derive(Debug)]
pub struct WsEncoder {
    masking: bool,
    mask_source: fn() -> [u8; 4],
    header: Option<WsFrameHeader>,
    pending: BytesMut,
    message: Option<DataMessage>,
    control_pending: Option<u8>,
    closing: SharedClosingState,
}

impl WsEncoder {
    fn new(masking: bool) -> Self {
        Self {
            masking,
            mask_source: rand::random::<[u8; 4]>,
            header: None,
            pending: BytesMut::with_capacity(frame::MAX_FRAME_HEAD + MAX_CONTROL_PAYLOAD),
            message: None,
            control_pending: None,
            closing: SharedClosingState::new(),
        }
    }

    /// An encoder for the client side, masking all frames.
    pub fn client() -> Self {
        Self::new(true)
    }

    /// An encoder for the server side; frames are never masked.
    pub fn server() -> Self {
        Self::new(false)
    }

    /// Replaces the random source of masking keys.
    #[must_use]
    pub fn with_mask_source(mut self, mask_source: fn() -> [u8; 4]) -> Self {
        self.mask_source = mask_source;
        self
    }

    pub fn closing_state(&self) -> ClosingState {
        self.closing.get()
    }

    pub fn shared_closing_state(&self) -> &SharedClosingState {
        &self.closing
    }

    /// Shares the closing state with the decoder of the same connection.
    pub fn set_peer_decoder(&mut self, decoder: &mut WsDecoder) {
        decoder.share_closing_state(self.closing.clone());
    }

    pub(crate) fn share_closing_state(&mut self, closing: SharedClosingState) {
        self.closing = closing;
    }

    fn next_mask(&self) -> Option<[u8; 4]> {
        self.masking.then(self.mask_source)
    }

    fn stage_control_frame(&mut self, header: &WsFrameHeader) -> Result<(), SendError> {
        ensure!(self.control_pending.is_none(), SendError::invalid_frame("previous control frame not sent yet"));
        ensure!(
            self.message.as_ref().is_none_or(|message| message.remaining == 0),
            SendError::invalid_frame("control frame inside an unfinished data frame")
        );
        if let WsFrameHeader::Close { status: None, reason: Some(_) } = header {
            return Err(SendError::invalid_frame("close reason without status code"));
        }

        let mut payload = header.control_payload();
        ensure!(
            payload.len() <= MAX_CONTROL_PAYLOAD,
            SendError::invalid_frame("control frame payload longer than 125 bytes")
        );

        let mask = self.next_mask();
        write_frame_head(&mut self.pending, true, header.opcode(), payload.len() as u64, mask);
        if let Some(mask) = mask {
            apply_mask(mask, &mut payload, 0);
        }
        self.pending.extend_from_slice(&payload);
        self.control_pending = Some(header.opcode());
        Ok(())
    }

    fn accept_header(&mut self, header: &WsFrameHeader) -> Result<(), SendError> {
        ensure!(
            matches!(self.closing.get(), ClosingState::Open | ClosingState::CloseReceived),
            SendError::invalid_frame("close frame already sent")
        );
        match header {
            WsFrameHeader::Message { text, .. } => {
                ensure!(self.message.is_none(), SendError::invalid_frame("previous data message not finished"));
                self.message = Some(DataMessage::new(*text));
                Ok(())
            }
            control => self.stage_control_frame(control),
        }
    }

    fn control_frame_sent(&mut self, opcode: u8) -> CodecResult {
        if opcode != frame::CLOSE {
            return CodecResult::complete();
        }
        let state = self.closing.close_sent();
        debug!(?state, "close frame sent");
        CodecResult::complete().with_close_connection(!self.masking && state == ClosingState::Closed)
    }
}

/// Writes as much of `pending` as fits, `true` once it is empty.
fn flush(pending: &mut BytesMut, dst: &mut dyn BufMut) -> bool {
    let n = cmp::min(pending.len(), dst.remaining_mut());
    dst.put_slice(&pending[..n]);
    pending.advance(n);
    pending.is_empty()
}

impl Encoder for WsEncoder {
    type Header = WsFrameHeader;

    fn set_header(&mut self, header: WsFrameHeader) -> Result<(), SendError> {
        self.accept_header(&header).inspect_err(|e| error!(cause = %e, ?header, "rejected websocket frame header"))?;
        self.header = Some(header);
        Ok(())
    }

    fn encode<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut, end_of_input: bool) -> Result<CodecResult, SendError> {
        ensure!(self.header.is_some(), SendError::MissingHeader);

        if !flush(&mut self.pending, dst) {
            return Ok(CodecResult::needs_output());
        }
        if let Some(opcode) = self.control_pending.take() {
            return Ok(self.control_frame_sent(opcode));
        }

        let Some(message) = self.message.as_mut() else {
            ensure!(!src.has_remaining(), SendError::invalid_frame("payload without a data message header"));
            return Ok(CodecResult::complete());
        };

        loop {
            if !flush(&mut self.pending, dst) {
                return Ok(CodecResult::needs_output());
            }

            if message.remaining > 0 {
                if !src.has_remaining() {
                    ensure!(!end_of_input, SendError::invalid_frame("input ended within a frame"));
                    return Ok(CodecResult::needs_input());
                }
                if !dst.has_remaining_mut() {
                    return Ok(CodecResult::needs_output());
                }
                message.copy_payload(src, dst)?;
                continue;
            }

            if message.last_frame {
                if message.text {
                    ensure!(message.utf8.finish(), SendError::invalid_frame("text message ends within a character"));
                }
                trace!(text = message.text, "data message sent");
                self.message = None;
                return Ok(CodecResult::complete());
            }

            if !src.has_remaining() && !end_of_input {
                return Ok(CodecResult::needs_input());
            }

            let length = src.remaining() as u64;
            let opcode = message.next_opcode();
            let mask = self.masking.then(self.mask_source);
            trace!(opcode, length, fin = end_of_input, "start frame");
            write_frame_head(&mut self.pending, end_of_input, opcode, length, mask);
            message.start_frame(length, mask, end_of_input);
        }
    }

    fn header(&self) -> Option<&WsFrameHeader> {
        self.header.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::codec::Decoder;

    fn fixed_mask() -> [u8; 4] {
        [0x37, 0xfa, 0x21, 0x3d]
    }

    #[test]
    fn writes_single_frame_message() {
        let mut encoder = WsEncoder::server();
        let mut out = BytesMut::new();

        encoder.set_header(WsFrameHeader::text()).unwrap();
        let result = encoder.encode(&mut &b"Hello"[..], &mut out, true).unwrap();

        assert!(!result.is_overflow() && !result.is_underflow());
        assert_eq!(&out[..], &[0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f]);
    }

    #[test]
    fn masks_client_frames() {
        let mut encoder = WsEncoder::client().with_mask_source(fixed_mask);
        let mut out = BytesMut::new();

        encoder.set_header(WsFrameHeader::text()).unwrap();
        encoder.encode(&mut &b"Hello"[..], &mut out, true).unwrap();

        assert_eq!(&out[..], &[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    }

    #[test]
    fn splits_message_into_frames() {
        let mut encoder = WsEncoder::server();
        let mut out = BytesMut::new();

        encoder.set_header(WsFrameHeader::binary()).unwrap();
        let result = encoder.encode(&mut &b"Hel"[..], &mut out, false).unwrap();
        assert!(result.is_underflow());
        let result = encoder.encode(&mut &b"lo"[..], &mut out, false).unwrap();
        assert!(result.is_underflow());
        let result = encoder.encode(&mut &b""[..], &mut out, true).unwrap();
        assert!(!result.is_underflow());

        assert_eq!(
            &out[..],
            &[0x02, 0x03, b'H', b'e', b'l', 0x00, 0x02, b'l', b'o', 0x80, 0x00]
        );
    }

    #[test]
    fn ping_between_frames() {
        let mut encoder = WsEncoder::server();
        let mut out = BytesMut::new();

        encoder.set_header(WsFrameHeader::text()).unwrap();
        encoder.encode(&mut &b"a"[..], &mut out, false).unwrap();
        encoder.set_header(WsFrameHeader::Ping(Some(bytes::Bytes::from_static(b"p")))).unwrap();
        assert!(!encoder.encode_header_only(&mut out).unwrap().is_underflow());
        encoder.encode(&mut &b"b"[..], &mut out, true).unwrap();

        assert_eq!(&out[..], &[0x01, 0x01, b'a', 0x89, 0x01, b'p', 0x80, 0x01, b'b']);
    }

    #[test]
    fn resumes_with_small_output() {
        let mut encoder = WsEncoder::client().with_mask_source(fixed_mask);
        encoder.set_header(WsFrameHeader::text()).unwrap();
        let mut src = &b"Hello"[..];
        let mut out = Vec::new();

        loop {
            let mut dst = BytesMut::new().limit(3);
            let result = encoder.encode(&mut src, &mut dst, true).unwrap();
            out.extend_from_slice(dst.get_ref());
            if !result.is_overflow() {
                break;
            }
        }

        assert_eq!(out, [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    }

    #[test]
    fn rejects_misuse() {
        let mut out = BytesMut::new();

        let mut encoder = WsEncoder::server();
        assert!(matches!(encoder.encode_header_only(&mut out), Err(SendError::MissingHeader)));

        encoder.set_header(WsFrameHeader::text()).unwrap();
        assert!(encoder.set_header(WsFrameHeader::binary()).is_err());
        assert!(encoder.encode(&mut &[0xff][..], &mut out, true).is_err());

        let mut encoder = WsEncoder::server();
        let too_long = bytes::Bytes::from(vec![0u8; MAX_CONTROL_PAYLOAD + 1]);
        assert!(encoder.set_header(WsFrameHeader::Ping(Some(too_long))).is_err());
        let reason_only = WsFrameHeader::Close { status: None, reason: Some("bye".into()) };
        assert!(encoder.set_header(reason_only).is_err());

        encoder.set_header(WsFrameHeader::close(1000, None)).unwrap();
        encoder.encode_header_only(&mut out).unwrap();
        assert_eq!(encoder.closing_state(), ClosingState::CloseSent);
        assert!(encoder.set_header(WsFrameHeader::text()).is_err());
    }

    proptest! {
        #[test]
        fn decoder_reads_what_encoder_writes(
            pieces in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..300), 1..6),
            out_limit in 1usize..64,
        ) {
            let mut encoder = WsEncoder::client();
            encoder.set_header(WsFrameHeader::binary()).unwrap();
            let mut wire = Vec::new();
            for (i, piece) in pieces.iter().enumerate() {
                let mut src = &piece[..];
                loop {
                    let mut dst = BytesMut::new().limit(out_limit);
                    let result = encoder.encode(&mut src, &mut dst, i + 1 == pieces.len()).unwrap();
                    wire.extend_from_slice(dst.get_ref());
                    if !result.is_overflow() {
                        break;
                    }
                }
            }

            let mut decoder = WsDecoder::new();
            let mut input = &wire[..];
            let mut body = BytesMut::new();
            loop {
                let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();
                if !result.is_underflow() || input.is_empty() {
                    break;
                }
            }
            prop_assert!(input.is_empty());
            prop_assert_eq!(body.to_vec(), pieces.concat());
        }
    }
}
