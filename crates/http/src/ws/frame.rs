use bytes::{BufMut, Bytes, BytesMut};

pub(crate) const CONTINUATION: u8 = 0x0;
pub(crate) const TEXT: u8 = 0x1;
pub(crate) const BINARY: u8 = 0x2;
pub(crate) const CLOSE: u8 = 0x8;
pub(crate) const PING: u8 = 0x9;
pub(crate) const PONG: u8 = 0xA;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;

/// Largest payload of a control frame.
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// Payload is (un)masked in blocks of this size on its way to the output.
pub(crate) const COPY_BLOCK: usize = 1024;

/// Longest possible frame head: 2 bytes, 8 bytes extended length, 4 bytes key.
pub(crate) const MAX_FRAME_HEAD: usize = 14;

/// What a WebSocket frame (or data message) is about.
///
/// A data message spanning several frames is represented by the header of its
/// first frame; continuation frames carry no header of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsFrameHeader {
    Message { text: bool, has_payload: bool },
    Ping(Option<Bytes>),
    Pong(Option<Bytes>),
    Close { status: Option<u16>, reason: Option<String> },
}

impl WsFrameHeader {
    pub fn text() -> Self {
        Self::Message { text: true, has_payload: true }
    }

    pub fn binary() -> Self {
        Self::Message { text: false, has_payload: true }
    }

    pub fn close(status: u16, reason: Option<&str>) -> Self {
        Self::Close { status: Some(status), reason: reason.map(str::to_owned) }
    }

    pub fn is_control(&self) -> bool {
        !matches!(self, Self::Message { .. })
    }

    pub(crate) fn opcode(&self) -> u8 {
        match self {
            Self::Message { text: true, .. } => TEXT,
            Self::Message { text: false, .. } => BINARY,
            Self::Ping(_) => PING,
            Self::Pong(_) => PONG,
            Self::Close { .. } => CLOSE,
        }
    }

    /// Application data of a control frame.
    pub(crate) fn control_payload(&self) -> BytesMut {
        let mut payload = BytesMut::new();
        match self {
            Self::Ping(Some(data)) | Self::Pong(Some(data)) => payload.put_slice(data),
            Self::Close { status: Some(status), reason } => {
                payload.put_u16(*status);
                if let Some(reason) = reason {
                    payload.put_slice(reason.as_bytes());
                }
            }
            _ => {}
        }
        payload
    }
}

/// Writes the head of a frame: flags, opcode, length and masking key.
#[allow(clippy::cast_possible_truncation, reason = "length ranges are matched before narrowing")]
pub(crate) fn write_frame_head(dst: &mut BytesMut, fin: bool, opcode: u8, length: u64, mask: Option<[u8; 4]>) {
    let fin_bit = if fin { FIN_BIT } else { 0 };
    dst.put_u8(fin_bit | opcode);

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    match length {
        0..=125 => dst.put_u8(mask_bit | length as u8),
        126..=0xFFFF => {
            dst.put_u8(mask_bit | 126);
            dst.put_u16(length as u16);
        }
        _ => {
            dst.put_u8(mask_bit | 127);
            dst.put_u64(length);
        }
    }

    if let Some(mask) = mask {
        dst.put_slice(&mask);
    }
}
