//! WebSocket framing (RFC 6455) on top of the codec contract.
//!
//! A [`WsDecoder`]/[`WsEncoder`] pair serves one connection after the HTTP
//! upgrade. Link them with [`WsDecoder::set_peer_encoder`] so that both see
//! the same [`ClosingState`]: the decoder asks for the CLOSE echo, the encoder
//! completes the handshake when it sends it, and whichever side is the server
//! reports `close_connection` once both CLOSE frames have passed.
//!
//! ```
//! use bytes::BytesMut;
//! use micro_http_codec::codec::{Decoder, Encoder};
//! use micro_http_codec::ws::{WsDecoder, WsEncoder, WsFrameHeader};
//!
//! let mut decoder = WsDecoder::new();
//! let mut encoder = WsEncoder::server();
//! decoder.set_peer_encoder(&mut encoder);
//!
//! // a masked PING from the client
//! let mut input = &[0x89, 0x82, 1, 2, 3, 4, b'h' ^ 1, b'i' ^ 2][..];
//! let mut result = decoder.decode(&mut input, None, false).unwrap();
//! let pong = result.take_response().unwrap();
//! assert_eq!(pong, WsFrameHeader::Pong(Some("hi".into())));
//!
//! let mut out = BytesMut::new();
//! encoder.set_header(pong).unwrap();
//! encoder.encode_header_only(&mut out).unwrap();
//! assert_eq!(&out[..], b"\x8a\x02hi");
//! ```

mod closing;
mod decoder;
mod encoder;
mod frame;
mod handshake;
mod masking;
mod utf8;

pub use closing::{ClosingState, SharedClosingState};
pub use decoder::WsDecoder;
pub use encoder::WsEncoder;
pub use frame::{MAX_CONTROL_PAYLOAD, WsFrameHeader};
pub use handshake::{WEBSOCKET_VERSION, WsUpgradeProvider, accept_key, switching_protocols};
