//! Non-blocking HTTP/1.1 message codecs.
//!
//! All engines implement the buffer driven [`Decoder`] / [`Encoder`] contract:
//! every call consumes what it can from the input, writes what fits into the
//! output and returns a [`CodecResult`] describing what is needed next.
//!
//! # Architecture
//!
//! - Request handling (server side):
//!   - [`HttpRequestDecoder`]: decodes incoming requests
//!   - [`HttpResponseEncoder`]: encodes the responses
//! - Response handling (client side):
//!   - [`HttpRequestEncoder`]: encodes outgoing requests
//!   - [`HttpResponseDecoder`]: decodes the responses
//! - Head parsing and serialization via the `header` module, payload framing
//!   (content-length, chunked, until close) via the `body` module
//! - [`SharedExchange`]: links the two directions of a connection
//! - [`upgrade`]: registry of protocol upgrade providers
//! - [`FramedDecoder`]: runs any decoder under `tokio_util::codec::FramedRead`
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use http::{StatusCode, Version};
//! use micro_http_codec::codec::{Decoder, Encoder, HttpRequestDecoder, HttpResponseEncoder};
//! use micro_http_codec::protocol::ResponseHeader;
//!
//! let mut decoder = HttpRequestDecoder::new();
//! let mut encoder = HttpResponseEncoder::new();
//! decoder.set_peer_encoder(&mut encoder);
//!
//! let mut request = BytesMut::from("GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
//! let result = decoder.decode(&mut request, None, false).unwrap();
//! assert!(result.is_header_completed());
//!
//! let mut header = ResponseHeader::new(StatusCode::OK, Version::HTTP_11, true);
//! header.set_raw("Content-Length", "2");
//! encoder.set_header(header).unwrap();
//!
//! let mut out = BytesMut::new();
//! let result = encoder.encode(&mut &b"ok"[..], &mut out, true).unwrap();
//! assert!(!result.is_overflow() && !result.is_underflow());
//! assert_eq!(&out[..], b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
//! ```

mod body;
mod contract;
mod exchange;
mod framed;
mod header;
mod message_decoder;
mod message_encoder;
mod request_decoder;
mod request_encoder;
mod response_decoder;
mod response_encoder;
pub mod upgrade;

pub use contract::CodecResult;
pub use contract::Decoder;
pub use contract::Encoder;
pub use exchange::RequestInfo;
pub use exchange::SharedExchange;
pub use framed::FramedDecoder;
pub use framed::MAX_CHUNK_SIZE;
pub use header::{HeadLimits, MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub use request_decoder::HttpRequestDecoder;
pub use request_encoder::HttpRequestEncoder;
pub use response_decoder::HttpResponseDecoder;
pub use response_encoder::HttpResponseEncoder;
pub use upgrade::UpgradeProvider;
