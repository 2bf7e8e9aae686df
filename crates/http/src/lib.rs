//! A non-blocking, buffer driven HTTP/1.1 and WebSocket codec
//!
//! This crate turns bytes into HTTP messages and WebSocket frames and back
//! without doing any I/O itself. The caller owns the sockets and the buffers;
//! the codecs only ever look at what they are given, keep their state between
//! calls and tell the caller what they need next.
//!
//! # Features
//!
//! - HTTP/1.1 (and 1.0) requests and responses, pipelining included
//! - Content-Length, chunked (with trailers) and until-close payloads
//! - Typed header fields: dates, media types and ranges, languages, cookies,
//!   product descriptions, lists
//! - Protocol upgrades with a pluggable provider registry
//! - WebSocket frames: masking, fragmentation, control frames, the closing
//!   handshake and UTF-8 validation of text messages
//! - A `tokio-util` adapter for use with `FramedRead`
//!
//! # Example
//!
//! ```
//! use bytes::{BufMut, BytesMut};
//! use micro_http_codec::codec::{Decoder, HttpRequestDecoder};
//! use micro_http_codec::fields::converters::MEDIA_RANGE_LIST;
//!
//! let mut decoder = HttpRequestDecoder::new();
//! let mut input = BytesMut::from(
//!     "POST /echo HTTP/1.1\r\nHost: example.com\r\nAccept: text/*\r\nContent-Length: 5\r\n\r\nhello",
//! );
//! let mut body = BytesMut::new().limit(3);
//!
//! // the body does not fit: the decoder reports overflow
//! let result = decoder.decode(&mut input, Some(&mut body), false).unwrap();
//! assert!(result.is_header_completed());
//! assert!(result.is_overflow());
//! assert_eq!(&body.get_ref()[..], b"hel");
//!
//! let mut rest = BytesMut::new();
//! let result = decoder.decode(&mut input, Some(&mut rest), false).unwrap();
//! assert!(!result.is_overflow() && !result.is_underflow());
//! assert_eq!(&rest[..], b"lo");
//!
//! let header = decoder.header_mut().unwrap();
//! let accept = header.find_value("accept", MEDIA_RANGE_LIST).unwrap();
//! assert_eq!(accept[0].to_string(), "text/*");
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`codec`]: the decode/encode contract and the four HTTP engines
//! - [`protocol`]: message headers, message items and errors
//! - [`fields`]: header field names and value converters
//! - [`ws`]: WebSocket frame decoder and encoder, opening handshake helpers
//!
//! ## Error Handling
//!
//! - [`protocol::ParseError`]: malformed input; every variant is fatal for the connection
//! - [`protocol::SendError`]: an encoder was asked for something it cannot produce
//! - [`fields::FieldParseError`]: a field value does not match its grammar
//!
//! # Limitations
//!
//! - HTTP/1.x only (HTTP/2 and HTTP/3 are not supported)
//! - No I/O, no TLS, no compression
//! - Default maximum header size: 8KB
//! - Default maximum number of headers: 64

pub mod codec;
pub mod fields;
pub mod protocol;
pub mod ws;

mod utils;
pub(crate) use utils::ensure;
