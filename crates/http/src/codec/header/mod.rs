//! Head processing shared by the HTTP engines.
//!
//! - `head_decoder`: collects head lines, parses them with `httparse` and
//!   determines how the payload is delimited
//! - `head_encoder`: serializes start line and fields

mod head_decoder;
mod head_encoder;

pub use head_decoder::{HeadLimits, MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub(crate) use head_decoder::{HeadReader, is_chunked, parse_payload, parse_request_head, parse_response_head, parse_trailer};
pub(crate) use head_encoder::{write_request_head, write_response_head};
