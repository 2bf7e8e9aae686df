//! Reading and parsing the head of an HTTP message.
//!
//! Head bytes are collected by [`HeadReader`] until the blank line ending the
//! head has been seen, so a head may arrive in arbitrarily small pieces. The
//! complete head is then parsed with `httparse` into a [`RequestHeader`] or
//! [`ResponseHeader`]; all fields are stored as raw text.
//!
//! # Limits
//!
//! - Maximum number of fields: 64 (see [`HeadLimits`])
//! - Maximum head size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1
//!
//! Bare `LF` line endings are accepted, empty lines before the start line are
//! skipped (RFC 7230, section 3.5).

use bytes::{Buf, BytesMut};
use http::{Method, StatusCode, Uri, Version};
use httparse::Status;
use tracing::trace;

use crate::ensure;
use crate::fields::names::{CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::protocol::{MessageHeader, ParseError, PayloadSize, RequestHeader, ResponseHeader};

/// Maximum number of fields allowed in a head
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire head
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Size limits applied while reading a message head (or chunked trailer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadLimits {
    pub max_head_bytes: usize,
    pub max_fields: usize,
}

impl Default for HeadLimits {
    fn default() -> Self {
        Self { max_head_bytes: MAX_HEADER_BYTES, max_fields: MAX_HEADER_NUM }
    }
}

/// Accumulates the lines of a head up to and including the terminating blank line.
#[derive(Debug)]
pub(crate) struct HeadReader {
    buf: BytesMut,
    line_len: usize,
    lines: usize,
    trailer: bool,
    limits: HeadLimits,
}

impl HeadReader {
    pub(crate) fn new(limits: HeadLimits) -> Self {
        Self { buf: BytesMut::new(), line_len: 0, lines: 0, trailer: false, limits }
    }

    /// A reader for the trailer section of a chunked body, which may be empty.
    pub(crate) fn trailer(limits: HeadLimits) -> Self {
        Self { trailer: true, ..Self::new(limits) }
    }

    /// Moves head bytes from `src` into the internal buffer, returns `true`
    /// once the head is complete. Bytes after the head are left in `src`.
    pub(crate) fn read<B: Buf>(&mut self, src: &mut B) -> Result<bool, ParseError> {
        while src.has_remaining() {
            let chunk = src.chunk();
            let mut end = None;
            for (i, &b) in chunk.iter().enumerate() {
                match b {
                    b'\n' if self.line_len > 0 => {
                        self.lines += 1;
                        self.line_len = 0;
                        // the start line is not a field
                        ensure!(
                            self.lines <= self.limits.max_fields + 1,
                            ParseError::too_many_headers(self.limits.max_fields)
                        );
                    }
                    b'\n' if self.lines > 0 || self.trailer => {
                        end = Some(i + 1);
                        break;
                    }
                    b'\n' => {
                        // empty line before the start line
                    }
                    b'\r' => {}
                    _ => self.line_len += 1,
                }
            }

            let consumed = end.unwrap_or(chunk.len());
            self.buf.extend_from_slice(&chunk[..consumed]);
            src.advance(consumed);
            ensure!(
                self.buf.len() <= self.limits.max_head_bytes,
                ParseError::too_large_header(self.buf.len(), self.limits.max_head_bytes)
            );

            if end.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether anything but empty lines has been read.
    pub(crate) fn has_started(&self) -> bool {
        self.lines > 0 || self.line_len > 0
    }

    /// Returns the complete head and resets the reader.
    pub(crate) fn take(&mut self) -> BytesMut {
        self.line_len = 0;
        self.lines = 0;
        self.buf.split()
    }
}

fn trim_leading_newlines(head: &[u8]) -> &[u8] {
    let start = head.iter().position(|b| !matches!(b, b'\r' | b'\n')).unwrap_or(head.len());
    &head[start..]
}

fn lines(head: &[u8]) -> impl Iterator<Item = &[u8]> {
    head.split(|&b| b == b'\n').map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn first_line(head: &[u8]) -> String {
    String::from_utf8_lossy(lines(head).next().unwrap_or_default()).into_owned()
}

fn is_valid_field_line(line: &[u8]) -> bool {
    let Some(colon) = line.iter().position(|&b| b == b':') else {
        return false;
    };
    let (name, value) = line.split_at(colon);
    !name.is_empty()
        && name.iter().all(|&b| crate::fields::grammar::is_tchar(b))
        && value[1..].iter().all(|&b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}

/// The first field line `httparse` would have choked on.
fn offending_field_line(head: &[u8]) -> String {
    lines(head)
        .skip(1)
        .take_while(|line| !line.is_empty())
        .find(|line| !is_valid_field_line(line))
        .map_or_else(|| first_line(head), |line| String::from_utf8_lossy(line).into_owned())
}

fn map_error(head: &[u8], e: httparse::Error, limits: &HeadLimits) -> ParseError {
    match e {
        httparse::Error::TooManyHeaders => ParseError::too_many_headers(limits.max_fields),
        httparse::Error::HeaderName | httparse::Error::HeaderValue | httparse::Error::NewLine => {
            ParseError::invalid_header(offending_field_line(head), e)
        }
        _ => ParseError::invalid_start_line(first_line(head)),
    }
}

fn to_version(version: Option<u8>) -> Result<Version, ParseError> {
    match version {
        Some(0) => Ok(Version::HTTP_10),
        Some(1) => Ok(Version::HTTP_11),
        // Currently HTTP/2 and HTTP/3 not supported
        v => Err(ParseError::InvalidVersion(v)),
    }
}

fn append_fields(header: &mut MessageHeader, fields: &[httparse::Header<'_>]) {
    for field in fields {
        header.append_raw(field.name, String::from_utf8_lossy(field.value).trim());
    }
}

pub(crate) fn parse_request_head(head: &[u8], limits: &HeadLimits) -> Result<RequestHeader, ParseError> {
    let head = trim_leading_newlines(head);
    let mut fields = vec![httparse::EMPTY_HEADER; limits.max_fields];
    let mut req = httparse::Request::new(&mut fields);

    let Status::Complete(head_size) = req.parse(head).map_err(|e| map_error(head, e, limits))? else {
        return Err(ParseError::invalid_start_line(first_line(head)));
    };
    trace!(head_size, "parsed request head");

    let version = to_version(req.version)?;
    let invalid_start_line = || ParseError::invalid_start_line(first_line(head));
    let method = req.method.and_then(|m| Method::from_bytes(m.as_bytes()).ok()).ok_or_else(invalid_start_line)?;
    let uri = req.path.and_then(|p| p.parse::<Uri>().ok()).ok_or_else(invalid_start_line)?;

    let mut header = RequestHeader::new(method, uri, version, false);
    append_fields(&mut header, req.headers);
    Ok(header)
}

pub(crate) fn parse_response_head(head: &[u8], limits: &HeadLimits) -> Result<ResponseHeader, ParseError> {
    let head = trim_leading_newlines(head);
    let mut fields = vec![httparse::EMPTY_HEADER; limits.max_fields];
    let mut res = httparse::Response::new(&mut fields);

    let Status::Complete(head_size) = res.parse(head).map_err(|e| map_error(head, e, limits))? else {
        return Err(ParseError::invalid_start_line(first_line(head)));
    };
    trace!(head_size, "parsed response head");

    let version = to_version(res.version)?;
    let status = res
        .code
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ParseError::invalid_start_line(first_line(head)))?;

    let mut header = ResponseHeader::new(status, version, false);
    if let Some(reason) = res.reason.filter(|reason| Some(*reason) != status.canonical_reason()) {
        header.set_reason_phrase(reason);
    }
    append_fields(&mut header, res.headers);
    Ok(header)
}

/// Parses the trailer section of a chunked body and appends its fields.
pub(crate) fn parse_trailer(trailer: &[u8], header: &mut MessageHeader, limits: &HeadLimits) -> Result<(), ParseError> {
    let mut fields = vec![httparse::EMPTY_HEADER; limits.max_fields];
    match httparse::parse_headers(trailer, &mut fields) {
        Ok(Status::Complete((_, fields))) => {
            trace!(fields = fields.len(), "parsed chunked trailer");
            append_fields(header, fields);
            Ok(())
        }
        Ok(Status::Partial) => Err(ParseError::invalid_header(first_line(trailer), "incomplete trailer")),
        Err(httparse::Error::TooManyHeaders) => Err(ParseError::too_many_headers(limits.max_fields)),
        Err(e) => {
            let line = lines(trailer).find(|line| !line.is_empty() && !is_valid_field_line(line)).unwrap_or_default();
            Err(ParseError::invalid_header(String::from_utf8_lossy(line), e))
        }
    }
}

/// Checks if the Transfer-Encoding value ends with `chunked`.
pub(crate) fn is_chunked(transfer_encoding: &str) -> bool {
    transfer_encoding.rsplit(',').next().is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Determines how the payload following `header` is delimited (RFC 7230,
/// section 3.3.3).
///
/// Without `Transfer-Encoding` and `Content-Length` a response is read until
/// the connection closes while a request has no payload.
pub(crate) fn parse_payload(header: &MessageHeader, is_response: bool) -> Result<PayloadSize, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
    let transfer_encoding = header.find_string_value(TRANSFER_ENCODING);
    let content_length = header.find_string_value(CONTENT_LENGTH);

    if let Some(transfer_encoding) = transfer_encoding {
        ensure!(
            content_length.is_none(),
            ParseError::invalid_content_length("transfer_encoding and content_length both present in headers")
        );
        if is_chunked(&transfer_encoding) {
            return Ok(PayloadSize::Chunked);
        }
        if is_response {
            return Ok(PayloadSize::UntilClose);
        }
        return Err(ParseError::invalid_transfer_encoding(format!("{transfer_encoding} without final chunked")));
    }

    if let Some(content_length) = content_length {
        let mut length = None;
        // repeated lines have been joined with ", "
        for value in content_length.split(',') {
            let value = value.trim();
            let parsed = value
                .parse::<u64>()
                .map_err(|e| ParseError::invalid_content_length(format!("value {value} is not u64: {e}")))?;
            ensure!(
                length.is_none_or(|length| length == parsed),
                ParseError::invalid_content_length(format!("conflicting values {content_length}"))
            );
            length = Some(parsed);
        }
        return Ok(length.map_or(PayloadSize::Empty, PayloadSize::Length));
    }

    Ok(if is_response { PayloadSize::UntilClose } else { PayloadSize::Empty })
}
