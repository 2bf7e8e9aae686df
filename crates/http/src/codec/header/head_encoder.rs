//! Serializes request and response heads.
//!
//! The start line is followed by every field line in insertion order (a
//! multi-value field may produce several lines) and the blank line. Framing
//! fields (`Content-Length`, `Transfer-Encoding`) are written as they are set
//! on the header; the message encoders adjust them before calling in here.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::Version;
use tracing::error;

use crate::protocol::{MessageHeader, RequestHeader, ResponseHeader, SendError};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

fn version_str(version: Version) -> Result<&'static str, SendError> {
    match version {
        Version::HTTP_10 => Ok("HTTP/1.0"),
        Version::HTTP_11 => Ok("HTTP/1.1"),
        v => {
            error!(http_version = ?v, "unsupported http version");
            Err(SendError::invalid_header(format!("unsupported http version {v:?}")))
        }
    }
}

fn write_fields(header: &MessageHeader, dst: &mut BytesMut) {
    header.write_fields(dst);
    dst.put_slice(b"\r\n");
}

pub(crate) fn write_request_head(header: &RequestHeader, dst: &mut BytesMut) -> Result<(), SendError> {
    let version = version_str(header.version())?;
    dst.reserve(INIT_HEADER_SIZE);
    write!(FastWrite(dst), "{} {} {}\r\n", header.method(), header.uri(), version)
        .map_err(SendError::invalid_header)?;
    write_fields(header, dst);
    Ok(())
}

pub(crate) fn write_response_head(header: &ResponseHeader, dst: &mut BytesMut) -> Result<(), SendError> {
    let version = version_str(header.version())?;
    dst.reserve(INIT_HEADER_SIZE);
    write!(FastWrite(dst), "{} {} {}\r\n", version, header.status().as_str(), header.reason_phrase())
        .map_err(SendError::invalid_header)?;
    write_fields(header, dst);
    Ok(())
}

/// Writer over a [`BytesMut`] whose space has already been reserved.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fields::converters::SET_COOKIE_LIST;
    use crate::fields::{Cookie, CookieList};

    #[test]
    fn writes_request_head() {
        let mut header =
            RequestHeader::new(Method::POST, "/submit?x=1".parse().unwrap(), Version::HTTP_11, true);
        header.set_raw("Host", "example.com");
        header.set_raw("Content-Length", "3");

        let mut dst = BytesMut::new();
        write_request_head(&header, &mut dst).unwrap();
        assert_eq!(
            std::str::from_utf8(&dst).unwrap(),
            "POST /submit?x=1 HTTP/1.1\r\nHost: example.com\r\nContent-Length: 3\r\n\r\n"
        );
    }

    #[test]
    fn writes_response_head_with_separate_lines() {
        let mut header = ResponseHeader::new(StatusCode::OK, Version::HTTP_10, false);
        let cookies: CookieList = vec![Cookie::new("a", "1"), Cookie::new("b", "2")].into();
        header.set_value("Set-Cookie", cookies, SET_COOKIE_LIST);

        let mut dst = BytesMut::new();
        write_response_head(&header, &mut dst).unwrap();
        assert_eq!(
            std::str::from_utf8(&dst).unwrap(),
            "HTTP/1.0 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n"
        );
    }

    #[test]
    fn rejects_unsupported_versions() {
        let header = ResponseHeader::new(StatusCode::OK, Version::HTTP_2, false);
        assert!(matches!(write_response_head(&header, &mut BytesMut::new()), Err(SendError::InvalidHeader { .. })));
    }
}
