use std::io;

use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("decode error: {source}")]
    DecodeError {
        #[from]
        source: ParseError,
    },

    #[error("encode error: {source}")]
    EncodeError {
        #[from]
        source: SendError,
    },
}

/// Errors raised while decoding HTTP messages or WebSocket frames.
///
/// Every variant is fatal for the connection it was raised on: the codec state
/// is undefined afterwards. [`ParseError::status_code`] and
/// [`ParseError::close_status`] give the code the peer should be answered with.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid start line {line:?}")]
    InvalidStartLine { line: String },

    #[error("invalid header line {line:?}: {reason}")]
    InvalidHeader { line: String, reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid transfer-encoding header: {reason}")]
    InvalidTransferEncoding { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid websocket frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("websocket frame payload of {length} bytes exceeds the limit {max_length}")]
    FrameTooLarge { length: u64, max_length: u64 },

    #[error("invalid utf-8 in websocket text data")]
    InvalidUtf8,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_start_line<S: ToString>(line: S) -> Self {
        Self::InvalidStartLine { line: line.to_string() }
    }

    pub fn invalid_header<L: ToString, S: ToString>(line: L, reason: S) -> Self {
        Self::InvalidHeader { line: line.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_transfer_encoding<S: ToString>(str: S) -> Self {
        Self::InvalidTransferEncoding { reason: str.to_string() }
    }

    pub fn invalid_frame<S: ToString>(str: S) -> Self {
        Self::InvalidFrame { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The status a server should answer with before closing the connection.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TooLargeHeader { .. } | Self::TooManyHeaders { .. } => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Self::InvalidVersion(_) => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            Self::InvalidTransferEncoding { .. } => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The WebSocket close code (RFC 6455, 7.4.1) matching this error.
    pub fn close_status(&self) -> u16 {
        match self {
            Self::InvalidUtf8 => 1007,
            Self::FrameTooLarge { .. } => 1009,
            _ => 1002,
        }
    }
}

/// Errors raised when an encoder is used in a way that cannot produce a valid message.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("no header has been set for the message to encode")]
    MissingHeader,

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid websocket frame: {reason}")]
    InvalidFrame { reason: String },
}

impl SendError {
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_frame<S: ToString>(str: S) -> Self {
        Self::InvalidFrame { reason: str.to_string() }
    }
}
