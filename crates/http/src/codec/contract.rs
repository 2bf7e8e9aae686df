//! The calling convention shared by all engines.
//!
//! A [`Decoder`] is fed with whatever bytes have arrived and writes as much
//! payload as fits into the caller's output buffer; an [`Encoder`] does the
//! reverse. Neither ever waits: each call returns a [`CodecResult`] telling the
//! caller what is needed to make progress.
//!
//! | overflow | underflow | meaning                                                  |
//! |----------|-----------|----------------------------------------------------------|
//! | false    | false     | the current message (or frame) is complete               |
//! | true     | false     | output space is exhausted, call again with a fresh `dst` |
//! | false    | true      | all input consumed, call again when more has arrived     |
//! | true     | true      | both; the output must be drained first                   |

use bytes::{Buf, BufMut};

use crate::protocol::{ParseError, SendError};

/// The outcome of one `decode` or `encode` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecResult<R = ()> {
    overflow: bool,
    underflow: bool,
    close_connection: bool,
    header_completed: bool,
    response: Option<R>,
    response_only: bool,
}

impl<R> CodecResult<R> {
    pub(crate) fn new(overflow: bool, underflow: bool) -> Self {
        Self {
            overflow,
            underflow,
            close_connection: false,
            header_completed: false,
            response: None,
            response_only: false,
        }
    }

    /// The message is complete.
    pub(crate) fn complete() -> Self {
        Self::new(false, false)
    }

    pub(crate) fn needs_input() -> Self {
        Self::new(false, true)
    }

    pub(crate) fn needs_output() -> Self {
        Self::new(true, false)
    }

    #[must_use]
    pub(crate) fn with_close_connection(mut self, close_connection: bool) -> Self {
        self.close_connection = close_connection;
        self
    }

    #[must_use]
    pub(crate) fn with_header_completed(mut self, header_completed: bool) -> Self {
        self.header_completed = header_completed;
        self
    }

    #[must_use]
    pub(crate) fn with_response(mut self, response: R, response_only: bool) -> Self {
        self.response = Some(response);
        self.response_only = response_only;
        self
    }

    /// The output buffer is full and more output is pending.
    pub fn is_overflow(&self) -> bool {
        self.overflow
    }

    /// No progress can be made without more input.
    pub fn is_underflow(&self) -> bool {
        self.underflow
    }

    /// The connection should be closed once the output has been sent.
    pub fn close_connection(&self) -> bool {
        self.close_connection
    }

    /// A header has been completed during this call and is available from the
    /// engine's `header()`.
    pub fn is_header_completed(&self) -> bool {
        self.header_completed
    }

    /// A message the caller must send to the peer, such as the PONG answering a PING.
    pub fn response(&self) -> Option<&R> {
        self.response.as_ref()
    }

    pub fn take_response(&mut self) -> Option<R> {
        self.response.take()
    }

    /// The received message only asked for the response to be sent; there is
    /// nothing to hand to the application.
    pub fn is_response_only(&self) -> bool {
        self.response_only
    }
}

/// Decodes messages from bytes.
pub trait Decoder {
    /// The header type made available after `header_completed`.
    type Header;
    /// The type of messages the decoder may ask to be sent back.
    type Response;

    /// Decodes from `src` into `dst`.
    ///
    /// `dst` may be `None` while waiting for a header; once the header is
    /// complete and a payload follows, the call reports overflow. `end_of_input`
    /// signals that `src` holds the last bytes of the connection.
    fn decode<B: Buf>(
        &mut self,
        src: &mut B,
        dst: Option<&mut dyn BufMut>,
        end_of_input: bool,
    ) -> Result<CodecResult<Self::Response>, ParseError>;

    /// The most recently completed header.
    fn header(&self) -> Option<&Self::Header>;

    fn header_mut(&mut self) -> Option<&mut Self::Header>;
}

/// Encodes messages into bytes.
pub trait Encoder {
    type Header;

    /// Starts a new message; must be called before the first `encode` of each message.
    fn set_header(&mut self, header: Self::Header) -> Result<(), SendError>;

    /// Encodes payload from `src` into `dst`, preceded by the pending header.
    fn encode<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut, end_of_input: bool) -> Result<CodecResult, SendError>;

    /// Encodes a message that has no payload (or the rest of a message whose
    /// payload has been passed completely).
    fn encode_header_only(&mut self, dst: &mut dyn BufMut) -> Result<CodecResult, SendError> {
        self.encode(&mut &b""[..], dst, true)
    }

    /// The header of the message being encoded.
    fn header(&self) -> Option<&Self::Header>;
}
