//! Protocol level types: message headers, decoded message items and errors.
//!
//! - **Headers**: [`MessageHeader`] holds the fields and payload flag common to
//!   all HTTP messages, [`RequestHeader`] and [`ResponseHeader`] add the start
//!   line and deref to it.
//! - **Message items** ([`message`]): [`Message`], [`PayloadItem`] and
//!   [`PayloadSize`], used by the `tokio-util` adapter and the body codecs.
//! - **Errors** ([`error`]): [`ParseError`] for decoding, [`SendError`] for
//!   encoding and the umbrella [`HttpError`].

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod header;
pub use header::MessageHeader;

mod request;
pub use request::RequestHeader;

mod response;
pub use response::ResponseHeader;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
