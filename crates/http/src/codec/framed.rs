//! Adapter running a codec [`Decoder`] under `tokio_util::codec::FramedRead`.
//!
//! Each completed header becomes a [`Message::Header`], payload bytes are
//! handed out as [`PayloadItem::Chunk`]s of at most [`MAX_CHUNK_SIZE`] bytes and
//! the end of every message is marked with [`PayloadItem::Eof`].
//!
//! ```no_run
//! use futures::StreamExt;
//! use micro_http_codec::codec::{FramedDecoder, HttpRequestDecoder};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::FramedRead;
//!
//! # async fn run(stream: TcpStream) {
//! let mut messages = FramedRead::new(stream, FramedDecoder::new(HttpRequestDecoder::new()));
//! while let Some(message) = messages.next().await {
//!     println!("{:?}", message);
//! }
//! # }
//! ```

use std::collections::VecDeque;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use super::contract::Decoder;
use crate::protocol::{Message, ParseError, PayloadItem};

/// Largest payload chunk produced by a single item.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug)]
pub struct FramedDecoder<D: Decoder> {
    inner: D,
    items: VecDeque<Message<D::Header>>,
    responses: VecDeque<D::Response>,
}

impl<D: Decoder> FramedDecoder<D> {
    pub fn new(inner: D) -> Self {
        Self { inner, items: VecDeque::new(), responses: VecDeque::new() }
    }

    pub fn get_ref(&self) -> &D {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    /// The next message the decoder asked to be sent back to the peer.
    pub fn take_response(&mut self) -> Option<D::Response> {
        self.responses.pop_front()
    }
}

impl<D> FramedDecoder<D>
where
    D: Decoder,
    D::Header: Clone,
{
    fn decode_items(&mut self, src: &mut BytesMut, end_of_input: bool) -> Result<Option<Message<D::Header>>, ParseError> {
        while self.items.is_empty() {
            let mut chunk = BytesMut::new().limit(MAX_CHUNK_SIZE);
            let available = src.len();
            let mut result = self.inner.decode(src, Some(&mut chunk), end_of_input)?;

            if result.is_header_completed() {
                if let Some(header) = self.inner.header() {
                    self.items.push_back(Message::Header(header.clone()));
                }
            }
            if let Some(response) = result.take_response() {
                self.responses.push_back(response);
            }

            let chunk = chunk.into_inner();
            if !chunk.is_empty() {
                trace!(len = chunk.len(), "decoded payload chunk");
                self.items.push_back(Message::Payload(PayloadItem::Chunk(chunk.freeze())));
            }

            if !result.is_overflow() && !result.is_underflow() {
                self.items.push_back(Message::Payload(PayloadItem::Eof));
            } else if result.is_underflow() && self.items.is_empty() && (src.is_empty() || src.len() == available) {
                // wait for the reader only once buffered input stops making progress
                return Ok(None);
            }
        }
        Ok(self.items.pop_front())
    }
}

impl<D> tokio_util::codec::Decoder for FramedDecoder<D>
where
    D: Decoder,
    D::Header: Clone,
{
    type Item = Message<D::Header>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode_items(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode_items(src, true)
    }
}
