//! HTTP request encoder (client side).
//!
//! Before the head is written the request is completed where HTTP/1.1
//! requires it: a missing `Host` is derived from the request target, and an
//! `Upgrade` request is announced in `Connection` and handed to the
//! registered [`UpgradeProvider`](super::upgrade::UpgradeProvider) for the
//! protocol, if any.

use bytes::{Buf, BufMut};
use http::Version;
use tracing::{debug, error};

use super::contract::{CodecResult, Encoder};
use super::exchange::{RequestInfo, SharedExchange};
use super::header::write_request_head;
use super::message_encoder::{MessageEncoder, prepare_framing};
use super::response_decoder::HttpResponseDecoder;
use super::upgrade;
use crate::fields::converters::STRING_LIST;
use crate::fields::names::{HOST, UPGRADE};
use crate::protocol::{RequestHeader, SendError};

#[derive(Debug)]
pub struct HttpRequestEncoder {
    core: MessageEncoder,
    header: Option<RequestHeader>,
    exchange: Option<SharedExchange>,
}

impl HttpRequestEncoder {
    pub fn new() -> Self {
        Self { core: MessageEncoder::new(), header: None, exchange: None }
    }

    /// Links this encoder with the decoder of the responses.
    pub fn set_peer_decoder(&mut self, decoder: &mut HttpResponseDecoder) {
        let exchange = self.exchange.get_or_insert_with(SharedExchange::new).clone();
        decoder.set_exchange(exchange);
    }

    pub(crate) fn set_exchange(&mut self, exchange: SharedExchange) {
        self.exchange = Some(exchange);
    }
}

impl Default for HttpRequestEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// `host[:port]` of the request target, empty if it has none (RFC 7230, section 5.4).
fn host_of(request: &RequestHeader) -> String {
    let uri = request.uri();
    match (uri.host(), uri.port_u16()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_owned(),
        (None, _) => String::new(),
    }
}

fn prepare_upgrade(request: &mut RequestHeader) -> Result<(), SendError> {
    let protocol = request.find_value(UPGRADE, STRING_LIST).and_then(|protocols| protocols.first().cloned());
    let Some(protocol) = protocol else {
        error!("upgrade header field without value");
        return Err(SendError::invalid_header("Upgrade header field must have a value"));
    };

    request.ensure_connection_upgrade();
    match upgrade::find_provider(&protocol) {
        Some(provider) => {
            debug!(%protocol, "preparing protocol upgrade");
            provider.augment_initial_request(request);
        }
        None => debug!(%protocol, "no provider for upgrade protocol"),
    }
    Ok(())
}

impl Encoder for HttpRequestEncoder {
    type Header = RequestHeader;

    fn set_header(&mut self, mut header: RequestHeader) -> Result<(), SendError> {
        if header.version() == Version::HTTP_11 && !header.has_field(HOST) {
            let host = host_of(&header);
            header.set_raw(HOST, host);
        }
        if header.has_field(UPGRADE) {
            prepare_upgrade(&mut header)?;
        }
        let payload = prepare_framing(&mut header, false)?;

        write_request_head(&header, self.core.head_buffer()?)?;
        self.core.start(payload, false);
        if let Some(exchange) = &self.exchange {
            exchange.push_request(RequestInfo::of(&header));
        }
        self.header = Some(header);
        Ok(())
    }

    fn encode<B: Buf>(&mut self, src: &mut B, dst: &mut dyn BufMut, end_of_input: bool) -> Result<CodecResult, SendError> {
        self.core.encode(src, dst, end_of_input)
    }

    fn header(&self) -> Option<&RequestHeader> {
        self.header.as_ref()
    }
}
