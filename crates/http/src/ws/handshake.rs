//! The HTTP side of the WebSocket opening handshake (RFC 6455, section 4).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{StatusCode, Version};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::codec::UpgradeProvider;
use crate::fields::converters::STRING_LIST;
use crate::fields::names::{SEC_WEBSOCKET_ACCEPT, SEC_WEBSOCKET_KEY, SEC_WEBSOCKET_VERSION, UPGRADE};
use crate::protocol::{RequestHeader, ResponseHeader};

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

pub const WEBSOCKET_VERSION: &str = "13";

/// The `Sec-WebSocket-Accept` value answering `key`.
pub fn accept_key(key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(key.trim().as_bytes());
    sha1.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(sha1.finalize())
}

/// Adds the WebSocket fields to requests upgrading to `websocket`.
///
/// Register it with [`upgrade::register`](crate::codec::upgrade::register) so
/// that the request encoder picks it up.
#[derive(Debug, Default)]
pub struct WsUpgradeProvider;

impl UpgradeProvider for WsUpgradeProvider {
    fn supports_protocol(&self, protocol: &str) -> bool {
        protocol.eq_ignore_ascii_case("websocket")
    }

    fn augment_initial_request(&self, request: &mut RequestHeader) {
        if !request.has_field(SEC_WEBSOCKET_KEY) {
            let nonce: [u8; 16] = rand::random();
            request.set_raw(SEC_WEBSOCKET_KEY, STANDARD.encode(nonce));
        }
        request.set_raw(SEC_WEBSOCKET_VERSION, WEBSOCKET_VERSION);
    }
}

/// The `101 Switching Protocols` response accepting a WebSocket upgrade, or
/// `None` if `request` is not a valid opening handshake.
pub fn switching_protocols(request: &RequestHeader) -> Option<ResponseHeader> {
    let upgrades_to_websocket = request
        .parse_value(UPGRADE, STRING_LIST)
        .is_some_and(|protocols| protocols.iter().any(|p| p.eq_ignore_ascii_case("websocket")));
    let version = request.find_string_value(SEC_WEBSOCKET_VERSION);
    let key = request.find_string_value(SEC_WEBSOCKET_KEY)?;
    if !upgrades_to_websocket || version.as_deref().map(str::trim) != Some(WEBSOCKET_VERSION) {
        debug!(?version, "not a websocket opening handshake");
        return None;
    }

    let mut response = ResponseHeader::new(StatusCode::SWITCHING_PROTOCOLS, Version::HTTP_11, false);
    response.set_raw(UPGRADE, "websocket");
    response.ensure_connection_upgrade();
    response.set_raw(SEC_WEBSOCKET_ACCEPT, accept_key(&key));
    Some(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::BytesMut;
    use http::Method;

    use super::*;
    use crate::codec::{Encoder, HttpRequestEncoder, upgrade};

    #[test]
    fn computes_rfc_accept_key() {
        assert_eq!(accept_key("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn adds_key_and_version() {
        let mut request = RequestHeader::new(Method::GET, "/chat".parse().unwrap(), Version::HTTP_11, false);
        WsUpgradeProvider.augment_initial_request(&mut request);

        let key = request.find_string_value(SEC_WEBSOCKET_KEY).unwrap();
        assert_eq!(STANDARD.decode(&key).unwrap().len(), 16);
        assert_eq!(request.find_string_value(SEC_WEBSOCKET_VERSION).as_deref(), Some("13"));

        // an existing key is kept
        WsUpgradeProvider.augment_initial_request(&mut request);
        assert_eq!(request.find_string_value(SEC_WEBSOCKET_KEY), Some(key));
    }

    #[test]
    fn request_encoder_uses_registered_provider() {
        upgrade::register(Arc::new(WsUpgradeProvider));

        let mut request = RequestHeader::new(Method::GET, "ws://example.com/chat".parse().unwrap(), Version::HTTP_11, false);
        request.set_raw(UPGRADE, "websocket");
        let mut encoder = HttpRequestEncoder::new();
        encoder.set_header(request).unwrap();
        let mut out = BytesMut::new();
        encoder.encode_header_only(&mut out).unwrap();

        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(text.starts_with("GET ws://example.com/chat HTTP/1.1\r\nHost: example.com\r\n"));
        assert!(text.contains("Connection: Upgrade\r\n"));
        assert!(text.contains("Sec-WebSocket-Key: "));
        assert!(text.contains("Sec-WebSocket-Version: 13\r\n"));
    }

    #[test]
    fn answers_opening_handshake() {
        let mut request = RequestHeader::new(Method::GET, "/chat".parse().unwrap(), Version::HTTP_11, false);
        request.set_raw(UPGRADE, "websocket");
        request.set_raw(SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==");
        request.set_raw(SEC_WEBSOCKET_VERSION, "13");

        let response = switching_protocols(&request).unwrap();
        assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
        assert!(response.has_connection_token("upgrade"));
        assert_eq!(
            response.find_string_value(SEC_WEBSOCKET_ACCEPT).as_deref(),
            Some("s3pPLMBiTxaQ9kYGzzhZRbK+xOo=")
        );

        request.set_raw(SEC_WEBSOCKET_VERSION, "8");
        assert!(switching_protocols(&request).is_none());
    }
}
