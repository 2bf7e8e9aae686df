//! Well-known field names and the converters used for them.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::fields::converter::FieldConverter;
use crate::fields::converters;

pub const ACCEPT: &str = "Accept";
pub const ACCEPT_CHARSET: &str = "Accept-Charset";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
pub const ALLOW: &str = "Allow";
pub const AUTHORIZATION: &str = "Authorization";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const CONNECTION: &str = "Connection";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_LOCATION: &str = "Content-Location";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const COOKIE: &str = "Cookie";
pub const DATE: &str = "Date";
pub const ETAG: &str = "ETag";
pub const EXPECT: &str = "Expect";
pub const HOST: &str = "Host";
pub const IF_MATCH: &str = "If-Match";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";
pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const IF_UNMODIFIED_SINCE: &str = "If-Unmodified-Since";
pub const LAST_MODIFIED: &str = "Last-Modified";
pub const LOCATION: &str = "Location";
pub const MAX_FORWARDS: &str = "Max-Forwards";
pub const RETRY_AFTER: &str = "Retry-After";
pub const SEC_WEBSOCKET_ACCEPT: &str = "Sec-WebSocket-Accept";
pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";
pub const SEC_WEBSOCKET_PROTOCOL: &str = "Sec-WebSocket-Protocol";
pub const SEC_WEBSOCKET_VERSION: &str = "Sec-WebSocket-Version";
pub const SERVER: &str = "Server";
pub const SET_COOKIE: &str = "Set-Cookie";
pub const TE: &str = "TE";
pub const TRAILER: &str = "Trailer";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const UPGRADE: &str = "Upgrade";
pub const USER_AGENT: &str = "User-Agent";
pub const VIA: &str = "Via";
pub const WWW_AUTHENTICATE: &str = "WWW-Authenticate";

static WELL_KNOWN: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    [
        ACCEPT,
        ACCEPT_CHARSET,
        ACCEPT_ENCODING,
        ACCEPT_LANGUAGE,
        ALLOW,
        AUTHORIZATION,
        CACHE_CONTROL,
        CONNECTION,
        CONTENT_ENCODING,
        CONTENT_LENGTH,
        CONTENT_LOCATION,
        CONTENT_TYPE,
        COOKIE,
        DATE,
        ETAG,
        EXPECT,
        HOST,
        IF_MATCH,
        IF_MODIFIED_SINCE,
        IF_NONE_MATCH,
        IF_UNMODIFIED_SINCE,
        LAST_MODIFIED,
        LOCATION,
        MAX_FORWARDS,
        RETRY_AFTER,
        SEC_WEBSOCKET_ACCEPT,
        SEC_WEBSOCKET_KEY,
        SEC_WEBSOCKET_PROTOCOL,
        SEC_WEBSOCKET_VERSION,
        SERVER,
        SET_COOKIE,
        TE,
        TRAILER,
        TRANSFER_ENCODING,
        UPGRADE,
        USER_AGENT,
        VIA,
        WWW_AUTHENTICATE,
    ]
    .into_iter()
    .map(|name| (name.to_ascii_lowercase(), name))
    .collect()
});

/// The canonical spelling of a well-known field name, `name` itself otherwise.
pub fn canonical_name(name: &str) -> &str {
    WELL_KNOWN.get(&name.to_ascii_lowercase()).copied().unwrap_or(name)
}

/// The converter used for the field `name`; unknown fields are plain strings.
pub fn lookup_converter(name: &str) -> &'static dyn FieldConverter {
    match canonical_name(name) {
        ACCEPT => &converters::MEDIA_RANGE_LIST,
        ACCEPT_LANGUAGE => &converters::LANGUAGE_LIST,
        CONTENT_LENGTH | MAX_FORWARDS => &converters::LONG,
        CONTENT_TYPE => &converters::MEDIA_TYPE,
        DATE | LAST_MODIFIED | IF_MODIFIED_SINCE | IF_UNMODIFIED_SINCE | RETRY_AFTER => &converters::DATE_TIME,
        LOCATION | CONTENT_LOCATION => &converters::URI,
        COOKIE => &converters::COOKIE_LIST,
        SET_COOKIE => &converters::SET_COOKIE_LIST,
        SERVER | USER_AGENT => &converters::PRODUCT_DESCRIPTIONS,
        ALLOW | CONNECTION | IF_MATCH | IF_NONE_MATCH | TRAILER | TRANSFER_ENCODING | UPGRADE | VIA => {
            &converters::STRING_LIST
        }
        _ => &converters::STRING,
    }
}
