//! Session cookie payload codec.
//!
//! The payload is the upstream session token (`MUSIC_U=...`) base64-encoded into a single
//! HttpOnly cookie. Anything that fails to decode is an anonymous session.

use base64::{Engine, prelude::BASE64_STANDARD};
use std::collections::HashMap;
use tracing::warn;

pub const SESSION_COOKIE: &str = "NETEASE_SESSION";
/// 30 days.
pub const SESSION_MAX_AGE: u64 = 60 * 60 * 24 * 30;

const TOKEN_PREFIX: &str = "MUSIC_U=";

/// Parse a request `Cookie` header into name → value.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|c| c.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Decode a payload into upstream `name=value` cookies.
pub fn decode_payload(encoded: &str) -> Vec<String> {
    let bytes = match BASE64_STANDARD.decode(encoded.trim()) {
        Ok(b) => b,
        Err(e) => {
            warn!("discarding undecodable session payload: {e}");
            return Vec::new();
        }
    };
    let Ok(text) = String::from_utf8(bytes) else {
        warn!("discarding non-utf8 session payload");
        return Vec::new();
    };
    text.split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode the session token out of an upstream cookie jar, if the upstream granted one.
pub fn encode_payload(cookies: &[String]) -> Option<String> {
    cookies
        .iter()
        .find(|c| c.starts_with(TOKEN_PREFIX))
        .map(|c| BASE64_STANDARD.encode(c.as_bytes()))
}

/// `Set-Cookie` value that stores `payload`, or clears the cookie when there is none.
pub fn set_cookie_header(payload: Option<&str>) -> String {
    match payload {
        Some(p) => format!("{SESSION_COOKIE}={p}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_MAX_AGE}"),
        None => format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    }
}

/// Read our cookie back out of a `Set-Cookie` value.
///
/// `None` when the header is about some other cookie, `Some(None)` when it clears the session.
pub fn payload_from_set_cookie(header: &str) -> Option<Option<String>> {
    let mut parts = header.split(';').map(str::trim);
    let (name, value) = parts.next()?.split_once('=')?;
    if name.trim() != SESSION_COOKIE {
        return None;
    }
    let cleared = value.is_empty()
        || parts.any(|attr| {
            attr.split_once('=')
                .is_some_and(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
        });
    Some(if cleared { None } else { Some(value.to_string()) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_only_the_session_token() {
        let jar = vec!["appver=3.1.11".to_string(), "MUSIC_U=abc123".to_string()];
        let payload = encode_payload(&jar).unwrap();
        assert_eq!(decode_payload(&payload), vec!["MUSIC_U=abc123".to_string()]);
        assert!(encode_payload(&["os=pc".to_string()]).is_none());
    }

    #[test]
    fn garbage_payload_is_anonymous() {
        assert!(decode_payload("%%%not base64").is_empty());
        assert!(decode_payload("").is_empty());
    }

    #[test]
    fn cookie_header_keeps_equals_in_values() {
        let cookies = parse_cookie_header("a=1; NETEASE_SESSION=TVVTSUNfVT14; b=x=y");
        assert_eq!(cookies["NETEASE_SESSION"], "TVVTSUNfVT14");
        assert_eq!(cookies["b"], "x=y");
    }

    #[test]
    fn set_cookie_round_trip() {
        let set = set_cookie_header(Some("abc="));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Max-Age=2592000"));
        assert_eq!(payload_from_set_cookie(&set), Some(Some("abc=".to_string())));

        let clear = set_cookie_header(None);
        assert_eq!(payload_from_set_cookie(&clear), Some(None));
        assert_eq!(payload_from_set_cookie("other=1; Path=/"), None);
    }
}
