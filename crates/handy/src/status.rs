//! Respond with whatever status code the path asks for.
//!
//! `GET /503` answers `503 Service Unavailable`, with the code and its reason
//! phrase echoed in the `x-status-code` and `x-status` headers and in the
//! body. Only codes in the handler's allow-list are served; anything else is a
//! `404` without those headers.

use crate::{Handler, Request, Response, response::not_found};
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use std::{collections::BTreeSet, sync::Arc};

/// Header echoing the requested code, as written in the path.
pub const X_STATUS_CODE: HeaderName = HeaderName::from_static("x-status-code");

/// Header echoing the reason phrase of the requested code.
pub const X_STATUS: HeaderName = HeaderName::from_static("x-status");

/// Codes with a reason phrase that are still refused by default: the
/// WebDAV/delta-encoding 2xx codes, whose bodies carry more than a phrase.
const UNSUPPORTED_SUCCESS: [u16; 3] = [207, 208, 226];

/// A frozen allow-list of status codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusCodes(Arc<BTreeSet<u16>>);

impl StatusCodes {
    /// Returns true if `code` may be served.
    pub fn contains(&self, code: u16) -> bool {
        self.0.contains(&code)
    }

    /// Iterates over the allowed codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl Default for StatusCodes {
    /// Every 2xx, 4xx and 5xx code with a canonical reason phrase, except
    /// 207, 208 and 226. Informational and redirection codes are excluded.
    fn default() -> Self {
        (200..600)
            .filter(|code| matches!(code / 100, 2 | 4 | 5))
            .filter(|code| !UNSUPPORTED_SUCCESS.contains(code))
            .filter(|code| reason(*code).is_some())
            .collect()
    }
}

impl FromIterator<u16> for StatusCodes {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

/// A handler that responds with the status code named by the request path.
#[derive(Clone, Debug, Default)]
pub struct Status {
    allowed: StatusCodes,
}

impl Status {
    /// Creates a handler serving only the codes in `allowed`.
    pub const fn new(allowed: StatusCodes) -> Self {
        Self { allowed }
    }

    /// Returns the allow-list this handler serves.
    pub const fn allowed(&self) -> &StatusCodes {
        &self.allowed
    }

    fn respond(&self, req: &Request) -> Response {
        let written = req.uri().path().trim_matches('/');
        let Some(code) = parse_code(written) else {
            return not_found();
        };
        let Some(text) = reason(code) else {
            return not_found();
        };
        if !self.allowed.contains(code) {
            return not_found();
        }
        let Ok(status) = StatusCode::from_u16(code) else {
            return not_found();
        };

        let body = if req.method() == Method::HEAD || !body_allowed(status) {
            Bytes::new()
        } else {
            Bytes::from(format!("{written} {text}\n"))
        };

        let mut res = Response::new(body);
        *res.status_mut() = status;
        let headers = res.headers_mut();
        // `written` is ASCII, `text` a static phrase.
        if let Ok(value) = HeaderValue::try_from(written) {
            headers.insert(X_STATUS_CODE, value);
        }
        headers.insert(X_STATUS, HeaderValue::from_static(text));
        res
    }
}

impl Handler for Status {
    fn handle(&self, req: Request) -> impl Future<Output = Response> + Send {
        core::future::ready(self.respond(&req))
    }
}

/// Parses an optionally `+`-signed string of ASCII digits as a status code
/// candidate. A `-` sign can never name a code and is rejected with the rest.
fn parse_code(code: &str) -> Option<u16> {
    let digits = code.strip_prefix('+').unwrap_or(code);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn reason(code: u16) -> Option<&'static str> {
    StatusCode::from_u16(code).ok()?.canonical_reason()
}

fn body_allowed(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}
