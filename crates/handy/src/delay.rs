//! Artificial latency driven by the request path.
//!
//! [`Delay`] reads the last path segment as a duration (see
//! [`parse_duration`]), strips it, waits that long and then forwards the
//! rewritten request. `GET /users/42/300ms` reaches the next handler as
//! `GET /users/42` roughly 300ms later.
//!
//! Requests whose last segment is not a duration are forwarded immediately
//! and untouched.

use crate::{Handler, Request, Response, duration::parse_duration, path};
use core::time::Duration;
use http::{Uri, uri::PathAndQuery};

/// A decorator that delays requests by the duration named in their path.
#[derive(Clone, Debug)]
pub struct Delay<H> {
    next: H,
}

impl<H> Delay<H>
where
    H: Handler,
{
    /// Wraps `next` so that it receives requests after their requested delay.
    pub const fn new(next: H) -> Self {
        Self { next }
    }

    /// Returns a reference to the wrapped handler.
    pub const fn get_ref(&self) -> &H {
        &self.next
    }
}

impl<H> Handler for Delay<H>
where
    H: Handler,
{
    fn handle(&self, mut req: Request) -> impl Future<Output = Response> + Send {
        async move {
            if let Some((uri, delay)) = delayed_uri(req.uri()) {
                #[cfg(feature = "tracing")]
                tracing::debug!("Delaying {} by {:?}", uri.path(), delay);
                *req.uri_mut() = uri;
                tokio::time::sleep(delay).await;
            }
            self.next.handle(req).await
        }
    }
}

/// Splits a trailing duration token off `path`.
///
/// Returns the cleaned remainder of the path and the parsed delay, or `None`
/// if the last segment (ignoring one trailing slash) is not a duration.
pub(crate) fn split_delay(path: &str) -> Option<(String, Duration)> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let (head, token) = trimmed.rsplit_once('/').unwrap_or(("", trimmed));
    let delay = parse_duration(&path::decode(token)).ok()?;
    Some((path::clean(head), delay))
}

/// Builds the URI the next handler sees: the same URI with the duration token
/// removed from its path. The query string is preserved.
fn delayed_uri(uri: &Uri) -> Option<(Uri, Duration)> {
    let (path, delay) = split_delay(uri.path())?;
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    let uri = Uri::from_parts(parts).ok()?;
    Some((uri, delay))
}
