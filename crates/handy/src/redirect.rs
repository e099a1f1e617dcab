//! Permanent redirects served from a fixed table.
//!
//! [`Redirects`] answers every request whose path is a key of its table with a
//! `301 Moved Permanently` pointing at the mapped target, and every other
//! request with a `404`.
//!
//! The table itself is immutable. [`Redirects::reload`] swaps in a complete
//! replacement atomically; requests already being answered keep the table they
//! started with.

use crate::{Handler, Request, Response, path, response::not_found};
use arc_swap::ArcSwap;
use bytes::Bytes;
use http::{HeaderValue, Method, StatusCode, header};
use std::{collections::HashMap, sync::Arc};

/// Requested path to redirect target.
pub type RedirectMap = HashMap<String, String>;

/// A handler serving permanent redirects from a path lookup table.
///
/// Clones share the same table, including across [`reload`](Self::reload).
#[derive(Clone, Debug)]
pub struct Redirects {
    table: Arc<ArcSwap<RedirectMap>>,
}

impl Redirects {
    /// Creates a handler redirecting `from -> to` for every entry of
    /// `redirects`.
    pub fn new(redirects: impl Into<RedirectMap>) -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(redirects.into())),
        }
    }

    /// Replaces the whole table.
    pub fn reload(&self, redirects: impl Into<RedirectMap>) {
        let redirects = redirects.into();
        #[cfg(feature = "tracing")]
        tracing::info!("Reloading {} redirects", redirects.len());
        self.table.store(Arc::new(redirects));
    }

    /// Returns the number of redirects in the current table.
    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    /// Returns true if the current table has no redirects.
    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }

    /// Returns the redirect target for `path`, resolved against it.
    pub fn target(&self, path: &str) -> Option<String> {
        let table = self.table.load();
        table
            .get(path)
            .map(|target| path::resolve_reference(path, target))
    }
}

impl<K, V> FromIterator<(K, V)> for Redirects
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect::<RedirectMap>(),
        )
    }
}

impl Handler for Redirects {
    fn handle(&self, req: Request) -> impl Future<Output = Response> + Send {
        let res = match self.target(&path::decode(req.uri().path())) {
            Some(target) => moved_permanently(req.method(), &target),
            None => not_found(),
        };
        core::future::ready(res)
    }
}

/// Builds a `301` the way browsers expect it: the `Location` is ASCII-only,
/// both `GET` and `HEAD` are labelled as HTML, and only `GET` gets the link.
fn moved_permanently(method: &Method, target: &str) -> Response {
    let location = path::escape_non_ascii(target);
    let Ok(location) = HeaderValue::from_str(&location) else {
        #[cfg(feature = "tracing")]
        tracing::warn!("Redirect target {target:?} is not a valid header value");
        return crate::response::internal_error();
    };

    let body = if method == Method::GET {
        Bytes::from(format!(
            "<a href=\"{}\">Moved Permanently</a>.\n\n",
            html_escape(target)
        ))
    } else {
        Bytes::new()
    };

    let mut res = Response::new(body);
    *res.status_mut() = StatusCode::MOVED_PERMANENTLY;
    let headers = res.headers_mut();
    headers.insert(header::LOCATION, location);
    if method == Method::GET || method == Method::HEAD {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
    }
    res
}

fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
    }

    #[tokio::test]
    async fn redirects_mapped_paths_permanently() {
        let redirects = Redirects::from_iter([("/old", "/new")]);

        let res = redirects.handle(request(Method::GET, "/old")).await;
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()[header::LOCATION], "/new");
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(
            res.body().as_ref(),
            b"<a href=\"/new\">Moved Permanently</a>.\n\n"
        );
    }

    #[tokio::test]
    async fn unmapped_paths_are_not_found() {
        let redirects = Redirects::from_iter([("/old", "/new")]);

        let res = redirects.handle(request(Method::GET, "/missing")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().get(header::LOCATION).is_none());
        assert_eq!(res.body().as_ref(), b"404 page not found\n");

        // Lookups are exact: no prefix or trailing-slash matching.
        for path in ["/old/", "/old/x", "/OLD"] {
            let res = redirects.handle(request(Method::GET, path)).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn non_get_redirects_have_no_body() {
        let redirects = Redirects::from_iter([("/old", "/new")]);

        for method in [Method::HEAD, Method::POST, Method::DELETE] {
            let res = redirects.handle(request(method.clone(), "/old")).await;
            assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY, "{method}");
            assert_eq!(res.headers()[header::LOCATION], "/new");
            assert!(res.body().is_empty(), "{method}");

            let content_type = res.headers().get(header::CONTENT_TYPE);
            if method == Method::HEAD {
                assert_eq!(content_type.unwrap(), "text/html; charset=utf-8");
            } else {
                assert!(content_type.is_none(), "{method}");
            }
        }
    }

    #[tokio::test]
    async fn resolves_and_escapes_targets() {
        let redirects = Redirects::from_iter([
            ("/docs/old", "new?a=1&b=2"),
            ("/away", "https://example.com/<there>"),
            ("/caf\u{e9}", "/cafe"),
            ("/coffee", "/caf\u{e9}?q=cr\u{e8}me"),
        ]);

        let res = redirects.handle(request(Method::GET, "/docs/old")).await;
        assert_eq!(res.headers()[header::LOCATION], "/docs/new?a=1&b=2");
        assert_eq!(
            res.body().as_ref(),
            b"<a href=\"/docs/new?a=1&amp;b=2\">Moved Permanently</a>.\n\n"
        );

        let res = redirects.handle(request(Method::GET, "/away")).await;
        assert_eq!(res.headers()[header::LOCATION], "https://example.com/<there>");
        assert_eq!(
            res.body().as_ref(),
            b"<a href=\"https://example.com/&lt;there&gt;\">Moved Permanently</a>.\n\n"
        );

        let res = redirects.handle(request(Method::GET, "/caf%C3%A9")).await;
        assert_eq!(res.headers()[header::LOCATION], "/cafe");

        // The header is ASCII-only; the link keeps the original text.
        let res = redirects.handle(request(Method::GET, "/coffee")).await;
        assert_eq!(res.headers()[header::LOCATION], "/caf%C3%A9?q=cr%C3%A8me");
        assert_eq!(
            res.body().as_ref(),
            "<a href=\"/caf\u{e9}?q=cr\u{e8}me\">Moved Permanently</a>.\n\n".as_bytes()
        );
    }

    #[tokio::test]
    async fn reload_replaces_the_whole_table() {
        let redirects = Redirects::from_iter([("/old", "/new"), ("/gone", "/elsewhere")]);
        let shared = redirects.clone();
        assert_eq!(redirects.len(), 2);

        shared.reload(RedirectMap::from([("/fresh".to_string(), "/target".to_string())]));

        assert_eq!(redirects.len(), 1);
        assert!(!redirects.is_empty());
        let res = redirects.handle(request(Method::GET, "/old")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = redirects.handle(request(Method::GET, "/fresh")).await;
        assert_eq!(res.headers()[header::LOCATION], "/target");

        shared.reload(RedirectMap::new());
        assert!(redirects.is_empty());
    }
}
