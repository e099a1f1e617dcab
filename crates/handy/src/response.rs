//! Canned responses shared by the handlers.

use crate::Response;
use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// A plain-text `404 Not Found` response.
///
/// Every handler that cannot map a request (an unknown redirect path, an
/// unsupported status code) answers with this exact response.
pub fn not_found() -> Response {
    plain(StatusCode::NOT_FOUND, "404 page not found\n")
}

/// A plain-text `500 Internal Server Error` response.
pub fn internal_error() -> Response {
    plain(
        StatusCode::INTERNAL_SERVER_ERROR,
        "500 internal server error\n",
    )
}

fn plain(status: StatusCode, body: &'static str) -> Response {
    let mut res = Response::new(Bytes::from_static(body.as_bytes()));
    *res.status_mut() = status;
    let headers = res.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_matches_plain_text_contract() {
        let res = not_found();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[header::CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(res.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(res.body().as_ref(), b"404 page not found\n");
    }

    #[test]
    fn internal_error_is_500() {
        let res = internal_error();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body().as_ref(), b"500 internal server error\n");
    }
}
