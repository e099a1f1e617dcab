//! Lexical helpers for URL paths.

use percent_encoding::{CONTROLS, percent_decode_str, utf8_percent_encode};
use std::borrow::Cow;

/// Percent-decodes a raw URL path, replacing invalid UTF-8 sequences.
pub(crate) fn decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

/// Percent-encodes every non-ASCII byte (and ASCII control) of `reference`,
/// leaving existing escapes and reserved characters alone.
pub(crate) fn escape_non_ascii(reference: &str) -> Cow<'_, str> {
    utf8_percent_encode(reference, CONTROLS).into()
}

/// Returns the shortest rooted path equivalent to `path`.
///
/// Empty and `.` segments are dropped and `..` removes the segment before it.
/// `..` at the root stays at the root. The result always starts with `/` and
/// never ends with one, unless it is the root itself.
pub(crate) fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() {
        cleaned.push('/');
    }
    cleaned
}

/// Returns true if `reference` names a scheme (`https:`) or a host (`//host`).
pub(crate) fn is_absolute_reference(reference: &str) -> bool {
    if reference.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolves a redirect target against the path of the request being
/// redirected.
///
/// Absolute references are returned untouched. Anything else is made rooted
/// (relative targets are taken relative to the request's directory) and
/// cleaned, keeping a trailing slash and any query string.
pub(crate) fn resolve_reference(request_path: &str, reference: &str) -> String {
    if is_absolute_reference(reference) {
        return reference.to_string();
    }

    let (target, query) = match reference.find('?') {
        Some(i) => reference.split_at(i),
        None => (reference, ""),
    };

    let rooted = if target.starts_with('/') {
        Cow::Borrowed(target)
    } else {
        let dir = match request_path.rfind('/') {
            Some(i) => &request_path[..=i],
            None => "/",
        };
        Cow::Owned(format!("{dir}{target}"))
    };

    let mut resolved = clean(&rooted);
    if rooted.ends_with('/') && !resolved.ends_with('/') {
        resolved.push('/');
    }
    resolved.push_str(query);
    resolved
}
