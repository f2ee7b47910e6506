//! Percent-encoding primitives for beacon parameters and cookie segments.
//!
//! The legacy collector protocol distinguishes between values that are
//! escaped in place and values that arrive pre-escaped (the cookie and the
//! event payload), so every escape in this crate funnels through the helpers
//! here rather than calling the codec crate directly.

use std::borrow::Cow;

/// Percent-encode a string for use in a URL query component.
///
/// Reserved characters (space, `&`, `=`, `+`, `;`, `|`, parentheses) and all
/// non-ASCII bytes are escaped; unreserved characters pass through.
pub fn percent_encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Join pre-encoded `parts` with a percent-encoded `delimiter`.
///
/// The collector expects literal `%xx` separators between cookie segments,
/// not raw ones. The delimiter is encoded exactly once; the parts are
/// inserted verbatim and must already carry whatever escaping they need.
pub fn join_with_encoded_delimiter(parts: &[String], delimiter: &str) -> String {
    parts.join(percent_encode(delimiter).as_ref())
}
