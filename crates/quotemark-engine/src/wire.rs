//! Query-string encoding of span sets.
//!
//! A span set travels as one query parameter whose value is a list of
//! `A-B` address pairs joined with `+` (carried percent-encoded as `%2B`
//! so it survives the `+`-means-space convention).

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters that must not appear raw in a query component. `+` is
/// included so the pair separator is unambiguous after decoding.
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'=')
    .add(b'%');

/// Value of the first occurrence of `name` in a query string. Accepts the
/// string with or without a leading `?` (or `#`, for fragment-carried
/// parameters). Later duplicates are ignored.
pub fn param_value(query: &str, name: &str) -> Option<String> {
    let query = query.strip_prefix(['?', '#']).unwrap_or(query);
    for entry in query.split('&') {
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
        let key = percent_decode_str(key).decode_utf8_lossy();
        if key == name {
            return Some(percent_decode_str(value).decode_utf8_lossy().into_owned());
        }
    }
    None
}

/// Split a parameter value into its raw pair strings.
pub fn split_pairs(value: &str) -> Vec<String> {
    value
        .split('+')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join serialized pairs into a `name=value` query entry.
pub fn encode_param(name: &str, pairs: &[String]) -> String {
    let value = pairs.join("+");
    format!(
        "{}={}",
        utf8_percent_encode(name, QUERY),
        utf8_percent_encode(&value, QUERY)
    )
}
