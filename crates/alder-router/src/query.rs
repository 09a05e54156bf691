//! Query-string parsing and serialization.
//!
//! Parsing never fails: malformed escapes are kept verbatim. Query handling
//! is independent of route matching, so a path that matches no route still
//! yields its parsed query.

use std::collections::HashMap;

/// Parsed query parameters.
pub type Query = HashMap<String, String>;

/// Splits a path into its pathname and raw query-string components.
#[must_use]
pub fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((pathname, query)) => (pathname, Some(query)),
        None => (path, None),
    }
}

/// Parses a raw query string into a key/value map.
#[must_use]
pub fn parse(query: &str) -> Query {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            Some((decode(key), decode(value)))
        })
        .collect()
}

/// Serializes query parameters, sorted by key for a stable output.
///
/// Returns an empty string for an empty map, otherwise `a=1&b=2`.
#[must_use]
pub fn serialize(query: &Query) -> String {
    let mut pairs: Vec<_> = query.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Simple URL decoding (`%XX` escapes and `+` as space).
///
/// Escapes are decoded into a byte buffer first so multi-byte UTF-8
/// sequences survive; invalid sequences are replaced, not rejected.
fn decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    bytes.push(byte);
                    continue;
                }
            }
            bytes.push(b'%');
            bytes.extend_from_slice(hex.as_bytes());
        } else if c == '+' {
            bytes.push(b' ');
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Percent-encodes characters that are not safe inside a query component.
fn encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            b' ' => result.push_str("%20"),
            _ => result.push_str(&format!("%{byte:02X}")),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/a/b?x=1"), ("/a/b", Some("x=1")));
        assert_eq!(split_path("/a/b"), ("/a/b", None));
    }

    #[test]
    fn test_parse() {
        let query = parse("name=John+Doe&age=30&city=New%20York");
        assert_eq!(query.get("name").map(String::as_str), Some("John Doe"));
        assert_eq!(query.get("age").map(String::as_str), Some("30"));
        assert_eq!(query.get("city").map(String::as_str), Some("New York"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_multibyte_escapes() {
        let query = parse("q=%E4%B8%AD%E6%96%87");
        assert_eq!(query.get("q").map(String::as_str), Some("中文"));
        // non-ASCII values survive an encode/decode cycle
        assert_eq!(parse(&serialize(&query)), query);
    }

    #[test]
    fn test_serialize() {
        let query: Query = [("b", "2"), ("a", "1 2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(serialize(&query), "a=1%202&b=2");
        assert_eq!(serialize(&Query::new()), "");
    }

    #[test]
    fn test_round_trip() {
        let query: Query = [("withReplies", "true")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(parse(&serialize(&query)), query);
    }
}
