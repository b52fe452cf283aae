//! Cache key types and derivation.
//!
//! This module provides:
//!
//! - [`CacheKey`] - The rendered cache key plus the request identity it came from
//! - [`KeyCodec`] - Derives canonical keys from request components
//!
//! ## Format
//!
//! Derived keys join five components with `|`:
//!
//! `{METHOD}|{path}|{query}|{body}|{headers}`
//!
//! Every component after the method is either the sentinel `~` (absent) or a
//! length-prefixed canonical text `{len}:{text}`. The length prefix means a
//! `|` inside a component can never be mistaken for a delimiter, and the
//! sentinel keeps "no body" apart from an empty object `{}`.
//!
//! ```
//! use cachet_core::KeyCodec;
//! use http::Method;
//! use serde_json::json;
//!
//! let key = KeyCodec::derive(&Method::GET, "/files", Some(&json!({"path": "/a"})), None, None);
//! assert_eq!(key.as_str(), r#"GET|6:/files|13:{"path":"/a"}|~|~"#);
//! assert_eq!(key.path(), Some("/files"));
//! ```
//!
//! ## Canonical form
//!
//! JSON objects are rendered with their keys sorted at every depth, so two
//! structurally equal values produce the same text regardless of insertion
//! order. Arrays keep their order. Header maps are rendered as an object keyed
//! by lower-cased header name; repeated headers become arrays.
//!
//! ## Performance
//!
//! [`CacheKey`] wraps its data in `Arc`, so cloning a key only bumps a
//! reference count.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use http::{HeaderMap, Method};
use serde_json::Value;
use smol_str::SmolStr;

/// Sentinel rendered for an absent component.
pub const ABSENT: &str = "~";

/// Delimiter between key components.
pub const DELIMITER: char = '|';

#[derive(Debug)]
struct CacheKeyInner {
    rendered: String,
    method: Option<SmolStr>,
    path: Option<SmolStr>,
}

/// A cache key identifying a cached entry.
///
/// Equality and hashing use the rendered key string only. The method and
/// path are kept alongside so stores can purge by path without parsing the
/// rendered form back.
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl CacheKey {
    /// Wraps a caller-supplied key verbatim.
    ///
    /// Explicit keys carry no method or path component.
    pub fn explicit(key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(CacheKeyInner {
                rendered: key.into(),
                method: None,
                path: None,
            }),
        }
    }

    fn derived(rendered: String, method: &str, path: &str) -> Self {
        Self {
            inner: Arc::new(CacheKeyInner {
                rendered,
                method: Some(SmolStr::new(method)),
                path: Some(SmolStr::new(path)),
            }),
        }
    }

    /// Returns the rendered key.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner.rendered
    }

    /// Returns the request method for derived keys.
    #[inline]
    pub fn method(&self) -> Option<&str> {
        self.inner.method.as_deref()
    }

    /// Returns the request path for derived keys.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.inner.path.as_deref()
    }

    /// Returns `true` if the key was supplied by the caller rather than derived.
    #[inline]
    pub fn is_explicit(&self) -> bool {
        self.inner.path.is_none()
    }

    /// Returns `true` if the path component contains `pattern`.
    ///
    /// Explicit keys have no path, so the whole rendered key is searched instead.
    pub fn path_contains(&self, pattern: &str) -> bool {
        match self.path() {
            Some(path) => path.contains(pattern),
            None => self.as_str().contains(pattern),
        }
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.rendered == other.inner.rendered
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.rendered.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.rendered)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey::explicit(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey::explicit(key)
    }
}

/// Derives canonical cache keys from request components.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCodec;

impl KeyCodec {
    /// Derives the key for a request.
    ///
    /// Pure and deterministic: structurally equal inputs produce equal keys
    /// whatever the order of their object fields.
    pub fn derive(
        method: &Method,
        path: &str,
        query: Option<&Value>,
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> CacheKey {
        let method = method.as_str().to_ascii_uppercase();
        let headers = headers.map(headers_value);

        let mut rendered = String::with_capacity(method.len() + path.len() + 16);
        rendered.push_str(&method);
        for component in [
            Some(path.to_owned()),
            query.map(canonical),
            body.map(canonical),
            headers.as_ref().map(canonical),
        ] {
            rendered.push(DELIMITER);
            push_component(&mut rendered, component.as_deref());
        }

        CacheKey::derived(rendered, &method, path)
    }
}

fn push_component(out: &mut String, component: Option<&str>) {
    match component {
        Some(text) => {
            out.push_str(&text.len().to_string());
            out.push(':');
            out.push_str(text);
        }
        None => out.push_str(ABSENT),
    }
}

/// Renders a JSON value with object keys sorted at every depth.
pub fn canonical(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn headers_value(headers: &HeaderMap) -> Value {
    let mut grouped: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
    for (name, value) in headers {
        grouped
            .entry(name.as_str())
            .or_default()
            .push(Value::String(
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            ));
    }

    Value::Object(
        grouped
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::Array(values)
                };
                (name.to_owned(), value)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    #[test]
    fn field_order_does_not_change_key() {
        let mut forward = Map::new();
        forward.insert("page".into(), json!(1));
        forward.insert("size".into(), json!(20));
        let mut reverse = Map::new();
        reverse.insert("size".into(), json!(20));
        reverse.insert("page".into(), json!(1));

        let a = KeyCodec::derive(&Method::GET, "/users", Some(&Value::Object(forward)), None, None);
        let b = KeyCodec::derive(&Method::GET, "/users", Some(&Value::Object(reverse)), None, None);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn nested_objects_are_sorted() {
        let value = json!({"b": {"y": 1, "x": [ {"k": 2, "a": 1} ]}, "a": null});
        assert_eq!(canonical(&value), r#"{"a":null,"b":{"x":[{"a":1,"k":2}],"y":1}}"#);
    }

    #[test]
    fn absent_body_differs_from_empty_object() {
        let absent = KeyCodec::derive(&Method::GET, "/a", None, None, None);
        let empty = KeyCodec::derive(&Method::GET, "/a", None, Some(&json!({})), None);
        assert_ne!(absent, empty);
        assert_eq!(absent.as_str(), "GET|2:/a|~|~|~");
        assert_eq!(empty.as_str(), "GET|2:/a|~|2:{}|~");
    }

    #[test]
    fn empty_query_and_empty_body_do_not_collide() {
        let query = KeyCodec::derive(&Method::GET, "/a", Some(&json!({})), None, None);
        let body = KeyCodec::derive(&Method::GET, "/a", None, Some(&json!({})), None);
        assert_ne!(query, body);
    }

    #[test]
    fn delimiter_inside_component_does_not_collide() {
        let a = KeyCodec::derive(&Method::GET, "/a|2:{}", None, None, None);
        let b = KeyCodec::derive(&Method::GET, "/a", Some(&json!({})), None, None);
        assert_ne!(a, b);
    }

    #[test]
    fn method_is_upper_cased() {
        let method = Method::from_bytes(b"get").unwrap();
        let key = KeyCodec::derive(&method, "/a", None, None, None);
        assert_eq!(key.method(), Some("GET"));
        assert!(key.as_str().starts_with("GET|"));
    }

    #[test]
    fn headers_are_grouped_by_name() {
        let mut first = HeaderMap::new();
        first.insert("x-tenant", HeaderValue::from_static("7"));
        first.append("accept", HeaderValue::from_static("a"));
        first.append("accept", HeaderValue::from_static("b"));

        let mut second = HeaderMap::new();
        second.append("accept", HeaderValue::from_static("a"));
        second.append("accept", HeaderValue::from_static("b"));
        second.insert("x-tenant", HeaderValue::from_static("7"));

        let a = KeyCodec::derive(&Method::GET, "/a", None, None, Some(&first));
        let b = KeyCodec::derive(&Method::GET, "/a", None, None, Some(&second));
        assert_eq!(a, b);
        assert!(a.as_str().ends_with(r#"{"accept":["a","b"],"x-tenant":"7"}"#));
    }

    #[test]
    fn explicit_key_matches_rendered_string() {
        let derived = KeyCodec::derive(&Method::GET, "/a", None, None, None);
        let explicit = CacheKey::explicit(derived.as_str());
        assert_eq!(derived, explicit);
        assert!(explicit.is_explicit());
        assert!(!derived.is_explicit());
    }

    #[test]
    fn path_contains_uses_path_component() {
        let key = KeyCodec::derive(
            &Method::GET,
            "/api/v1/couldfile/list",
            Some(&json!({"dir": "/api/v1/coulduser"})),
            None,
            None,
        );
        assert!(key.path_contains("/api/v1/couldfile"));
        assert!(!key.path_contains("/api/v1/coulduser"));

        let explicit = CacheKey::explicit("user-profile:/api/v1/coulduser");
        assert!(explicit.path_contains("/api/v1/coulduser"));
    }
}
