use crate::core::errors::ExchangeError;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// How a route is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Security {
    /// Market data and connectivity; no credentials involved
    None,
    /// API key header only (user data stream, historical trades)
    ApiKey,
    /// API key header plus timestamp and HMAC signature
    Signed,
}

impl Security {
    pub const fn requires_credentials(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Static description of a route: verb, path and authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub method: Method,
    pub path: &'a str,
    pub security: Security,
}

impl<'a> Endpoint<'a> {
    pub const fn new(method: Method, path: &'a str, security: Security) -> Self {
        Self {
            method,
            path,
            security,
        }
    }

    pub const fn public(method: Method, path: &'a str) -> Self {
        Self::new(method, path, Security::None)
    }

    pub const fn keyed(method: Method, path: &'a str) -> Self {
        Self::new(method, path, Security::ApiKey)
    }

    pub const fn signed(method: Method, path: &'a str) -> Self {
        Self::new(method, path, Security::Signed)
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Flat request parameter bag.
///
/// Keys are unique and keep their insertion order, which is also the order
/// of the canonical query string. Signing the same bag twice therefore
/// yields the same signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a serializable struct into a parameter bag.
    ///
    /// `null` fields are skipped, scalars are stringified, and nested arrays
    /// or objects are rejected. Field order follows the struct declaration.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ExchangeError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Self::from_json_map(map),
            Value::Null => Ok(Self::new()),
            other => Err(ExchangeError::InvalidParameters(format!(
                "expected a flat object of parameters, got {}",
                other
            ))),
        }
    }

    fn from_json_map(map: Map<String, Value>) -> Result<Self, ExchangeError> {
        let mut params = Self::new();
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::String(s) => params.insert(key, s),
                Value::Bool(b) => params.insert(key, b),
                Value::Number(n) => params.insert(key, n),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ExchangeError::InvalidParameters(format!(
                        "nested value for parameter '{}' is not supported",
                        key
                    )));
                }
            }
        }
        Ok(params)
    }

    /// Insert a parameter, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert a parameter only when a value is present
    pub fn insert_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical `application/x-www-form-urlencoded` rendering
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.entries.iter())
            .finish()
    }

    /// Render as a JSON object of string values, used for batch fields
    pub fn to_json_object(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct OrderLike {
        symbol: String,
        side: String,
        quantity: u32,
        reduce_only: Option<bool>,
        new_client_order_id: Option<String>,
    }

    #[test]
    fn test_struct_fields_keep_declaration_order() {
        let params = Params::from_serialize(&OrderLike {
            symbol: "BTCUSD_PERP".to_string(),
            side: "BUY".to_string(),
            quantity: 340,
            reduce_only: Some(true),
            new_client_order_id: None,
        })
        .unwrap();

        assert_eq!(
            params.to_query_string(),
            "symbol=BTCUSD_PERP&side=BUY&quantity=340&reduceOnly=true"
        );
        assert!(!params.contains_key("newClientOrderId"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut params = Params::new().with("a", 1).with("b", 2);
        params.insert("a", 3);
        assert_eq!(params.to_query_string(), "a=3&b=2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_nested_values_are_rejected() {
        #[derive(Serialize)]
        struct Nested {
            symbol: &'static str,
            inner: Vec<u32>,
        }

        let result = Params::from_serialize(&Nested {
            symbol: "BTCUSDT",
            inner: vec![1, 2],
        });
        assert!(matches!(result, Err(ExchangeError::InvalidParameters(_))));
    }

    #[test]
    fn test_query_string_is_percent_encoded() {
        let params = Params::new().with("batchOrders", r#"[{"symbol":"BTCUSDT"}]"#);
        assert_eq!(
            params.to_query_string(),
            "batchOrders=%5B%7B%22symbol%22%3A%22BTCUSDT%22%7D%5D"
        );
    }

    #[test]
    fn test_optional_insert_skips_none() {
        let params = Params::new()
            .with_opt("limit", Some(5))
            .with_opt::<u32>("fromId", None);
        assert_eq!(params.to_query_string(), "limit=5");
    }

    #[test]
    fn test_json_object_rendering() {
        let params = Params::new().with("symbol", "BTCUSDT").with("quantity", 1);
        assert_eq!(
            params.to_json_object().to_string(),
            r#"{"symbol":"BTCUSDT","quantity":"1"}"#
        );
    }
}
