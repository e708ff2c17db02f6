//! The per-call context record.
//!
//! A [`Context`] is the single mutable object that flows through a dispatch
//! chain. It carries the remaining path to match (`uri`), the prefix already
//! consumed by enclosing mounts (`base_uri`), accumulated path parameters and
//! the transport payload. Routers mutate and restore the same instance as the
//! call descends into mounted sub-routers; a context must never be shared
//! between two concurrent top-level calls.
//!
//! The serde representation uses the camelCase wire names transports expect
//! (`originalUri`, `baseUri`, `type`), so a context can be serialized as-is
//! onto a JSON transport.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Path and free-form parameters, keyed by name.
pub type Params = serde_json::Map<String, Value>;

/// Request verb filter.
///
/// Routes registered without a verb match any verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Remove.
    Delete,
}

impl Verb {
    /// The lowercase wire name of this verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown verb name.
#[derive(Debug, Clone, Error)]
#[error("unknown verb: {0}")]
pub struct ParseVerbError(pub String);

impl FromStr for Verb {
    type Err = ParseVerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Verb::Get),
            "post" => Ok(Verb::Post),
            "put" => Ok(Verb::Put),
            "delete" => Ok(Verb::Delete),
            other => Err(ParseVerbError(other.to_string())),
        }
    }
}

/// The mutable per-call record carrying URI, parameters and payload through
/// the dispatch chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// The remaining path to match against the current router level.
    pub uri: String,

    /// The full path as first submitted. Set once on first dispatch entry,
    /// restored into `uri` after each route attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_uri: Option<String>,

    /// The path prefix already consumed by enclosing mounts.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_uri: String,

    /// Named path parameters, merged level by level; matched values win.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,

    /// Request verb. Verb-filtered routes require equality; routes without
    /// a verb filter accept any value here.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub verb: Option<Verb>,

    /// Transport payload, opaque to the router.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Transport headers, opaque to the router.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Request timeout in milliseconds; `None` means no timeout. Enforced by
    /// transports, never by the router.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Free-form transport-specific fields.
    #[serde(flatten)]
    pub extra: Params,
}

impl Context {
    /// Create a context for the given URI with no verb.
    pub fn new(uri: impl Into<String>) -> Self {
        Context {
            uri: uri.into(),
            ..Context::default()
        }
    }

    /// Shorthand for a GET context.
    pub fn get(uri: impl Into<String>) -> Self {
        Context::new(uri).verb(Verb::Get)
    }

    /// Shorthand for a POST context.
    pub fn post(uri: impl Into<String>) -> Self {
        Context::new(uri).verb(Verb::Post)
    }

    /// Shorthand for a PUT context.
    pub fn put(uri: impl Into<String>) -> Self {
        Context::new(uri).verb(Verb::Put)
    }

    /// Shorthand for a DELETE context.
    pub fn delete(uri: impl Into<String>) -> Self {
        Context::new(uri).verb(Verb::Delete)
    }

    /// Set the verb.
    pub fn verb(mut self, verb: Verb) -> Self {
        self.verb = Some(verb);
        self
    }

    /// Set the payload.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Insert a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the timeout in milliseconds.
    pub fn timeout(mut self, millis: u64) -> Self {
        self.timeout = Some(millis);
        self
    }

    /// Insert a parameter.
    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verb_round_trip() {
        for v in [Verb::Get, Verb::Post, Verb::Put, Verb::Delete] {
            assert_eq!(v.as_str().parse::<Verb>().unwrap(), v);
        }
        assert_eq!("GET".parse::<Verb>().unwrap(), Verb::Get);
        assert!("patch".parse::<Verb>().is_err());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let ctx = Context::get("/users/5")
            .data(json!({"name": "ada"}))
            .timeout(500);
        let wire = serde_json::to_value(&ctx).unwrap();
        assert_eq!(wire["uri"], "/users/5");
        assert_eq!(wire["type"], "get");
        assert_eq!(wire["timeout"], 500);
        assert!(wire.get("baseUri").is_none());
        assert!(wire.get("originalUri").is_none());
    }

    #[test]
    fn extra_fields_survive_round_trip() {
        let wire = json!({"uri": "/a", "type": "post", "trace": "abc123"});
        let ctx: Context = serde_json::from_value(wire).unwrap();
        assert_eq!(ctx.verb, Some(Verb::Post));
        assert_eq!(ctx.extra["trace"], "abc123");
    }
}
