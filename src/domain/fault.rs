//! Broker error envelope payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `error` object the broker attaches to a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerFault {
    /// Machine-readable code, e.g. `InvalidToken`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    "unknown broker error".to_string()
}

impl BrokerFault {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Decode an `error` value leniently.
    ///
    /// A bare string becomes the message; any other shape that does not
    /// match the object form keeps its JSON text as the message.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        if let Some(text) = value.as_str() {
            return Self::new(None, text);
        }
        Self::deserialize(value).unwrap_or_else(|_| Self::new(None, value.to_string()))
    }
}
