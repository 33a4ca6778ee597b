//! Deriv gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, Result};

/// Connection settings for the Deriv real-time API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DerivConfig {
    /// WebSocket endpoint without query parameters.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Registered application id, sent as the `app_id` query parameter.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Language code sent as the `l` query parameter.
    #[serde(default)]
    pub language: Option<String>,
    /// Time to wait for a correlated response.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Time to wait for the socket to open.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_ws_url() -> String {
    "wss://ws.derivws.com/websockets/v3".into()
}

fn default_app_id() -> String {
    "1089".into()
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for DerivConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            app_id: default_app_id(),
            language: None,
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl DerivConfig {
    /// Full endpoint URL including `app_id` and optional `l`.
    ///
    /// # Errors
    ///
    /// Returns an error if `ws_url` is not a valid URL.
    pub fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&self.ws_url)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("app_id", &self.app_id);
            if let Some(language) = &self.language {
                query.append_pair("l", language);
            }
        }
        Ok(url)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Check the settings for values the gateway cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        match Url::parse(&self.ws_url) {
            Ok(url) if matches!(url.scheme(), "ws" | "wss") => {}
            Ok(url) => {
                return Err(ConfigError::InvalidValue {
                    field: "deriv.ws_url",
                    reason: format!("scheme must be ws or wss, got {}", url.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    field: "deriv.ws_url",
                    reason: e.to_string(),
                });
            }
        }
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "deriv.app_id",
                reason: "cannot be empty".into(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "deriv.request_timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "deriv.connect_timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_carries_app_id() {
        let config = DerivConfig::default();
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "wss://ws.derivws.com/websockets/v3?app_id=1089"
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn language_is_appended() {
        let config = DerivConfig {
            language: Some("EN".into()),
            ..DerivConfig::default()
        };
        assert_eq!(
            config.endpoint().unwrap().query(),
            Some("app_id=1089&l=EN")
        );
    }

    #[test]
    fn http_scheme_is_rejected() {
        let config = DerivConfig {
            ws_url: "https://ws.derivws.com/websockets/v3".into(),
            ..DerivConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "deriv.ws_url",
                ..
            })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = DerivConfig {
            request_timeout_ms: 0,
            ..DerivConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: DerivConfig = toml::from_str(r#"app_id = "4242""#).unwrap();
        assert_eq!(config.app_id, "4242");
        assert_eq!(config.ws_url, "wss://ws.derivws.com/websockets/v3");
        assert_eq!(config.connect_timeout_ms, 10_000);
    }
}
