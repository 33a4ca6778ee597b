use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures of the real-time broker gateway.
///
/// Cloneable so that a single connection attempt or teardown can hand the
/// same failure to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The transport failed to open, errored, or was closed underneath a caller.
    #[error("connection error: {0}")]
    Connection(String),

    /// A request was issued while no connection was open.
    #[error("not connected to the broker")]
    NotConnected,

    /// No correlated response arrived in time.
    #[error("request {req_id} timed out after {after_ms}ms")]
    Timeout { req_id: u64, after_ms: u64 },

    /// The broker answered with an error envelope.
    #[error("broker error: {message}")]
    Broker {
        code: Option<String>,
        message: String,
    },

    /// An inbound frame could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The broker answered with a payload of the wrong kind.
    #[error("unexpected response: expected {expected}, got {got}")]
    UnexpectedResponse {
        expected: &'static str,
        got: String,
    },

    /// A request was rejected locally before it reached the wire.
    #[error("invalid request field {field}: {reason}")]
    InvalidRequest { field: &'static str, reason: String },
}

impl GatewayError {
    /// Server-provided message for broker errors.
    #[must_use]
    pub fn broker_message(&self) -> Option<&str> {
        match self {
            Self::Broker { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True when the failure is worth retrying by the caller.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::NotConnected | Self::Timeout { .. }
        )
    }
}

/// Errors from the persistence/auth backend collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("user already registered: {0}")]
    UserExists(String),

    #[error("no active session")]
    NoSession,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Session-level errors raised by the account facade's caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("not authorized with the broker")]
    NotAuthorized,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
