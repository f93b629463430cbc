//! Error types for tether.
//!
//! [`Error`] is `Clone`: once an interceptor chain freezes its result, the same
//! error may be handed back to every later caller of the chain.

use std::sync::Arc;

use derive_more::{Display, Error, From};

/// Main error type for tether operations.
#[derive(Debug, Clone, Display, Error, From)]
pub enum Error {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from(skip)]
    JsonSerialization(Arc<serde_json::Error>),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Error raised by an interceptor's own logic.
    #[display("interceptor error: {_0}")]
    #[from(skip)]
    Interceptor(Arc<dyn std::error::Error + Send + Sync>),

    /// The chain was stopped on purpose before reaching the transport.
    #[display("http request abort")]
    #[from(skip)]
    Aborted,

    /// Abort was requested for a request that carries no chain.
    #[display("abort invoked outside of any chain")]
    #[from(skip)]
    AbortOutsideChain,

    /// The chain ran off its end without any interceptor producing a result.
    #[display("interceptor chain exhausted without a result")]
    #[from(skip)]
    ChainExhausted,
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonSerialization(Arc::new(err))
    }
}

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error produced inside an interceptor.
    #[must_use]
    pub fn interceptor(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Interceptor(Arc::new(err))
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the chain was aborted on purpose.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns `true` for misuse of the chain protocol by calling code.
    ///
    /// These point at a bug in interceptor wiring and are never worth retrying.
    #[must_use]
    pub const fn is_chain_misuse(&self) -> bool {
        matches!(self, Self::AbortOutsideChain | Self::ChainExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Display, Error)]
    #[display("token expired")]
    struct TokenExpired;

    #[test]
    fn error_display() {
        let err = Error::connection("reset by peer");
        assert_eq!(err.to_string(), "connection error: reset by peer");

        let err = Error::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        assert_eq!(Error::Aborted.to_string(), "http request abort");
        assert_eq!(
            Error::AbortOutsideChain.to_string(),
            "abort invoked outside of any chain"
        );

        let err = Error::interceptor(TokenExpired);
        assert_eq!(err.to_string(), "interceptor error: token expired");
    }

    #[test]
    fn transport_error_predicates() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::Timeout.is_connection());
        assert!(Error::connection("refused").is_connection());
        assert!(!Error::tls("bad certificate").is_connection());
    }

    #[test]
    fn chain_error_predicates() {
        assert!(Error::Aborted.is_aborted());
        assert!(!Error::Aborted.is_chain_misuse());
        assert!(Error::AbortOutsideChain.is_chain_misuse());
        assert!(Error::ChainExhausted.is_chain_misuse());
        assert!(!Error::connection("reset").is_chain_misuse());
    }

    #[test]
    fn cloned_error_keeps_message() {
        let err = Error::from(serde_json::from_str::<u32>("x").expect_err("invalid json"));
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
        assert!(std::error::Error::source(&cloned).is_some());
    }
}
