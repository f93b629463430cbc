//! The transport contract.
//!
//! A [`Transport`] performs the literal network exchange for a fully prepared
//! request. The interceptor chain treats it as opaque: it hands the request
//! over unchanged and returns whatever comes back.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Performs the real request/response exchange.
///
/// Implementations should be async-first and support connection pooling.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use tether_core::{Request, Response, Result, StatusCode, Transport};
///
/// struct AlwaysOk;
///
/// impl Transport for AlwaysOk {
///     async fn execute(&self, _request: Request<Bytes>) -> Result<Response<Bytes>> {
///         Ok(Response::empty(StatusCode::OK))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
