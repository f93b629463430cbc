//! Transports: the type-erased handle used by [`crate::ClientConfig`] and a
//! hyper-util based implementation.

use std::collections::HashMap;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tracing::{Instrument, debug, debug_span, warn};

use crate::config::TransportConfig;
use crate::interceptor::BoxFuture;
use crate::{Error, Request, Response, Result, Transport};

// ============================================================================
// Type-Erased Transport
// ============================================================================

/// Object-safe face of [`Transport`], so a configuration can hold any
/// transport behind an `Arc`.
pub(crate) trait ErasedTransport: Send + Sync {
    fn call(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>>>;
}

impl<T: Transport> ErasedTransport for T {
    fn call(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<Response<Bytes>>> {
        Box::pin(self.execute(request))
    }
}

// ============================================================================
// Hyper Transport
// ============================================================================

/// Transport over hyper-util with connection pooling and rustls TLS.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use tether::{ClientConfig, HyperTransport, TransportConfig};
///
/// let transport = HyperTransport::with_config(
///     TransportConfig::builder().timeout(Duration::from_secs(5)).build(),
/// );
/// let root = ClientConfig::new(transport);
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with a custom configuration.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(&config));

        Self { inner, config }
    }

    /// The transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn build_hyper_request(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body, extensions) = request.into_parts();

        let mut builder = http::Request::builder().method(method).uri(url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = body.map_or_else(Full::default, Full::new);
        let mut http_request = builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))?;
        *http_request.extensions_mut() = extensions;

        Ok(http_request)
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn exchange(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let hyper_request = Self::build_hyper_request(request)?;

        let response = self
            .inner
            .request(hyper_request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status();
        let headers = Self::extract_headers(response.headers());
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(status, headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let span = debug_span!("transport", method = %request.method(), url = %request.url());

        async move {
            let start = Instant::now();
            debug!("sending request");

            let result = tokio::time::timeout(self.config.timeout, self.exchange(request))
                .await
                .map_err(|_| Error::Timeout)
                .and_then(|result| result);

            // Saturating conversion to u64
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            match &result {
                Ok(response) => debug!(status = response.status().as_u16(), elapsed_ms, "response received"),
                Err(err) => warn!(error = %err, elapsed_ms, "transport failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// HTTPS connector using rustls with the Mozilla root certificates.
///
/// Plain `http://` URLs are accepted too.
fn https_connector(config: &TransportConfig) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    #[test]
    fn hyper_request_keeps_parts() {
        let url = url::Url::parse("http://localhost:8080/items?page=1").expect("url");
        let request = Request::builder(Method::PUT, url)
            .header("X-Token", "abc")
            .body(Bytes::from_static(b"{}"))
            .build();

        let http_request = HyperTransport::build_hyper_request(request).expect("valid request");

        assert_eq!(http_request.method(), http::Method::PUT);
        assert_eq!(http_request.uri(), "http://localhost:8080/items?page=1");
        assert_eq!(
            http_request.headers().get("X-Token").map(http::HeaderValue::as_bytes),
            Some(b"abc".as_slice())
        );
    }

    #[test]
    fn invalid_header_is_rejected() {
        let url = url::Url::parse("http://localhost/").expect("url");
        let request = Request::builder(Method::GET, url)
            .header("bad header", "x")
            .build();

        let err = HyperTransport::build_hyper_request(request).expect_err("invalid header name");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn transport_is_debug() {
        let transport = HyperTransport::new();
        let debug = format!("{transport:?}");
        assert!(debug.contains("HyperTransport"));
    }
}
