//! Request-scoped interceptor chains for an async HTTP client.
//!
//! Register interceptors on a [`ClientConfig`]; every request sent through it
//! walks them in registration order. Each interceptor can continue the chain
//! ([`ClientConfig::next`]), stop it ([`ClientConfig::abort`]), or answer the
//! request on its own. When the chain is used up the request falls through to
//! the [`Transport`].
//!
//! # Example
//!
//! ```ignore
//! use tether::prelude::*;
//!
//! let root = ClientConfig::new(HyperTransport::new());
//!
//! let client = root
//!     .use_interceptor(|client: ClientConfig, mut request: Request| async move {
//!         request.headers_mut().insert("Authorization".into(), "Bearer secret".into());
//!         client.next(request).await
//!     })
//!     .use_interceptor(|client: ClientConfig, request: Request| async move {
//!         if request.url().path().starts_with("/admin") {
//!             return client.abort(&request);
//!         }
//!         client.next(request).await
//!     });
//!
//! let url = Url::parse("https://api.example.com/users")?;
//! let response = client.send(Request::builder(Method::GET, url).build()).await?;
//! ```
//!
//! Each request gets its own chain state, stored in the request's extensions,
//! so one configuration can serve any number of concurrent requests.

mod chain;
mod client;
mod config;
mod interceptor;
pub mod prelude;
mod transport;

pub use chain::{ChainEnd, ChainHandle, ChainStatus};
pub use client::ClientConfig;
pub use config::{TransportConfig, TransportConfigBuilder};
pub use interceptor::{BoxFuture, ChainFuture, Interceptor, SharedInterceptor};
pub use transport::HyperTransport;

// Re-export core types
pub use tether_core::{
    Error, Extensions, JSON_CONTENT_TYPE, Method, Request, RequestBuilder, Response, Result,
    StatusCode, Transport, from_json, header, to_json,
};

pub use url;
