//! Interceptor functions.
//!
//! An interceptor receives the [`ClientConfig`] it was registered on and the
//! request, and resolves to the request's result. Inside, it does exactly one
//! of:
//!
//! - continue: [`ClientConfig::next`] runs the next interceptor, or the
//!   transport once the chain is used up;
//! - stop: [`ClientConfig::abort`] freezes the chain with an abort error;
//! - answer the request itself, e.g. by calling
//!   [`ClientConfig::transport_call`] directly or returning a canned response.
//!
//! Any `Fn(ClientConfig, Request<Bytes>) -> impl Future` closure is an
//! interceptor.
//!
//! # Example
//!
//! ```ignore
//! use tether::{ClientConfig, Request};
//!
//! let client = root.use_interceptor(|client: ClientConfig, mut request: Request| async move {
//!     request.headers_mut().insert("X-Request-Source".into(), "tether".into());
//!     client.next(request).await
//! });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use crate::{ClientConfig, Request, Response, Result};

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Future returned by interceptors and by the chain runner.
pub type ChainFuture = BoxFuture<'static, Result<Response<Bytes>>>;

/// A registered interceptor, shared between configurations and chains.
pub type SharedInterceptor = Arc<dyn Interceptor>;

/// A function invoked in order around every request sent through a
/// [`ClientConfig`].
pub trait Interceptor: Send + Sync + 'static {
    /// Handle `request` on behalf of `client`.
    fn intercept(&self, client: ClientConfig, request: Request<Bytes>) -> ChainFuture;
}

impl<F, Fut> Interceptor for F
where
    F: Fn(ClientConfig, Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
{
    fn intercept(&self, client: ClientConfig, request: Request<Bytes>) -> ChainFuture {
        Box::pin(self(client, request))
    }
}
