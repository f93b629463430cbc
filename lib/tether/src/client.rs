//! Client configuration and the chain runner.
//!
//! A [`ClientConfig`] pairs an ordered list of interceptors with the
//! transport that performs the real network call. Configurations come in two
//! flavours:
//!
//! - a *root*, created by [`ClientConfig::new`] or [`ClientConfig::freeze`],
//!   is never mutated; it can be shared freely between call sites;
//! - a *derived* configuration, returned by [`ClientConfig::use_interceptors`]
//!   on a root, owns a sequence that further `use_*` calls extend in place.
//!
//! # Example
//!
//! ```ignore
//! use tether::{ClientConfig, HyperTransport, Request};
//!
//! let root = ClientConfig::new(HyperTransport::new());
//!
//! // `root` is untouched, `client` is a derived branch.
//! let client = root.use_interceptor(|client: ClientConfig, request: Request| async move {
//!     tracing::info!(url = %request.url(), "sending");
//!     client.next(request).await
//! });
//!
//! let response = client.send(request).await?;
//! ```

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use bytes::Bytes;
use tower_service::Service;
use tracing::{debug, warn};

use crate::chain::{ChainEnd, ChainHandle};
use crate::interceptor::{ChainFuture, Interceptor, SharedInterceptor};
use crate::transport::ErasedTransport;
use crate::{Error, Request, Response, Result, Transport};

/// Where a configuration's interceptors live.
#[derive(Clone)]
enum Lineage {
    Root(Arc<[SharedInterceptor]>),
    Derived(Arc<RwLock<Vec<SharedInterceptor>>>),
}

/// Interceptor sequence plus transport, with copy-on-write registration.
///
/// Cloning a `ClientConfig` is cheap and yields a handle to the same
/// configuration: clones of a derived configuration observe each other's
/// registrations.
#[derive(Clone)]
pub struct ClientConfig {
    lineage: Lineage,
    transport: Arc<dyn ErasedTransport>,
    chain_end: ChainEnd,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("root", &self.is_root())
            .field("interceptors", &self.len())
            .field("chain_end", &self.chain_end)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Create a root configuration with no interceptors.
    #[must_use]
    pub fn new<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            lineage: Lineage::Root(Arc::from(Vec::new())),
            transport: Arc::new(transport),
            chain_end: ChainEnd::default(),
        }
    }

    /// Set what happens when a chain moves past its last interceptor.
    #[must_use]
    pub fn with_chain_end(mut self, chain_end: ChainEnd) -> Self {
        self.chain_end = chain_end;
        self
    }

    /// The configured end-of-chain policy.
    #[must_use]
    pub const fn chain_end(&self) -> ChainEnd {
        self.chain_end
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Append interceptors, in order.
    ///
    /// On a root this returns a new derived configuration holding the root's
    /// interceptors followed by `interceptors`; the root itself is unchanged.
    /// On a derived configuration the interceptors are appended in place and
    /// a handle to the same configuration is returned.
    #[must_use]
    pub fn use_interceptors<I>(&self, interceptors: I) -> Self
    where
        I: IntoIterator<Item = SharedInterceptor>,
    {
        match &self.lineage {
            Lineage::Root(sequence) => {
                let mut forked = sequence.to_vec();
                forked.extend(interceptors);
                self.derive(forked)
            }
            Lineage::Derived(sequence) => {
                // Drain the iterator before locking: it may read this configuration.
                let interceptors: Vec<_> = interceptors.into_iter().collect();
                sequence
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend(interceptors);
                self.clone()
            }
        }
    }

    /// Append a single interceptor. See [`ClientConfig::use_interceptors`].
    #[must_use]
    pub fn use_interceptor(&self, interceptor: impl Interceptor) -> Self {
        self.use_interceptors([Arc::new(interceptor) as SharedInterceptor])
    }

    /// An independent derived copy with its own interceptor sequence.
    ///
    /// Unlike `use_interceptors`, this always forks, even from a derived
    /// configuration.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.derive(self.snapshot().to_vec())
    }

    /// A root holding the current interceptors, safe to hand out for reuse.
    #[must_use]
    pub fn freeze(&self) -> Self {
        Self {
            lineage: Lineage::Root(self.snapshot()),
            transport: Arc::clone(&self.transport),
            chain_end: self.chain_end,
        }
    }

    fn derive(&self, interceptors: Vec<SharedInterceptor>) -> Self {
        Self {
            lineage: Lineage::Derived(Arc::new(RwLock::new(interceptors))),
            transport: Arc::clone(&self.transport),
            chain_end: self.chain_end,
        }
    }

    /// Returns `true` for a root configuration.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self.lineage, Lineage::Root(_))
    }

    /// Returns `true` for a derived configuration.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        !self.is_root()
    }

    /// Number of registered interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.lineage {
            Lineage::Root(sequence) => sequence.len(),
            Lineage::Derived(sequence) => sequence
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }

    /// Returns `true` when no interceptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when both handles refer to the same interceptor
    /// sequence, i.e. a registration on one is visible on the other.
    #[must_use]
    pub fn shares_interceptors_with(&self, other: &Self) -> bool {
        match (&self.lineage, &other.lineage) {
            (Lineage::Root(a), Lineage::Root(b)) => Arc::ptr_eq(a, b),
            (Lineage::Derived(a), Lineage::Derived(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Immutable view of the interceptors, taken when a request starts.
    fn snapshot(&self) -> Arc<[SharedInterceptor]> {
        match &self.lineage {
            Lineage::Root(sequence) => Arc::clone(sequence),
            Lineage::Derived(sequence) => Arc::from(
                sequence
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .as_slice(),
            ),
        }
    }

    // ========================================================================
    // Chain runner
    // ========================================================================

    /// Send a request through the interceptor chain.
    ///
    /// Without interceptors the request goes straight to the transport.
    /// Otherwise a fresh chain replaces whatever chain the request carried,
    /// and the first interceptor runs.
    pub async fn send(&self, mut request: Request<Bytes>) -> Result<Response<Bytes>> {
        let interceptors = self.snapshot();
        if interceptors.is_empty() {
            return self.transport_call(request).await;
        }

        debug!(
            interceptors = interceptors.len(),
            method = %request.method(),
            url = %request.url(),
            "starting interceptor chain"
        );
        ChainHandle::new(self.clone(), interceptors).attach(&mut request);
        self.next(request).await
    }

    /// Continue the chain the request belongs to.
    ///
    /// Runs the next interceptor, or reaches the end of the chain (see
    /// [`ChainEnd`]). Once the chain is aborted or has recorded an error, the
    /// frozen result is returned and nothing else runs. A request that
    /// carries no chain goes straight to the transport.
    pub fn next(&self, request: Request<Bytes>) -> ChainFuture {
        match ChainHandle::of(&request) {
            Some(chain) => Box::pin(chain.proceed(request)),
            None => {
                debug!(url = %request.url(), "no interceptor chain on request, calling transport");
                self.transport_call(request)
            }
        }
    }

    /// Abort the chain the request belongs to.
    ///
    /// Nothing else in the chain runs and the transport is not reached. The
    /// returned value is the chain's frozen result: [`Error::Aborted`] unless
    /// an error had already been recorded.
    ///
    /// # Errors
    ///
    /// Always returns an error; [`Error::AbortOutsideChain`] when the request
    /// carries no chain.
    pub fn abort(&self, request: &Request<Bytes>) -> Result<Response<Bytes>> {
        match ChainHandle::of(request) {
            Some(chain) => {
                debug!(url = %request.url(), "interceptor chain aborted");
                chain.abort()
            }
            None => {
                warn!(url = %request.url(), "abort invoked outside of any chain");
                Err(Error::AbortOutsideChain)
            }
        }
    }

    /// Call the transport directly, bypassing the chain.
    ///
    /// Terminal interceptors use this to perform the real request themselves.
    /// The request's chain is detached first, so the transport never holds
    /// on to chain state.
    pub fn transport_call(&self, mut request: Request<Bytes>) -> ChainFuture {
        ChainHandle::detach(&mut request);
        let transport = Arc::clone(&self.transport);
        Box::pin(async move { transport.call(request).await })
    }
}

// ============================================================================
// Transport / Tower Service Implementation
// ============================================================================

impl Transport for ClientConfig {
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        self.send(request)
    }
}

impl Service<Request<Bytes>> for ClientConfig {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ChainFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.send(request).await })
    }
}
