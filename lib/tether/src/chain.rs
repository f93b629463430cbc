//! Per-request chain traversal state.
//!
//! Every request sent through a [`ClientConfig`] with interceptors gets its
//! own [`ChainState`], reachable through a [`ChainHandle`] stored in the
//! request's extensions. Interceptors never see the state directly: they call
//! [`ClientConfig::next`] or [`ClientConfig::abort`], which look the handle up
//! on the request they were given.
//!
//! The cursor starts before the first interceptor. Each `Continue` advances it
//! by one and runs the interceptor at the new position. What happens when the
//! cursor moves past the last interceptor is decided by [`ChainEnd`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::interceptor::SharedInterceptor;
use crate::{ClientConfig, Error, Request, Response, Result};

/// What a chain does once every interceptor has been started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainEnd {
    /// Continuing past the last interceptor sends the request through the
    /// transport, exactly once per chain.
    #[default]
    Transport,
    /// Continuing past the last interceptor does nothing. A terminal
    /// interceptor has to call [`ClientConfig::transport_call`] itself;
    /// otherwise the chain resolves to [`Error::ChainExhausted`].
    Stop,
}

/// Observable state of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    /// Interceptors remain to be started.
    Running,
    /// The cursor moved past the last interceptor.
    Exhausted,
    /// [`ClientConfig::abort`] was called; the result is frozen.
    Aborted,
    /// An error was recorded; the result is frozen.
    Failed,
}

/// Traversal cursor and cached result of one request.
pub(crate) struct ChainState {
    client: ClientConfig,
    interceptors: Arc<[SharedInterceptor]>,
    /// Number of positions the cursor has advanced; `0` is "before first".
    advanced: usize,
    aborted: bool,
    result: Option<Result<Response<Bytes>>>,
}

/// What a `Continue` call has to do once the lock is released.
enum Step {
    Settled(Result<Response<Bytes>>),
    Intercept {
        interceptor: SharedInterceptor,
        client: ClientConfig,
        position: usize,
    },
    Transport(ClientConfig),
}

impl ChainState {
    fn new(client: ClientConfig, interceptors: Arc<[SharedInterceptor]>) -> Self {
        Self {
            client,
            interceptors,
            advanced: 0,
            aborted: false,
            result: None,
        }
    }

    fn status(&self) -> ChainStatus {
        if self.aborted {
            ChainStatus::Aborted
        } else if matches!(self.result, Some(Err(_))) {
            ChainStatus::Failed
        } else if self.advanced > self.interceptors.len() {
            ChainStatus::Exhausted
        } else {
            ChainStatus::Running
        }
    }

    fn is_frozen(&self) -> bool {
        matches!(self.status(), ChainStatus::Aborted | ChainStatus::Failed)
    }

    fn cached(&self) -> Result<Response<Bytes>> {
        self.result.clone().unwrap_or(Err(Error::ChainExhausted))
    }

    fn advance(&mut self) -> Step {
        if self.is_frozen() {
            return Step::Settled(self.cached());
        }

        let position = self.advanced;
        if let Some(interceptor) = self.interceptors.get(position) {
            self.advanced += 1;
            return Step::Intercept {
                interceptor: Arc::clone(interceptor),
                client: self.client.clone(),
                position,
            };
        }

        if position == self.interceptors.len() {
            self.advanced += 1;
            if self.client.chain_end() == ChainEnd::Transport {
                return Step::Transport(self.client.clone());
            }
        }

        Step::Settled(self.cached())
    }

    /// Record a freshly produced result unless the chain is already frozen,
    /// and return whatever the chain now holds.
    fn settle(&mut self, result: Result<Response<Bytes>>) -> Result<Response<Bytes>> {
        if self.is_frozen() {
            return self.cached();
        }
        self.result = Some(result.clone());
        result
    }

    fn abort(&mut self) {
        self.aborted = true;
        if !matches!(self.result, Some(Err(_))) {
            self.result = Some(Err(Error::Aborted));
        }
    }
}

/// Handle to the chain state of one in-flight request.
///
/// The handle lives in the request's extensions. Cloning the request clones
/// the handle, so a request forwarded to background work must be detached
/// first with [`ChainHandle::detach`]; the chain is not meant to be driven
/// from two places at once.
#[derive(Clone)]
pub struct ChainHandle {
    state: Arc<Mutex<ChainState>>,
}

impl std::fmt::Debug for ChainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ChainHandle")
            .field("interceptors", &state.interceptors.len())
            .field("advanced", &state.advanced)
            .field("status", &state.status())
            .finish()
    }
}

impl ChainHandle {
    pub(crate) fn new(client: ClientConfig, interceptors: Arc<[SharedInterceptor]>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState::new(client, interceptors))),
        }
    }

    /// The chain attached to `request`, if any.
    #[must_use]
    pub fn of(request: &Request<Bytes>) -> Option<Self> {
        request.extensions().get::<Self>().cloned()
    }

    /// Remove the chain from `request`, returning it.
    ///
    /// After this, sending the request starts from a fresh chain and
    /// `ClientConfig::next` on it goes straight to the transport.
    pub fn detach(request: &mut Request<Bytes>) -> Option<Self> {
        request.extensions_mut().remove::<Self>()
    }

    pub(crate) fn attach(&self, request: &mut Request<Bytes>) {
        request.extensions_mut().insert(self.clone());
    }

    /// Current status of the chain.
    #[must_use]
    pub fn status(&self) -> ChainStatus {
        self.lock().status()
    }

    /// Zero-based position of the interceptor the cursor is on, or `None`
    /// before the first `Continue` and once the cursor is past the end.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        let state = self.lock();
        state
            .advanced
            .checked_sub(1)
            .filter(|position| *position < state.interceptors.len())
    }

    /// `Continue`: run the next step of the chain and return its result.
    pub(crate) async fn proceed(self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let step = self.lock().advance();
        let result = match step {
            Step::Settled(result) => return result,
            Step::Intercept {
                interceptor,
                client,
                position,
            } => {
                trace!(position, "invoking interceptor");
                interceptor.intercept(client, request).await
            }
            Step::Transport(client) => {
                debug!(url = %request.url(), "interceptor chain exhausted, calling transport");
                client.transport_call(request).await
            }
        };
        self.lock().settle(result)
    }

    /// `Abort`: freeze the chain and return the frozen result.
    pub(crate) fn abort(&self) -> Result<Response<Bytes>> {
        let mut state = self.lock();
        state.abort();
        state.cached()
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, StatusCode, Transport};

    struct NoTransport;

    impl Transport for NoTransport {
        async fn execute(&self, _request: Request<Bytes>) -> Result<Response<Bytes>> {
            Err(Error::connection("no transport in unit tests"))
        }
    }

    fn answer(status: StatusCode) -> SharedInterceptor {
        Arc::new(move |_client: ClientConfig, _request: Request| async move {
            Ok::<_, Error>(Response::empty(status))
        })
    }

    fn state(interceptors: Vec<SharedInterceptor>) -> ChainState {
        ChainState::new(ClientConfig::new(NoTransport), Arc::from(interceptors))
    }

    fn request() -> Request {
        let url = url::Url::parse("http://localhost/x").expect("url");
        Request::builder(Method::GET, url).build()
    }

    #[test]
    fn fresh_state_is_running_before_first() {
        let state = state(vec![answer(StatusCode::OK)]);
        assert_eq!(state.status(), ChainStatus::Running);
        assert_eq!(state.advanced, 0);
        assert!(matches!(state.cached(), Err(Error::ChainExhausted)));
    }

    #[test]
    fn advance_starts_at_position_zero() {
        let mut state = state(vec![answer(StatusCode::OK), answer(StatusCode::CREATED)]);
        assert!(matches!(state.advance(), Step::Intercept { position: 0, .. }));
        assert!(matches!(state.advance(), Step::Intercept { position: 1, .. }));
        assert!(matches!(state.advance(), Step::Transport(_)));
        assert_eq!(state.status(), ChainStatus::Exhausted);
        assert!(matches!(state.advance(), Step::Settled(Err(Error::ChainExhausted))));
    }

    #[test]
    fn stop_policy_never_reaches_transport() {
        let client = ClientConfig::new(NoTransport).with_chain_end(ChainEnd::Stop);
        let mut state = ChainState::new(client, Arc::from(vec![answer(StatusCode::OK)]));
        assert!(matches!(state.advance(), Step::Intercept { position: 0, .. }));
        assert!(matches!(state.advance(), Step::Settled(Err(Error::ChainExhausted))));
        assert_eq!(state.status(), ChainStatus::Exhausted);
    }

    #[test]
    fn abort_records_sentinel_once() {
        let mut state = state(vec![answer(StatusCode::OK)]);
        state.abort();
        state.abort();
        assert_eq!(state.status(), ChainStatus::Aborted);
        assert!(matches!(state.cached(), Err(Error::Aborted)));
        assert!(matches!(state.advance(), Step::Settled(Err(Error::Aborted))));
        assert_eq!(state.advanced, 0);
    }

    #[test]
    fn abort_keeps_earlier_error() {
        let mut state = state(vec![answer(StatusCode::OK)]);
        let _ = state.settle(Err(Error::Timeout));
        state.abort();
        assert_eq!(state.status(), ChainStatus::Aborted);
        assert!(matches!(state.cached(), Err(Error::Timeout)));
    }

    #[test]
    fn recorded_error_freezes_result() {
        let mut state = state(vec![answer(StatusCode::OK)]);
        let first = state.settle(Err(Error::connection("refused")));
        assert!(first.is_err());
        assert_eq!(state.status(), ChainStatus::Failed);

        let second = state.settle(Ok(Response::empty(StatusCode::OK)));
        assert!(matches!(second, Err(Error::Connection(_))));
    }

    #[test]
    fn successful_result_can_be_replaced() {
        let mut state = state(vec![answer(StatusCode::OK)]);
        let _ = state.settle(Ok(Response::empty(StatusCode::CREATED)));
        let result = state.settle(Ok(Response::empty(StatusCode::ACCEPTED)));
        assert_eq!(result.expect("ok").status(), StatusCode::ACCEPTED);
        assert_eq!(state.status(), ChainStatus::Running);
    }

    #[test]
    fn handle_attach_and_detach() {
        let handle = ChainHandle::new(ClientConfig::new(NoTransport), Arc::from(Vec::new()));
        let mut request = request();
        assert!(ChainHandle::of(&request).is_none());

        handle.attach(&mut request);
        assert!(ChainHandle::of(&request).is_some());

        assert!(ChainHandle::detach(&mut request).is_some());
        assert!(ChainHandle::of(&request).is_none());
    }

    #[test]
    fn handle_position_tracks_cursor() {
        let handle = ChainHandle::new(
            ClientConfig::new(NoTransport),
            Arc::from(vec![answer(StatusCode::OK)]),
        );
        assert_eq!(handle.position(), None);
        let _ = handle.lock().advance();
        assert_eq!(handle.position(), Some(0));
        let _ = handle.lock().advance();
        assert_eq!(handle.position(), None);
        assert_eq!(handle.status(), ChainStatus::Exhausted);
    }
}
