//! Cache-fronted fetching.
//!
//! A lookup first asks the cache. Only on a miss does it wait for the
//! [`HostGate`] and run the request. Successful results are stored in the
//! cache, failures are handed back unchanged and never cached.

use async_trait::async_trait;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::time::Instant;

use crate::AdmissionCancelled;
use crate::cache::ExpiringCache;
use crate::ratelimit::{HostGate, HostKey};

/// Something that can perform a request against a remote host.
///
/// Implementors own the transport (an HTTP client, a browser bridge, a mock).
/// They neither pace nor cache; [`Fetcher`] does that around them.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Description of a single request, e.g. a [`url::Url`]
    type Request: Send + Sync;
    /// Result of a successful request
    type Output: Send;
    /// Anything that can go wrong while executing a request
    type Error: Send;

    /// The host `request` is going to contact
    ///
    /// # Errors
    ///
    /// Fails if the request does not target a host.
    fn host(&self, request: &Self::Request) -> Result<HostKey, Self::Error>;

    /// Perform `request`. Called only after the gate admitted `host`.
    async fn execute(
        &self,
        host: &HostKey,
        request: &Self::Request,
    ) -> Result<Self::Output, Self::Error>;
}

/// Look up `key` in `cache`, or run `operation` once `gate` admits `host`.
///
/// A hit returns right away and never touches the gate. On a miss, the
/// successful result of `operation` is stored under `key`. Errors are
/// returned as they are and leave the cache untouched.
///
/// Neither the cache lock nor any gate guard is held while `operation` runs.
///
/// # Errors
///
/// Returns the error of `operation`.
pub async fn cached_fetch<K, V, E, F, Fut>(
    cache: &ExpiringCache<K, V>,
    gate: &HostGate,
    key: K,
    host: &HostKey,
    operation: F,
) -> Result<V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    if let Some(value) = cache.get(&key) {
        log::trace!("Serving cached artifact instead of contacting {host}");
        return Ok(value);
    }

    let value = gate.admit(host, operation).await?;
    cache.put(key, value.clone());
    Ok(value)
}

/// Like [`cached_fetch`], but give up waiting for admission at `deadline`.
///
/// # Errors
///
/// Returns the error of `operation`, or [`AdmissionCancelled`] converted
/// into `E` if `host` was not admitted in time. `operation` is not invoked
/// in the latter case.
pub async fn cached_fetch_before<K, V, E, F, Fut>(
    cache: &ExpiringCache<K, V>,
    gate: &HostGate,
    key: K,
    host: &HostKey,
    deadline: Instant,
    operation: F,
) -> Result<V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: From<AdmissionCancelled>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    if let Some(value) = cache.get(&key) {
        log::trace!("Serving cached artifact instead of contacting {host}");
        return Ok(value);
    }

    let value = gate.admit_before(host, deadline, operation).await??;
    cache.put(key, value.clone());
    Ok(value)
}

/// Runs requests of a [`RequestExecutor`] through a shared [`HostGate`]
#[derive(Debug)]
pub struct Fetcher<X> {
    gate: Arc<HostGate>,
    executor: X,
}

impl<X: RequestExecutor> Fetcher<X> {
    /// Create a fetcher sharing `gate` with other users
    #[must_use]
    pub const fn new(gate: Arc<HostGate>, executor: X) -> Self {
        Self { gate, executor }
    }

    /// The gate requests go through
    #[must_use]
    pub const fn gate(&self) -> &Arc<HostGate> {
        &self.gate
    }

    /// The wrapped executor
    #[must_use]
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    /// Run `request` as soon as its host is admitted, bypassing any cache
    ///
    /// # Errors
    ///
    /// Returns the executor's error.
    pub async fn fetch(&self, request: &X::Request) -> Result<X::Output, X::Error> {
        let host = self.executor.host(request)?;
        self.gate
            .admit(&host, || self.executor.execute(&host, request))
            .await
    }

    /// Serve `key` from `cache`, fetching and storing it on a miss
    ///
    /// # Errors
    ///
    /// Returns the executor's error. Nothing is cached in that case.
    pub async fn fetch_cached<K>(
        &self,
        cache: &ExpiringCache<K, X::Output>,
        key: K,
        request: &X::Request,
    ) -> Result<X::Output, X::Error>
    where
        K: Eq + Hash + Clone,
        X::Output: Clone,
    {
        self.fetch_cached_with(cache, key, request, Ok).await
    }

    /// Like [`Fetcher::fetch_cached`], converting the executor output into
    /// the cached artifact before storing it
    ///
    /// # Errors
    ///
    /// Returns the executor's error or the error of `convert`.
    pub async fn fetch_cached_with<K, V, C>(
        &self,
        cache: &ExpiringCache<K, V>,
        key: K,
        request: &X::Request,
        convert: C,
    ) -> Result<V, X::Error>
    where
        K: Eq + Hash + Clone,
        V: Clone,
        C: FnOnce(X::Output) -> Result<V, X::Error>,
    {
        let host = self.executor.host(request)?;
        let executor = &self.executor;
        let target = &host;
        cached_fetch(cache, &self.gate, key, &host, move || async move {
            let output = executor.execute(target, request).await?;
            convert(output)
        })
        .await
    }

    /// Like [`Fetcher::fetch_cached`], but stop waiting for admission at
    /// `deadline`
    ///
    /// # Errors
    ///
    /// Returns the executor's error, or [`AdmissionCancelled`] converted into
    /// it if the host was not admitted in time.
    pub async fn fetch_cached_before<K>(
        &self,
        cache: &ExpiringCache<K, X::Output>,
        key: K,
        request: &X::Request,
        deadline: Instant,
    ) -> Result<X::Output, X::Error>
    where
        K: Eq + Hash + Clone,
        X::Output: Clone,
        X::Error: From<AdmissionCancelled>,
    {
        let host = self.executor.host(request)?;
        cached_fetch_before(cache, &self.gate, key, &host, deadline, || {
            self.executor.execute(&host, request)
        })
        .await
    }
}
