use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cache::ResponseCache;
use super::transport::{cache_key, FetchOptions, FetchRequest, HttpTransport, Method, ReqwestTransport};
use crate::config::CacheConfig;
use crate::error::FetchError;
use crate::types::CacheStats;

type SharedFetch = Shared<BoxFuture<'static, Result<Value, FetchError>>>;

struct Pending {
    id: u64,
    future: SharedFetch,
}

struct Inner {
    cache: ResponseCache,
    pending: Mutex<HashMap<String, Pending>>,
    transport: Arc<dyn HttpTransport>,
    next_id: AtomicU64,
    requests_sent: AtomicU64,
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, Pending>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop the pending record for `key` if it still belongs to request `id`.
    fn settle(&self, key: &str, id: u64) {
        let mut pending = self.lock_pending();
        if pending.get(key).is_some_and(|p| p.id == id) {
            pending.remove(key);
        }
    }
}

enum Lookup {
    Cached(Value),
    InFlight(SharedFetch),
}

/// Run `request` as its own task so it settles even when every caller has
/// gone away. Outside a runtime the callers drive it instead.
fn detach(
    request: BoxFuture<'static, Result<Value, FetchError>>,
    url: &str,
) -> BoxFuture<'static, Result<Value, FetchError>> {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            debug!(url, "no async runtime, request driven by its callers");
            return request;
        }
    };

    let url = url.to_string();
    handle
        .spawn(request)
        .map(move |joined| {
            joined.unwrap_or_else(|e| {
                Err(FetchError::Network {
                    url,
                    message: format!("request task failed: {e}"),
                })
            })
        })
        .boxed()
}

/// Cache-backed fetcher that coalesces identical in-flight requests.
///
/// Cloning is cheap; clones share the cache, the pending map and the
/// transport.
#[derive(Clone)]
pub struct DedupFetcher {
    inner: Arc<Inner>,
}

impl DedupFetcher {
    /// Fetcher over `transport` with a system-clock cache and default TTL
    pub fn new<T: HttpTransport>(transport: T) -> Self {
        Self::with_cache(Arc::new(transport), ResponseCache::new())
    }

    pub fn with_cache(transport: Arc<dyn HttpTransport>, cache: ResponseCache) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                pending: Mutex::new(HashMap::new()),
                transport,
                next_id: AtomicU64::new(0),
                requests_sent: AtomicU64::new(0),
            }),
        }
    }

    /// Production fetcher: `reqwest` transport, TTL and timeout from config
    pub fn from_config(config: &CacheConfig) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(config)?;
        let cache = ResponseCache::with_clock(
            Arc::new(super::clock::SystemClock),
            config.default_ttl(),
        );
        Ok(Self::with_cache(Arc::new(transport), cache))
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    pub fn get_from_cache(&self, key: &str) -> Option<Value> {
        self.inner.cache.get(key)
    }

    pub fn set_in_cache(&self, key: &str, value: Value, ttl: Option<Duration>) {
        self.inner.cache.set(key, value, ttl)
    }

    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        self.inner.cache.clear(pattern)
    }

    /// Number of requests actually handed to the transport so far.
    pub fn requests_sent(&self) -> u64 {
        self.inner.requests_sent.load(Ordering::Relaxed)
    }

    /// Keys of the requests currently in flight, sorted.
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock_pending().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cache_size: self.inner.cache.len(),
            pending_requests: self.inner.lock_pending().len(),
            keys: self.inner.cache.keys(),
        }
    }

    /// Fetch `url`, serving GETs from the cache and coalescing identical
    /// in-flight requests.
    ///
    /// Every caller sharing one in-flight request sees the same result.
    /// Failures are never cached.
    pub async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Value, FetchError> {
        match self.lookup(url, options) {
            Lookup::Cached(value) => Ok(value),
            Lookup::InFlight(fut) => fut.await,
        }
    }

    /// [`fetch`](Self::fetch) and deserialize the JSON into `T`.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<T, FetchError> {
        let value = self.fetch(url, options).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Json {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn lookup(&self, url: &str, options: FetchOptions) -> Lookup {
        let key = cache_key(options.method, url, options.body.as_ref());
        let cacheable = options.method == Method::Get;

        // The pending lock is held across the cache check so a settlement
        // cannot land between the two.
        let mut pending = self.inner.lock_pending();

        if cacheable {
            if let Some(value) = self.inner.cache.get(&key) {
                debug!(key = %key, "cache hit");
                return Lookup::Cached(value);
            }
        }

        if let Some(existing) = pending.get(&key) {
            debug!(key = %key, method = %options.method, "joining in-flight request");
            return Lookup::InFlight(existing.future.clone());
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let request = FetchRequest {
            method: options.method,
            url: url.to_string(),
            body: options.body,
        };
        let request = self.request_future(key.clone(), id, request, cacheable, options.cache_ttl);
        let future = detach(request, url).shared();
        pending.insert(
            key,
            Pending {
                id,
                future: future.clone(),
            },
        );
        Lookup::InFlight(future)
    }

    fn request_future(
        &self,
        key: String,
        id: u64,
        request: FetchRequest,
        cacheable: bool,
        ttl: Option<Duration>,
    ) -> BoxFuture<'static, Result<Value, FetchError>> {
        let inner = Arc::clone(&self.inner);
        async move {
            info!(method = %request.method, url = %request.url, "fetching");
            inner.requests_sent.fetch_add(1, Ordering::Relaxed);

            let result = inner.transport.send(request).await;
            match &result {
                Ok(value) if cacheable => inner.cache.set(&key, value.clone(), ttl),
                Ok(_) => {}
                Err(e) => warn!(key = %key, error = %e, "request failed"),
            }
            inner.settle(&key, id);
            result
        }
        .boxed()
    }

    /// Warm the cache for `urls` in the background.
    ///
    /// The task yields once before issuing anything so more urgent work runs
    /// first. Failures are logged at debug level and otherwise dropped.
    /// Returns `None` when called outside a tokio runtime.
    pub fn preload<I, S>(&self, urls: I) -> Option<JoinHandle<()>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(count = urls.len(), "preload skipped: no async runtime");
                return None;
            }
        };

        let fetcher = self.clone();
        Some(handle.spawn(async move {
            tokio::task::yield_now().await;
            let fetches = urls.iter().map(|url| {
                let fetcher = fetcher.clone();
                async move {
                    if let Err(e) = fetcher.fetch(url, FetchOptions::default()).await {
                        debug!(url = %url, error = %e, "preload failed");
                    }
                }
            });
            future::join_all(fetches).await;
        }))
    }
}
