use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use jsonwebtoken::jwk::{Jwk, JwkSet};
use moka::future::Cache;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::services::keys::KeySetError;

/// Tuning knobs for a [`RemoteKeySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySetOptions {
    /// HTTP timeout for one fetch of the key-set endpoint.
    pub timeout: Duration,
    /// Minimum gap between refreshes forced by an unknown `kid`.
    pub cooldown: Duration,
    /// How long a fetched key set is served before it is fetched again.
    pub cache_max_age: Duration,
}

impl Default for KeySetOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            cooldown: Duration::from_secs(30),
            cache_max_age: Duration::from_secs(600),
        }
    }
}

/// Key set fetched from an issuer's certificate endpoint.
///
/// Cheap to clone; clones share the cache. Concurrent first loads are
/// coalesced by the cache. A lookup for an unknown `kid` refreshes the set
/// (key rotation) unless the last completed fetch is inside the cooldown
/// window; concurrent misses wait for the one refresh in flight.
#[derive(Clone)]
pub struct RemoteKeySet {
    inner: Arc<Inner>,
}

struct Inner {
    url: Url,
    http: Client,
    cache: Cache<Url, Arc<JwkSet>>,
    cooldown: Duration,
    /// When the last successful fetch completed.
    last_fetch: Mutex<Option<Instant>>,
    /// Serializes forced refreshes.
    refresh: tokio::sync::Mutex<()>,
}

impl RemoteKeySet {
    pub fn new(url: Url, options: KeySetOptions) -> Result<Self, KeySetError> {
        let http = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| KeySetError::Fetch(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(options.cache_max_age)
            .build();

        Ok(Self {
            inner: Arc::new(Inner {
                url,
                http,
                cache,
                cooldown: options.cooldown,
                last_fetch: Mutex::new(None),
                refresh: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Current key set, fetched on first use or after the cache expired.
    pub async fn jwk_set(&self) -> Result<Arc<JwkSet>, KeySetError> {
        let inner = &self.inner;
        inner
            .cache
            .try_get_with(inner.url.clone(), inner.fetch())
            .await
            .map_err(|e| (*e).clone())
    }

    pub async fn find(&self, kid: &str) -> Result<Jwk, KeySetError> {
        let jwks = self.jwk_set().await?;
        if let Some(jwk) = jwks.find(kid) {
            return Ok(jwk.clone());
        }

        let jwks = self.refresh(&jwks).await?;
        jwks.find(kid).cloned().ok_or_else(|| {
            debug!(kid, "no key for kid after refresh");
            KeySetError::KeyNotFound(kid.to_string())
        })
    }

    /// Replace `stale` with a fresh set, or return whatever replaced it while
    /// this caller waited for the refresh lock.
    async fn refresh(&self, stale: &Arc<JwkSet>) -> Result<Arc<JwkSet>, KeySetError> {
        let inner = &self.inner;
        let _guard = inner.refresh.lock().await;

        if let Some(current) = inner.cache.get(&inner.url).await
            && !Arc::ptr_eq(&current, stale)
        {
            return Ok(current);
        }

        if inner.in_cooldown() {
            debug!(url = %inner.url, "key set refreshed too recently");
            return Ok(stale.clone());
        }

        let fresh = inner.fetch().await?;
        inner.cache.insert(inner.url.clone(), fresh.clone()).await;
        Ok(fresh)
    }
}

impl Inner {
    async fn fetch(&self) -> Result<Arc<JwkSet>, KeySetError> {
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| KeySetError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeySetError::Status(response.status()));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeySetError::Decode(e.to_string()))?;

        *self.last_fetch.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        info!(url = %self.url, keys = jwks.keys.len(), "fetched JSON Web Key Set");
        Ok(Arc::new(jwks))
    }

    fn in_cooldown(&self) -> bool {
        let last = self.last_fetch.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*last, Some(at) if at.elapsed() < self.cooldown)
    }
}
