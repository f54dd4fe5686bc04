//! Short-lived cache of rental prices.

use crate::types::{CountryId, Price, Service};
use dashmap::DashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

type PriceKey = (Service, CountryId);

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: Price,
    fetched_at: Instant,
}

/// Price per (service, country), fresh for `ttl` after it was fetched.
///
/// Fresh reads never wait on a lock. Concurrent misses for the same key
/// share one refresh: the first caller fetches while the others wait on the
/// key's refresh lock and then find the fresh entry.
#[derive(Debug)]
pub(crate) struct PriceCache {
    ttl: Duration,
    entries: DashMap<PriceKey, CachedPrice>,
    refreshing: DashMap<PriceKey, Arc<Mutex<()>>>,
}

impl PriceCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            refreshing: DashMap::new(),
        }
    }

    /// Cached price if still fresh.
    pub(crate) fn cached(&self, service: &Service, country: CountryId) -> Option<Price> {
        let key = (service.clone(), country);
        self.entries
            .get(&key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.price)
    }

    /// Fresh cached price, or the result of `fetch`.
    ///
    /// A failed fetch, a missing price and a zero price all yield
    /// [`Price::ZERO`] and leave the cache untouched.
    pub(crate) async fn get_or_fetch<F, Fut, E>(
        &self,
        service: &Service,
        country: CountryId,
        fetch: F,
    ) -> Price
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Price>, E>>,
        E: Display,
    {
        if let Some(price) = self.cached(service, country) {
            #[cfg(feature = "tracing")]
            debug!(service = %service, country = %country, price = %price, "Price cache hit");
            return price;
        }

        let key = (service.clone(), country);
        let lock = Arc::clone(self.refreshing.entry(key.clone()).or_default().value());
        let _guard = lock.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(price) = self.cached(service, country) {
            return price;
        }

        match fetch().await {
            Ok(Some(price)) if !price.is_zero() => {
                self.entries.insert(
                    key,
                    CachedPrice {
                        price,
                        fetched_at: Instant::now(),
                    },
                );

                #[cfg(feature = "tracing")]
                debug!(service = %service, country = %country, price = %price, "Price refreshed");

                price
            }
            Ok(_) => {
                #[cfg(feature = "tracing")]
                debug!(service = %service, country = %country, "No price listed");

                Price::ZERO
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(service = %service, country = %country, error = %_e, "Price refresh failed");

                Price::ZERO
            }
        }
    }

    pub(crate) fn invalidate(&self, service: &Service, country: CountryId) {
        self.entries.remove(&(service.clone(), country));
    }
}
