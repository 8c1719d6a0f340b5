// Copyright 2024. Felix Engl
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::address::{AddressResolver, HostAddress, Resolution};
use moka::future::Cache;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Copy, Clone)]
struct CachedAddress {
    address: HostAddress,
    resolved_at: Instant,
}

/// A ttl based cache in front of an [AddressResolver].
#[derive(Debug)]
pub struct AddressCache<R> {
    resolver: R,
    ttl: Duration,
    entries: Cache<String, CachedAddress>,
}

impl<R: AddressResolver> AddressCache<R> {
    pub fn new(resolver: R, ttl: Duration, capacity: u64) -> Self {
        Self {
            resolver,
            ttl,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Resolves [hostname], preferring a fresh cache entry.
    ///
    /// A stale entry is refreshed on success and evicted on failure.
    /// A failed lookup of an unknown host is never cached.
    pub async fn resolve(&self, hostname: &str) -> Resolution {
        if let Some(cached) = self.entries.get(hostname).await {
            if cached.resolved_at.elapsed() <= self.ttl {
                return Resolution::Resolved(cached.address);
            }
            log::trace!("DNS entry for {hostname} is stale.");
            return match self.resolver.lookup(hostname).await {
                Resolution::Resolved(address) => {
                    self.remember(hostname, address).await;
                    Resolution::Resolved(address)
                }
                Resolution::Unresolved => {
                    self.entries.invalidate(hostname).await;
                    Resolution::Unresolved
                }
            };
        }

        let resolution = self.resolver.lookup(hostname).await;
        if let Resolution::Resolved(address) = resolution {
            self.remember(hostname, address).await;
        }
        resolution
    }

    /// Returns the cached address without resolving or checking the age.
    pub async fn cached(&self, hostname: &str) -> Option<HostAddress> {
        self.entries.get(hostname).await.map(|value| value.address)
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    async fn remember(&self, hostname: &str, address: HostAddress) {
        self.entries
            .insert(
                hostname.to_string(),
                CachedAddress {
                    address,
                    resolved_at: Instant::now(),
                },
            )
            .await
    }
}

#[cfg(test)]
mod test {
    use super::AddressCache;
    use crate::address::Resolution;
    use crate::test_impls::StaticResolver;
    use std::time::Duration;

    fn resolver() -> StaticResolver {
        let resolver = StaticResolver::default();
        resolver.insert("www.test1.de", [10, 0, 0, 1]);
        resolver.insert("test1.de", [10, 0, 0, 1]);
        resolver
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_entries_are_served_from_cache() {
        let cache = AddressCache::new(resolver(), Duration::from_secs(60), 100);
        let first = cache.resolve("www.test1.de").await;
        let second = cache.resolve("www.test1.de").await;
        assert_eq!(first, second);
        assert_eq!(1, cache.resolver().lookups("www.test1.de"));
    }

    #[tokio::test(start_paused = true)]
    async fn aliases_share_one_address() {
        let cache = AddressCache::new(resolver(), Duration::from_secs(60), 100);
        assert_eq!(
            cache.resolve("www.test1.de").await,
            cache.resolve("test1.de").await
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_refreshed() {
        let cache = AddressCache::new(resolver(), Duration::from_secs(60), 100);
        cache.resolve("www.test1.de").await;
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.resolver().insert("www.test1.de", [10, 0, 0, 2]);
        let refreshed = cache.resolve("www.test1.de").await;
        assert_eq!("10.0.0.2", refreshed.address().unwrap().to_string());
        assert_eq!(2, cache.resolver().lookups("www.test1.de"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_evicted_on_failure() {
        let cache = AddressCache::new(resolver(), Duration::from_secs(60), 100);
        cache.resolve("www.test1.de").await;
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.resolver().remove("www.test1.de");
        assert_eq!(Resolution::Unresolved, cache.resolve("www.test1.de").await);
        assert_eq!(None, cache.cached("www.test1.de").await);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let cache = AddressCache::new(resolver(), Duration::from_secs(60), 100);
        assert_eq!(Resolution::Unresolved, cache.resolve("unknown.test").await);
        assert_eq!(None, cache.cached("unknown.test").await);
        assert_eq!(Resolution::Unresolved, cache.resolve("unknown.test").await);
        assert_eq!(2, cache.resolver().lookups("unknown.test"));
    }
}
