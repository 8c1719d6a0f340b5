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

use crate::address::HostAddress;
use crate::queue::{CrawlTask, LeaseId, SeedDistance};
use crate::url::NormalizedUrl;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// A task handed to a worker and not yet completed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Lease {
    pub id: LeaseId,
    pub host: HostAddress,
    pub url: NormalizedUrl,
    pub seed_distance: SeedDistance,
    pub leased_at: Instant,
}

/// The outstanding leases, at most one per host.
#[derive(Debug, Default)]
pub struct Leases {
    next_id: AtomicU64,
    active: DashMap<HostAddress, Lease>,
}

impl Leases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lease for [task].
    pub fn grant(&self, task: &CrawlTask) -> LeaseId {
        let id = LeaseId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let lease = Lease {
            id,
            host: task.host,
            url: task.url.clone(),
            seed_distance: task.seed_distance,
            leased_at: Instant::now(),
        };
        if let Some(previous) = self.active.insert(task.host, lease) {
            log::error!(
                "{} was leased twice, dropping the lease of {}.",
                task.host,
                previous.url
            );
        }
        id
    }

    /// Consumes the lease [id] of [host]. Returns None if it expired or never existed.
    pub fn release(&self, host: &HostAddress, id: LeaseId) -> Option<Lease> {
        self.active
            .remove_if(host, |_, lease| lease.id == id)
            .map(|(_, lease)| lease)
    }

    /// Removes and returns every lease older than [timeout].
    pub fn take_expired(&self, timeout: Duration) -> Vec<Lease> {
        let expired: Vec<(HostAddress, LeaseId)> = self
            .active
            .iter()
            .filter(|lease| lease.leased_at.elapsed() > timeout)
            .map(|lease| (lease.host, lease.id))
            .collect();
        expired
            .into_iter()
            .filter_map(|(host, id)| self.release(&host, id))
            .collect()
    }

    pub fn contains(&self, host: &HostAddress) -> bool {
        self.active.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Lease> {
        let mut leases: Vec<_> = self.active.iter().map(|lease| lease.value().clone()).collect();
        leases.sort_by_key(|lease| lease.id);
        leases
    }
}
