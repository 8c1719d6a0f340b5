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

mod active;
mod admission;
mod errors;
mod initialize;
mod lease;
mod persistence;
mod rotation;
mod scheduling;

pub use active::ActiveCounter;
pub use admission::Admission;
pub use errors::PersistError;
pub use initialize::SeedReport;
pub use lease::{Lease, Leases};
pub use persistence::load_dump;
pub use rotation::Rotation;
pub use scheduling::{Completion, CrawlReport, ExtractedLink};

use crate::address::{AddressCache, AddressResolver, SystemResolver};
use crate::config::{Configs, FrontierConfig};
use crate::partition::Partitioner;
use crate::queue::{CleanupRecord, CrawlTask, HostQueuePool, OverflowQueue, TimedQueue};
use crate::seen::{FilterOpened, SeenFilter, SeenFilterError};
use crate::transport::{ForeignUrlSink, UnroutedSink};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

/// The url frontier of a single crawl node.
///
/// Owns every shared structure of the crawl. Workers share it through an `Arc` and call
/// [Frontier::get_task] and [Frontier::complete], a single maintenance task calls
/// [Frontier::rotate_once] in a loop.
#[derive(Debug)]
pub struct Frontier<R = SystemResolver, S = UnroutedSink> {
    config: FrontierConfig,
    partitioner: Partitioner,
    addresses: AddressCache<R>,
    seen: SeenFilter,
    pool: HostQueuePool,
    scheduler: TimedQueue<CrawlTask>,
    cleanup: TimedQueue<CleanupRecord>,
    overflow: OverflowQueue,
    active: ActiveCounter,
    leases: Leases,
    sink: S,
    dump_path: Utf8PathBuf,
}

impl Frontier {
    /// Opens the seen filter configured in [configs] and creates a frontier resolving
    /// with the system resolver.
    pub fn open(configs: &Configs) -> Result<(Self, FilterOpened), SeenFilterError> {
        let (seen, opened) = SeenFilter::open(
            configs.paths.seen_path(),
            configs.frontier.seen_capacity,
            configs.frontier.seen_false_positive_rate,
        )?;
        Ok((
            Self::new(
                configs.frontier.clone(),
                seen,
                SystemResolver,
                UnroutedSink,
                configs.paths.dump_path(),
            ),
            opened,
        ))
    }
}

impl<R: AddressResolver, S: ForeignUrlSink> Frontier<R, S> {
    pub fn new(
        config: FrontierConfig,
        seen: SeenFilter,
        resolver: R,
        sink: S,
        dump_path: impl AsRef<Utf8Path>,
    ) -> Self {
        Self {
            partitioner: config.partitioner(),
            addresses: AddressCache::new(resolver, config.dns_ttl(), config.dns_cache_capacity),
            pool: HostQueuePool::new(config.pool_target()),
            scheduler: TimedQueue::new(),
            cleanup: TimedQueue::new(),
            overflow: OverflowQueue::new(),
            active: ActiveCounter::new(),
            leases: Leases::new(),
            seen,
            sink,
            dump_path: dump_path.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn config(&self) -> &FrontierConfig {
        &self.config
    }

    pub fn partitioner(&self) -> &Partitioner {
        &self.partitioner
    }

    pub fn addresses(&self) -> &AddressCache<R> {
        &self.addresses
    }

    pub fn resolver(&self) -> &R {
        self.addresses.resolver()
    }

    pub fn seen(&self) -> &SeenFilter {
        &self.seen
    }

    pub fn pool(&self) -> &HostQueuePool {
        &self.pool
    }

    pub fn scheduler(&self) -> &TimedQueue<CrawlTask> {
        &self.scheduler
    }

    pub fn cleanup(&self) -> &TimedQueue<CleanupRecord> {
        &self.cleanup
    }

    pub fn overflow(&self) -> &OverflowQueue {
        &self.overflow
    }

    pub fn active(&self) -> &ActiveCounter {
        &self.active
    }

    pub fn leases(&self) -> &Leases {
        &self.leases
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn dump_path(&self) -> &Utf8Path {
        &self.dump_path
    }

    /// A snapshot of the sizes of all structures.
    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            pooled_hosts: self.pool.len(),
            live_hosts: self.pool.live_hosts().len(),
            queued_urls: self.pool.pending(),
            scheduled_tasks: self.scheduler.len(),
            pending_cleanups: self.cleanup.len(),
            overflow: self.overflow.len(),
            leases: self.leases.len(),
            active: self.active.total(),
            seen: self.seen.len(),
        }
    }
}

/// Sizes of the frontier structures, see [Frontier::stats].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct FrontierStats {
    pub pooled_hosts: usize,
    pub live_hosts: usize,
    pub queued_urls: usize,
    pub scheduled_tasks: usize,
    pub pending_cleanups: usize,
    pub overflow: usize,
    pub leases: usize,
    pub active: usize,
    pub seen: u64,
}
