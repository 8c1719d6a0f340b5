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
use crate::frontier::Frontier;
use crate::queue::{CleanupRecord, CrawlTask, HostEntry, OverflowRecord};
use crate::transport::ForeignUrlSink;
use crate::url::NormalizedUrl;
use serde::Serialize;
use std::collections::HashSet;
use tokio::time::Instant;

/// How the seeds were distributed by [Frontier::initialize].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct SeedReport {
    /// Hosts that received a pool slot and a task.
    pub hosts: usize,
    /// Seeds appended to a host that already had a slot.
    pub appended: usize,
    /// Seeds of hosts that did not fit into the pool.
    pub overflowed: usize,
    /// Seeds owned by another node.
    pub forwarded: usize,
    /// Seeds whose host did not resolve.
    pub unresolved: usize,
    /// Lines that are no valid url.
    pub invalid: usize,
    /// Seeds listed more than once.
    pub duplicates: usize,
    /// Placeholder slots created to fill the pool.
    pub vacant: usize,
}

impl<R: AddressResolver, S: ForeignUrlSink> Frontier<R, S> {
    /// Distributes [seeds] over the host pool and the overflow queue.
    ///
    /// Seeds are not checked against the seen filter, so a restart can continue from
    /// the urls of a dump. Free pool slots left afterwards are filled with vacant hosts that
    /// rotate in overflow hosts as soon as the maintenance loop runs.
    pub async fn initialize<I>(&self, seeds: I) -> SeedReport
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let now = Instant::now();
        let mut report = SeedReport::default();
        let mut taken = HashSet::new();
        for seed in seeds {
            let seed = seed.as_ref();
            let url = match NormalizedUrl::parse(seed) {
                Ok(url) => url,
                Err(err) => {
                    log::warn!("Skipping the seed {seed}: {err}");
                    report.invalid += 1;
                    continue;
                }
            };
            if !taken.insert(url.clone()) {
                log::debug!("Skipping the repeated seed {url}.");
                report.duplicates += 1;
                continue;
            }
            let Some(hostname) = url.hostname() else {
                report.invalid += 1;
                continue;
            };
            let host = match self.addresses.resolve(&hostname).await {
                Resolution::Resolved(host) => host,
                Resolution::Unresolved => {
                    log::warn!("Skipping the seed {url}, {hostname} does not resolve.");
                    report.unresolved += 1;
                    continue;
                }
            };
            if !self.partitioner.is_local(&host) {
                self.sink.send(self.partitioner.owner(&host), url).await;
                report.forwarded += 1;
                continue;
            }

            self.seen.mark(&url);
            self.active.admitted(&url);
            let entry = HostEntry::seed(url);
            if self.pool.contains(&host) {
                if let Err(entry) = self.pool.append(&host, entry) {
                    self.overflow.push(OverflowRecord::new(host, entry));
                    report.overflowed += 1;
                } else {
                    report.appended += 1;
                }
            } else if self.pool.has_free_slot() && self.pool.create(host, Vec::new()) {
                self.scheduler.push(CrawlTask::new(now, host, entry));
                report.hosts += 1;
            } else {
                self.overflow.push(OverflowRecord::new(host, entry));
                report.overflowed += 1;
            }
        }

        let mut slot = 0u32;
        while self.pool.has_free_slot() {
            let vacant = HostAddress::vacant(slot);
            slot += 1;
            if self.pool.create(vacant, Vec::new()) {
                self.cleanup.push(CleanupRecord::new(now, vacant));
                report.vacant += 1;
            }
        }
        log::info!("Initialized the frontier: {report:?}");
        report
    }
}
