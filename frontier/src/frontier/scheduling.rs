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

use crate::address::{AddressResolver, HostAddress};
use crate::frontier::{Frontier, Lease};
use crate::queue::{CleanupRecord, CrawlTask, PageStats, PoolPop};
use crate::transport::ForeignUrlSink;
use crate::url::NormalizedUrl;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// A link found on a crawled page.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExtractedLink {
    pub url: NormalizedUrl,
    pub stats: PageStats,
}

impl ExtractedLink {
    pub fn new(url: NormalizedUrl, stats: PageStats) -> Self {
        Self { url, stats }
    }
}

/// The result of crawling a single [CrawlTask].
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub success: bool,
    pub time_taken: Duration,
    pub extracted: Vec<ExtractedLink>,
}

impl CrawlReport {
    pub fn succeeded(time_taken: Duration, extracted: Vec<ExtractedLink>) -> Self {
        Self {
            success: true,
            time_taken,
            extracted,
        }
    }

    pub fn failed(time_taken: Duration) -> Self {
        Self {
            success: false,
            time_taken,
            extracted: Vec::new(),
        }
    }
}

/// What happened to a host after one of its tasks completed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Completion {
    /// The next url of the host is scheduled.
    Rescheduled(Instant),
    /// The host queue is empty and waits for cleanup.
    Dormant(Instant),
    /// The lease was reaped before the task completed. The host was already rescheduled.
    LeaseExpired,
    /// The host has no pool slot.
    Orphaned,
}

/// A uniformly distributed duration in `[0, upper)`.
fn jitter<G: Rng>(rng: &mut G, upper: Duration) -> Duration {
    let upper = u64::try_from(upper.as_nanos()).unwrap_or(u64::MAX);
    if upper == 0 {
        Duration::ZERO
    } else {
        Duration::from_nanos(rng.gen_range(0..upper))
    }
}

impl<R: AddressResolver, S: ForeignUrlSink> Frontier<R, S> {
    /// Waits for the next due task and leases it to the caller.
    pub async fn get_task(&self) -> CrawlTask {
        let mut task = self.scheduler.pop().await;
        task.lease = Some(self.leases.grant(&task));
        log::trace!("Leased {task}");
        task
    }

    /// Admits the links of [report] and hands the next url of the task's host to the scheduler.
    ///
    /// If the lease of [task] was already reaped only the links are admitted.
    pub async fn complete(&self, task: &CrawlTask, report: CrawlReport) -> Completion {
        let links = report.extracted.len();
        let mut accepted = 0usize;
        for link in report.extracted {
            if self
                .admit(task.host, task.seed_distance, link.url, link.stats)
                .await
                .is_accepted()
            {
                accepted += 1;
            }
        }
        log::debug!("{}: accepted {accepted} of {links} links.", task.url);

        let released = task
            .lease
            .and_then(|id| self.leases.release(&task.host, id))
            .is_some();
        if !released {
            log::warn!("The lease of {task} expired before it completed.");
            return Completion::LeaseExpired;
        }
        self.active.completed(&task.url);
        let next = self.next_pull_time(report.success, report.time_taken);
        self.schedule_next(task.host, next)
    }

    /// Treats every lease older than the configured timeout as a failed crawl.
    pub fn reap_expired_leases(&self) -> Vec<Lease> {
        let Some(timeout) = self.config.lease_timeout() else {
            return Vec::new();
        };
        let expired = self.leases.take_expired(timeout);
        for lease in &expired {
            log::warn!(
                "The lease {} of {} for {} expired.",
                lease.id,
                lease.host,
                lease.url
            );
            self.active.completed(&lease.url);
            let next = self.next_pull_time(false, Duration::ZERO);
            self.schedule_next(lease.host, next);
        }
        expired
    }

    /// The earliest time [CrawlTask]s of a host may run again after a crawl.
    ///
    /// Successful crawls wait ten times as long as the crawl took plus up to twice the base
    /// delay, failed crawls wait between one and two base delays.
    pub fn next_pull_time(&self, success: bool, time_taken: Duration) -> Instant {
        let base = self.config.base_delay();
        let mut rng = rand::thread_rng();
        let delay = if success {
            time_taken.saturating_mul(10) + jitter(&mut rng, base.saturating_mul(2))
        } else {
            base + jitter(&mut rng, base)
        };
        Instant::now() + delay
    }

    fn schedule_next(&self, host: HostAddress, at: Instant) -> Completion {
        match self.pool.pop_next(&host) {
            PoolPop::Next(entry) => {
                self.scheduler.push(CrawlTask::new(at, host, entry));
                Completion::Rescheduled(at)
            }
            PoolPop::Empty => {
                self.cleanup.push(CleanupRecord::new(at, host));
                Completion::Dormant(at)
            }
            PoolPop::Missing => {
                log::error!("{host} completed a task without a pool slot.");
                Completion::Orphaned
            }
        }
    }
}
