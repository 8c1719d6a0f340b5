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
use crate::frontier::Frontier;
use crate::queue::{CleanupRecord, CrawlTask, OverflowRecord, PoolPop};
use crate::transport::ForeignUrlSink;
use tokio::time::Instant;

/// The result of processing one [CleanupRecord].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Rotation {
    /// The retired host was replaced by a host from the overflow queue.
    Promoted {
        retired: HostAddress,
        promoted: HostAddress,
    },
    /// The host queue received urls while it waited and is scheduled again.
    Resumed(HostAddress),
    /// No overflow host could be promoted, the slot is retried later.
    Deferred(HostAddress),
    /// The record referenced a host without a pool slot.
    Stale(HostAddress),
}

impl<R: AddressResolver, S: ForeignUrlSink> Frontier<R, S> {
    /// Waits for the next due [CleanupRecord] and rotates its pool slot.
    pub async fn rotate_once(&self) -> Rotation {
        let record = self.cleanup.pop().await;
        self.rotate(record)
    }

    /// Retires the empty host queue of [record] and fills the freed slot with the first
    /// overflow host that has no slot yet.
    pub fn rotate(&self, record: CleanupRecord) -> Rotation {
        let retired = record.host;
        if !self.pool.remove_if_empty(&retired) {
            return match self.pool.pop_next(&retired) {
                PoolPop::Next(entry) => {
                    log::debug!("{retired} got new urls while waiting for cleanup.");
                    self.scheduler
                        .push(CrawlTask::new(record.eligible_at, retired, entry));
                    Rotation::Resumed(retired)
                }
                PoolPop::Empty => {
                    self.cleanup
                        .push(CleanupRecord::new(Instant::now(), retired));
                    Rotation::Deferred(retired)
                }
                PoolPop::Missing => {
                    log::warn!("Cleanup for {retired} which has no pool slot.");
                    Rotation::Stale(retired)
                }
            };
        }

        if let Some(candidate) = self.take_promotable() {
            let (promoted, entry) = candidate.into_entry();
            if self.pool.create(promoted, Vec::new()) {
                log::debug!("Rotated {retired} out for {promoted}.");
                self.scheduler
                    .push(CrawlTask::new(Instant::now(), promoted, entry));
                return Rotation::Promoted { retired, promoted };
            }
            self.overflow.push(OverflowRecord::new(promoted, entry));
        }

        let retry_at = Instant::now() + self.config.rotation_backoff();
        self.pool.create(retired, Vec::new());
        self.cleanup.push(CleanupRecord::new(retry_at, retired));
        log::trace!("Nothing to promote for {retired}, retrying later.");
        Rotation::Deferred(retired)
    }

    /// Pops overflow records until one names a host without a pool slot.
    /// Skipped records are requeued, every record is inspected at most once.
    fn take_promotable(&self) -> Option<OverflowRecord> {
        for _ in 0..self.overflow.len() {
            let record = self.overflow.pop()?;
            if self.pool.contains(&record.host) {
                self.overflow.push(record);
            } else {
                return Some(record);
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::Rotation;
    use crate::address::HostAddress;
    use crate::queue::{CleanupRecord, HostEntry, OverflowRecord};
    use crate::test_impls::{address, test_frontier, url, TestFrontier};
    use std::time::Duration;
    use tokio::time::Instant;

    fn frontier() -> (tempfile::TempDir, TestFrontier) {
        test_frontier(|config| {
            config.workers = 1;
            config.pool_ratio = 2;
            config.rotation_backoff = time::Duration::seconds(1);
        })
    }

    fn overflow(frontier: &TestFrontier, ip: [u8; 4], value: &str) {
        frontier.overflow().push(OverflowRecord::new(
            address(ip),
            HostEntry::seed(url(value)),
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_hosts_are_replaced_from_the_overflow() {
        let (_dir, frontier) = frontier();
        let retired = address([10, 0, 0, 1]);
        let busy = address([10, 0, 0, 2]);
        frontier.pool().create(retired, Vec::new());
        frontier.pool().create(busy, Vec::new());
        overflow(&frontier, [10, 0, 0, 2], "https://www.test2.de/a");
        overflow(&frontier, [10, 0, 0, 3], "https://www.test3.de");
        frontier
            .cleanup()
            .push(CleanupRecord::new(Instant::now(), retired));

        let rotation = frontier.rotate_once().await;
        let promoted = address([10, 0, 0, 3]);
        assert_eq!(Rotation::Promoted { retired, promoted }, rotation);
        assert!(!frontier.pool().contains(&retired));
        assert!(frontier.pool().contains(&promoted));
        assert_eq!(2, frontier.pool().len());
        assert_eq!(promoted, frontier.scheduler().snapshot()[0].host);
        let remaining = frontier.overflow().snapshot();
        assert_eq!(1, remaining.len());
        assert_eq!(busy, remaining[0].host);
    }

    #[tokio::test(start_paused = true)]
    async fn rotation_without_candidates_is_deferred() {
        let (_dir, frontier) = frontier();
        let retired = address([10, 0, 0, 1]);
        frontier.pool().create(retired, Vec::new());
        frontier.pool().create(address([10, 0, 0, 2]), Vec::new());
        overflow(&frontier, [10, 0, 0, 2], "https://www.test2.de/a");
        frontier
            .cleanup()
            .push(CleanupRecord::new(Instant::now(), retired));

        assert_eq!(Rotation::Deferred(retired), frontier.rotate_once().await);
        assert!(frontier.pool().contains(&retired));
        assert_eq!(1, frontier.overflow().len());
        let retry = frontier.cleanup().snapshot();
        assert_eq!(1, retry.len());
        assert!(retry[0].eligible_at >= Instant::now() + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn refilled_hosts_are_resumed() {
        let (_dir, frontier) = frontier();
        let host = address([10, 0, 0, 1]);
        frontier.pool().create(host, Vec::new());
        frontier
            .pool()
            .append(&host, HostEntry::seed(url("https://www.test1.de/a")))
            .unwrap();
        frontier
            .cleanup()
            .push(CleanupRecord::new(Instant::now(), host));

        assert_eq!(Rotation::Resumed(host), frontier.rotate_once().await);
        assert!(frontier.pool().contains(&host));
        assert_eq!(Some(0), frontier.pool().queued(&host));
        assert_eq!(1, frontier.scheduler().len());
    }

    #[tokio::test(start_paused = true)]
    async fn vacant_slots_are_filled() {
        let (_dir, frontier) = frontier();
        let vacant = HostAddress::vacant(0);
        frontier.pool().create(vacant, Vec::new());
        frontier
            .cleanup()
            .push(CleanupRecord::new(Instant::now(), vacant));
        overflow(&frontier, [10, 0, 0, 5], "https://www.test5.de");

        let rotation = frontier.rotate_once().await;
        assert_eq!(
            Rotation::Promoted {
                retired: vacant,
                promoted: address([10, 0, 0, 5])
            },
            rotation
        );
        assert!(frontier.pool().live_hosts().contains(&address([10, 0, 0, 5])));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_records_are_ignored() {
        let (_dir, frontier) = frontier();
        let host = address([10, 0, 0, 1]);
        assert_eq!(Rotation::Stale(host), frontier.rotate(CleanupRecord::new(Instant::now(), host)));
        assert!(frontier.pool().is_empty());
    }
}
