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
use crate::partition::NodeId;
use crate::queue::{HostEntry, OverflowRecord, PageStats, SeedDistance};
use crate::transport::ForeignUrlSink;
use crate::url::NormalizedUrl;

/// What happened to a discovered url.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Admission {
    /// Appended to the host queue of the referring page.
    Appended(HostAddress),
    /// Put into the overflow queue, the host has no pool slot yet.
    Overflowed(HostAddress),
    /// Handed to the node owning the host.
    Forwarded(NodeId),
    /// Already seen.
    Duplicate,
    /// The host could not be resolved.
    Unresolved,
    /// Too many hops away from its seed.
    TooDistant,
    /// The url has no host.
    Invalid,
}

impl Admission {
    /// True if the url was accepted by this node.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Appended(_) | Admission::Overflowed(_))
    }
}

impl<R: AddressResolver, S: ForeignUrlSink> Frontier<R, S> {
    /// Routes [url], found on a page of [referrer], to its host queue, the overflow queue
    /// or the node owning it.
    ///
    /// Links to the referring host keep the seed distance of the referrer, links to any other
    /// host are one hop further away.
    pub async fn admit(
        &self,
        referrer: HostAddress,
        referrer_distance: SeedDistance,
        url: NormalizedUrl,
        stats: PageStats,
    ) -> Admission {
        if self.seen.seen(&url) {
            return Admission::Duplicate;
        }
        let Some(hostname) = url.hostname() else {
            log::debug!("{url} has no hostname.");
            return Admission::Invalid;
        };
        let host = match self.addresses.resolve(&hostname).await {
            Resolution::Resolved(host) => host,
            Resolution::Unresolved => {
                log::debug!("Dropping {url}, {hostname} does not resolve.");
                return Admission::Unresolved;
            }
        };

        if host == referrer {
            if !self.seen.mark(&url) {
                return Admission::Duplicate;
            }
            self.active.admitted(&url);
            return match self.pool.append(&host, HostEntry::new(url, stats, referrer_distance)) {
                Ok(()) => Admission::Appended(host),
                Err(entry) => {
                    log::debug!("{host} lost its pool slot, overflowing {}.", entry.url);
                    self.overflow.push(OverflowRecord::new(host, entry));
                    Admission::Overflowed(host)
                }
            };
        }

        let seed_distance = referrer_distance.saturating_add(1);
        if !self.config.allows_seed_distance(seed_distance) {
            log::trace!("Dropping {url}, it is {seed_distance} hops away from its seed.");
            return Admission::TooDistant;
        }
        if !self.partitioner.is_local(&host) {
            let owner = self.partitioner.owner(&host);
            self.sink.send(owner, url).await;
            return Admission::Forwarded(owner);
        }
        if !self.seen.mark(&url) {
            return Admission::Duplicate;
        }
        self.active.admitted(&url);
        self.overflow
            .push(OverflowRecord::new(host, HostEntry::new(url, stats, seed_distance)));
        Admission::Overflowed(host)
    }
}

#[cfg(test)]
mod test {
    use super::Admission;
    use crate::partition::NodeId;
    use crate::queue::PageStats;
    use crate::test_impls::{address, test_frontier, url, TestFrontier};

    async fn frontier() -> (tempfile::TempDir, TestFrontier) {
        let (dir, frontier) = test_frontier(|config| config.max_seed_distance = Some(2));
        frontier.resolver().insert("www.test1.de", [10, 0, 0, 1]);
        frontier.resolver().insert("test1.de", [10, 0, 0, 1]);
        frontier.resolver().insert("www.test2.de", [10, 0, 0, 2]);
        frontier.pool().create(address([10, 0, 0, 1]), Vec::new());
        (dir, frontier)
    }

    #[tokio::test(start_paused = true)]
    async fn same_host_links_are_appended() {
        let (_dir, frontier) = frontier().await;
        let host = address([10, 0, 0, 1]);
        let admission = frontier
            .admit(host, 1, url("https://test1.de/a"), PageStats::default())
            .await;
        assert_eq!(Admission::Appended(host), admission);
        assert_eq!(Some(1), frontier.pool().queued(&host));
        assert!(frontier.seen().seen(&url("https://test1.de/a")));
        assert_eq!(1, frontier.active().total());

        let snapshot = frontier.pool().snapshot();
        assert_eq!(1, snapshot[0].1[0].seed_distance);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicates_are_dropped() {
        let (_dir, frontier) = frontier().await;
        let host = address([10, 0, 0, 1]);
        let target = url("https://www.test1.de/a#section");
        assert!(frontier
            .admit(host, 0, target.clone(), PageStats::default())
            .await
            .is_accepted());
        assert_eq!(
            Admission::Duplicate,
            frontier
                .admit(host, 0, url("https://www.test1.de/a/"), PageStats::default())
                .await
        );
        assert_eq!(Some(1), frontier.pool().queued(&host));
    }

    #[tokio::test(start_paused = true)]
    async fn other_hosts_are_overflowed_one_hop_further() {
        let (_dir, frontier) = frontier().await;
        let admission = frontier
            .admit(
                address([10, 0, 0, 1]),
                1,
                url("https://www.test2.de/"),
                PageStats::default(),
            )
            .await;
        assert_eq!(Admission::Overflowed(address([10, 0, 0, 2])), admission);
        let overflow = frontier.overflow().snapshot();
        assert_eq!(1, overflow.len());
        assert_eq!(2, overflow[0].seed_distance);
    }

    #[tokio::test(start_paused = true)]
    async fn distant_links_are_not_marked() {
        let (_dir, frontier) = frontier().await;
        let target = url("https://www.test2.de/far");
        assert_eq!(
            Admission::TooDistant,
            frontier
                .admit(address([10, 0, 0, 1]), 2, target.clone(), PageStats::default())
                .await
        );
        assert!(!frontier.seen().seen(&target));
        assert!(frontier.overflow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn distance_is_kept_on_the_same_host() {
        let (_dir, frontier) = frontier().await;
        let host = address([10, 0, 0, 1]);
        assert_eq!(
            Admission::Appended(host),
            frontier
                .admit(host, 2, url("https://www.test1.de/deep"), PageStats::default())
                .await
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_hosts_are_dropped() {
        let (_dir, frontier) = frontier().await;
        let target = url("https://unknown.test/");
        assert_eq!(
            Admission::Unresolved,
            frontier
                .admit(address([10, 0, 0, 1]), 0, target.clone(), PageStats::default())
                .await
        );
        assert!(!frontier.seen().seen(&target));
        assert_eq!(0, frontier.active().total());
    }

    #[tokio::test(start_paused = true)]
    async fn foreign_hosts_are_forwarded_unmarked() {
        let (_dir, frontier) = test_frontier(|config| {
            config.node = 0;
            config.nodes = 2;
        });
        let foreign = (1..=u8::MAX)
            .map(|last| address([10, 0, 1, last]))
            .find(|host| !frontier.partitioner().is_local(host))
            .unwrap();
        frontier.resolver().insert("www.foreign.de", foreign.ip());
        let target = url("https://www.foreign.de/");
        assert_eq!(
            Admission::Forwarded(NodeId(1)),
            frontier
                .admit(address([10, 0, 0, 9]), 0, target.clone(), PageStats::default())
                .await
        );
        assert_eq!(vec![(NodeId(1), target.clone())], frontier.sink().received());
        assert!(!frontier.seen().seen(&target));
        assert!(frontier.overflow().is_empty());
    }
}
