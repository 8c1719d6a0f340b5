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
use crate::url::NormalizedUrl;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tokio::time::Instant;

/// Link-hop count between an url and its seed, only counting hops onto another host.
pub type SeedDistance = u32;

/// What is known about the page an url was found on.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PageStats {
    /// The http status of the parent page.
    pub status: Option<u16>,
    /// The size of the parent page in bytes.
    pub content_length: Option<u64>,
    /// The number of links extracted from the parent page.
    pub out_links: u32,
}

/// An url waiting in a host queue.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HostEntry {
    pub url: NormalizedUrl,
    pub stats: PageStats,
    pub seed_distance: SeedDistance,
}

impl HostEntry {
    pub fn new(url: NormalizedUrl, stats: PageStats, seed_distance: SeedDistance) -> Self {
        Self {
            url,
            stats,
            seed_distance,
        }
    }

    /// An entry for a seed url.
    pub fn seed(url: NormalizedUrl) -> Self {
        Self::new(url, PageStats::default(), 0)
    }
}

/// The id of a handed out [CrawlTask].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaseId(pub u64);

impl Display for LeaseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "lease#{}", self.0)
    }
}

/// The permission to crawl [CrawlTask::url] once [CrawlTask::next_pull_time] is reached.
/// There is at most one task per host at any time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CrawlTask {
    pub next_pull_time: Instant,
    pub host: HostAddress,
    pub url: NormalizedUrl,
    pub stats: PageStats,
    pub seed_distance: SeedDistance,
    /// Set when the task is handed to a worker.
    pub lease: Option<LeaseId>,
}

impl CrawlTask {
    pub fn new(next_pull_time: Instant, host: HostAddress, entry: HostEntry) -> Self {
        Self {
            next_pull_time,
            host,
            url: entry.url,
            stats: entry.stats,
            seed_distance: entry.seed_distance,
            lease: None,
        }
    }
}

impl Display for CrawlTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CrawlTask(host: {}, url: {}, seed_distance: {})",
            self.host, self.url, self.seed_distance
        )
    }
}

/// An url of a host without a pool slot.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OverflowRecord {
    pub host: HostAddress,
    pub url: NormalizedUrl,
    pub stats: PageStats,
    pub seed_distance: SeedDistance,
}

impl OverflowRecord {
    pub fn new(host: HostAddress, entry: HostEntry) -> Self {
        Self {
            host,
            url: entry.url,
            stats: entry.stats,
            seed_distance: entry.seed_distance,
        }
    }

    pub fn into_entry(self) -> (HostAddress, HostEntry) {
        (
            self.host,
            HostEntry::new(self.url, self.stats, self.seed_distance),
        )
    }
}

/// Marks an empty host queue for deletion once [CleanupRecord::eligible_at] is reached.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CleanupRecord {
    pub eligible_at: Instant,
    pub host: HostAddress,
}

impl CleanupRecord {
    pub fn new(eligible_at: Instant, host: HostAddress) -> Self {
        Self { eligible_at, host }
    }
}
