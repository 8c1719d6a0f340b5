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

use crate::config::FrontierConfigError;
use crate::partition::{NodeId, Partitioner};
use crate::seen::{DEFAULT_SEEN_CAPACITY, DEFAULT_SEEN_FALSE_POSITIVE_RATE};
use serde::{Deserialize, Serialize};
use time::Duration;

/// The base delay between two requests to the same host.
pub const DEFAULT_BASE_DELAY: Duration = Duration::seconds(60);
/// Resolved addresses older than this are resolved again.
pub const DEFAULT_DNS_TTL: Duration = Duration::hours(6);
/// Host queues per worker.
pub const DEFAULT_POOL_RATIO: usize = 3;

/// The settings of the frontier of a single crawl node.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename(serialize = "Frontier"))]
#[serde(default)]
pub struct FrontierConfig {
    /// The id of this node. (default: 0)
    pub node: u32,
    /// The number of nodes of the crawl. (default: 1)
    pub nodes: u32,
    /// The number of crawl workers. (default: number of cpus)
    pub workers: usize,
    /// The pool holds `pool_ratio * workers` host queues. (default: 3)
    pub pool_ratio: usize,
    /// The base delay between two requests to the same host. (default: 60s)
    pub base_delay: Duration,
    /// How long a resolved address is trusted. (default: 6h)
    pub dns_ttl: Duration,
    /// The maximum number of cached hostnames.
    pub dns_cache_capacity: u64,
    /// Urls further away from their seed are dropped. None crawls without limit.
    pub max_seed_distance: Option<u32>,
    /// The number of urls the seen filter is sized for.
    pub seen_capacity: u64,
    /// The false positive rate of the seen filter at [FrontierConfig::seen_capacity].
    pub seen_false_positive_rate: f64,
    /// A handed out task that is not completed in time is treated as failed.
    /// None waits forever.
    pub lease_timeout: Option<Duration>,
    /// How long rotation waits before retrying a slot it could not refill.
    pub rotation_backoff: Duration,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            node: 0,
            nodes: 1,
            workers: num_cpus::get(),
            pool_ratio: DEFAULT_POOL_RATIO,
            base_delay: DEFAULT_BASE_DELAY,
            dns_ttl: DEFAULT_DNS_TTL,
            dns_cache_capacity: 100_000,
            max_seed_distance: Some(10),
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            seen_false_positive_rate: DEFAULT_SEEN_FALSE_POSITIVE_RATE,
            lease_timeout: Some(Duration::minutes(10)),
            rotation_backoff: Duration::seconds(1),
        }
    }
}

impl FrontierConfig {
    /// Checks the settings that would otherwise misroute every url.
    pub fn validate(&self) -> Result<(), FrontierConfigError> {
        if self.node >= self.nodes {
            return Err(FrontierConfigError::NodeOutOfRange {
                node: self.node,
                nodes: self.nodes,
            });
        }
        Ok(())
    }

    /// The constant number of host queues.
    pub fn pool_target(&self) -> usize {
        (self.pool_ratio * self.workers).max(1)
    }

    pub fn partitioner(&self) -> Partitioner {
        Partitioner::new(NodeId(self.node), self.nodes)
    }

    pub fn base_delay(&self) -> std::time::Duration {
        self.base_delay.unsigned_abs()
    }

    pub fn dns_ttl(&self) -> std::time::Duration {
        self.dns_ttl.unsigned_abs()
    }

    pub fn lease_timeout(&self) -> Option<std::time::Duration> {
        self.lease_timeout.map(|value| value.unsigned_abs())
    }

    pub fn rotation_backoff(&self) -> std::time::Duration {
        self.rotation_backoff.unsigned_abs()
    }

    /// Returns true if an url at [seed_distance] may still be crawled.
    pub fn allows_seed_distance(&self, seed_distance: u32) -> bool {
        self.max_seed_distance
            .map_or(true, |max| seed_distance <= max)
    }
}
