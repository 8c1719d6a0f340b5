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

//! In-memory stand-ins for the network facing parts of the frontier.

use crate::address::{AddressResolver, HostAddress, Resolution};
use crate::config::FrontierConfig;
use crate::fetch::Fetcher;
use crate::frontier::{CrawlReport, ExtractedLink, Frontier};
use crate::partition::NodeId;
use crate::queue::{CrawlTask, PageStats};
use crate::seen::SeenFilter;
use crate::transport::ForeignUrlSink;
use crate::url::NormalizedUrl;
use camino::Utf8PathBuf;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub type TestFrontier = Frontier<StaticResolver, RecordingSink>;

pub fn address(ip: [u8; 4]) -> HostAddress {
    HostAddress::from(IpAddr::from(ip))
}

pub fn url(value: &str) -> NormalizedUrl {
    NormalizedUrl::parse(value).unwrap()
}

/// A frontier with a small seen filter inside a temporary directory.
pub fn test_frontier(configure: impl FnOnce(&mut FrontierConfig)) -> (tempfile::TempDir, TestFrontier) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let mut config = FrontierConfig {
        seen_capacity: 1000,
        seen_false_positive_rate: 0.001,
        ..FrontierConfig::default()
    };
    configure(&mut config);
    let (seen, _) = SeenFilter::open(
        root.join("seen.bloom"),
        config.seen_capacity,
        config.seen_false_positive_rate,
    )
    .unwrap();
    let frontier = Frontier::new(
        config,
        seen,
        StaticResolver::default(),
        RecordingSink::default(),
        root.join("frontier.dump"),
    );
    (dir, frontier)
}

/// Resolves hostnames from a fixed table and counts the lookups.
#[derive(Debug, Default)]
pub struct StaticResolver {
    table: Mutex<HashMap<String, HostAddress>>,
    lookups: Mutex<HashMap<String, usize>>,
}

impl StaticResolver {
    pub fn insert(&self, hostname: &str, ip: impl Into<IpAddr>) {
        self.table
            .lock()
            .unwrap()
            .insert(hostname.to_string(), HostAddress::from(ip.into()));
    }

    pub fn remove(&self, hostname: &str) {
        self.table.lock().unwrap().remove(hostname);
    }

    pub fn lookups(&self, hostname: &str) -> usize {
        self.lookups
            .lock()
            .unwrap()
            .get(hostname)
            .copied()
            .unwrap_or(0)
    }
}

impl AddressResolver for StaticResolver {
    async fn lookup(&self, hostname: &str) -> Resolution {
        *self
            .lookups
            .lock()
            .unwrap()
            .entry(hostname.to_string())
            .or_insert(0) += 1;
        match self.table.lock().unwrap().get(hostname) {
            Some(address) => Resolution::Resolved(*address),
            None => Resolution::Unresolved,
        }
    }
}

/// Remembers every url handed to another node.
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<(NodeId, NormalizedUrl)>>,
}

impl RecordingSink {
    pub fn received(&self) -> Vec<(NodeId, NormalizedUrl)> {
        self.received.lock().unwrap().clone()
    }
}

impl ForeignUrlSink for RecordingSink {
    async fn send(&self, node: NodeId, url: NormalizedUrl) {
        self.received.lock().unwrap().push((node, url));
    }
}

/// Serves fixed link lists. Unknown urls fail.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    pages: Mutex<HashMap<NormalizedUrl, Vec<NormalizedUrl>>>,
    fetched: Mutex<Vec<(NormalizedUrl, Instant)>>,
}

impl ScriptedFetcher {
    pub const TIME_TAKEN: Duration = Duration::from_millis(100);

    pub fn page(&self, page: &str, links: &[&str]) {
        self.pages
            .lock()
            .unwrap()
            .insert(url(page), links.iter().map(|value| url(value)).collect());
    }

    pub fn fetched(&self) -> Vec<NormalizedUrl> {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// The start times of all fetches of urls on [hostname].
    pub fn fetch_times(&self, hostname: &str) -> Vec<Instant> {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.hostname().as_deref() == Some(hostname))
            .map(|(_, at)| *at)
            .collect()
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, task: &CrawlTask) -> CrawlReport {
        self.fetched
            .lock()
            .unwrap()
            .push((task.url.clone(), Instant::now()));
        let links = self.pages.lock().unwrap().get(&task.url).cloned();
        match links {
            Some(links) => {
                let stats = PageStats {
                    status: Some(200),
                    content_length: Some(1024),
                    out_links: links.len() as u32,
                };
                CrawlReport::succeeded(
                    Self::TIME_TAKEN,
                    links
                        .into_iter()
                        .map(|link| ExtractedLink::new(link, stats.clone()))
                        .collect(),
                )
            }
            None => CrawlReport::failed(Self::TIME_TAKEN),
        }
    }
}
