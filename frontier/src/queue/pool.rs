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
use crate::queue::HostEntry;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::VecDeque;

/// The result of taking the next url of a host queue.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PoolPop {
    Next(HostEntry),
    /// The host holds a slot but has no urls left.
    Empty,
    /// The host holds no slot.
    Missing,
}

/// The fixed size pool of per-host queues.
///
/// Only one worker touches a host queue at a time, the map itself is sharded so
/// workers can append to different hosts concurrently.
#[derive(Debug)]
pub struct HostQueuePool {
    target: usize,
    queues: DashMap<HostAddress, VecDeque<HostEntry>>,
}

impl HostQueuePool {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            queues: DashMap::with_capacity(target),
        }
    }

    /// The number of slots the pool is kept at.
    pub fn target(&self) -> usize {
        self.target
    }

    /// The number of occupied slots.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Returns true if there are fewer occupied slots than [HostQueuePool::target].
    pub fn has_free_slot(&self) -> bool {
        self.len() < self.target
    }

    pub fn contains(&self, host: &HostAddress) -> bool {
        self.queues.contains_key(host)
    }

    /// Gives [host] a slot. Returns false if it already has one.
    pub fn create(&self, host: HostAddress, entries: impl IntoIterator<Item = HostEntry>) -> bool {
        match self.queues.entry(host) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(entries.into_iter().collect());
                true
            }
        }
    }

    /// Removes the slot of [host] if its queue is empty.
    /// Returns false if the host is missing or still has urls.
    pub fn remove_if_empty(&self, host: &HostAddress) -> bool {
        self.queues
            .remove_if(host, |_, queue| queue.is_empty())
            .is_some()
    }

    /// Appends [entry] to the queue of [host]. Gives the entry back if the host has no slot.
    pub fn append(&self, host: &HostAddress, entry: HostEntry) -> Result<(), HostEntry> {
        match self.queues.get_mut(host) {
            Some(mut queue) => {
                queue.push_back(entry);
                Ok(())
            }
            None => Err(entry),
        }
    }

    /// Takes the next url of [host].
    pub fn pop_next(&self, host: &HostAddress) -> PoolPop {
        match self.queues.get_mut(host) {
            Some(mut queue) => match queue.pop_front() {
                Some(entry) => PoolPop::Next(entry),
                None => PoolPop::Empty,
            },
            None => PoolPop::Missing,
        }
    }

    /// The number of queued urls of [host].
    pub fn queued(&self, host: &HostAddress) -> Option<usize> {
        self.queues.get(host).map(|queue| queue.len())
    }

    /// All hosts with a slot, except vacant ones.
    pub fn live_hosts(&self) -> Vec<HostAddress> {
        self.queues
            .iter()
            .map(|entry| *entry.key())
            .filter(|host| !host.is_vacant())
            .collect()
    }

    /// The number of urls in all queues.
    pub fn pending(&self) -> usize {
        self.queues.iter().map(|entry| entry.value().len()).sum()
    }

    /// Copies every queued url.
    pub fn snapshot(&self) -> Vec<(HostAddress, Vec<HostEntry>)> {
        self.queues
            .iter()
            .map(|entry| (*entry.key(), entry.value().iter().cloned().collect()))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::{HostQueuePool, PoolPop};
    use crate::address::HostAddress;
    use crate::queue::HostEntry;
    use crate::url::NormalizedUrl;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    fn host(last: u8) -> HostAddress {
        HostAddress::from(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)))
    }

    fn entry(value: &str) -> HostEntry {
        HostEntry::seed(NormalizedUrl::parse(value).unwrap())
    }

    #[test]
    fn queues_are_fifo() {
        let pool = HostQueuePool::new(2);
        assert!(pool.create(host(1), [entry("https://www.test1.de/a")]));
        assert!(!pool.create(host(1), Vec::new()));
        pool.append(&host(1), entry("https://www.test1.de/b")).unwrap();
        assert_eq!(PoolPop::Next(entry("https://www.test1.de/a")), pool.pop_next(&host(1)));
        assert_eq!(PoolPop::Next(entry("https://www.test1.de/b")), pool.pop_next(&host(1)));
        assert_eq!(PoolPop::Empty, pool.pop_next(&host(1)));
        assert_eq!(PoolPop::Missing, pool.pop_next(&host(2)));
    }

    #[test]
    fn appending_to_a_missing_host_returns_the_entry() {
        let pool = HostQueuePool::new(1);
        let rejected = pool.append(&host(3), entry("https://www.test3.de")).unwrap_err();
        assert_eq!(entry("https://www.test3.de"), rejected);
    }

    #[test]
    fn only_empty_queues_are_removed() {
        let pool = HostQueuePool::new(2);
        pool.create(host(1), [entry("https://www.test1.de")]);
        pool.create(HostAddress::vacant(0), Vec::new());
        assert!(!pool.remove_if_empty(&host(1)));
        assert!(pool.remove_if_empty(&HostAddress::vacant(0)));
        assert_eq!(vec![host(1)], pool.live_hosts());
        assert_eq!(1, pool.len());
        assert!(pool.has_free_slot());
    }

    #[test]
    fn concurrent_appends_to_different_hosts() {
        let pool = Arc::new(HostQueuePool::new(8));
        for i in 0..8 {
            pool.create(host(i), Vec::new());
        }
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for page in 0..250 {
                        pool.append(&host(i), entry(&format!("https://www.test{i}.de/{page}")))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(2000, pool.pending());
        for i in 0..8 {
            assert_eq!(Some(250), pool.queued(&host(i)));
        }
    }
}
