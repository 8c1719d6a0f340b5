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

use crate::queue::{CleanupRecord, CrawlTask};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::time::Instant;

/// Something that becomes ready at a point in time.
pub trait Scheduled {
    fn due(&self) -> Instant;
}

impl Scheduled for CrawlTask {
    #[inline]
    fn due(&self) -> Instant {
        self.next_pull_time
    }
}

impl Scheduled for CleanupRecord {
    #[inline]
    fn due(&self) -> Instant {
        self.eligible_at
    }
}

#[derive(Debug)]
struct Slot<T> {
    due: Instant,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// A multi producer, multi consumer priority queue ordered by [Scheduled::due].
///
/// [TimedQueue::pop] waits until the earliest element is due. Elements with the same due
/// time leave the queue in insertion order.
#[derive(Debug)]
pub struct TimedQueue<T> {
    heap: Mutex<BinaryHeap<Reverse<Slot<T>>>>,
    seq: AtomicU64,
    notify: Notify,
}

impl<T: Scheduled> TimedQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            seq: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<BinaryHeap<Reverse<Slot<T>>>> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: T) {
        let slot = Slot {
            due: item.due(),
            seq: self.seq.fetch_add(1, AtomicOrdering::Relaxed),
            item,
        };
        self.lock().push(Reverse(slot));
        self.notify.notify_waiters();
    }

    /// Removes the earliest element if it is due.
    pub fn try_pop_due(&self) -> Option<T> {
        let mut heap = self.lock();
        match heap.peek().map(|Reverse(slot)| slot.due) {
            Some(due) if due <= Instant::now() => heap.pop().map(|Reverse(slot)| slot.item),
            _ => None,
        }
    }

    /// Waits until the earliest element is due and removes it.
    /// Cancelling the returned future never loses an element.
    pub async fn pop(&self) -> T {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_due = {
                let mut heap = self.lock();
                let now = Instant::now();
                match heap.peek().map(|Reverse(slot)| slot.due) {
                    Some(due) if due <= now => {
                        if let Some(Reverse(slot)) = heap.pop() {
                            return slot.item;
                        }
                        None
                    }
                    other => other,
                }
            };

            match next_due {
                Some(due) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(due) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies all elements, earliest first.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        let heap = self.lock();
        let mut slots: Vec<_> = heap.iter().map(|Reverse(slot)| slot).collect();
        slots.sort_unstable();
        slots.into_iter().map(|slot| slot.item.clone()).collect()
    }
}

impl<T: Scheduled> Default for TimedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
