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

use crate::url::NormalizedUrl;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts the urls that were accepted by this node and are not yet completed.
///
/// Seeds bypass the seen filter, so an url seeded again while it is still queued is
/// counted twice. Hence a multiset.
#[derive(Debug, Default)]
pub struct ActiveCounter {
    urls: DashMap<NormalizedUrl, usize>,
    total: AtomicUsize,
}

impl ActiveCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admitted(&self, url: &NormalizedUrl) {
        *self.urls.entry(url.clone()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns false if [url] was not active.
    pub fn completed(&self, url: &NormalizedUrl) -> bool {
        let mut decremented = false;
        self.urls.remove_if_mut(url, |_, count| {
            *count -= 1;
            decremented = true;
            *count == 0
        });
        if decremented {
            self.total.fetch_sub(1, Ordering::AcqRel);
        } else {
            log::warn!("Completed {url} which was never admitted.");
        }
        decremented
    }

    pub fn count(&self, url: &NormalizedUrl) -> usize {
        self.urls.get(url).map_or(0, |value| *value)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
