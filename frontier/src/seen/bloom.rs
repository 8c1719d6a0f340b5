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

use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use twox_hash::XxHash64;

/// The dimensions of a bloom filter.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomShape {
    pub capacity: u64,
    pub false_positive_rate: f64,
    pub bit_count: u64,
    pub hashes: u32,
}

impl BloomShape {
    /// Calculates the optimal number of bits and hashes for [capacity] elements
    /// with a probability of [false_positive_rate] for a false positive.
    pub fn optimal(capacity: u64, false_positive_rate: f64) -> Self {
        let capacity = capacity.max(1);
        let false_positive_rate = false_positive_rate.clamp(f64::MIN_POSITIVE, 0.5);
        let ln2 = std::f64::consts::LN_2;
        let bits = (-(capacity as f64) * false_positive_rate.ln() / (ln2 * ln2)).ceil();
        let bit_count = (bits as u64).max(64);
        let hashes = ((bit_count as f64 / capacity as f64) * ln2).round().max(1.0) as u32;
        Self {
            capacity,
            false_positive_rate,
            bit_count,
            hashes,
        }
    }

    pub fn words(&self) -> usize {
        self.bit_count.div_ceil(64) as usize
    }
}

/// A bloom filter that can be shared between threads without a lock.
/// Bits are only ever set, never cleared.
#[derive(Debug)]
pub struct AtomicBloom {
    shape: BloomShape,
    words: Box<[AtomicU64]>,
    inserted: AtomicU64,
}

impl AtomicBloom {
    pub fn new(shape: BloomShape) -> Self {
        Self {
            words: (0..shape.words()).map(|_| AtomicU64::new(0)).collect(),
            shape,
            inserted: AtomicU64::new(0),
        }
    }

    /// Recreates a filter from stored words. Returns None if the words do not fit the shape
    /// or the shape has no bits or hashes.
    pub fn from_words(shape: BloomShape, words: Vec<u64>, inserted: u64) -> Option<Self> {
        if shape.bit_count == 0 || shape.hashes == 0 || words.len() != shape.words() {
            return None;
        }
        Some(Self {
            shape,
            words: words.into_iter().map(AtomicU64::new).collect(),
            inserted: AtomicU64::new(inserted),
        })
    }

    pub fn contains(&self, data: &[u8]) -> bool {
        self.indices(data).all(|idx| {
            let (word, mask) = Self::position(idx);
            self.words[word].load(Ordering::Acquire) & mask != 0
        })
    }

    /// Sets all bits of [data]. Returns false if every bit was already set.
    pub fn insert(&self, data: &[u8]) -> bool {
        let mut changed = false;
        for idx in self.indices(data) {
            let (word, mask) = Self::position(idx);
            if self.words[word].fetch_or(mask, Ordering::AcqRel) & mask == 0 {
                changed = true;
            }
        }
        if changed {
            self.inserted.fetch_add(1, Ordering::Relaxed);
        }
        changed
    }

    pub fn shape(&self) -> &BloomShape {
        &self.shape
    }

    /// The number of inserts that changed the filter.
    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Vec<u64> {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Acquire))
            .collect()
    }

    #[inline]
    fn position(idx: u64) -> (usize, u64) {
        ((idx / 64) as usize, 1u64 << (idx % 64))
    }

    /// Double hashing, see Kirsch & Mitzenmacher.
    fn indices(&self, data: &[u8]) -> impl Iterator<Item = u64> {
        let h1 = hash_with_seed(data, 0);
        let h2 = hash_with_seed(data, 0x9e37_79b1_85eb_ca87) | 1;
        let bit_count = self.shape.bit_count;
        (0..self.shape.hashes as u64)
            .map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % bit_count)
    }
}

fn hash_with_seed(data: &[u8], seed: u64) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    hasher.write(data);
    hasher.finish()
}
