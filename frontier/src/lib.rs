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

//! A polite, partitioned url frontier.
//!
//! The [Frontier] decides which url a crawl worker fetches next. It keeps a fixed pool of
//! per-host queues, spaces out requests against the same host, deduplicates discovered links
//! with a persistent bloom filter and hands urls owned by other crawl nodes to a [ForeignUrlSink].

pub mod address;
pub mod app;
pub mod config;
pub mod fetch;
pub mod frontier;
pub mod partition;
pub mod queue;
pub mod runtime;
pub mod seen;
pub mod transport;
pub mod url;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_impls;

pub use frontier::Frontier;
pub use transport::ForeignUrlSink;
