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

mod errors;
mod http;
mod links;

pub use errors::FetchError;
pub use http::HttpFetcher;
pub use links::extract_links;

use crate::frontier::CrawlReport;
use crate::queue::CrawlTask;
use std::future::Future;

/// Crawls the url of a [CrawlTask].
///
/// A fetcher never fails, errors are reported as an unsuccessful [CrawlReport].
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, task: &CrawlTask) -> impl Future<Output = CrawlReport> + Send;
}
