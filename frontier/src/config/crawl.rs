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
use time::Duration;

/// The settings of the http fetcher.
#[derive(Debug, Clone, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename(serialize = "Crawl"))]
#[serde(default)]
pub struct CrawlConfig {
    /// The user agent sent with every request.
    pub user_agent: String,
    /// Timeout of a single request, including the body. (default: 30s)
    pub request_timeout: Option<Duration>,
    /// Respect the nofollow attribute during the link extraction (default: true)
    pub respect_nofollow: bool,
    /// Accept invalid certificates (default: false)
    pub accept_invalid_certs: bool,
    /// The maximum number of redirects followed per request (default: 5)
    pub redirect_limit: usize,
}

impl CrawlConfig {
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            request_timeout: Some(Duration::seconds(30)),
            respect_nofollow: true,
            accept_invalid_certs: false,
            redirect_limit: 5,
        }
    }
}
