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

use crate::config::CrawlConfig;
use crate::fetch::{extract_links, FetchError, Fetcher};
use crate::frontier::{CrawlReport, ExtractedLink};
use crate::queue::{CrawlTask, PageStats};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::Instant;

/// Fetches pages over http and extracts the links of html documents.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    respect_nofollow: bool,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let mut client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .tcp_keepalive(Duration::from_millis(500))
            .redirect(reqwest::redirect::Policy::limited(config.redirect_limit));
        if let Some(timeout) = config.request_timeout {
            log::trace!("Timeout Set: {}", timeout);
            client = client.timeout(timeout.unsigned_abs());
        }
        Ok(Self {
            client: client.build()?,
            respect_nofollow: config.respect_nofollow,
        })
    }

    async fn download(&self, task: &CrawlTask) -> Result<Vec<ExtractedLink>, FetchError> {
        let response = self.client.get(task.url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        if !is_html(&response) {
            log::trace!("{} is no html document.", task.url);
            return Ok(Vec::new());
        }
        let page = response.url().clone();
        let body = response.text().await?;
        let links = extract_links(&page, &body, self.respect_nofollow);
        let stats = PageStats {
            status: Some(status.as_u16()),
            content_length: Some(body.len() as u64),
            out_links: u32::try_from(links.len()).unwrap_or(u32::MAX),
        };
        Ok(links
            .into_iter()
            .map(|url| ExtractedLink::new(url, stats.clone()))
            .collect())
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(true, |value| value.contains("html"))
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, task: &CrawlTask) -> CrawlReport {
        let started = Instant::now();
        let result = self.download(task).await;
        let time_taken = started.elapsed();
        match result {
            Ok(extracted) => {
                log::debug!(
                    "Fetched {} in {} ms with {} links.",
                    task.url,
                    time_taken.as_millis(),
                    extracted.len()
                );
                CrawlReport::succeeded(time_taken, extracted)
            }
            Err(err) => {
                log::info!("Failed to fetch {}: {err}", task.url);
                CrawlReport::failed(time_taken)
            }
        }
    }
}
