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

use crate::address::AddressResolver;
use crate::fetch::Fetcher;
use crate::frontier::Frontier;
use crate::runtime::ShutdownReceiver;
use crate::transport::ForeignUrlSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// How often the maintenance loop reaps leases and logs the frontier stats.
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(5);

/// Crawls tasks until [shutdown] is triggered. Returns the number of completed tasks.
///
/// A fetch interrupted by the shutdown stays leased and is part of the next dump.
pub async fn run_worker<R, S, F, D>(
    worker: usize,
    frontier: Arc<Frontier<R, S>>,
    fetcher: Arc<F>,
    shutdown: D,
) -> usize
where
    R: AddressResolver,
    S: ForeignUrlSink,
    F: Fetcher,
    D: ShutdownReceiver,
{
    log::info!("Worker {worker} started.");
    let mut completed = 0usize;
    loop {
        let task = tokio::select! {
            _ = shutdown.wait() => break,
            task = frontier.get_task() => task,
        };
        log::trace!("Worker {worker}: crawling {task}");
        let report = tokio::select! {
            _ = shutdown.wait() => break,
            report = fetcher.fetch(&task) => report,
        };
        frontier.complete(&task, report).await;
        completed += 1;
    }
    log::info!("Worker {worker} stopped after {completed} tasks.");
    completed
}

/// Rotates the host pool and reaps expired leases until [shutdown] is triggered.
pub async fn run_maintenance<R, S, D>(frontier: Arc<Frontier<R, S>>, shutdown: D)
where
    R: AddressResolver,
    S: ForeignUrlSink,
    D: ShutdownReceiver,
{
    let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            rotation = frontier.rotate_once() => {
                log::trace!("{rotation:?}");
            }
            _ = interval.tick() => {
                let reaped = frontier.reap_expired_leases();
                if !reaped.is_empty() {
                    log::info!("Reaped {} expired leases.", reaped.len());
                }
                log::debug!("{:?}", frontier.stats());
            }
        }
    }
    log::info!("Maintenance stopped.");
}
