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

mod args;
mod errors;
mod logging;
mod seeds;

pub use args::{consume_args, write_default_config, FrontierArgs, Instruction, RunInstruction, RunMode};
pub use errors::RunError;
pub use logging::configure_logging;
pub use seeds::read_seeds;

use crate::fetch::HttpFetcher;
use crate::frontier::{load_dump, Frontier};
use crate::runtime::GracefulShutdown;
use crate::seen::FilterOpened;
use crate::worker::{run_maintenance, run_worker};
use camino::Utf8Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinSet;

pub fn exec_args(args: FrontierArgs) -> ExitCode {
    match consume_args(args) {
        Ok(Instruction::Run(instruction)) => {
            if let Err(err) = configure_logging(&instruction.configs) {
                eprintln!("Failed to configure the logging: {err}");
                return ExitCode::from(3);
            }
            match execute(instruction) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    log::error!("Failed with: {err:?}");
                    err.into()
                }
            }
        }
        Ok(Instruction::Nothing) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Failed with: {err:?}");
            ExitCode::from(2)
        }
    }
}

/// The urls a run starts with: the pending urls of the last dump or else the seed file.
///
/// The dump stays on disk until the dump of this run replaces it.
fn starting_urls(
    dump_path: &Utf8Path,
    seeds: Option<&Utf8Path>,
    opened: FilterOpened,
) -> Result<Vec<String>, RunError> {
    if let Some(urls) = load_dump(dump_path)? {
        if opened == FilterOpened::CreatedFresh {
            log::warn!("Restarting from {dump_path} without a seen filter, urls may be crawled twice.");
        }
        log::info!("Restarting from {dump_path} with {} urls.", urls.len());
        return Ok(urls);
    }
    let path = seeds.ok_or(RunError::NoSeeds)?;
    read_seeds(path).map_err(|source| RunError::Seeds {
        path: path.to_string(),
        source,
    })
}

/// Runs the frontier until ctrl-c is pressed, then dumps all pending urls.
fn execute(instruction: RunInstruction) -> Result<(), RunError> {
    let RunInstruction { configs, seeds } = instruction;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(RunError::Runtime)?;

    runtime.block_on(async move {
        let (frontier, opened) = Frontier::open(&configs)?;
        let seeds = starting_urls(frontier.dump_path(), seeds.as_deref(), opened)?;

        let frontier = Arc::new(frontier);
        let report = frontier.initialize(&seeds).await;
        log::info!("Seeded {} hosts.", report.hosts);

        let fetcher = Arc::new(HttpFetcher::new(&configs.crawl)?);
        let shutdown = GracefulShutdown::new();
        let mut set = JoinSet::new();
        for worker in 0..configs.frontier.workers.max(1) {
            log::info!("Spawn Worker: {worker}");
            set.spawn(run_worker(
                worker,
                frontier.clone(),
                fetcher.clone(),
                shutdown.create_shutdown(),
            ));
        }
        let maintenance = tokio::spawn(run_maintenance(
            frontier.clone(),
            shutdown.create_shutdown(),
        ));

        let signal = tokio::signal::ctrl_c().await;
        log::info!("Shutting down.");
        shutdown.shutdown();

        let mut crawled = 0usize;
        while let Some(result) = set.join_next().await {
            match result {
                Ok(completed) => crawled += completed,
                Err(err) => log::error!("A worker failed: {err}"),
            }
        }
        if let Err(err) = maintenance.await {
            log::error!("The maintenance failed: {err}");
        }
        log::info!("Crawled {crawled} urls, {:?}", frontier.stats());

        let dumped = frontier.dump()?;
        log::info!("Dumped {dumped} urls for the next run.");
        signal.map_err(RunError::Signal)
    })
}
