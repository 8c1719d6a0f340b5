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

use crate::fetch::FetchError;
use crate::frontier::PersistError;
use crate::seen::SeenFilterError;
use std::process::ExitCode;
use thiserror::Error;

/// Everything that stops a run of the frontier.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Was not able to initialize the runtime!")]
    Runtime(#[source] std::io::Error),
    #[error(transparent)]
    SeenFilter(#[from] SeenFilterError),
    #[error("Neither a seed file nor a dump is available.")]
    NoSeeds,
    #[error("Failed to read the seeds at {path}.")]
    Seeds {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Client(#[from] FetchError),
    #[error("Failed to listen for ctrl-c.")]
    Signal(#[source] std::io::Error),
    /// The pending urls could not be written, the next run loses them.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl From<RunError> for ExitCode {
    fn from(value: RunError) -> Self {
        match value {
            RunError::Runtime(_) => ExitCode::from(10),
            RunError::SeenFilter(_) => ExitCode::from(11),
            RunError::NoSeeds | RunError::Seeds { .. } => ExitCode::from(20),
            RunError::Client(_) => ExitCode::from(30),
            RunError::Signal(_) => ExitCode::from(40),
            RunError::Persist(_) => ExitCode::from(70),
        }
    }
}
