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

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Where the frontier keeps its files.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(rename(serialize = "Paths"))]
pub struct PathsConfig {
    /// The root folder, every other path is relative to it.
    #[serde(default = "_default_root_folder")]
    pub root: Utf8PathBuf,
    /// The binary file of the seen filter.
    #[serde(default = "_default_seen_file")]
    pub seen_file: Utf8PathBuf,
    /// The plain text restart dump, one url per line.
    #[serde(default = "_default_dump_file")]
    pub dump_file: Utf8PathBuf,
    /// The log file, if logging to a file.
    #[serde(default = "_default_log_file")]
    pub log_file: Utf8PathBuf,
}

fn _default_root_folder() -> Utf8PathBuf {
    Utf8PathBuf::from("./frontier_data")
}
fn _default_seen_file() -> Utf8PathBuf {
    Utf8PathBuf::from("seen.bloom")
}
fn _default_dump_file() -> Utf8PathBuf {
    Utf8PathBuf::from("frontier.dump")
}
fn _default_log_file() -> Utf8PathBuf {
    Utf8PathBuf::from("out.log")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: _default_root_folder(),
            seen_file: _default_seen_file(),
            dump_file: _default_dump_file(),
            log_file: _default_log_file(),
        }
    }
}

impl PathsConfig {
    pub fn seen_path(&self) -> Utf8PathBuf {
        self.root.join(&self.seen_file)
    }

    pub fn dump_path(&self) -> Utf8PathBuf {
        self.root.join(&self.dump_file)
    }

    pub fn log_path(&self) -> Utf8PathBuf {
        self.root.join(&self.log_file)
    }
}
