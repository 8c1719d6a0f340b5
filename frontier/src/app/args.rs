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

use crate::config::Configs;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// A polite, partitioned url frontier.
pub struct FrontierArgs {
    /// The mode of the frontier
    #[command(subcommand)]
    pub mode: RunMode,
}

#[derive(Subcommand, Debug)]
pub enum RunMode {
    /// Crawls from a seed file or, if present, from the dump of the previous run.
    Run {
        /// The folder containing the required configs.
        #[arg(short, long)]
        config: Option<Utf8PathBuf>,
        /// The number of crawl workers.
        #[arg(short, long)]
        threads: Option<usize>,
        /// The id of this node.
        #[arg(long, requires = "nodes")]
        node: Option<u32>,
        /// The number of crawl nodes.
        #[arg(long, requires = "node")]
        nodes: Option<u32>,
        /// Overrides the log level from the config.
        #[arg(long)]
        log_level: Option<log::LevelFilter>,
        /// Log to file
        #[arg(long)]
        log_to_file: bool,
        /// A file with one seed url per line.
        seeds: Option<Utf8PathBuf>,
    },
    /// Writes the default config to the given folder.
    Init {
        /// The target folder.
        #[arg(default_value = ".")]
        folder: Utf8PathBuf,
    },
}

/// Everything necessary to run the frontier.
#[derive(Debug)]
pub struct RunInstruction {
    pub configs: Configs,
    pub seeds: Option<Utf8PathBuf>,
}

#[derive(Debug)]
pub enum Instruction {
    Run(RunInstruction),
    Nothing,
}

/// Consumes the args and returns everything necessary to execute the frontier.
pub fn consume_args(args: FrontierArgs) -> anyhow::Result<Instruction> {
    match args.mode {
        RunMode::Run {
            config,
            threads,
            node,
            nodes,
            log_level,
            log_to_file,
            seeds,
        } => {
            let mut configs = match config {
                None => Configs::discover_or_default()?,
                Some(folder) => Configs::load_from(folder)?,
            };
            if let Some(threads) = threads {
                configs.frontier.workers = threads.max(1);
            }
            if let (Some(node), Some(nodes)) = (node, nodes) {
                configs.frontier.node = node;
                configs.frontier.nodes = nodes;
            }
            configs.frontier.validate()?;
            if let Some(log_level) = log_level {
                configs.system.log_level = log_level;
            }
            configs.system.log_to_file |= log_to_file;
            Ok(Instruction::Run(RunInstruction { configs, seeds }))
        }
        RunMode::Init { folder } => {
            let path = write_default_config(&folder)?;
            println!("Created the default config at {path}.");
            Ok(Instruction::Nothing)
        }
    }
}

/// Writes the default [Configs] as `config.json` into [folder].
pub fn write_default_config(folder: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    std::fs::create_dir_all(folder)?;
    let path = folder.join("config.json");
    anyhow::ensure!(
        !path.exists(),
        "The config {path} already exists. Delete it before regenerating."
    );
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &Configs::default())?;
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod test {
    use super::{consume_args, write_default_config, FrontierArgs, Instruction, RunMode};
    use crate::config::Configs;
    use camino::Utf8PathBuf;
    use clap::Parser;

    #[test]
    fn parses_a_run() {
        let args = FrontierArgs::try_parse_from([
            "frontier",
            "run",
            "--threads",
            "4",
            "--node",
            "1",
            "--nodes",
            "3",
            "--log-level",
            "debug",
            "seeds.txt",
        ])
        .unwrap();
        let RunMode::Run {
            threads,
            node,
            nodes,
            log_level,
            seeds,
            ..
        } = args.mode
        else {
            panic!("Expected a run.");
        };
        assert_eq!(Some(4), threads);
        assert_eq!((Some(1), Some(3)), (node, nodes));
        assert_eq!(Some(log::LevelFilter::Debug), log_level);
        assert_eq!(Some(Utf8PathBuf::from("seeds.txt")), seeds);
    }

    #[test]
    fn node_requires_nodes() {
        assert!(FrontierArgs::try_parse_from(["frontier", "run", "--node", "1"]).is_err());
    }

    #[test]
    fn init_writes_a_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let instruction = consume_args(FrontierArgs {
            mode: RunMode::Init {
                folder: folder.clone(),
            },
        })
        .unwrap();
        assert!(matches!(instruction, Instruction::Nothing));
        assert_eq!(Configs::default(), Configs::load_from(&folder).unwrap());
        assert!(write_default_config(&folder).is_err());
    }

    #[test]
    fn run_overrides_the_config() {
        let dir = tempfile::tempdir().unwrap();
        let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write_default_config(&folder).unwrap();
        let instruction = consume_args(FrontierArgs {
            mode: RunMode::Run {
                config: Some(folder),
                threads: Some(2),
                node: Some(0),
                nodes: Some(2),
                log_level: None,
                log_to_file: true,
                seeds: None,
            },
        })
        .unwrap();
        let Instruction::Run(run) = instruction else {
            panic!("Expected a run.");
        };
        assert_eq!(2, run.configs.frontier.workers);
        assert_eq!(2, run.configs.frontier.nodes);
        assert!(run.configs.system.log_to_file);
        assert!(run.seeds.is_none());
    }

    #[test]
    fn a_config_with_a_foreign_node_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(
            folder.join("config.json"),
            r#"{"frontier": {"node": 3, "nodes": 2}}"#,
        )
        .unwrap();
        let result = consume_args(FrontierArgs {
            mode: RunMode::Run {
                config: Some(folder),
                threads: None,
                node: None,
                nodes: None,
                log_level: None,
                log_to_file: false,
                seeds: None,
            },
        });
        assert!(result.is_err());
    }
}
