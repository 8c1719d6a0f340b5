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

use crate::config::{CrawlConfig, FrontierConfig, PathsConfig, SystemConfig};
use camino::Utf8Path;
use config::Config;
use serde::{Deserialize, Serialize};

/// A collection of all configs used by a crawl node.
/// Can be shared across threads
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename(serialize = "Config"))]
pub struct Configs {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

impl Configs {
    pub fn load_from<P: AsRef<Utf8Path>>(folder: P) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("./config").required(false))
            .add_source(config::File::with_name("./frontier").required(false))
            .add_source(config::File::with_name(
                folder.as_ref().join("frontier").as_str(),
            ).required(false))
            .add_source(config::File::with_name(
                folder.as_ref().join("config").as_str(),
            ))
            .add_source(config::Environment::with_prefix("FRONTIER").separator("."))
            .build()?
            .try_deserialize()
    }

    pub fn discover_or_default() -> Result<Self, config::ConfigError> {
        match Config::builder()
            .add_source(config::File::with_name("./frontier"))
            .add_source(config::File::with_name("./frontier_data/frontier").required(false))
            .add_source(config::File::with_name("./config").required(false))
            .add_source(config::Environment::with_prefix("FRONTIER").separator("."))
            .build()
        {
            Ok(value) => value.try_deserialize(),
            Err(_) => Ok(Default::default()),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::config::Configs;
    use camino::Utf8PathBuf;
    use std::io::Write;

    #[test]
    fn can_load_a_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut config = Configs::default();
        config.frontier.workers = 7;
        config.frontier.node = 1;
        config.frontier.nodes = 2;
        config.frontier.max_seed_distance = Some(4);
        config.paths.root = folder.join("data");
        config.crawl.user_agent = "test-agent".to_string();

        let mut file = std::fs::File::create(folder.join("config.json")).unwrap();
        write!(&mut file, "{}", serde_json::to_string(&config).unwrap()).unwrap();
        drop(file);

        let loaded = Configs::load_from(&folder).unwrap();
        assert_eq!(config.frontier, loaded.frontier);
        assert_eq!(config.paths, loaded.paths);
        assert_eq!(config.crawl, loaded.crawl);
    }
}
