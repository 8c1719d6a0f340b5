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

use camino::Utf8Path;
use itertools::Itertools;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Reads one seed per line. Lines starting with `#` are ignored, `\#` escapes a leading `#`.
pub fn read_seeds(path: impl AsRef<Utf8Path>) -> Result<Vec<String>, std::io::Error> {
    let lines = BufReader::new(File::open(path.as_ref())?).lines();
    let mut seeds = Vec::new();
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix('\\').filter(|rest| rest.starts_with('#')).unwrap_or(line);
        seeds.push(line.to_string());
    }
    Ok(seeds.into_iter().unique().collect())
}

#[cfg(test)]
mod test {
    use super::read_seeds;
    use camino::Utf8PathBuf;

    #[test]
    fn skips_comments_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("seeds.txt")).unwrap();
        std::fs::write(
            &path,
            "# my seeds\nhttps://www.test1.de\n\n  https://www.test2.de  \n\\#not-a-comment\nhttps://www.test1.de\n",
        )
        .unwrap();
        assert_eq!(
            vec!["https://www.test1.de", "https://www.test2.de", "#not-a-comment"],
            read_seeds(&path).unwrap()
        );
    }

    #[test]
    fn missing_files_fail() {
        assert!(read_seeds("/definitely/not/there/seeds.txt").is_err());
    }
}
