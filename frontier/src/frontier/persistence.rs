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
use crate::frontier::{Frontier, PersistError};
use crate::transport::ForeignUrlSink;
use crate::url::NormalizedUrl;
use camino::Utf8Path;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use tempfile::NamedTempFile;

impl<R: AddressResolver, S: ForeignUrlSink> Frontier<R, S> {
    /// Writes every pending url to the configured dump file and syncs the seen filter.
    pub fn dump(&self) -> Result<usize, PersistError> {
        self.dump_to(&self.dump_path)
    }

    /// Writes every pending url to [path], one per line, replacing the file atomically.
    ///
    /// Leased urls come first, followed by the scheduled tasks, the host queues and the
    /// overflow queue.
    pub fn dump_to(&self, path: impl AsRef<Utf8Path>) -> Result<usize, PersistError> {
        let path = path.as_ref();
        let io_error = |source: std::io::Error| PersistError::Io {
            path: path.to_string(),
            source,
        };

        let mut urls: Vec<NormalizedUrl> = Vec::new();
        urls.extend(self.leases.snapshot().into_iter().map(|lease| lease.url));
        urls.extend(self.scheduler.snapshot().into_iter().map(|task| task.url));
        for (_, entries) in self.pool.snapshot() {
            urls.extend(entries.into_iter().map(|entry| entry.url));
        }
        urls.extend(self.overflow.snapshot().into_iter().map(|record| record.url));

        let folder = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        std::fs::create_dir_all(folder).map_err(io_error)?;
        let mut writer = BufWriter::new(NamedTempFile::new_in(folder).map_err(io_error)?);
        for url in &urls {
            writeln!(writer, "{url}").map_err(io_error)?;
        }
        writer.flush().map_err(io_error)?;
        let temp = writer.into_inner().map_err(|err| io_error(err.into_error()))?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(path).map_err(|err| io_error(err.error))?;
        log::info!("Dumped {} urls to {path}.", urls.len());

        self.seen.sync()?;
        Ok(urls.len())
    }
}

/// Reads the urls of a dump written by [Frontier::dump_to].
/// Returns None if there is no dump.
pub fn load_dump(path: impl AsRef<Utf8Path>) -> Result<Option<Vec<String>>, PersistError> {
    let path = path.as_ref();
    let io_error = |source: std::io::Error| PersistError::Io {
        path: path.to_string(),
        source,
    };
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(err)),
    };
    let mut urls = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(io_error)?;
        let line = line.trim();
        if !line.is_empty() {
            urls.push(line.to_string());
        }
    }
    Ok(Some(urls))
}
