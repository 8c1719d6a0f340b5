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

mod bloom;
mod errors;

pub use bloom::{AtomicBloom, BloomShape};
pub use errors::SeenFilterError;

use crate::url::NormalizedUrl;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use tempfile::NamedTempFile;

/// The default capacity of the seen filter.
pub const DEFAULT_SEEN_CAPACITY: u64 = 10_000_000;
/// The default false positive rate of the seen filter.
pub const DEFAULT_SEEN_FALSE_POSITIVE_RATE: f64 = 0.001;

const MAGIC: [u8; 4] = *b"SEEN";
const FORMAT_VERSION: u16 = 1;

/// How the seen filter came to be.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FilterOpened {
    /// The filter was read from the disc.
    Opened,
    /// The file was missing or unreadable, a new one was created.
    CreatedFresh,
}

#[derive(Serialize, Deserialize)]
struct StoredFilter {
    magic: [u8; 4],
    version: u16,
    shape: BloomShape,
    inserted: u64,
    words: Vec<u64>,
}

/// The set of all urls accepted by this node. Grows monotonically and never forgets a url,
/// but may claim to know urls it never saw with the configured probability.
#[derive(Debug)]
pub struct SeenFilter {
    path: Utf8PathBuf,
    bloom: AtomicBloom,
}

impl SeenFilter {
    /// Opens the filter at [path] or creates a new one with the given dimensions.
    ///
    /// A stored filter keeps its own dimensions. A corrupt file is replaced.
    pub fn open(
        path: impl AsRef<Utf8Path>,
        capacity: u64,
        false_positive_rate: f64,
    ) -> Result<(Self, FilterOpened), SeenFilterError> {
        let path = path.as_ref().to_path_buf();
        match File::open(&path) {
            Ok(file) => match Self::read(BufReader::new(file)) {
                Some(bloom) => {
                    if bloom.shape().capacity != capacity
                        || bloom.shape().false_positive_rate != false_positive_rate
                    {
                        log::info!(
                            "The seen filter at {path} was created with capacity {} and rate {}, keeping them.",
                            bloom.shape().capacity,
                            bloom.shape().false_positive_rate
                        );
                    }
                    log::info!(
                        "Reopened the seen filter at {path} with {} entries.",
                        bloom.inserted()
                    );
                    return Ok((Self { path, bloom }, FilterOpened::Opened));
                }
                None => {
                    log::warn!("The seen filter at {path} is corrupt, creating a new one.");
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!("No seen filter at {path}, creating a new one.");
            }
            Err(err) => {
                return Err(SeenFilterError::Io {
                    path: path.to_string(),
                    source: err,
                })
            }
        }
        let filter = Self {
            bloom: AtomicBloom::new(BloomShape::optimal(capacity, false_positive_rate)),
            path,
        };
        filter.sync()?;
        Ok((filter, FilterOpened::CreatedFresh))
    }

    fn read(reader: BufReader<File>) -> Option<AtomicBloom> {
        let stored: StoredFilter = bincode::deserialize_from(reader).ok()?;
        if stored.magic != MAGIC || stored.version != FORMAT_VERSION {
            return None;
        }
        AtomicBloom::from_words(stored.shape, stored.words, stored.inserted)
    }

    /// Returns true if [url] was probably marked before.
    pub fn seen(&self, url: &NormalizedUrl) -> bool {
        self.bloom.contains(url.as_str().as_bytes())
    }

    /// Marks [url] as seen. Returns false if it was (probably) already marked.
    pub fn mark(&self, url: &NormalizedUrl) -> bool {
        self.bloom.insert(url.as_str().as_bytes())
    }

    /// The number of marks that changed the filter.
    pub fn len(&self) -> u64 {
        self.bloom.inserted()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Writes the filter to its file. The file is replaced atomically.
    pub fn sync(&self) -> Result<(), SeenFilterError> {
        let io_error = |source: std::io::Error| SeenFilterError::Io {
            path: self.path.to_string(),
            source,
        };
        let folder = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        std::fs::create_dir_all(folder).map_err(io_error)?;
        let temp = NamedTempFile::new_in(folder).map_err(io_error)?;
        let stored = StoredFilter {
            magic: MAGIC,
            version: FORMAT_VERSION,
            shape: *self.bloom.shape(),
            inserted: self.bloom.inserted(),
            words: self.bloom.snapshot(),
        };
        let mut writer = BufWriter::new(temp);
        bincode::serialize_into(&mut writer, &stored)?;
        writer.flush().map_err(io_error)?;
        let temp = writer.into_inner().map_err(|err| io_error(err.into_error()))?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&self.path).map_err(|err| io_error(err.error))?;
        log::debug!("Synced the seen filter to {}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{BloomShape, FilterOpened, SeenFilter, StoredFilter, FORMAT_VERSION, MAGIC};
    use crate::url::NormalizedUrl;
    use camino::Utf8PathBuf;

    fn url(value: &str) -> NormalizedUrl {
        NormalizedUrl::parse(value).unwrap()
    }

    fn temp_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("seen.bloom")).unwrap()
    }

    #[test]
    fn marks_are_only_set_explicitly() {
        let dir = tempfile::tempdir().unwrap();
        let (filter, opened) = SeenFilter::open(temp_path(&dir), 1000, 0.001).unwrap();
        assert_eq!(FilterOpened::CreatedFresh, opened);
        let target = url("https://www.test1.de/about");
        assert!(!filter.seen(&target));
        assert!(!filter.seen(&target));
        assert!(filter.mark(&target));
        assert!(filter.seen(&target));
        assert!(!filter.mark(&target));
    }

    #[test]
    fn can_be_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        {
            let (filter, _) = SeenFilter::open(&path, 1000, 0.001).unwrap();
            filter.mark(&url("https://www.test1.de"));
            filter.mark(&url("https://www.test2.de"));
            filter.sync().unwrap();
        }
        let (filter, opened) = SeenFilter::open(&path, 1000, 0.001).unwrap();
        assert_eq!(FilterOpened::Opened, opened);
        assert!(filter.seen(&url("https://www.test1.de")));
        assert!(filter.seen(&url("https://www.test2.de")));
        assert!(!filter.seen(&url("https://www.test3.de")));
        assert_eq!(2, filter.len());
    }

    #[test]
    fn corrupt_files_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        std::fs::write(&path, b"definitely not a bloom filter").unwrap();
        let (filter, opened) = SeenFilter::open(&path, 1000, 0.001).unwrap();
        assert_eq!(FilterOpened::CreatedFresh, opened);
        assert!(filter.is_empty());
        let (_, opened) = SeenFilter::open(&path, 1000, 0.001).unwrap();
        assert_eq!(FilterOpened::Opened, opened);
    }

    #[test]
    fn files_without_bits_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        let stored = StoredFilter {
            magic: MAGIC,
            version: FORMAT_VERSION,
            shape: BloomShape {
                capacity: 1000,
                false_positive_rate: 0.001,
                bit_count: 0,
                hashes: 1,
            },
            inserted: 0,
            words: Vec::new(),
        };
        std::fs::write(&path, bincode::serialize(&stored).unwrap()).unwrap();
        let (filter, opened) = SeenFilter::open(&path, 1000, 0.001).unwrap();
        assert_eq!(FilterOpened::CreatedFresh, opened);
        assert!(!filter.seen(&url("https://www.test1.de")));
        assert!(filter.mark(&url("https://www.test1.de")));
    }
}
