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

mod errors;

pub use errors::UrlError;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;
use url::Url;

/// The canonical form of an url.
///
/// Every lookup in the seen filter and every insert into a queue uses this form:
/// the fragment is dropped and a trailing `/` is removed.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl {
    inner: String,
}

impl NormalizedUrl {
    /// Parses and normalizes [raw]. Only absolute http(s) urls with a host are accepted.
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let mut parsed = Url::parse(raw.trim())?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(UrlError::UnsupportedScheme(other.to_string())),
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::NoHost(raw.to_string()));
        }
        parsed.set_fragment(None);
        let mut inner: String = parsed.into();
        while inner.ends_with('/') {
            inner.pop();
        }
        Ok(Self { inner })
    }

    /// Resolves [raw] against [self] and normalizes the result.
    pub fn join(&self, raw: &str) -> Result<Self, UrlError> {
        let base = Url::parse(&self.inner)?;
        Self::parse(base.join(raw)?.as_str())
    }

    /// The hostname used for address resolution.
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.inner)
            .ok()?
            .host_str()
            .map(|value| value.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl Deref for NormalizedUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl Display for NormalizedUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl FromStr for NormalizedUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
