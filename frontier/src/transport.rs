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

use crate::partition::NodeId;
use crate::url::NormalizedUrl;
use std::future::Future;

/// Receives urls that belong to another crawl node.
pub trait ForeignUrlSink: Send + Sync + 'static {
    fn send(&self, node: NodeId, url: NormalizedUrl) -> impl Future<Output = ()> + Send;
}

/// Drops foreign urls. Nodes do not exchange urls yet.
#[derive(Debug, Default, Copy, Clone)]
pub struct UnroutedSink;

impl ForeignUrlSink for UnroutedSink {
    async fn send(&self, node: NodeId, url: NormalizedUrl) {
        log::trace!("Dropping {url}, it belongs to {node}.");
    }
}
