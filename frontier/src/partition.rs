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

use crate::address::HostAddress;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use twox_hash::XxHash64;

/// The id of a crawl node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Maps a resolved [HostAddress] to the node responsible for it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Partitioner {
    local: NodeId,
    num_nodes: u32,
}

impl Partitioner {
    /// Creates a partitioner for the node [local] of [num_nodes] nodes.
    /// A node count of zero is treated as a single node.
    pub fn new(local: NodeId, num_nodes: u32) -> Self {
        Self {
            local,
            num_nodes: num_nodes.max(1),
        }
    }

    /// The owner of [address].
    pub fn owner(&self, address: &HostAddress) -> NodeId {
        owner(address, self.num_nodes)
    }

    /// Returns true if [address] is handled by this node.
    pub fn is_local(&self, address: &HostAddress) -> bool {
        self.owner(address) == self.local
    }

    pub fn num_nodes(&self) -> u32 {
        self.num_nodes
    }
}

/// Hashes the octets of [address] uniformly onto `0..num_nodes`.
///
/// The hash is seeded with a constant, every node of a cluster computes the same owner.
pub fn owner(address: &HostAddress, num_nodes: u32) -> NodeId {
    if num_nodes <= 1 {
        return NodeId(0);
    }
    let mut hasher = XxHash64::with_seed(0);
    match address.ip() {
        IpAddr::V4(v4) => v4.octets().hash(&mut hasher),
        IpAddr::V6(v6) => v6.octets().hash(&mut hasher),
    }
    NodeId((hasher.finish() % num_nodes as u64) as u32)
}
