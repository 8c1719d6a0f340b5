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

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr};

/// The resolved network address of a host.
///
/// Queues and partitions are keyed by this value and never by the hostname, so two hostnames
/// pointing to the same server share one queue and one owning node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct HostAddress {
    inner: IpAddr,
}

impl HostAddress {
    pub const fn new(inner: IpAddr) -> Self {
        Self { inner }
    }

    /// A key for an empty pool slot.
    ///
    /// Vacant keys live in `0.0.0.0/8`, a range no resolved host can occupy
    /// (see [HostAddress::is_routable]).
    pub fn vacant(slot: u32) -> Self {
        let [_, b, c, d] = slot.to_be_bytes();
        Self::new(IpAddr::V4(Ipv4Addr::new(0, b, c, d)))
    }

    /// Returns true if this key names an empty pool slot.
    pub fn is_vacant(&self) -> bool {
        matches!(self.inner, IpAddr::V4(v4) if v4.octets()[0] == 0)
    }

    /// Returns false for addresses that can not be crawled.
    pub fn is_routable(&self) -> bool {
        !self.inner.is_unspecified() && !self.is_vacant()
    }

    pub fn ip(&self) -> IpAddr {
        self.inner
    }
}

impl From<IpAddr> for HostAddress {
    fn from(value: IpAddr) -> Self {
        Self::new(value)
    }
}

impl Display for HostAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.inner {
            IpAddr::V4(v4) if v4.octets()[0] == 0 => write!(f, "vacant#{}", u32::from(v4)),
            other => Display::fmt(&other, f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::HostAddress;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[test]
    fn vacant_slots_are_not_routable() {
        let slot = HostAddress::vacant(513);
        assert!(slot.is_vacant());
        assert!(!slot.is_routable());
        assert_eq!("vacant#513", slot.to_string());
        assert_ne!(HostAddress::vacant(1), HostAddress::vacant(2));
    }

    #[test]
    fn resolved_addresses_are_routable() {
        let v4 = HostAddress::from(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)));
        assert!(v4.is_routable());
        assert_eq!("93.184.216.34", v4.to_string());
        let v6 = HostAddress::from(IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert!(v6.is_routable());
        assert!(!HostAddress::from(IpAddr::V4(Ipv4Addr::UNSPECIFIED)).is_routable());
    }
}
