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
use std::future::Future;

/// The outcome of resolving a hostname.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Resolution {
    Resolved(HostAddress),
    Unresolved,
}

impl Resolution {
    pub fn address(self) -> Option<HostAddress> {
        match self {
            Resolution::Resolved(address) => Some(address),
            Resolution::Unresolved => None,
        }
    }
}

/// The primitive used to turn a hostname into an address.
pub trait AddressResolver: Send + Sync + 'static {
    /// Looks up [hostname] once. Implementations do not retry.
    fn lookup(&self, hostname: &str) -> impl Future<Output = Resolution> + Send;
}

/// Resolves with the resolver of the operating system.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemResolver;

impl AddressResolver for SystemResolver {
    async fn lookup(&self, hostname: &str) -> Resolution {
        match tokio::net::lookup_host((hostname, 0u16)).await {
            Ok(found) => {
                let address = found
                    .map(|socket| HostAddress::from(socket.ip()))
                    .find(HostAddress::is_routable);
                match address {
                    Some(address) => Resolution::Resolved(address),
                    None => {
                        log::debug!("DNS returned no usable address for {hostname}");
                        Resolution::Unresolved
                    }
                }
            }
            Err(err) => {
                log::debug!("DNS error accessing {hostname}: {err}");
                Resolution::Unresolved
            }
        }
    }
}
