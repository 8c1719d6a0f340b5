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

use tokio_util::sync::CancellationToken;

/// Owns the shutdown of a node. Every [Shutdown] handed out by it is triggered
/// by [GracefulShutdown::shutdown] or when it is dropped.
#[derive(Debug, Default)]
pub struct GracefulShutdown {
    token: CancellationToken,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_shutdown(&self) -> Shutdown {
        Shutdown {
            token: self.token.clone(),
        }
    }

    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

impl Drop for GracefulShutdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// The receiving side of a [GracefulShutdown].
#[derive(Debug, Clone)]
pub struct Shutdown {
    token: CancellationToken,
}

impl ShutdownReceiver for Shutdown {
    async fn wait(&self) {
        self.token.clone().cancelled_owned().await
    }
}

/// Something a long running loop can wait on to stop.
pub trait ShutdownReceiver: Clone + Send + Sync + 'static {
    /// Resolves once the shutdown was triggered.
    fn wait(&self) -> impl std::future::Future<Output = ()> + Send;
}
