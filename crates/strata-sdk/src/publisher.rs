// Copyright 2025 eraflo
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

//! The content side: scenes offered to and withdrawn from the renderer.

use std::sync::Arc;
use strata_core::command::{PublishScene, UnpublishScene};
use strata_core::{CommandTransport, RendererCommand, SceneId};

/// Publishes scenes into the renderer's command transport.
///
/// Publishing is independent of [`SceneControl`](strata_control::SceneControl):
/// a content provider offers a scene, the control decides what to do with it.
/// Clones share the same transport.
#[derive(Debug, Clone)]
pub struct ContentPublisher {
    transport: Arc<CommandTransport<RendererCommand>>,
}

impl ContentPublisher {
    /// Creates a publisher writing to `transport`.
    pub fn new(transport: Arc<CommandTransport<RendererCommand>>) -> Self {
        Self { transport }
    }

    /// Offers `scene` to the renderer.
    pub fn publish(&self, scene: SceneId) {
        log::debug!("Publishing {scene}.");
        self.transport.enqueue(PublishScene { scene });
    }

    /// Withdraws `scene`. The renderer takes it down and reports each step.
    pub fn unpublish(&self, scene: SceneId) {
        log::debug!("Unpublishing {scene}.");
        self.transport.enqueue(UnpublishScene { scene });
    }
}
