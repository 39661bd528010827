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

use crate::config::FrameTimerLimits;
use crate::ids::{DataSlotId, DisplayBufferId, DisplayId, SceneId};
use crate::scene::{DisplayBuffer, SceneTransition};
use std::fmt;

/// How a request ended on the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventResult {
    /// The request was applied.
    Ok,
    /// The request was rejected; the renderer state is unchanged.
    Fail,
    /// The transition happened as a side effect of another occurrence,
    /// not in reply to a request.
    Indirect,
}

impl fmt::Display for EventResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An outcome reported by the renderer, one per applied command or
/// spontaneous occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// The producer published a scene.
    ScenePublished {
        /// The published scene.
        scene: SceneId,
    },
    /// The producer withdrew a scene. Preceded by the indirect cascade.
    SceneUnpublished {
        /// The withdrawn scene.
        scene: SceneId,
    },
    /// A single-rung transition finished.
    SceneTransition {
        /// The scene concerned.
        scene: SceneId,
        /// Which rung was crossed, or was attempted.
        transition: SceneTransition,
        /// Outcome.
        result: EventResult,
    },
    /// A display buffer assignment was applied or rejected.
    SceneAssigned {
        /// The scene concerned.
        scene: SceneId,
        /// Requested buffer.
        buffer: DisplayBuffer,
        /// Requested render order.
        render_order: i32,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to a create-display command.
    DisplayCreated {
        /// The display concerned.
        display: DisplayId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to a destroy-display command.
    DisplayDestroyed {
        /// The display concerned.
        display: DisplayId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to a create-offscreen-buffer command.
    OffscreenBufferCreated {
        /// Owning display.
        display: DisplayId,
        /// The buffer concerned.
        buffer: DisplayBufferId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to a destroy-offscreen-buffer command.
    OffscreenBufferDestroyed {
        /// Owning display.
        display: DisplayId,
        /// The buffer concerned.
        buffer: DisplayBufferId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to a link-data command.
    DataLinked {
        /// Providing scene.
        provider_scene: SceneId,
        /// Providing slot.
        provider_slot: DataSlotId,
        /// Consuming scene.
        consumer_scene: SceneId,
        /// Consuming slot.
        consumer_slot: DataSlotId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to a link-offscreen-buffer command.
    OffscreenBufferLinked {
        /// Source buffer.
        buffer: DisplayBufferId,
        /// Consuming scene.
        consumer_scene: SceneId,
        /// Consuming slot.
        consumer_slot: DataSlotId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to an unlink command, or an indirect unlink caused by a provider
    /// or consumer going away.
    DataUnlinked {
        /// Consuming scene.
        consumer_scene: SceneId,
        /// Consuming slot.
        consumer_slot: DataSlotId,
        /// Outcome.
        result: EventResult,
    },
    /// The renderer applied new frame timer limits.
    FrameTimerLimitsChanged {
        /// The limits now in force.
        limits: FrameTimerLimits,
    },
    /// Every command enqueued before the matching echo has been applied.
    ConfirmationEcho {
        /// The token given to the echo command.
        text: String,
    },
}

impl RendererEvent {
    /// Shorthand for a [`RendererEvent::SceneTransition`].
    pub fn transition(scene: SceneId, transition: SceneTransition, result: EventResult) -> Self {
        RendererEvent::SceneTransition {
            scene,
            transition,
            result,
        }
    }
}
