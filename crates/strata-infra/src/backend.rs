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

//! Seams between the renderer schedule and the platform.

use crate::error::BackendError;
use std::time::Duration;
use strata_core::{ClearColor, DisplayBuffer, DisplayBufferId, DisplayConfig, DisplayId, SceneId};

/// One target of a frame: the scenes drawn into it, back to front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPass {
    /// Where the pass draws.
    pub buffer: DisplayBuffer,
    /// Scenes in draw order.
    pub scenes: Vec<SceneId>,
}

/// Everything a display draws in one frame.
///
/// Offscreen passes come first, ordered by buffer id, so consumers linked to
/// them see this frame's content. The framebuffer pass is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    /// The display being rendered.
    pub display: DisplayId,
    /// Passes in execution order.
    pub passes: Vec<RenderPass>,
    /// Time allowed for all offscreen passes together.
    pub offscreen_budget: Duration,
}

impl FramePlan {
    /// The pass targeting `buffer`, if any.
    pub fn pass(&self, buffer: DisplayBuffer) -> Option<&RenderPass> {
        self.passes.iter().find(|pass| pass.buffer == buffer)
    }
}

/// Platform resources of a single display.
pub trait DisplayBackend: Send {
    /// Uploads the resources of `scene`.
    ///
    /// ## Returns
    /// The time the upload took, checked by the caller against the frame
    /// timer limits.
    fn upload_scene(&mut self, scene: SceneId) -> Result<Duration, BackendError>;

    /// Frees the resources of `scene`. Unknown scenes are ignored.
    fn release_scene(&mut self, scene: SceneId);

    /// Makes an uploaded scene eligible for drawing.
    fn enable_scene(&mut self, scene: SceneId) -> Result<(), BackendError>;

    /// Stops drawing `scene`.
    fn disable_scene(&mut self, scene: SceneId);

    /// Allocates an offscreen render target.
    fn create_offscreen_buffer(
        &mut self,
        buffer: DisplayBufferId,
        width: u32,
        height: u32,
    ) -> Result<(), BackendError>;

    /// Frees an offscreen render target.
    fn destroy_offscreen_buffer(&mut self, buffer: DisplayBufferId);

    /// Sets the colour `buffer` is cleared to before each frame.
    fn set_clear_color(&mut self, buffer: DisplayBuffer, color: ClearColor);

    /// Draws one frame.
    fn render_frame(&mut self, plan: &FramePlan) -> Result<(), BackendError>;
}

/// Opens displays.
pub trait PlatformFactory: Send {
    /// Creates the backend for a new display.
    fn create_backend(
        &mut self,
        display: DisplayId,
        config: &DisplayConfig,
    ) -> Result<Box<dyn DisplayBackend>, BackendError>;
}
