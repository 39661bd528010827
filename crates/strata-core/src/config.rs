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

//! Plain configuration payloads carried by display and timing commands.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An RGBA clear colour with components in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearColor {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component.
    pub a: f32,
}

impl ClearColor {
    /// Opaque black.
    pub const BLACK: ClearColor = ClearColor::rgba(0.0, 0.0, 0.0, 1.0);

    /// Creates a colour from its components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Describes a display the renderer should create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Human readable title, used by windowed backends.
    pub title: String,
    /// Horizontal position of the surface.
    pub x: i32,
    /// Vertical position of the surface.
    pub y: i32,
    /// Width of the framebuffer in pixels.
    pub width: u32,
    /// Height of the framebuffer in pixels.
    pub height: u32,
    /// Requests a fullscreen surface.
    pub fullscreen: bool,
    /// Initial clear colour of the framebuffer.
    pub clear_color: ClearColor,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "strata".to_string(),
            x: 0,
            y: 0,
            width: 1280,
            height: 480,
            fullscreen: false,
            clear_color: ClearColor::default(),
        }
    }
}

/// Per-frame time budgets the renderer honours while processing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameTimerLimits {
    /// Budget for uploading the resources of a scene being mapped, in microseconds.
    pub scene_upload_us: u64,
    /// Budget for rendering interruptible offscreen buffers, in microseconds.
    pub offscreen_render_us: u64,
}

impl FrameTimerLimits {
    /// The scene upload budget as a [`Duration`].
    pub fn scene_upload(&self) -> Duration {
        Duration::from_micros(self.scene_upload_us)
    }

    /// The interruptible offscreen render budget as a [`Duration`].
    pub fn offscreen_render(&self) -> Duration {
        Duration::from_micros(self.offscreen_render_us)
    }
}

impl Default for FrameTimerLimits {
    fn default() -> Self {
        Self {
            scene_upload_us: 10_000,
            offscreen_render_us: 5_000,
        }
    }
}
