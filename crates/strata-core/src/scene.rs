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

//! The public scene presentation ladder and the single-rung transitions
//! that move a scene along it.

use crate::ids::DisplayBufferId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The presentation state of a scene as seen by the application.
///
/// The ladder is totally ordered: `Unavailable < Available < Ready < Rendered`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum SceneState {
    /// Not published, or published but not subscribed by the renderer.
    #[default]
    Unavailable,
    /// Subscribed by the renderer, not mapped to a display.
    Available,
    /// Mapped to a display and assigned to a display buffer, not shown.
    Ready,
    /// Shown on its display buffer.
    Rendered,
}

impl SceneState {
    /// Every state, bottom rung first.
    pub const ALL: [SceneState; 4] = [
        SceneState::Unavailable,
        SceneState::Available,
        SceneState::Ready,
        SceneState::Rendered,
    ];
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SceneState::Unavailable => "Unavailable",
            SceneState::Available => "Available",
            SceneState::Ready => "Ready",
            SceneState::Rendered => "Rendered",
        };
        f.write_str(name)
    }
}

/// A single-rung transition the renderer can be asked to perform on a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneTransition {
    /// Published → subscribed.
    Subscribe,
    /// Subscribed → published.
    Unsubscribe,
    /// Subscribed → mapped to a display.
    Map,
    /// Mapped → subscribed.
    Unmap,
    /// Ready → rendered.
    Show,
    /// Rendered → ready.
    Hide,
}

impl SceneTransition {
    /// Returns `true` for transitions that climb the ladder.
    pub fn is_ascending(self) -> bool {
        matches!(
            self,
            SceneTransition::Subscribe | SceneTransition::Map | SceneTransition::Show
        )
    }
}

impl fmt::Display for SceneTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The buffer a mapped scene renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayBuffer {
    /// The display's own framebuffer.
    #[default]
    Framebuffer,
    /// An offscreen buffer created on the same display.
    Offscreen(DisplayBufferId),
}

impl fmt::Display for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayBuffer::Framebuffer => f.write_str("framebuffer"),
            DisplayBuffer::Offscreen(id) => write!(f, "offscreen {id}"),
        }
    }
}
