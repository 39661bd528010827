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

//! Strongly-typed identifiers shared by the producer and the renderer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a scene across its whole lifetime, including republication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u64);

/// Identifies a renderer-owned output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayId(pub u32);

/// Identifies an offscreen buffer. A display's own framebuffer has no id,
/// see [`DisplayBuffer::Framebuffer`](crate::scene::DisplayBuffer::Framebuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayBufferId(pub u32);

/// Identifies a data provider or consumer slot inside a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataSlotId(pub u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "display#{}", self.0)
    }
}

impl fmt::Display for DisplayBufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

impl fmt::Display for DataSlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_with_their_domain() {
        assert_eq!(SceneId(33).to_string(), "scene#33");
        assert_eq!(DisplayId(1).to_string(), "display#1");
        assert_eq!(DisplayBufferId(7).to_string(), "buffer#7");
        assert_eq!(DataSlotId(2).to_string(), "slot#2");
    }

    #[test]
    fn test_scene_ids_are_ordered() {
        assert!(SceneId(1) < SceneId(2));
    }
}
