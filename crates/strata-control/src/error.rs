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

//! Local validation errors. None of these ever reach the command queue.

use strata_core::{DisplayBufferId, DisplayId, SceneId};
use thiserror::Error;

/// A request rejected at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The scene needs a display mapping for this request.
    #[error("{scene} has no display mapping")]
    NoMapping {
        /// The scene concerned.
        scene: SceneId,
    },
    /// The scene is mapped, or about to be, so its display cannot change.
    #[error("{scene} is mapped or heading for Ready, cannot move it from {current} to {requested}")]
    MappingLocked {
        /// The scene concerned.
        scene: SceneId,
        /// The display currently requested for the scene.
        current: DisplayId,
        /// The display the caller asked for.
        requested: DisplayId,
    },
    /// The display was never created through this control, or is gone.
    #[error("{display} is unknown")]
    UnknownDisplay {
        /// The display concerned.
        display: DisplayId,
    },
    /// The offscreen buffer was never created through this control, or is gone.
    #[error("{buffer} is unknown")]
    UnknownOffscreenBuffer {
        /// The buffer concerned.
        buffer: DisplayBufferId,
    },
    /// The offscreen buffer lives on a different display than the one named.
    #[error("{buffer} does not belong to {display}")]
    BufferNotOnDisplay {
        /// The buffer concerned.
        buffer: DisplayBufferId,
        /// The display it was expected on.
        display: DisplayId,
    },
    /// Offscreen buffers need a non-zero size.
    #[error("offscreen buffer size {width}x{height} is invalid")]
    InvalidBufferSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}
