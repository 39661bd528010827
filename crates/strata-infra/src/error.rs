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

//! Errors raised on the renderer side.
//!
//! Backend errors never leave the renderer: they are turned into failed
//! events for the producer to retry or report.

use strata_core::{DisplayBufferId, DisplayId, SceneId};
use thiserror::Error;

/// A platform backend could not carry out an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The platform refused to open a display.
    #[error("failed to create {display}: {reason}")]
    DisplayCreation {
        /// The display concerned.
        display: DisplayId,
        /// Platform message.
        reason: String,
    },
    /// Scene resources could not be uploaded.
    #[error("failed to upload resources of {scene}: {reason}")]
    Upload {
        /// The scene concerned.
        scene: SceneId,
        /// Platform message.
        reason: String,
    },
    /// The scene could not be enabled for rendering.
    #[error("failed to enable {scene}: {reason}")]
    Enable {
        /// The scene concerned.
        scene: SceneId,
        /// Platform message.
        reason: String,
    },
    /// The backend has no resources for this scene.
    #[error("{scene} is not uploaded")]
    SceneNotUploaded {
        /// The scene concerned.
        scene: SceneId,
    },
    /// An offscreen buffer operation failed.
    #[error("offscreen {buffer}: {reason}")]
    OffscreenBuffer {
        /// The buffer concerned.
        buffer: DisplayBufferId,
        /// Platform message.
        reason: String,
    },
}

/// Misuse of a [`RendererLoop`](crate::RendererLoop).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopError {
    /// The renderer thread is already running.
    #[error("the renderer thread is already running")]
    AlreadyRunning,
    /// Manual iterations are not allowed while the thread owns the schedule.
    #[error("cannot run a manual iteration while the renderer thread is running")]
    ThreadRunning,
    /// A threaded loop needs a frame rate above zero.
    #[error("frame rate must be above zero")]
    ZeroFrameRate,
}

