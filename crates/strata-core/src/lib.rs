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

//! Foundational crate for the strata scene-lifecycle middleware.
//!
//! `strata-core` holds everything both actors agree on: identifiers, the public
//! scene state ladder, the closed command vocabulary together with the queue and
//! the transport that carry it, and the events the renderer reports back.
//! It contains no policy: the reconciler lives in `strata-control` and the
//! renderer-side executor in `strata-infra`.

#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod scene;

pub use command::queue::CommandQueue;
pub use command::transport::CommandTransport;
pub use command::{CommandKind, Payload, RendererCommand, Tagged};
pub use config::{ClearColor, DisplayConfig, FrameTimerLimits};
pub use error::QueueError;
pub use event::{EventBus, EventResult, RendererEvent};
pub use ids::{DataSlotId, DisplayBufferId, DisplayId, SceneId};
pub use scene::{DisplayBuffer, SceneState, SceneTransition};
