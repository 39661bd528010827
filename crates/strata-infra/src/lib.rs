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

//! # Strata Infra
//!
//! The renderer schedule. [`RendererCore`] drains the command transport once
//! per cycle, applies every command against its scene, display and link
//! registries, renders each display and sends the outcomes back as
//! [`RendererEvent`](strata_core::RendererEvent)s. [`RendererLoop`] runs it on
//! a dedicated thread.
//!
//! Platform access goes through [`PlatformFactory`] and [`DisplayBackend`];
//! [`HeadlessPlatform`] is the in-memory implementation.

#![warn(missing_docs)]

pub mod backend;
pub mod data_links;
pub mod display_manager;
pub mod error;
pub mod headless;
pub mod render_loop;
pub mod renderer;
pub mod scene_executor;

pub use backend::{DisplayBackend, FramePlan, PlatformFactory, RenderPass};
pub use data_links::{DataLinkRegistry, LinkSource};
pub use display_manager::{DisplayManager, OffscreenBuffer};
pub use error::{BackendError, LoopError};
pub use headless::{FaultPlan, FrameRecorder, HeadlessPlatform};
pub use render_loop::{LoopConfig, LoopMode, RendererLoop};
pub use renderer::RendererCore;
pub use scene_executor::{RendererSceneState, SceneRecord, SceneStateExecutor};
