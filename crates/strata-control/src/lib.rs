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

//! # Strata Control
//!
//! The producer-side half of the middleware: a reconciler that drives each
//! scene, one rung at a time, from its confirmed state to the state the
//! application declared, retrying failures and standing down on unpublish,
//! plus the dispatcher that brings renderer outcomes back to it.

#![warn(missing_docs)]

pub mod config;
pub mod control;
pub mod dispatcher;
pub mod display_registry;
pub mod error;
pub mod logic;
pub mod state_machine;

pub use config::ControlConfig;
pub use control::SceneControl;
pub use dispatcher::{EventCollector, SceneControlEvent, SceneControlEventHandler};
pub use error::ControlError;
pub use logic::{SceneMapping, SceneSnapshot};
pub use state_machine::{next_step, SceneRung, Step};
