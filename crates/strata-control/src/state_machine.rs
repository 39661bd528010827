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

//! The per-scene finite state machine, free of any queue or thread.
//!
//! The reconciler tracks six internal rungs so that it can tell "published"
//! from "not published" and "mapped" from "mapped and assigned". They fold onto
//! the four public [`SceneState`] rungs through [`SceneRung::to_public`].

use strata_core::{SceneState, SceneTransition};

/// Internal rung of a scene, bottom first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SceneRung {
    /// The producer has not published the scene (or withdrew it).
    #[default]
    Unpublished,
    /// Published, not subscribed.
    Published,
    /// Subscribed, not mapped.
    Subscribed,
    /// Mapped to a display, display buffer assignment not yet sent.
    Mapped,
    /// Mapped and assigned to a display buffer.
    MappedAndAssigned,
    /// Shown.
    Rendered,
}

impl SceneRung {
    /// The public state this rung is reported as.
    pub fn to_public(self) -> SceneState {
        match self {
            SceneRung::Unpublished | SceneRung::Published => SceneState::Unavailable,
            SceneRung::Subscribed | SceneRung::Mapped => SceneState::Available,
            SceneRung::MappedAndAssigned => SceneState::Ready,
            SceneRung::Rendered => SceneState::Rendered,
        }
    }

    /// The rung the reconciler aims for when the application desires `state`.
    pub fn target_for(state: SceneState) -> SceneRung {
        match state {
            SceneState::Unavailable => SceneRung::Published,
            SceneState::Available => SceneRung::Subscribed,
            SceneState::Ready => SceneRung::MappedAndAssigned,
            SceneState::Rendered => SceneRung::Rendered,
        }
    }

    /// The rung a scene rests on once `transition` has happened.
    pub fn after(transition: SceneTransition) -> SceneRung {
        match transition {
            SceneTransition::Subscribe => SceneRung::Subscribed,
            SceneTransition::Unsubscribe => SceneRung::Published,
            SceneTransition::Map => SceneRung::Mapped,
            SceneTransition::Unmap => SceneRung::Subscribed,
            SceneTransition::Show => SceneRung::Rendered,
            SceneTransition::Hide => SceneRung::MappedAndAssigned,
        }
    }
}

/// The next thing the reconciler has to do for a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Ask the renderer for a transition and wait for its reply.
    Request(SceneTransition),
    /// Send the display buffer assignment. Not awaited, the scene moves to
    /// [`SceneRung::MappedAndAssigned`] at once.
    Assign,
}

/// Computes the single next step that closes the gap between `confirmed`
/// and `desired`.
///
/// ## Arguments
/// * `confirmed` - last rung acknowledged by the renderer.
/// * `desired` - rung the application asked for.
/// * `awaiting_reply` - a command is in flight or a stale reply is still owed.
/// * `display_ready` - the display the scene is mapped to is confirmed created.
///
/// ## Returns
/// `None` when nothing can or needs to be done right now.
pub fn next_step(
    confirmed: SceneRung,
    desired: SceneRung,
    awaiting_reply: bool,
    display_ready: bool,
) -> Option<Step> {
    if awaiting_reply || confirmed == desired {
        return None;
    }

    match confirmed {
        // Nothing to do before the producer publishes.
        SceneRung::Unpublished => None,
        SceneRung::Published => {
            (desired > SceneRung::Published).then_some(Step::Request(SceneTransition::Subscribe))
        }
        SceneRung::Subscribed => {
            if desired >= SceneRung::Mapped {
                display_ready.then_some(Step::Request(SceneTransition::Map))
            } else {
                Some(Step::Request(SceneTransition::Unsubscribe))
            }
        }
        SceneRung::Mapped => {
            if desired >= SceneRung::MappedAndAssigned {
                Some(Step::Assign)
            } else {
                Some(Step::Request(SceneTransition::Unmap))
            }
        }
        SceneRung::MappedAndAssigned => {
            if desired == SceneRung::Rendered {
                Some(Step::Request(SceneTransition::Show))
            } else {
                Some(Step::Request(SceneTransition::Unmap))
            }
        }
        SceneRung::Rendered => Some(Step::Request(SceneTransition::Hide)),
    }
}
