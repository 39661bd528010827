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

//! Renderer-side scene states and the rules for moving between them.
//!
//! The executor only decides whether a transition is legal and records the
//! result. Resource work (uploads, enabling) is done by the caller, which
//! commits the transition once the platform has accepted it.

use std::collections::HashMap;
use strata_core::{DisplayBuffer, DisplayBufferId, DisplayId, SceneId, SceneTransition};

/// Where a scene stands on the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RendererSceneState {
    /// Offered by its publisher, nothing requested yet.
    Published,
    /// Content is being received.
    Subscribed,
    /// Resources uploaded to a display.
    Mapped,
    /// Drawn every frame.
    Rendered,
}

/// What the renderer knows about one published scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRecord {
    /// Current state.
    pub state: RendererSceneState,
    /// Display holding the scene's resources, while mapped.
    pub display: Option<DisplayId>,
    /// Target the scene is drawn into.
    pub buffer: DisplayBuffer,
    /// Position within the target, lower first.
    pub render_order: i32,
}

impl SceneRecord {
    fn published() -> Self {
        Self {
            state: RendererSceneState::Published,
            display: None,
            buffer: DisplayBuffer::Framebuffer,
            render_order: 0,
        }
    }

    /// Whether the scene has resources on a display.
    pub fn is_mapped(&self) -> bool {
        self.state >= RendererSceneState::Mapped
    }
}

/// Scene bookkeeping of the renderer.
#[derive(Debug, Default)]
pub struct SceneStateExecutor {
    scenes: HashMap<SceneId, SceneRecord>,
}

impl SceneStateExecutor {
    /// Creates an executor with no scenes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly published scene.
    ///
    /// ## Returns
    /// `false` if the scene was already published.
    pub fn publish(&mut self, scene: SceneId) -> bool {
        if self.scenes.contains_key(&scene) {
            return false;
        }
        self.scenes.insert(scene, SceneRecord::published());
        true
    }

    /// The transitions that take `scene` back to
    /// [`Published`](RendererSceneState::Published), in order, or `None` if it
    /// is not published.
    pub fn exit_path(&self, scene: SceneId) -> Option<Vec<SceneTransition>> {
        let path = match self.scenes.get(&scene)?.state {
            RendererSceneState::Published => vec![],
            RendererSceneState::Subscribed => vec![SceneTransition::Unsubscribe],
            RendererSceneState::Mapped => {
                vec![SceneTransition::Unmap, SceneTransition::Unsubscribe]
            }
            RendererSceneState::Rendered => vec![
                SceneTransition::Hide,
                SceneTransition::Unmap,
                SceneTransition::Unsubscribe,
            ],
        };
        Some(path)
    }

    /// Forgets a scene.
    ///
    /// ## Returns
    /// `false` if it was not published.
    pub fn unpublish(&mut self, scene: SceneId) -> bool {
        self.scenes.remove(&scene).is_some()
    }

    /// Whether `transition` may be applied to `scene` now.
    pub fn can_apply(&self, scene: SceneId, transition: SceneTransition) -> bool {
        let Some(record) = self.scenes.get(&scene) else {
            return false;
        };
        record.state == Self::source_state(transition)
    }

    /// Records a transition accepted by the platform.
    ///
    /// `display` is only read for [`SceneTransition::Map`]. Unmapping drops the
    /// display and resets the buffer assignment.
    pub fn commit(&mut self, scene: SceneId, transition: SceneTransition, display: Option<DisplayId>) {
        let Some(record) = self.scenes.get_mut(&scene) else {
            return;
        };
        record.state = match transition {
            SceneTransition::Subscribe => RendererSceneState::Subscribed,
            SceneTransition::Unsubscribe => RendererSceneState::Published,
            SceneTransition::Map => {
                record.display = display;
                RendererSceneState::Mapped
            }
            SceneTransition::Unmap => {
                record.display = None;
                record.buffer = DisplayBuffer::Framebuffer;
                record.render_order = 0;
                RendererSceneState::Subscribed
            }
            SceneTransition::Show => RendererSceneState::Rendered,
            SceneTransition::Hide => RendererSceneState::Mapped,
        };
    }

    /// Moves a mapped scene into `buffer` at `render_order`.
    ///
    /// ## Returns
    /// `false` if the scene is not mapped.
    pub fn assign(&mut self, scene: SceneId, buffer: DisplayBuffer, render_order: i32) -> bool {
        match self.scenes.get_mut(&scene) {
            Some(record) if record.is_mapped() => {
                record.buffer = buffer;
                record.render_order = render_order;
                true
            }
            _ => false,
        }
    }

    /// The record of `scene`.
    pub fn record(&self, scene: SceneId) -> Option<&SceneRecord> {
        self.scenes.get(&scene)
    }

    /// The state of `scene`, if published.
    pub fn state(&self, scene: SceneId) -> Option<RendererSceneState> {
        self.scenes.get(&scene).map(|record| record.state)
    }

    /// Whether any scene has resources on `display`.
    pub fn has_scenes_on(&self, display: DisplayId) -> bool {
        self.scenes
            .values()
            .any(|record| record.display == Some(display))
    }

    /// Whether any mapped scene draws into `buffer`.
    pub fn has_scenes_in(&self, buffer: DisplayBufferId) -> bool {
        self.scenes
            .values()
            .any(|record| record.is_mapped() && record.buffer == DisplayBuffer::Offscreen(buffer))
    }

    /// Rendered scenes of `display` drawn into `buffer`, in draw order.
    pub fn rendered_in(&self, display: DisplayId, buffer: DisplayBuffer) -> Vec<SceneId> {
        let mut scenes: Vec<(i32, SceneId)> = self
            .scenes
            .iter()
            .filter(|(_, record)| {
                record.state == RendererSceneState::Rendered
                    && record.display == Some(display)
                    && record.buffer == buffer
            })
            .map(|(scene, record)| (record.render_order, *scene))
            .collect();
        scenes.sort_unstable();
        scenes.into_iter().map(|(_, scene)| scene).collect()
    }

    /// Number of published scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether no scene is published.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    fn source_state(transition: SceneTransition) -> RendererSceneState {
        match transition {
            SceneTransition::Subscribe => RendererSceneState::Published,
            SceneTransition::Unsubscribe | SceneTransition::Map => RendererSceneState::Subscribed,
            SceneTransition::Unmap | SceneTransition::Show => RendererSceneState::Mapped,
            SceneTransition::Hide => RendererSceneState::Rendered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(executor: &mut SceneStateExecutor, scene: SceneId, display: DisplayId) {
        executor.publish(scene);
        executor.commit(scene, SceneTransition::Subscribe, None);
        executor.commit(scene, SceneTransition::Map, Some(display));
        executor.commit(scene, SceneTransition::Show, None);
    }

    #[test]
    fn test_transitions_need_the_right_source_state() {
        let mut executor = SceneStateExecutor::new();
        let scene = SceneId(1);
        assert!(!executor.can_apply(scene, SceneTransition::Subscribe));

        executor.publish(scene);
        assert!(executor.can_apply(scene, SceneTransition::Subscribe));
        assert!(!executor.can_apply(scene, SceneTransition::Map));
        assert!(!executor.can_apply(scene, SceneTransition::Show));

        executor.commit(scene, SceneTransition::Subscribe, None);
        assert!(executor.can_apply(scene, SceneTransition::Map));
        assert!(executor.can_apply(scene, SceneTransition::Unsubscribe));
        assert!(!executor.can_apply(scene, SceneTransition::Subscribe));
    }

    #[test]
    fn test_duplicate_publish_is_refused() {
        let mut executor = SceneStateExecutor::new();
        assert!(executor.publish(SceneId(2)));
        assert!(!executor.publish(SceneId(2)));
        assert_eq!(executor.len(), 1);
    }

    #[test]
    fn test_exit_path_follows_the_state() {
        let mut executor = SceneStateExecutor::new();
        rendered(&mut executor, SceneId(1), DisplayId(0));
        executor.publish(SceneId(2));
        executor.commit(SceneId(2), SceneTransition::Subscribe, None);
        executor.publish(SceneId(3));

        assert_eq!(
            executor.exit_path(SceneId(1)),
            Some(vec![
                SceneTransition::Hide,
                SceneTransition::Unmap,
                SceneTransition::Unsubscribe
            ])
        );
        assert_eq!(
            executor.exit_path(SceneId(2)),
            Some(vec![SceneTransition::Unsubscribe])
        );
        assert_eq!(executor.exit_path(SceneId(3)), Some(vec![]));
        assert_eq!(executor.exit_path(SceneId(4)), None);

        assert!(executor.unpublish(SceneId(2)));
        assert!(!executor.unpublish(SceneId(2)));
        assert_eq!(executor.len(), 2);
    }

    #[test]
    fn test_assign_needs_a_mapped_scene() {
        let mut executor = SceneStateExecutor::new();
        let scene = SceneId(5);
        executor.publish(scene);
        assert!(!executor.assign(scene, DisplayBuffer::Framebuffer, 1));

        executor.commit(scene, SceneTransition::Subscribe, None);
        executor.commit(scene, SceneTransition::Map, Some(DisplayId(0)));
        assert!(executor.assign(scene, DisplayBuffer::Offscreen(DisplayBufferId(3)), 2));
        assert!(executor.has_scenes_in(DisplayBufferId(3)));

        executor.commit(scene, SceneTransition::Unmap, None);
        let record = executor.record(scene).unwrap();
        assert_eq!(record.buffer, DisplayBuffer::Framebuffer);
        assert_eq!(record.render_order, 0);
        assert!(!executor.has_scenes_on(DisplayId(0)));
    }

    #[test]
    fn test_rendered_scenes_sorted_by_order_then_id() {
        let mut executor = SceneStateExecutor::new();
        for id in [9, 4, 7] {
            rendered(&mut executor, SceneId(id), DisplayId(0));
        }
        executor.assign(SceneId(9), DisplayBuffer::Framebuffer, -1);
        rendered(&mut executor, SceneId(1), DisplayId(1));

        assert_eq!(
            executor.rendered_in(DisplayId(0), DisplayBuffer::Framebuffer),
            vec![SceneId(9), SceneId(4), SceneId(7)]
        );
        assert_eq!(
            executor.rendered_in(DisplayId(1), DisplayBuffer::Framebuffer),
            vec![SceneId(1)]
        );
    }
}
