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

//! Delivery of renderer outcomes to the reconciler and the application.

use crate::control::SceneControl;
use strata_core::{
    DataSlotId, DisplayBuffer, DisplayBufferId, DisplayId, EventResult, FrameTimerLimits,
    RendererEvent, SceneId, SceneState, SceneTransition,
};

/// An event delivered to the application by [`SceneControl::dispatch_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneControlEvent {
    /// The producer published a scene.
    ScenePublished {
        /// The scene concerned.
        scene: SceneId,
    },
    /// The producer withdrew a scene. Its desired state was reset.
    SceneUnpublished {
        /// The scene concerned.
        scene: SceneId,
    },
    /// The confirmed public state of a scene changed.
    SceneStateChanged {
        /// The scene concerned.
        scene: SceneId,
        /// The new confirmed state.
        state: SceneState,
    },
    /// The renderer answered a transition, or performed one indirectly.
    TransitionOutcome {
        /// The scene concerned.
        scene: SceneId,
        /// Which rung.
        transition: SceneTransition,
        /// Outcome. Failures are retried automatically.
        result: EventResult,
    },
    /// A display buffer assignment was applied or rejected.
    DisplayBufferAssigned {
        /// The scene concerned.
        scene: SceneId,
        /// Buffer requested.
        buffer: DisplayBuffer,
        /// Render order requested.
        render_order: i32,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::create_display`].
    DisplayCreated {
        /// The display concerned.
        display: DisplayId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::destroy_display`].
    DisplayDestroyed {
        /// The display concerned.
        display: DisplayId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::create_offscreen_buffer`].
    OffscreenBufferCreated {
        /// Owning display.
        display: DisplayId,
        /// The buffer concerned.
        buffer: DisplayBufferId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::destroy_offscreen_buffer`].
    OffscreenBufferDestroyed {
        /// Owning display.
        display: DisplayId,
        /// The buffer concerned.
        buffer: DisplayBufferId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::link_data`].
    DataLinked {
        /// Providing scene.
        provider_scene: SceneId,
        /// Providing slot.
        provider_slot: DataSlotId,
        /// Consuming scene.
        consumer_scene: SceneId,
        /// Consuming slot.
        consumer_slot: DataSlotId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::link_offscreen_buffer`].
    OffscreenBufferLinked {
        /// Source buffer.
        buffer: DisplayBufferId,
        /// Consuming scene.
        consumer_scene: SceneId,
        /// Consuming slot.
        consumer_slot: DataSlotId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::unlink_data`], or an indirect unlink.
    DataUnlinked {
        /// Consuming scene.
        consumer_scene: SceneId,
        /// Consuming slot.
        consumer_slot: DataSlotId,
        /// Outcome.
        result: EventResult,
    },
    /// Reply to [`SceneControl::set_frame_timer_limits`].
    FrameTimerLimitsChanged {
        /// Limits now in force.
        limits: FrameTimerLimits,
    },
    /// Every command submitted before the echo has been applied.
    ConfirmationEcho {
        /// The confirmation token.
        text: String,
    },
}

/// Receives the events of [`SceneControl::dispatch_events`].
///
/// The handler is handed the control itself so it can react right away;
/// whatever it requests is submitted at the end of the same dispatch and
/// reaches the renderer on its next cycle.
pub trait SceneControlEventHandler {
    /// Called once per event, in the order the renderer produced them.
    fn handle(&mut self, control: &mut SceneControl, event: &SceneControlEvent);
}

impl<F> SceneControlEventHandler for F
where
    F: FnMut(&mut SceneControl, &SceneControlEvent),
{
    fn handle(&mut self, control: &mut SceneControl, event: &SceneControlEvent) {
        self(control, event)
    }
}

/// A handler that only records what it receives.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<SceneControlEvent>,
}

impl EventCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// The events collected so far, oldest first.
    pub fn events(&self) -> &[SceneControlEvent] {
        &self.events
    }

    /// Takes the collected events.
    pub fn take(&mut self) -> Vec<SceneControlEvent> {
        std::mem::take(&mut self.events)
    }
}

impl SceneControlEventHandler for EventCollector {
    fn handle(&mut self, _control: &mut SceneControl, event: &SceneControlEvent) {
        self.events.push(event.clone());
    }
}

/// The receiving end of the renderer's event channel.
#[derive(Debug)]
pub struct EventDispatcher {
    events: flume::Receiver<RendererEvent>,
    received: u64,
}

impl EventDispatcher {
    /// Wraps the receiving end of a renderer event channel.
    pub fn new(events: flume::Receiver<RendererEvent>) -> Self {
        Self {
            events,
            received: 0,
        }
    }

    /// Takes every renderer event available right now, oldest first.
    pub fn receive_all(&mut self) -> Vec<RendererEvent> {
        let batch: Vec<_> = self.events.try_iter().collect();
        self.received += batch.len() as u64;
        if !batch.is_empty() {
            log::trace!("Dispatcher received {} renderer events.", batch.len());
        }
        batch
    }

    /// Total number of renderer events received.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Returns `true` once every sender of the channel is gone.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.events.is_disconnected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_all_keeps_renderer_order() {
        let (tx, rx) = flume::unbounded();
        let mut dispatcher = EventDispatcher::new(rx);
        tx.send(RendererEvent::ScenePublished { scene: SceneId(1) })
            .unwrap();
        tx.send(RendererEvent::SceneUnpublished { scene: SceneId(1) })
            .unwrap();

        assert_eq!(
            dispatcher.receive_all(),
            vec![
                RendererEvent::ScenePublished { scene: SceneId(1) },
                RendererEvent::SceneUnpublished { scene: SceneId(1) },
            ]
        );
        assert!(dispatcher.receive_all().is_empty());
        assert_eq!(dispatcher.received(), 2);
    }

    #[test]
    fn test_disconnection_is_visible() {
        let (tx, rx) = flume::unbounded::<RendererEvent>();
        let dispatcher = EventDispatcher::new(rx);
        assert!(!dispatcher.is_disconnected());
        drop(tx);
        assert!(dispatcher.is_disconnected());
    }
}
