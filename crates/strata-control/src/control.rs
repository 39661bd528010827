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

//! The application-facing scene control API.

use crate::config::ControlConfig;
use crate::dispatcher::{EventDispatcher, SceneControlEvent, SceneControlEventHandler};
use crate::error::ControlError;
use crate::logic::{SceneControlLogic, SceneMapping, SceneSnapshot};
use std::sync::Arc;
use std::time::Instant;
use strata_core::command::{
    CreateDisplay, CreateOffscreenBuffer, DestroyDisplay, DestroyOffscreenBuffer, LinkData,
    LinkOffscreenBuffer, SetClearColor, SetFrameTimerLimits, UnlinkData,
};
use strata_core::{
    ClearColor, CommandTransport, DataSlotId, DisplayBuffer, DisplayBufferId, DisplayConfig,
    DisplayId, FrameTimerLimits, RendererCommand, RendererEvent, SceneId, SceneState,
};

/// Declares desired scene states and reports the renderer's progress.
///
/// Every request is queued locally and submitted to the renderer in one batch
/// by [`flush`](Self::flush). [`dispatch_events`](Self::dispatch_events) feeds
/// renderer outcomes to the reconciler, hands the resulting events to the
/// application and submits whatever the reconciler and the handler queued.
///
/// # Examples
///
/// ```no_run
/// # use strata_control::{SceneControl, ControlConfig};
/// # use strata_core::{CommandTransport, DisplayConfig, SceneId, SceneState};
/// # use std::sync::Arc;
/// let transport = Arc::new(CommandTransport::new());
/// let (_events_tx, events_rx) = flume::unbounded();
/// let mut control = SceneControl::new(ControlConfig::default(), transport, events_rx);
///
/// let display = control.create_display(DisplayConfig::default());
/// control.set_mapping(SceneId(33), display)?;
/// control.set_desired_state(SceneId(33), SceneState::Rendered, Some("shown"))?;
/// control.flush();
/// # Ok::<(), strata_control::ControlError>(())
/// ```
#[derive(Debug)]
pub struct SceneControl {
    logic: SceneControlLogic,
    transport: Arc<CommandTransport<RendererCommand>>,
    dispatcher: EventDispatcher,
    submitted: u64,
}

impl SceneControl {
    /// Creates a control submitting to `transport` and listening on `events`.
    pub fn new(
        config: ControlConfig,
        transport: Arc<CommandTransport<RendererCommand>>,
        events: flume::Receiver<RendererEvent>,
    ) -> Self {
        log::info!(
            "Scene control initialized (command timeout: {:?}).",
            config.command_timeout
        );
        Self {
            logic: SceneControlLogic::new(config),
            transport,
            dispatcher: EventDispatcher::new(events),
            submitted: 0,
        }
    }

    /// Declares the state the application wants `scene` in.
    ///
    /// ## Arguments
    /// * `scene` - the scene, published or not.
    /// * `state` - the target state.
    /// * `confirmation` - echoed back as [`SceneControlEvent::ConfirmationEcho`]
    ///   once `state` is reached.
    pub fn set_desired_state(
        &mut self,
        scene: SceneId,
        state: SceneState,
        confirmation: Option<&str>,
    ) -> Result<(), ControlError> {
        self.logic
            .set_desired_state(scene, state, confirmation.map(str::to_owned))
    }

    /// Maps `scene` to `display`. Rejected once the scene is mapped or
    /// heading for `Ready` on another display.
    pub fn set_mapping(&mut self, scene: SceneId, display: DisplayId) -> Result<(), ControlError> {
        self.logic.set_mapping(scene, display)
    }

    /// Assigns a mapped scene to a display buffer with a render order.
    pub fn set_display_buffer_assignment(
        &mut self,
        scene: SceneId,
        buffer: DisplayBuffer,
        render_order: i32,
    ) -> Result<(), ControlError> {
        self.logic
            .set_display_buffer_assignment(scene, buffer, render_order)
    }

    /// Links a data provider slot to a data consumer slot.
    pub fn link_data(
        &mut self,
        provider_scene: SceneId,
        provider_slot: DataSlotId,
        consumer_scene: SceneId,
        consumer_slot: DataSlotId,
    ) {
        self.logic.submit(LinkData {
            provider_scene,
            provider_slot,
            consumer_scene,
            consumer_slot,
        });
    }

    /// Uses an offscreen buffer as the texture behind a consumer slot.
    pub fn link_offscreen_buffer(
        &mut self,
        buffer: DisplayBufferId,
        consumer_scene: SceneId,
        consumer_slot: DataSlotId,
    ) -> Result<(), ControlError> {
        if self.logic.displays().buffer_display(buffer).is_none() {
            return Err(ControlError::UnknownOffscreenBuffer { buffer });
        }
        self.logic.submit(LinkOffscreenBuffer {
            buffer,
            consumer_scene,
            consumer_slot,
        });
        Ok(())
    }

    /// Removes the link feeding a consumer slot.
    pub fn unlink_data(&mut self, consumer_scene: SceneId, consumer_slot: DataSlotId) {
        self.logic.submit(UnlinkData {
            consumer_scene,
            consumer_slot,
        });
    }

    /// Requests a new display.
    ///
    /// ## Returns
    /// The id the display will have. Scenes can be mapped to it right away;
    /// they are only sent to it once the renderer confirms the creation.
    pub fn create_display(&mut self, config: DisplayConfig) -> DisplayId {
        let display = self.logic.displays_mut().reserve_display();
        log::info!(
            "Requesting {display} ({}x{} '{}').",
            config.width,
            config.height,
            config.title
        );
        self.logic.submit(CreateDisplay { display, config });
        display
    }

    /// Requests the destruction of a display. The renderer refuses while
    /// scenes are still mapped to it.
    pub fn destroy_display(&mut self, display: DisplayId) -> Result<(), ControlError> {
        self.logic
            .displays_mut()
            .request_display_destruction(display)?;
        self.logic.submit(DestroyDisplay { display });
        Ok(())
    }

    /// Requests an offscreen buffer on `display`.
    pub fn create_offscreen_buffer(
        &mut self,
        display: DisplayId,
        width: u32,
        height: u32,
        interruptible: bool,
    ) -> Result<DisplayBufferId, ControlError> {
        if width == 0 || height == 0 {
            return Err(ControlError::InvalidBufferSize { width, height });
        }
        let buffer = self.logic.displays_mut().reserve_buffer(display)?;
        self.logic.submit(CreateOffscreenBuffer {
            display,
            buffer,
            width,
            height,
            interruptible,
        });
        Ok(buffer)
    }

    /// Requests the destruction of an offscreen buffer. The renderer refuses
    /// while scenes are still assigned to it.
    pub fn destroy_offscreen_buffer(
        &mut self,
        display: DisplayId,
        buffer: DisplayBufferId,
    ) -> Result<(), ControlError> {
        self.logic
            .displays_mut()
            .request_buffer_destruction(display, buffer)?;
        self.logic
            .submit(DestroyOffscreenBuffer { display, buffer });
        Ok(())
    }

    /// Changes the clear colour of a display buffer.
    pub fn set_clear_color(
        &mut self,
        display: DisplayId,
        buffer: DisplayBuffer,
        color: ClearColor,
    ) -> Result<(), ControlError> {
        let displays = self.logic.displays();
        if displays.display_status(display).is_none() {
            return Err(ControlError::UnknownDisplay { display });
        }
        if let DisplayBuffer::Offscreen(id) = buffer {
            if displays.buffer_display(id) != Some(display) {
                return Err(ControlError::BufferNotOnDisplay {
                    buffer: id,
                    display,
                });
            }
        }
        self.logic.submit(SetClearColor {
            display,
            buffer,
            color,
        });
        Ok(())
    }

    /// Changes the renderer's per-frame time budgets.
    pub fn set_frame_timer_limits(&mut self, limits: FrameTimerLimits) {
        self.logic.submit(SetFrameTimerLimits { limits });
    }

    /// Submits every queued command to the renderer in one batch.
    ///
    /// ## Returns
    /// The number of commands submitted.
    pub fn flush(&mut self) -> usize {
        if !self.logic.has_commands() {
            return 0;
        }
        let mut batch = self.logic.take_commands();
        let count = self.transport.enqueue_all(&mut batch);
        self.submitted += count as u64;
        log::trace!("Flushed {count} commands to the renderer.");
        count
    }

    /// Processes every renderer event received since the last call and hands
    /// the resulting events to `handler`, then flushes.
    ///
    /// ## Returns
    /// The number of events delivered to `handler`.
    pub fn dispatch_events<H>(&mut self, handler: &mut H) -> usize
    where
        H: SceneControlEventHandler + ?Sized,
    {
        for event in self.dispatcher.receive_all() {
            self.logic.handle_event(event);
        }
        self.logic.check_timeouts(Instant::now());

        let events = self.logic.take_notifications();
        for event in &events {
            handler.handle(self, event);
        }
        self.flush();
        events.len()
    }

    /// Like [`dispatch_events`](Self::dispatch_events) for callbacks that do
    /// not need the control.
    pub fn poll(&mut self, mut callback: impl FnMut(&SceneControlEvent)) -> usize {
        self.dispatch_events(&mut |_: &mut SceneControl, event: &SceneControlEvent| {
            callback(event)
        })
    }

    /// The state last confirmed for `scene`.
    #[must_use]
    pub fn last_confirmed_state(&self, scene: SceneId) -> SceneState {
        self.logic.last_confirmed_state(scene)
    }

    /// The display `scene` is confirmed mapped to, if any.
    #[must_use]
    pub fn display_mapped_to(&self, scene: SceneId) -> Option<DisplayId> {
        self.logic.display_mapped_to(scene)
    }

    /// The mapping most recently requested for `scene`.
    #[must_use]
    pub fn requested_mapping(&self, scene: SceneId) -> Option<SceneMapping> {
        self.logic.requested_mapping(scene)
    }

    /// Diagnostic view of a scene's reconciliation record.
    pub fn scene_info(&self, scene: SceneId) -> Option<SceneSnapshot> {
        self.logic.snapshot(scene)
    }

    /// Number of commands submitted to the renderer so far.
    #[must_use]
    pub fn submitted_commands(&self) -> u64 {
        self.submitted
    }

    /// Returns `true` once the renderer side dropped its event sender.
    #[must_use]
    pub fn is_renderer_disconnected(&self) -> bool {
        self.dispatcher.is_disconnected()
    }
}
