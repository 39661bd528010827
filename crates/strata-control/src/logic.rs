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

//! The scene lifecycle reconciler.
//!
//! [`SceneControlLogic`] keeps one record per scene: the rung the application
//! wants, the rung the renderer last confirmed, the single command in flight
//! and the replies still owed for commands it gave up on. Every input (a
//! desired state, a renderer event, a timeout check) ends with a call to
//! `advance`, which asks [`next_step`] what to do and emits at most one
//! awaited command per scene.
//!
//! Commands are collected in an outbox and application-facing events in a
//! notification list; the owner moves both on, see
//! [`SceneControl`](crate::SceneControl).

use crate::config::ControlConfig;
use crate::dispatcher::SceneControlEvent;
use crate::display_registry::DisplayRegistry;
use crate::error::ControlError;
use crate::state_machine::{next_step, SceneRung, Step};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use strata_core::command::{
    AssignSceneToDisplayBuffer, ConfirmationEcho, HideScene, MapScene, ShowScene, SubscribeScene,
    UnmapScene, UnsubscribeScene,
};
use strata_core::{
    CommandQueue, DisplayBuffer, DisplayId, EventResult, RendererCommand, RendererEvent, SceneId,
    SceneState, SceneTransition,
};

/// The display, buffer and render order requested for a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneMapping {
    /// Display the scene is (to be) mapped to.
    pub display: DisplayId,
    /// Buffer on that display the scene renders into.
    pub buffer: DisplayBuffer,
    /// Order among scenes sharing the buffer.
    pub render_order: i32,
}

impl SceneMapping {
    fn on(display: DisplayId) -> Self {
        Self {
            display,
            buffer: DisplayBuffer::Framebuffer,
            render_order: 0,
        }
    }
}

/// A diagnostic view of one scene's reconciliation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSnapshot {
    /// State the application asked for.
    pub desired: SceneState,
    /// State last confirmed by the renderer.
    pub confirmed: SceneState,
    /// Internal rung behind `confirmed`.
    pub confirmed_rung: SceneRung,
    /// The transition awaiting its reply, if any.
    pub in_flight: Option<SceneTransition>,
    /// Replies of abandoned commands still expected.
    pub owed_replies: usize,
    /// Consecutive failures of the current transition.
    pub failed_attempts: u32,
    /// Requested mapping.
    pub mapping: Option<SceneMapping>,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    transition: SceneTransition,
    issued_at: Instant,
}

/// A reply the renderer still owes for a command the reconciler stopped waiting for.
#[derive(Debug, Clone, Copy)]
struct OwedReply {
    transition: SceneTransition,
    /// Blocking replies hold back every new command for the scene.
    blocking: bool,
    since: Instant,
}

#[derive(Debug)]
struct SceneInfo {
    desired: SceneRung,
    confirmed: SceneRung,
    in_flight: Option<InFlight>,
    owed: VecDeque<OwedReply>,
    mapping: Option<SceneMapping>,
    confirmation: Option<String>,
    failed_attempts: u32,
}

impl SceneInfo {
    fn new() -> Self {
        Self {
            desired: SceneRung::Published,
            confirmed: SceneRung::Unpublished,
            in_flight: None,
            owed: VecDeque::new(),
            mapping: None,
            confirmation: None,
            failed_attempts: 0,
        }
    }

    fn awaiting_reply(&self) -> bool {
        self.in_flight.is_some() || self.owed.iter().any(|owed| owed.blocking)
    }
}

/// Drives every known scene from its confirmed state to its desired state.
#[derive(Debug)]
pub struct SceneControlLogic {
    config: ControlConfig,
    scenes: HashMap<SceneId, SceneInfo>,
    displays: DisplayRegistry,
    commands: CommandQueue<RendererCommand>,
    notifications: Vec<SceneControlEvent>,
}

impl SceneControlLogic {
    /// Creates a reconciler that knows no scene and no display.
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            scenes: HashMap::new(),
            displays: DisplayRegistry::new(),
            commands: CommandQueue::new(),
            notifications: Vec::new(),
        }
    }

    /// The display bookkeeping.
    pub fn displays(&self) -> &DisplayRegistry {
        &self.displays
    }

    /// Mutable access to the display bookkeeping.
    pub fn displays_mut(&mut self) -> &mut DisplayRegistry {
        &mut self.displays
    }

    /// Appends a command that is not part of a scene transition to the outbox.
    pub fn submit(&mut self, command: impl Into<RendererCommand>) {
        self.commands.append(command);
    }

    /// Takes every command emitted since the last call.
    pub fn take_commands(&mut self) -> CommandQueue<RendererCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Returns `true` if the outbox holds commands.
    #[must_use]
    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Takes every application-facing event produced since the last call.
    pub fn take_notifications(&mut self) -> Vec<SceneControlEvent> {
        std::mem::take(&mut self.notifications)
    }

    /// Declares the state the application wants `scene` in.
    ///
    /// The scene record is created on first use; the scene does not need to be
    /// published yet. When `confirmation` is given, a confirmation echo carrying
    /// it is emitted once the state is reached, or right away if it already is.
    ///
    /// ## Errors
    /// [`ControlError::NoMapping`] when asking for `Ready` or `Rendered`
    /// without a mapping.
    pub fn set_desired_state(
        &mut self,
        scene: SceneId,
        state: SceneState,
        confirmation: Option<String>,
    ) -> Result<(), ControlError> {
        let has_mapping = self
            .scenes
            .get(&scene)
            .is_some_and(|info| info.mapping.is_some());
        if state >= SceneState::Ready && !has_mapping {
            log::warn!("Cannot set {scene} to {state}: the scene has no display mapping.");
            return Err(ControlError::NoMapping { scene });
        }

        let info = self.scenes.entry(scene).or_insert_with(SceneInfo::new);
        let target = SceneRung::target_for(state);
        if info.desired != target {
            log::debug!(
                "{scene}: desired state {} -> {state}.",
                info.desired.to_public()
            );
            info.desired = target;
        }
        if let Some(text) = confirmation {
            if let Some(previous) = info.confirmation.replace(text) {
                log::debug!("{scene}: confirmation '{previous}' replaced before it was echoed.");
            }
        }

        self.advance(scene);
        Ok(())
    }

    /// Requests `display` for `scene`, resetting its assignment to the
    /// display's framebuffer at render order 0.
    ///
    /// ## Errors
    /// [`ControlError::UnknownDisplay`] for a display this control never
    /// created, and [`ControlError::MappingLocked`] when the scene is mapped,
    /// being mapped, or heading for `Ready`/`Rendered` on another display.
    pub fn set_mapping(&mut self, scene: SceneId, display: DisplayId) -> Result<(), ControlError> {
        if self.displays.display_status(display).is_none() {
            return Err(ControlError::UnknownDisplay { display });
        }

        let info = self.scenes.entry(scene).or_insert_with(SceneInfo::new);
        if let Some(current) = info.mapping {
            if current.display == display {
                return Ok(());
            }
            let mapping_in_use = info.confirmed >= SceneRung::Mapped
                || info.desired >= SceneRung::MappedAndAssigned
                || info
                    .in_flight
                    .is_some_and(|f| f.transition == SceneTransition::Map);
            if mapping_in_use {
                log::warn!(
                    "Cannot map {scene} to {display}: it is {} on {} and heading for {}.",
                    info.confirmed.to_public(),
                    current.display,
                    info.desired.to_public()
                );
                return Err(ControlError::MappingLocked {
                    scene,
                    current: current.display,
                    requested: display,
                });
            }
        }

        log::debug!("{scene}: mapping set to {display}.");
        info.mapping = Some(SceneMapping::on(display));
        Ok(())
    }

    /// Chooses the buffer and render order of a mapped scene.
    ///
    /// If the scene is already `Ready` or `Rendered` the assignment is sent at
    /// once, otherwise it is sent right before the scene is shown.
    pub fn set_display_buffer_assignment(
        &mut self,
        scene: SceneId,
        buffer: DisplayBuffer,
        render_order: i32,
    ) -> Result<(), ControlError> {
        let info = self
            .scenes
            .get_mut(&scene)
            .ok_or(ControlError::NoMapping { scene })?;
        let mapping = info
            .mapping
            .as_mut()
            .ok_or(ControlError::NoMapping { scene })?;

        if let DisplayBuffer::Offscreen(id) = buffer {
            match self.displays.buffer_display(id) {
                None => return Err(ControlError::UnknownOffscreenBuffer { buffer: id }),
                Some(owner) if owner != mapping.display => {
                    return Err(ControlError::BufferNotOnDisplay {
                        buffer: id,
                        display: mapping.display,
                    })
                }
                Some(_) => {}
            }
        }

        mapping.buffer = buffer;
        mapping.render_order = render_order;
        log::debug!("{scene}: assigned to {buffer} at render order {render_order}.");

        if info.confirmed >= SceneRung::MappedAndAssigned && info.desired >= SceneRung::Mapped {
            self.commands.append(AssignSceneToDisplayBuffer {
                scene,
                buffer,
                render_order,
            });
        }
        Ok(())
    }

    /// The public state last confirmed for `scene`; `Unavailable` for unknown scenes.
    #[must_use]
    pub fn last_confirmed_state(&self, scene: SceneId) -> SceneState {
        self.scenes
            .get(&scene)
            .map_or(SceneState::Unavailable, |info| info.confirmed.to_public())
    }

    /// The display `scene` is confirmed mapped to.
    #[must_use]
    pub fn display_mapped_to(&self, scene: SceneId) -> Option<DisplayId> {
        let info = self.scenes.get(&scene)?;
        if info.confirmed >= SceneRung::Mapped {
            info.mapping.map(|mapping| mapping.display)
        } else {
            None
        }
    }

    /// The mapping most recently requested for `scene`.
    #[must_use]
    pub fn requested_mapping(&self, scene: SceneId) -> Option<SceneMapping> {
        self.scenes.get(&scene).and_then(|info| info.mapping)
    }

    /// A diagnostic snapshot of `scene`.
    pub fn snapshot(&self, scene: SceneId) -> Option<SceneSnapshot> {
        self.scenes.get(&scene).map(|info| SceneSnapshot {
            desired: info.desired.to_public(),
            confirmed: info.confirmed.to_public(),
            confirmed_rung: info.confirmed,
            in_flight: info.in_flight.map(|f| f.transition),
            owed_replies: info.owed.len(),
            failed_attempts: info.failed_attempts,
            mapping: info.mapping,
        })
    }

    /// Number of scenes with a command awaiting its reply.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.scenes
            .values()
            .filter(|info| info.in_flight.is_some())
            .count()
    }

    /// Feeds one renderer event into the reconciler.
    pub fn handle_event(&mut self, event: RendererEvent) {
        log::trace!("Reconciler received {event:?}.");
        match event {
            RendererEvent::ScenePublished { scene } => self.scene_published(scene),
            RendererEvent::SceneUnpublished { scene } => self.scene_unpublished(scene),
            RendererEvent::SceneTransition {
                scene,
                transition,
                result,
            } => self.transition_finished(scene, transition, result),
            RendererEvent::SceneAssigned {
                scene,
                buffer,
                render_order,
                result,
            } => {
                if result != EventResult::Ok {
                    log::warn!("Renderer rejected assigning {scene} to {buffer}.");
                }
                self.notify(SceneControlEvent::DisplayBufferAssigned {
                    scene,
                    buffer,
                    render_order,
                    result,
                });
            }
            RendererEvent::DisplayCreated { display, result } => {
                self.notify(SceneControlEvent::DisplayCreated { display, result });
                if self.displays.display_created(display, result) {
                    for scene in self.scenes_mapped_to(display) {
                        self.advance(scene);
                    }
                }
            }
            RendererEvent::DisplayDestroyed { display, result } => {
                self.displays.display_destroyed(display, result);
                self.notify(SceneControlEvent::DisplayDestroyed { display, result });
            }
            RendererEvent::OffscreenBufferCreated {
                display,
                buffer,
                result,
            } => {
                self.displays.buffer_created(buffer, result);
                self.notify(SceneControlEvent::OffscreenBufferCreated {
                    display,
                    buffer,
                    result,
                });
            }
            RendererEvent::OffscreenBufferDestroyed {
                display,
                buffer,
                result,
            } => {
                self.displays.buffer_destroyed(buffer, result);
                self.notify(SceneControlEvent::OffscreenBufferDestroyed {
                    display,
                    buffer,
                    result,
                });
            }
            RendererEvent::DataLinked {
                provider_scene,
                provider_slot,
                consumer_scene,
                consumer_slot,
                result,
            } => self.notify(SceneControlEvent::DataLinked {
                provider_scene,
                provider_slot,
                consumer_scene,
                consumer_slot,
                result,
            }),
            RendererEvent::OffscreenBufferLinked {
                buffer,
                consumer_scene,
                consumer_slot,
                result,
            } => self.notify(SceneControlEvent::OffscreenBufferLinked {
                buffer,
                consumer_scene,
                consumer_slot,
                result,
            }),
            RendererEvent::DataUnlinked {
                consumer_scene,
                consumer_slot,
                result,
            } => self.notify(SceneControlEvent::DataUnlinked {
                consumer_scene,
                consumer_slot,
                result,
            }),
            RendererEvent::FrameTimerLimitsChanged { limits } => {
                self.notify(SceneControlEvent::FrameTimerLimitsChanged { limits })
            }
            RendererEvent::ConfirmationEcho { text } => {
                self.notify(SceneControlEvent::ConfirmationEcho { text })
            }
        }
    }

    /// Treats every scene command unanswered for longer than the configured
    /// timeout as failed, and forgets owed replies older than the timeout.
    ///
    /// Does nothing without [`ControlConfig::command_timeout`].
    pub fn check_timeouts(&mut self, now: Instant) {
        let Some(timeout) = self.config.command_timeout else {
            return;
        };

        let mut expired = Vec::new();
        for (&scene, info) in self.scenes.iter_mut() {
            let owed_before = info.owed.len();
            info.owed
                .retain(|owed| now.saturating_duration_since(owed.since) < timeout);
            if info.owed.len() != owed_before {
                log::warn!("{scene}: gave up waiting for a stale reply.");
            }
            let mut timed_out = None;
            if let Some(in_flight) = info.in_flight {
                if now.saturating_duration_since(in_flight.issued_at) >= timeout {
                    log::warn!(
                        "{scene}: {} unanswered for {timeout:?}, treating it as failed.",
                        in_flight.transition
                    );
                    info.in_flight = None;
                    info.owed.push_back(OwedReply {
                        transition: in_flight.transition,
                        blocking: false,
                        since: now,
                    });
                    info.failed_attempts += 1;
                    timed_out = Some(in_flight.transition);
                }
            }
            if timed_out.is_some() || info.owed.len() != owed_before {
                expired.push((scene, timed_out));
            }
        }

        expired.sort_by_key(|(scene, _)| *scene);
        for (scene, timed_out) in expired {
            if let Some(transition) = timed_out {
                self.notify(SceneControlEvent::TransitionOutcome {
                    scene,
                    transition,
                    result: EventResult::Fail,
                });
            }
            self.advance(scene);
        }
    }

    fn scene_published(&mut self, scene: SceneId) {
        let info = self.scenes.entry(scene).or_insert_with(SceneInfo::new);
        if info.confirmed != SceneRung::Unpublished {
            log::warn!("{scene} was published twice, ignoring the second publication.");
            return;
        }
        log::info!("{scene} published.");
        self.notify(SceneControlEvent::ScenePublished { scene });
        self.set_confirmed(scene, SceneRung::Published);
        self.advance(scene);
    }

    fn scene_unpublished(&mut self, scene: SceneId) {
        let Some(info) = self.scenes.get_mut(&scene) else {
            log::warn!("Unpublish of unknown {scene} ignored.");
            return;
        };
        log::info!("{scene} unpublished.");

        // The renderer will still answer the command in flight; that answer
        // no longer says anything about the scene and must not unblock it.
        if let Some(in_flight) = info.in_flight.take() {
            log::debug!(
                "{scene}: reply to {} will be discarded.",
                in_flight.transition
            );
            info.owed.push_back(OwedReply {
                transition: in_flight.transition,
                blocking: true,
                since: in_flight.issued_at,
            });
        }
        if info.desired > SceneRung::Published {
            log::info!(
                "{scene}: desired state {} dropped, it must be declared again.",
                info.desired.to_public()
            );
        }
        info.desired = SceneRung::Published;
        info.failed_attempts = 0;
        if let Some(text) = info.confirmation.take() {
            log::debug!("{scene}: confirmation '{text}' dropped with the desired state.");
        }

        self.set_confirmed(scene, SceneRung::Unpublished);
        self.notify(SceneControlEvent::SceneUnpublished { scene });
    }

    fn transition_finished(
        &mut self,
        scene: SceneId,
        transition: SceneTransition,
        result: EventResult,
    ) {
        let Some(info) = self.scenes.get_mut(&scene) else {
            log::warn!("{transition} {result} for unknown {scene} ignored.");
            return;
        };

        if result == EventResult::Indirect {
            let lowered = SceneRung::after(transition);
            if lowered >= info.confirmed {
                log::warn!(
                    "{scene}: indirect {transition} does not lower {:?}, ignoring it.",
                    info.confirmed
                );
                return;
            }
            self.notify(SceneControlEvent::TransitionOutcome {
                scene,
                transition,
                result,
            });
            self.set_confirmed(scene, lowered);
            return;
        }

        if let Some(owed) = info
            .owed
            .front()
            .copied()
            .filter(|owed| owed.transition == transition)
        {
            info.owed.pop_front();
            let confirms = !owed.blocking
                && result == EventResult::Ok
                && info.confirmed != SceneRung::Unpublished;
            if !confirms {
                log::debug!("{scene}: discarding stale {transition} reply ({result}).");
                self.advance(scene);
                return;
            }

            // A timed-out command was carried out after all. The renderer
            // refuses the retry, so its answer is owed from now on.
            log::info!("{scene}: late {transition} reply confirms the abandoned request.");
            if info.in_flight.is_some_and(|f| f.transition == transition) {
                info.in_flight = None;
                info.owed.push_back(OwedReply {
                    transition,
                    blocking: false,
                    since: Instant::now(),
                });
            }
            info.failed_attempts = 0;
            self.notify(SceneControlEvent::TransitionOutcome {
                scene,
                transition,
                result,
            });
            self.set_confirmed(scene, SceneRung::after(transition));
            self.advance(scene);
            return;
        }

        if info.in_flight.map(|f| f.transition) != Some(transition) {
            log::warn!("{scene}: received {transition} {result} without asking for it, ignoring.");
            return;
        }
        info.in_flight = None;

        match result {
            EventResult::Ok => {
                info.failed_attempts = 0;
                self.notify(SceneControlEvent::TransitionOutcome {
                    scene,
                    transition,
                    result,
                });
                self.set_confirmed(scene, SceneRung::after(transition));
            }
            EventResult::Fail => {
                info.failed_attempts += 1;
                log::warn!(
                    "{scene}: {transition} failed (attempt {}), retrying.",
                    info.failed_attempts
                );
                self.notify(SceneControlEvent::TransitionOutcome {
                    scene,
                    transition,
                    result,
                });
            }
            EventResult::Indirect => {}
        }
        self.advance(scene);
    }

    /// Emits whatever `scene` needs next. Stops at the first awaited command.
    fn advance(&mut self, scene: SceneId) {
        loop {
            let Some(info) = self.scenes.get_mut(&scene) else {
                return;
            };
            let awaiting = info.awaiting_reply();

            if info.confirmed == info.desired && !awaiting {
                if let Some(text) = info.confirmation.take() {
                    log::debug!(
                        "{scene} reached {}, echoing '{text}'.",
                        info.desired.to_public()
                    );
                    self.commands.append(ConfirmationEcho { text });
                }
                return;
            }

            let display_ready = info
                .mapping
                .is_some_and(|mapping| self.displays.is_display_created(mapping.display));

            match next_step(info.confirmed, info.desired, awaiting, display_ready) {
                None => return,
                Some(Step::Assign) => {
                    let Some(mapping) = info.mapping else {
                        log::error!("{scene} is mapped without a mapping record.");
                        return;
                    };
                    self.commands.append(AssignSceneToDisplayBuffer {
                        scene,
                        buffer: mapping.buffer,
                        render_order: mapping.render_order,
                    });
                    self.set_confirmed(scene, SceneRung::MappedAndAssigned);
                }
                Some(Step::Request(transition)) => {
                    let command: RendererCommand = match transition {
                        SceneTransition::Subscribe => SubscribeScene { scene }.into(),
                        SceneTransition::Unsubscribe => UnsubscribeScene { scene }.into(),
                        SceneTransition::Map => match info.mapping {
                            Some(mapping) => MapScene {
                                scene,
                                display: mapping.display,
                            }
                            .into(),
                            None => return,
                        },
                        SceneTransition::Unmap => UnmapScene { scene }.into(),
                        SceneTransition::Show => ShowScene { scene }.into(),
                        SceneTransition::Hide => HideScene { scene }.into(),
                    };
                    log::debug!("{scene}: requesting {transition}.");
                    info.in_flight = Some(InFlight {
                        transition,
                        issued_at: Instant::now(),
                    });
                    self.commands.append(command);
                    return;
                }
            }
        }
    }

    fn set_confirmed(&mut self, scene: SceneId, rung: SceneRung) {
        let Some(info) = self.scenes.get_mut(&scene) else {
            return;
        };
        let before = info.confirmed.to_public();
        info.confirmed = rung;
        let after = rung.to_public();
        log::debug!("{scene} is {after} (internal {rung:?}).");
        if before != after {
            self.notify(SceneControlEvent::SceneStateChanged {
                scene,
                state: after,
            });
        }
    }

    fn scenes_mapped_to(&self, display: DisplayId) -> Vec<SceneId> {
        let mut scenes: Vec<_> = self
            .scenes
            .iter()
            .filter(|(_, info)| info.mapping.is_some_and(|m| m.display == display))
            .map(|(&scene, _)| scene)
            .collect();
        scenes.sort();
        scenes
    }

    fn notify(&mut self, event: SceneControlEvent) {
        self.notifications.push(event);
    }
}
