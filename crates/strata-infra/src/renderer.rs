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

//! One renderer processing cycle: drain, apply, render, report.

use crate::backend::{FramePlan, PlatformFactory, RenderPass};
use crate::data_links::{DataLinkRegistry, LinkSource};
use crate::display_manager::{DisplayManager, OffscreenBuffer};
use crate::scene_executor::SceneStateExecutor;
use std::mem;
use std::sync::Arc;
use std::time::Instant;
use strata_core::command::{
    AssignSceneToDisplayBuffer, ConfirmationEcho, CreateDisplay, CreateOffscreenBuffer,
    DestroyDisplay, DestroyOffscreenBuffer, HideScene, LinkData, LinkOffscreenBuffer, MapScene,
    PublishScene, SetClearColor, SetFrameTimerLimits, ShowScene, SubscribeScene, UnlinkData,
    UnmapScene, UnpublishScene, UnsubscribeScene,
};
use strata_core::{
    CommandQueue, CommandTransport, DisplayBuffer, DisplayId, EventResult, FrameTimerLimits,
    RendererCommand, RendererEvent, SceneId, SceneTransition, Tagged,
};
use strata_telemetry::RendererStatistics;

fn outcome(ok: bool) -> EventResult {
    if ok {
        EventResult::Ok
    } else {
        EventResult::Fail
    }
}

/// The renderer schedule's state and its per-cycle entry point.
pub struct RendererCore {
    transport: Arc<CommandTransport<RendererCommand>>,
    working: CommandQueue<RendererCommand>,
    events: flume::Sender<RendererEvent>,
    platform: Box<dyn PlatformFactory>,
    scenes: SceneStateExecutor,
    displays: DisplayManager,
    links: DataLinkRegistry,
    limits: FrameTimerLimits,
    stats: Arc<RendererStatistics>,
    outbox: Vec<RendererEvent>,
}

impl RendererCore {
    /// Creates a renderer reading `transport` and answering on `events`.
    pub fn new(
        transport: Arc<CommandTransport<RendererCommand>>,
        events: flume::Sender<RendererEvent>,
        platform: Box<dyn PlatformFactory>,
        limits: FrameTimerLimits,
    ) -> Self {
        Self {
            transport,
            working: CommandQueue::new(),
            events,
            platform,
            scenes: SceneStateExecutor::new(),
            displays: DisplayManager::new(),
            links: DataLinkRegistry::new(),
            limits,
            stats: Arc::new(RendererStatistics::new()),
            outbox: Vec::new(),
        }
    }

    /// Runs one cycle: takes every pending command, applies them in order,
    /// renders each display and sends the resulting events.
    ///
    /// ## Returns
    /// The number of commands applied.
    pub fn do_one_loop(&mut self) -> usize {
        let start = Instant::now();
        self.transport.drain_into(&mut self.working);

        let mut commands = mem::take(&mut self.working);
        let drained = commands.count();
        for command in commands.drain() {
            self.stats.record_command(command.kind());
            self.execute(command);
        }
        self.working = commands;

        self.render();
        self.send_events();
        self.stats.record_cycle(drained, start.elapsed());
        drained
    }

    /// Counters of this renderer.
    pub fn statistics(&self) -> &Arc<RendererStatistics> {
        &self.stats
    }

    /// Scene states as the renderer sees them.
    pub fn scenes(&self) -> &SceneStateExecutor {
        &self.scenes
    }

    /// Open displays.
    pub fn displays(&self) -> &DisplayManager {
        &self.displays
    }

    /// Active data links.
    pub fn links(&self) -> &DataLinkRegistry {
        &self.links
    }

    /// Current per-frame budgets.
    pub fn frame_timer_limits(&self) -> FrameTimerLimits {
        self.limits
    }

    fn execute(&mut self, command: RendererCommand) {
        log::trace!("Applying {:?}.", command);
        match command {
            RendererCommand::PublishScene(PublishScene { scene }) => {
                if self.scenes.publish(scene) {
                    log::info!("{scene} published.");
                    self.outbox.push(RendererEvent::ScenePublished { scene });
                } else {
                    log::warn!("{scene} is already published.");
                }
            }
            RendererCommand::UnpublishScene(UnpublishScene { scene }) => self.unpublish(scene),
            RendererCommand::SubscribeScene(SubscribeScene { scene }) => {
                self.simple_transition(scene, SceneTransition::Subscribe)
            }
            RendererCommand::UnsubscribeScene(UnsubscribeScene { scene }) => {
                self.simple_transition(scene, SceneTransition::Unsubscribe)
            }
            RendererCommand::MapScene(MapScene { scene, display }) => {
                let ok = self.map(scene, display);
                self.outbox
                    .push(RendererEvent::transition(scene, SceneTransition::Map, outcome(ok)));
            }
            RendererCommand::UnmapScene(UnmapScene { scene }) => {
                if self.scenes.can_apply(scene, SceneTransition::Unmap) {
                    self.unmap(scene, EventResult::Ok);
                } else {
                    self.reject(scene, SceneTransition::Unmap);
                }
            }
            RendererCommand::ShowScene(ShowScene { scene }) => {
                let ok = self.show(scene);
                self.outbox
                    .push(RendererEvent::transition(scene, SceneTransition::Show, outcome(ok)));
            }
            RendererCommand::HideScene(HideScene { scene }) => {
                if self.scenes.can_apply(scene, SceneTransition::Hide) {
                    self.hide(scene, EventResult::Ok);
                } else {
                    self.reject(scene, SceneTransition::Hide);
                }
            }
            RendererCommand::AssignSceneToDisplayBuffer(AssignSceneToDisplayBuffer {
                scene,
                buffer,
                render_order,
            }) => {
                let ok = self.assign(scene, buffer, render_order);
                self.outbox.push(RendererEvent::SceneAssigned {
                    scene,
                    buffer,
                    render_order,
                    result: outcome(ok),
                });
            }
            RendererCommand::CreateDisplay(CreateDisplay { display, config }) => {
                let ok = self
                    .displays
                    .create(self.platform.as_mut(), display, config);
                self.outbox.push(RendererEvent::DisplayCreated {
                    display,
                    result: outcome(ok),
                });
            }
            RendererCommand::DestroyDisplay(DestroyDisplay { display }) => {
                let ok = if self.scenes.has_scenes_on(display) {
                    log::warn!("Refusing to destroy {display}: scenes are still mapped to it.");
                    false
                } else {
                    self.displays.destroy(display)
                };
                self.outbox.push(RendererEvent::DisplayDestroyed {
                    display,
                    result: outcome(ok),
                });
            }
            RendererCommand::CreateOffscreenBuffer(CreateOffscreenBuffer {
                display,
                buffer,
                width,
                height,
                interruptible,
            }) => {
                let ok = self.displays.create_buffer(
                    display,
                    buffer,
                    OffscreenBuffer {
                        width,
                        height,
                        interruptible,
                    },
                );
                self.outbox.push(RendererEvent::OffscreenBufferCreated {
                    display,
                    buffer,
                    result: outcome(ok),
                });
            }
            RendererCommand::DestroyOffscreenBuffer(DestroyOffscreenBuffer { display, buffer }) => {
                let ok = if self.scenes.has_scenes_in(buffer) || self.links.is_buffer_linked(buffer) {
                    log::warn!("Refusing to destroy {buffer}: scenes still render into or read from it.");
                    false
                } else {
                    self.displays.destroy_buffer(display, buffer)
                };
                self.outbox.push(RendererEvent::OffscreenBufferDestroyed {
                    display,
                    buffer,
                    result: outcome(ok),
                });
            }
            RendererCommand::LinkData(LinkData {
                provider_scene,
                provider_slot,
                consumer_scene,
                consumer_slot,
            }) => {
                let ok = provider_scene != consumer_scene
                    && self.share_display(provider_scene, consumer_scene)
                    && self.links.link(
                        consumer_scene,
                        consumer_slot,
                        LinkSource::Data {
                            scene: provider_scene,
                            slot: provider_slot,
                        },
                    );
                self.outbox.push(RendererEvent::DataLinked {
                    provider_scene,
                    provider_slot,
                    consumer_scene,
                    consumer_slot,
                    result: outcome(ok),
                });
            }
            RendererCommand::LinkOffscreenBuffer(LinkOffscreenBuffer {
                buffer,
                consumer_scene,
                consumer_slot,
            }) => {
                let consumer = self.scenes.record(consumer_scene);
                let ok = match (self.displays.buffer_display(buffer), consumer) {
                    (Some(display), Some(record)) => {
                        record.is_mapped()
                            && record.display == Some(display)
                            && record.buffer != DisplayBuffer::Offscreen(buffer)
                    }
                    _ => false,
                } && self.links.link(
                    consumer_scene,
                    consumer_slot,
                    LinkSource::OffscreenBuffer(buffer),
                );
                self.outbox.push(RendererEvent::OffscreenBufferLinked {
                    buffer,
                    consumer_scene,
                    consumer_slot,
                    result: outcome(ok),
                });
            }
            RendererCommand::UnlinkData(UnlinkData {
                consumer_scene,
                consumer_slot,
            }) => {
                let ok = self.links.unlink(consumer_scene, consumer_slot);
                self.outbox.push(RendererEvent::DataUnlinked {
                    consumer_scene,
                    consumer_slot,
                    result: outcome(ok),
                });
            }
            RendererCommand::SetClearColor(SetClearColor {
                display,
                buffer,
                color,
            }) => {
                if !self.displays.set_clear_color(display, buffer, color) {
                    log::warn!("Cannot set the clear colour of {buffer} on {display}.");
                }
            }
            RendererCommand::SetFrameTimerLimits(SetFrameTimerLimits { limits }) => {
                log::debug!("Frame timer limits set to {:?}.", limits);
                self.limits = limits;
                self.outbox
                    .push(RendererEvent::FrameTimerLimitsChanged { limits });
            }
            RendererCommand::ConfirmationEcho(ConfirmationEcho { text }) => {
                self.outbox.push(RendererEvent::ConfirmationEcho { text });
            }
        }
    }

    fn simple_transition(&mut self, scene: SceneId, transition: SceneTransition) {
        if self.scenes.can_apply(scene, transition) {
            self.scenes.commit(scene, transition, None);
            log::debug!("{scene} {transition} done.");
            self.outbox
                .push(RendererEvent::transition(scene, transition, EventResult::Ok));
        } else {
            self.reject(scene, transition);
        }
    }

    fn reject(&mut self, scene: SceneId, transition: SceneTransition) {
        log::warn!(
            "{transition} is not valid for {scene} in state {:?}.",
            self.scenes.state(scene)
        );
        self.outbox
            .push(RendererEvent::transition(scene, transition, EventResult::Fail));
    }

    fn map(&mut self, scene: SceneId, display: DisplayId) -> bool {
        if !self.scenes.can_apply(scene, SceneTransition::Map) {
            log::warn!("Cannot map {scene} in state {:?}.", self.scenes.state(scene));
            return false;
        }
        let budget = self.limits.scene_upload();
        let Some(backend) = self.displays.backend_mut(display) else {
            log::warn!("Cannot map {scene}: {display} does not exist.");
            return false;
        };
        match backend.upload_scene(scene) {
            Ok(spent) if spent > budget => {
                backend.release_scene(scene);
                log::warn!(
                    "Upload of {scene} took {:?}, over the {:?} budget.",
                    spent,
                    budget
                );
                false
            }
            Ok(_) => {
                self.scenes.commit(scene, SceneTransition::Map, Some(display));
                log::debug!("{scene} mapped to {display}.");
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    fn show(&mut self, scene: SceneId) -> bool {
        if !self.scenes.can_apply(scene, SceneTransition::Show) {
            log::warn!("Cannot show {scene} in state {:?}.", self.scenes.state(scene));
            return false;
        }
        let display = self.scenes.record(scene).and_then(|record| record.display);
        let Some(backend) = display.and_then(|d| self.displays.backend_mut(d)) else {
            return false;
        };
        match backend.enable_scene(scene) {
            Ok(()) => {
                self.scenes.commit(scene, SceneTransition::Show, None);
                log::debug!("{scene} shown.");
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    fn hide(&mut self, scene: SceneId, result: EventResult) {
        let display = self.scenes.record(scene).and_then(|record| record.display);
        if let Some(backend) = display.and_then(|d| self.displays.backend_mut(d)) {
            backend.disable_scene(scene);
        }
        self.scenes.commit(scene, SceneTransition::Hide, None);
        self.outbox
            .push(RendererEvent::transition(scene, SceneTransition::Hide, result));
    }

    fn unmap(&mut self, scene: SceneId, result: EventResult) {
        let display = self.scenes.record(scene).and_then(|record| record.display);
        if let Some(backend) = display.and_then(|d| self.displays.backend_mut(d)) {
            backend.release_scene(scene);
        }
        self.scenes.commit(scene, SceneTransition::Unmap, None);
        self.outbox
            .push(RendererEvent::transition(scene, SceneTransition::Unmap, result));

        for (consumer_scene, consumer_slot) in self.links.remove_scene(scene) {
            self.outbox.push(RendererEvent::DataUnlinked {
                consumer_scene,
                consumer_slot,
                result: EventResult::Indirect,
            });
        }
    }

    fn unpublish(&mut self, scene: SceneId) {
        // Walk the scene down through the regular paths first so the backend
        // and the links are released, then forget it.
        let Some(cascade) = self.scenes.exit_path(scene) else {
            log::warn!("Cannot unpublish {scene}: it is not published.");
            return;
        };
        for transition in cascade {
            match transition {
                SceneTransition::Hide => self.hide(scene, EventResult::Indirect),
                SceneTransition::Unmap => self.unmap(scene, EventResult::Indirect),
                _ => {
                    self.scenes.commit(scene, transition, None);
                    self.outbox
                        .push(RendererEvent::transition(scene, transition, EventResult::Indirect));
                }
            }
        }
        self.scenes.unpublish(scene);
        log::info!("{scene} unpublished.");
        self.outbox.push(RendererEvent::SceneUnpublished { scene });
    }

    fn assign(&mut self, scene: SceneId, buffer: DisplayBuffer, render_order: i32) -> bool {
        let Some(display) = self.scenes.record(scene).and_then(|record| record.display) else {
            log::warn!("Cannot assign {scene}: it is not mapped.");
            return false;
        };
        if !self.displays.has_target(display, buffer) {
            log::warn!("Cannot assign {scene}: {buffer} is not on {display}.");
            return false;
        }
        if let DisplayBuffer::Offscreen(id) = buffer {
            if self.links.consumes_buffer(scene, id) {
                log::warn!("Cannot assign {scene} to {buffer}: it reads from that buffer.");
                return false;
            }
        }
        self.scenes.assign(scene, buffer, render_order)
    }

    fn share_display(&self, provider: SceneId, consumer: SceneId) -> bool {
        match (self.scenes.record(provider), self.scenes.record(consumer)) {
            (Some(p), Some(c)) => p.is_mapped() && c.is_mapped() && p.display == c.display,
            _ => false,
        }
    }

    fn render(&mut self) {
        let offscreen_budget = self.limits.offscreen_render();
        for display in self.displays.ids() {
            let mut passes: Vec<RenderPass> = self
                .displays
                .buffers(display)
                .into_iter()
                .map(|(id, _)| {
                    let buffer = DisplayBuffer::Offscreen(id);
                    RenderPass {
                        buffer,
                        scenes: self.scenes.rendered_in(display, buffer),
                    }
                })
                .collect();
            passes.push(RenderPass {
                buffer: DisplayBuffer::Framebuffer,
                scenes: self.scenes.rendered_in(display, DisplayBuffer::Framebuffer),
            });
            let plan = FramePlan {
                display,
                passes,
                offscreen_budget,
            };

            if let Some(backend) = self.displays.backend_mut(display) {
                match backend.render_frame(&plan) {
                    Ok(()) => self.stats.record_frames(1),
                    Err(e) => log::warn!("Frame of {display} dropped: {e}"),
                }
            }
        }
    }

    fn send_events(&mut self) {
        if self.outbox.is_empty() {
            return;
        }
        let failed = self
            .outbox
            .iter()
            .filter(|event| is_failure(event))
            .count();
        let emitted = self.outbox.len();
        for event in self.outbox.drain(..) {
            log::trace!("Emitting {:?}.", event);
            if self.events.send(event).is_err() {
                log::error!("Event receiver disconnected, dropping renderer events.");
                break;
            }
        }
        self.stats.record_events(emitted as u64, failed as u64);
    }
}

fn is_failure(event: &RendererEvent) -> bool {
    let result = match event {
        RendererEvent::SceneTransition { result, .. }
        | RendererEvent::SceneAssigned { result, .. }
        | RendererEvent::DisplayCreated { result, .. }
        | RendererEvent::DisplayDestroyed { result, .. }
        | RendererEvent::OffscreenBufferCreated { result, .. }
        | RendererEvent::OffscreenBufferDestroyed { result, .. }
        | RendererEvent::DataLinked { result, .. }
        | RendererEvent::OffscreenBufferLinked { result, .. }
        | RendererEvent::DataUnlinked { result, .. } => *result,
        RendererEvent::ScenePublished { .. }
        | RendererEvent::SceneUnpublished { .. }
        | RendererEvent::FrameTimerLimitsChanged { .. }
        | RendererEvent::ConfirmationEcho { .. } => EventResult::Ok,
    };
    result == EventResult::Fail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessPlatform;
    use std::time::Duration;
    use strata_core::{DataSlotId, DisplayBufferId, DisplayConfig};

    struct Harness {
        transport: Arc<CommandTransport<RendererCommand>>,
        events: flume::Receiver<RendererEvent>,
        platform: HeadlessPlatform,
        core: RendererCore,
    }

    impl Harness {
        fn new() -> Self {
            let transport = Arc::new(CommandTransport::new());
            let (tx, rx) = flume::unbounded();
            let platform = HeadlessPlatform::new();
            let core = RendererCore::new(
                Arc::clone(&transport),
                tx,
                Box::new(platform.clone()),
                FrameTimerLimits::default(),
            );
            Self {
                transport,
                events: rx,
                platform,
                core,
            }
        }

        fn run(&mut self, commands: Vec<RendererCommand>) -> Vec<RendererEvent> {
            for command in commands {
                self.transport.enqueue(command);
            }
            self.core.do_one_loop();
            self.events.try_iter().collect()
        }

        /// Publishes `scene` and takes it to Mapped on display 0.
        fn mapped(&mut self, scene: SceneId) {
            self.run(vec![
                CreateDisplay {
                    display: DisplayId(0),
                    config: DisplayConfig::default(),
                }
                .into(),
                PublishScene { scene }.into(),
                SubscribeScene { scene }.into(),
                MapScene {
                    scene,
                    display: DisplayId(0),
                }
                .into(),
            ]);
        }
    }

    #[test]
    fn test_scene_climbs_to_rendered_and_is_drawn() {
        let mut h = Harness::new();
        let scene = SceneId(33);
        h.mapped(scene);
        let events = h.run(vec![ShowScene { scene }.into()]);

        assert_eq!(
            events,
            vec![RendererEvent::transition(
                scene,
                SceneTransition::Show,
                EventResult::Ok
            )]
        );
        let frame = h.platform.recorder().last_frame(DisplayId(0)).unwrap();
        assert_eq!(
            frame.pass(DisplayBuffer::Framebuffer).map(|p| p.scenes.clone()),
            Some(vec![scene])
        );
    }

    #[test]
    fn test_out_of_order_requests_fail() {
        let mut h = Harness::new();
        let scene = SceneId(1);
        let events = h.run(vec![
            SubscribeScene { scene }.into(),
            PublishScene { scene }.into(),
            ShowScene { scene }.into(),
        ]);

        assert_eq!(
            events,
            vec![
                RendererEvent::transition(scene, SceneTransition::Subscribe, EventResult::Fail),
                RendererEvent::ScenePublished { scene },
                RendererEvent::transition(scene, SceneTransition::Show, EventResult::Fail),
            ]
        );
        assert_eq!(h.core.statistics().snapshot().failed_requests, 2);
    }

    #[test]
    fn test_upload_over_budget_fails_the_map() {
        let mut h = Harness::new();
        let scene = SceneId(8);
        h.platform
            .faults()
            .set_upload_cost(scene, Duration::from_millis(50));
        h.run(vec![
            CreateDisplay {
                display: DisplayId(0),
                config: DisplayConfig::default(),
            }
            .into(),
            PublishScene { scene }.into(),
            SubscribeScene { scene }.into(),
        ]);

        let map: RendererCommand = MapScene {
            scene,
            display: DisplayId(0),
        }
        .into();
        let events = h.run(vec![map.clone()]);
        assert_eq!(
            events,
            vec![RendererEvent::transition(scene, SceneTransition::Map, EventResult::Fail)]
        );

        let relaxed = FrameTimerLimits {
            scene_upload_us: 100_000,
            ..FrameTimerLimits::default()
        };
        let events = h.run(vec![SetFrameTimerLimits { limits: relaxed }.into(), map]);
        assert_eq!(
            events,
            vec![
                RendererEvent::FrameTimerLimitsChanged { limits: relaxed },
                RendererEvent::transition(scene, SceneTransition::Map, EventResult::Ok),
            ]
        );
    }

    #[test]
    fn test_unpublish_walks_the_scene_down() {
        let mut h = Harness::new();
        let scene = SceneId(4);
        h.mapped(scene);
        h.run(vec![ShowScene { scene }.into()]);

        let events = h.run(vec![
            UnpublishScene { scene }.into(),
            SubscribeScene { scene }.into(),
        ]);
        assert_eq!(
            events,
            vec![
                RendererEvent::transition(scene, SceneTransition::Hide, EventResult::Indirect),
                RendererEvent::transition(scene, SceneTransition::Unmap, EventResult::Indirect),
                RendererEvent::transition(
                    scene,
                    SceneTransition::Unsubscribe,
                    EventResult::Indirect
                ),
                RendererEvent::SceneUnpublished { scene },
                RendererEvent::transition(scene, SceneTransition::Subscribe, EventResult::Fail),
            ]
        );
        assert!(h.core.scenes().is_empty());
    }

    #[test]
    fn test_display_with_mapped_scenes_cannot_be_destroyed() {
        let mut h = Harness::new();
        let scene = SceneId(2);
        h.mapped(scene);

        let events = h.run(vec![DestroyDisplay {
            display: DisplayId(0),
        }
        .into()]);
        assert_eq!(
            events,
            vec![RendererEvent::DisplayDestroyed {
                display: DisplayId(0),
                result: EventResult::Fail
            }]
        );

        let events = h.run(vec![
            UnmapScene { scene }.into(),
            DestroyDisplay {
                display: DisplayId(0),
            }
            .into(),
        ]);
        assert_eq!(
            events.last(),
            Some(&RendererEvent::DisplayDestroyed {
                display: DisplayId(0),
                result: EventResult::Ok
            })
        );
        assert!(h.core.displays().ids().is_empty());
    }

    #[test]
    fn test_offscreen_buffer_in_use_cannot_be_destroyed() {
        let mut h = Harness::new();
        let scene = SceneId(6);
        let buffer = DisplayBufferId(1);
        h.mapped(scene);
        let events = h.run(vec![
            CreateOffscreenBuffer {
                display: DisplayId(0),
                buffer,
                width: 256,
                height: 256,
                interruptible: true,
            }
            .into(),
            AssignSceneToDisplayBuffer {
                scene,
                buffer: DisplayBuffer::Offscreen(buffer),
                render_order: 2,
            }
            .into(),
            ShowScene { scene }.into(),
            DestroyOffscreenBuffer {
                display: DisplayId(0),
                buffer,
            }
            .into(),
        ]);

        assert_eq!(
            events.last(),
            Some(&RendererEvent::OffscreenBufferDestroyed {
                display: DisplayId(0),
                buffer,
                result: EventResult::Fail
            })
        );
        let frame = h.platform.recorder().last_frame(DisplayId(0)).unwrap();
        assert_eq!(frame.passes.len(), 2);
        assert_eq!(frame.passes[0].buffer, DisplayBuffer::Offscreen(buffer));
        assert_eq!(frame.passes[0].scenes, vec![scene]);
        assert!(frame.passes[1].scenes.is_empty());
    }

    #[test]
    fn test_links_need_mapped_scenes_and_drop_on_unmap() {
        let mut h = Harness::new();
        let (provider, consumer) = (SceneId(10), SceneId(11));
        h.mapped(provider);
        let link: RendererCommand = LinkData {
            provider_scene: provider,
            provider_slot: DataSlotId(0),
            consumer_scene: consumer,
            consumer_slot: DataSlotId(1),
        }
        .into();

        let events = h.run(vec![link.clone()]);
        assert!(matches!(
            events[..],
            [RendererEvent::DataLinked {
                result: EventResult::Fail,
                ..
            }]
        ));

        h.run(vec![
            PublishScene { scene: consumer }.into(),
            SubscribeScene { scene: consumer }.into(),
            MapScene {
                scene: consumer,
                display: DisplayId(0),
            }
            .into(),
        ]);
        let events = h.run(vec![link]);
        assert!(matches!(
            events[..],
            [RendererEvent::DataLinked {
                result: EventResult::Ok,
                ..
            }]
        ));

        let events = h.run(vec![UnmapScene { scene: provider }.into()]);
        assert_eq!(
            events,
            vec![
                RendererEvent::transition(provider, SceneTransition::Unmap, EventResult::Ok),
                RendererEvent::DataUnlinked {
                    consumer_scene: consumer,
                    consumer_slot: DataSlotId(1),
                    result: EventResult::Indirect
                },
            ]
        );
        assert!(h.core.links().is_empty());
    }

    #[test]
    fn test_echo_follows_earlier_commands() {
        let mut h = Harness::new();
        let events = h.run(vec![
            PublishScene { scene: SceneId(1) }.into(),
            ConfirmationEcho {
                text: "done".to_string(),
            }
            .into(),
        ]);

        assert_eq!(
            events,
            vec![
                RendererEvent::ScenePublished { scene: SceneId(1) },
                RendererEvent::ConfirmationEcho {
                    text: "done".to_string()
                },
            ]
        );
        let stats = h.core.statistics().snapshot();
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.commands_executed, 2);
    }
}
