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

//! Reconciler properties checked against a scripted renderer that answers
//! every request one cycle late and fails each step a scene-dependent number
//! of times.

use std::collections::HashMap;
use std::sync::Arc;
use strata_control::{
    ControlConfig, EventCollector, SceneControl, SceneControlEvent, SceneControlEventHandler,
};
use strata_core::{
    CommandQueue, CommandTransport, DisplayBuffer, EventResult, RendererCommand,
    RendererEvent, SceneId, SceneState, SceneTransition,
};

struct ScriptedRenderer {
    transport: Arc<CommandTransport<RendererCommand>>,
    events: flume::Sender<RendererEvent>,
    failures_left: HashMap<(SceneId, SceneTransition), u32>,
    held: Vec<RendererEvent>,
    outstanding: HashMap<SceneId, usize>,
    max_outstanding: usize,
    requests: Vec<(SceneId, SceneTransition)>,
}

impl ScriptedRenderer {
    fn new(
        transport: Arc<CommandTransport<RendererCommand>>,
        events: flume::Sender<RendererEvent>,
    ) -> Self {
        Self {
            transport,
            events,
            failures_left: HashMap::new(),
            held: Vec::new(),
            outstanding: HashMap::new(),
            max_outstanding: 0,
            requests: Vec::new(),
        }
    }

    fn publish(&self, scene: SceneId) {
        self.events
            .send(RendererEvent::ScenePublished { scene })
            .unwrap();
    }

    fn cycle(&mut self) {
        for event in std::mem::take(&mut self.held) {
            if let RendererEvent::SceneTransition { scene, .. } = &event {
                *self.outstanding.entry(*scene).or_default() -= 1;
            }
            self.events.send(event).unwrap();
        }

        let mut working = CommandQueue::new();
        self.transport.drain_into(&mut working);
        for command in working.drain() {
            let transition = match &command {
                RendererCommand::SubscribeScene(c) => Some((c.scene, SceneTransition::Subscribe)),
                RendererCommand::UnsubscribeScene(c) => {
                    Some((c.scene, SceneTransition::Unsubscribe))
                }
                RendererCommand::MapScene(c) => Some((c.scene, SceneTransition::Map)),
                RendererCommand::UnmapScene(c) => Some((c.scene, SceneTransition::Unmap)),
                RendererCommand::ShowScene(c) => Some((c.scene, SceneTransition::Show)),
                RendererCommand::HideScene(c) => Some((c.scene, SceneTransition::Hide)),
                RendererCommand::AssignSceneToDisplayBuffer(c) => {
                    self.held.push(RendererEvent::SceneAssigned {
                        scene: c.scene,
                        buffer: c.buffer,
                        render_order: c.render_order,
                        result: EventResult::Ok,
                    });
                    None
                }
                RendererCommand::CreateDisplay(c) => {
                    self.held.push(RendererEvent::DisplayCreated {
                        display: c.display,
                        result: EventResult::Ok,
                    });
                    None
                }
                RendererCommand::ConfirmationEcho(c) => {
                    self.held.push(RendererEvent::ConfirmationEcho {
                        text: c.text.clone(),
                    });
                    None
                }
                _ => None,
            };

            if let Some((scene, transition)) = transition {
                let outstanding = self.outstanding.entry(scene).or_default();
                *outstanding += 1;
                self.max_outstanding = self.max_outstanding.max(*outstanding);
                self.requests.push((scene, transition));

                let failures = self
                    .failures_left
                    .entry((scene, transition))
                    .or_insert((scene.0 % 4) as u32);
                let result = if *failures > 0 {
                    *failures -= 1;
                    EventResult::Fail
                } else {
                    EventResult::Ok
                };
                self.held
                    .push(RendererEvent::transition(scene, transition, result));
            }
        }
    }
}

fn setup() -> (SceneControl, ScriptedRenderer) {
    let transport = Arc::new(CommandTransport::new());
    let (tx, rx) = flume::unbounded();
    let control = SceneControl::new(ControlConfig::default(), Arc::clone(&transport), rx);
    (control, ScriptedRenderer::new(transport, tx))
}

fn run_until(
    control: &mut SceneControl,
    renderer: &mut ScriptedRenderer,
    collector: &mut EventCollector,
    mut done: impl FnMut(&SceneControl, &EventCollector) -> bool,
) {
    for _ in 0..200 {
        renderer.cycle();
        control.dispatch_events(collector);
        if done(control, collector) {
            return;
        }
    }
    panic!("scenes did not converge within 200 cycles");
}

#[test]
fn test_every_scene_converges_despite_failures() {
    // --- ARRANGE ---
    let (mut control, mut renderer) = setup();
    let mut collector = EventCollector::new();
    let display = control.create_display(Default::default());
    let scenes: Vec<_> = (1..=12).map(SceneId).collect();
    for &scene in &scenes {
        control.set_mapping(scene, display).unwrap();
        control
            .set_desired_state(scene, SceneState::Rendered, None)
            .unwrap();
        renderer.publish(scene);
    }
    control.flush();

    // --- ACT ---
    run_until(&mut control, &mut renderer, &mut collector, |control, _| {
        scenes
            .iter()
            .all(|&s| control.last_confirmed_state(s) == SceneState::Rendered)
    });

    // --- ASSERT ---
    assert_eq!(renderer.max_outstanding, 1);
    for &scene in &scenes {
        assert_eq!(control.display_mapped_to(scene), Some(display));
        let shows = renderer
            .requests
            .iter()
            .filter(|(s, t)| *s == scene && *t == SceneTransition::Show)
            .count();
        assert_eq!(shows as u64, 1 + scene.0 % 4);
    }
}

#[test]
fn test_descending_back_to_unavailable() {
    let (mut control, mut renderer) = setup();
    let mut collector = EventCollector::new();
    let display = control.create_display(Default::default());
    let scene = SceneId(4);
    control.set_mapping(scene, display).unwrap();
    control
        .set_desired_state(scene, SceneState::Rendered, None)
        .unwrap();
    renderer.publish(scene);
    control.flush();
    run_until(&mut control, &mut renderer, &mut collector, |c, _| {
        c.last_confirmed_state(scene) == SceneState::Rendered
    });

    control
        .set_desired_state(scene, SceneState::Unavailable, Some("down"))
        .unwrap();
    control.flush();
    run_until(&mut control, &mut renderer, &mut collector, |_, events| {
        events.events().contains(&SceneControlEvent::ConfirmationEcho {
            text: "down".to_string(),
        })
    });

    assert_eq!(control.last_confirmed_state(scene), SceneState::Unavailable);
    assert_eq!(control.display_mapped_to(scene), None);
    let descent: Vec<_> = renderer
        .requests
        .iter()
        .filter(|(_, t)| !t.is_ascending())
        .map(|(_, t)| *t)
        .collect();
    assert_eq!(
        descent,
        vec![
            SceneTransition::Hide,
            SceneTransition::Unmap,
            SceneTransition::Unsubscribe
        ]
    );
}

/// Asks for `Rendered` as soon as the scene becomes available.
struct Escalator {
    scene: SceneId,
    echoes: Vec<String>,
}

impl SceneControlEventHandler for Escalator {
    fn handle(&mut self, control: &mut SceneControl, event: &SceneControlEvent) {
        match event {
            SceneControlEvent::SceneStateChanged {
                scene,
                state: SceneState::Available,
            } if *scene == self.scene => {
                control
                    .set_desired_state(self.scene, SceneState::Rendered, Some("shown"))
                    .unwrap();
                control
                    .set_display_buffer_assignment(self.scene, DisplayBuffer::Framebuffer, 3)
                    .unwrap();
            }
            SceneControlEvent::ConfirmationEcho { text } => self.echoes.push(text.clone()),
            _ => {}
        }
    }
}

#[test]
fn test_handler_can_request_the_next_state() {
    let (mut control, mut renderer) = setup();
    let display = control.create_display(Default::default());
    let scene = SceneId(8);
    control.set_mapping(scene, display).unwrap();
    control
        .set_desired_state(scene, SceneState::Available, None)
        .unwrap();
    renderer.publish(scene);
    control.flush();

    let mut handler = Escalator {
        scene,
        echoes: Vec::new(),
    };
    for _ in 0..100 {
        renderer.cycle();
        control.dispatch_events(&mut handler);
        if !handler.echoes.is_empty() {
            break;
        }
    }

    assert_eq!(handler.echoes, vec!["shown".to_string()]);
    assert_eq!(control.last_confirmed_state(scene), SceneState::Rendered);
    assert_eq!(control.requested_mapping(scene).unwrap().render_order, 3);
    assert_eq!(control.display_mapped_to(scene), Some(display));
}
