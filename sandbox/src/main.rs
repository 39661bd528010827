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

use anyhow::Result;
use std::time::Duration;
use strata_sdk::prelude::*;

const PREVIEW: SceneId = SceneId(1);
const MAIN: SceneId = SceneId(33);
const TEXTURE_SLOT: DataSlotId = DataSlotId(0);

/// Reacts to the renderer: once the preview is ready, the main scene starts
/// reading it and is brought on screen.
struct Director {
    done: bool,
}

impl SceneControlEventHandler for Director {
    fn handle(&mut self, control: &mut SceneControl, event: &SceneControlEvent) {
        match event {
            SceneControlEvent::SceneStateChanged { scene, state } => {
                log::info!("{scene} is now {state}.");
            }
            SceneControlEvent::TransitionOutcome {
                scene,
                transition,
                result: EventResult::Fail,
            } => log::warn!("{transition} of {scene} failed, the control retries it."),
            SceneControlEvent::ConfirmationEcho { text } if text == "preview ready" => {
                if let Some(buffer) = control
                    .requested_mapping(PREVIEW)
                    .and_then(|mapping| match mapping.buffer {
                        DisplayBuffer::Offscreen(buffer) => Some(buffer),
                        DisplayBuffer::Framebuffer => None,
                    })
                {
                    if let Err(e) = control.link_offscreen_buffer(buffer, MAIN, TEXTURE_SLOT) {
                        log::error!("{e}");
                    }
                }
                if let Err(e) =
                    control.set_desired_state(MAIN, SceneState::Rendered, Some("main shown"))
                {
                    log::error!("{e}");
                }
            }
            SceneControlEvent::ConfirmationEcho { text } if text == "main shown" => {
                self.done = true;
            }
            _ => log::debug!("{event:?}"),
        }
    }
}

fn main() -> Result<()> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => StrataConfig::load(path)?,
        None => StrataConfig::default(),
    };
    config.display.title = "sandbox".to_string();
    init_logging(&config.log);

    let faults = FaultPlan::new();
    faults.fail_shows(MAIN, 2);
    faults.fail_uploads(PREVIEW, 1);
    let mut strata = Strata::new(config, Box::new(HeadlessPlatform::with_faults(faults)))?;

    let display = strata.open_display();
    let preview = strata
        .control()
        .create_offscreen_buffer(display, 256, 256, true)?;

    let publisher = strata.publisher();
    publisher.publish(PREVIEW);
    publisher.publish(MAIN);

    let control = strata.control();
    control.set_mapping(PREVIEW, display)?;
    control.set_display_buffer_assignment(PREVIEW, DisplayBuffer::Offscreen(preview), 0)?;
    control.set_desired_state(PREVIEW, SceneState::Rendered, Some("preview ready"))?;
    control.set_mapping(MAIN, display)?;
    control.set_desired_state(MAIN, SceneState::Ready, None)?;

    let mut director = Director { done: false };
    for _ in 0..2_000 {
        strata.step(&mut director)?;
        if director.done {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    if !director.done {
        anyhow::bail!("the main scene never reached Rendered");
    }

    publisher.unpublish(PREVIEW);
    for _ in 0..10 {
        strata.poll(|event| log::info!("{event:?}"))?;
        std::thread::sleep(Duration::from_millis(5));
    }

    log::info!("{:#?}", strata.statistics());
    strata.shutdown();
    Ok(())
}
