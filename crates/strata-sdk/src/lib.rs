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

//! The public-facing API of strata.
//!
//! [`Strata`] wires a [`SceneControl`] and a [`ContentPublisher`] to a
//! renderer running on the configured [`PlatformFactory`], and pumps the
//! events between them.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use strata_control::{SceneControl, SceneControlEvent, SceneControlEventHandler};
use strata_core::{CommandTransport, DisplayId, EventBus, RendererEvent};
use strata_infra::{HeadlessPlatform, LoopMode, PlatformFactory, RendererCore, RendererLoop};
use strata_telemetry::{StatisticsReporter, StatisticsSnapshot};

pub mod config;
pub mod publisher;

pub use config::{ConfigError, StrataConfig};
pub use publisher::ContentPublisher;

/// Re-exports for applications.
pub mod prelude {
    pub use crate::{ContentPublisher, Strata, StrataConfig};
    pub use strata_control::{
        ControlConfig, ControlError, EventCollector, SceneControl, SceneControlEvent,
        SceneControlEventHandler,
    };
    pub use strata_core::{
        ClearColor, DataSlotId, DisplayBuffer, DisplayBufferId, DisplayConfig, DisplayId,
        EventResult, FrameTimerLimits, SceneId, SceneState, SceneTransition,
    };
    pub use strata_infra::{FaultPlan, HeadlessPlatform, LoopConfig, LoopMode};
    pub use strata_telemetry::{init_logging, LogConfig};
}

/// A running strata instance.
pub struct Strata {
    config: StrataConfig,
    control: SceneControl,
    publisher: ContentPublisher,
    renderer: RendererLoop,
    reporter: StatisticsReporter,
}

impl Strata {
    /// Builds an instance rendering through `platform`.
    ///
    /// In [`LoopMode::Threaded`] the renderer thread is started here.
    pub fn new(config: StrataConfig, platform: Box<dyn PlatformFactory>) -> Result<Self> {
        let transport = Arc::new(CommandTransport::new());
        let events = EventBus::<RendererEvent>::new();

        let core = RendererCore::new(
            Arc::clone(&transport),
            events.sender(),
            platform,
            config.frame_timer_limits,
        );
        let mut renderer = RendererLoop::new(core, config.renderer_loop);
        if config.renderer_loop.mode == LoopMode::Threaded {
            renderer
                .start()
                .context("Failed to start the renderer thread")?;
        }

        let reporter = StatisticsReporter::new(
            Arc::clone(renderer.statistics()),
            Duration::from_secs(config.statistics_interval_secs),
        );
        let control = SceneControl::new(
            config.control.clone(),
            Arc::clone(&transport),
            events.receiver().clone(),
        );

        log::info!(
            "Strata instance ready ({:?} renderer loop).",
            config.renderer_loop.mode
        );
        Ok(Self {
            config,
            control,
            publisher: ContentPublisher::new(transport),
            renderer,
            reporter,
        })
    }

    /// Builds an instance on a [`HeadlessPlatform`].
    pub fn headless(config: StrataConfig) -> Result<Self> {
        Self::new(config, Box::new(HeadlessPlatform::new()))
    }

    /// Opens a display with the configured [`DisplayConfig`](strata_core::DisplayConfig).
    pub fn open_display(&mut self) -> DisplayId {
        self.control.create_display(self.config.display.clone())
    }

    /// One round trip: submits queued requests, runs a renderer cycle when
    /// the loop is manual, then dispatches the resulting events to `handler`.
    ///
    /// ## Returns
    /// The number of events delivered.
    pub fn step<H>(&mut self, handler: &mut H) -> Result<usize>
    where
        H: SceneControlEventHandler + ?Sized,
    {
        self.control.flush();
        if self.config.renderer_loop.mode == LoopMode::Manual {
            self.renderer.do_one_loop()?;
        }
        let delivered = self.control.dispatch_events(handler);
        self.reporter.tick();

        if self.control.is_renderer_disconnected() {
            anyhow::bail!("The renderer stopped sending events");
        }
        Ok(delivered)
    }

    /// Like [`step`](Self::step) for callbacks that do not need the control.
    pub fn poll(&mut self, mut callback: impl FnMut(&SceneControlEvent)) -> Result<usize> {
        self.step(&mut |_: &mut SceneControl, event: &SceneControlEvent| callback(event))
    }

    /// The scene control.
    pub fn control(&mut self) -> &mut SceneControl {
        &mut self.control
    }

    /// A handle for publishing scenes.
    pub fn publisher(&self) -> ContentPublisher {
        self.publisher.clone()
    }

    /// The renderer loop.
    pub fn renderer(&mut self) -> &mut RendererLoop {
        &mut self.renderer
    }

    /// Current renderer counters.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.renderer.statistics().snapshot()
    }

    /// The configuration this instance was built with.
    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    /// Stops the renderer and logs the final counters.
    pub fn shutdown(mut self) {
        self.renderer.stop();
        let stats = self.statistics();
        log::info!(
            "Strata shut down after {} cycles, {} commands and {} events.",
            stats.cycles,
            stats.commands_executed,
            stats.events_emitted
        );
    }
}
