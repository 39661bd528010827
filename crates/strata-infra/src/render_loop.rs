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

//! Running the renderer schedule, either on its own thread or step by step.

use crate::error::LoopError;
use crate::renderer::RendererCore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use strata_telemetry::RendererStatistics;

/// Who drives the renderer cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    /// A dedicated thread runs a cycle per frame.
    #[default]
    Threaded,
    /// The owner calls [`RendererLoop::do_one_loop`].
    Manual,
}

/// Configuration of the renderer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Who drives the cycles.
    pub mode: LoopMode,
    /// Cycles per second of the threaded loop.
    pub frame_rate: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            mode: LoopMode::Threaded,
            frame_rate: 60,
        }
    }
}

/// Owns a [`RendererCore`] and schedules its cycles.
///
/// Dropping the loop stops the thread.
pub struct RendererLoop {
    config: LoopConfig,
    core: Arc<Mutex<RendererCore>>,
    stats: Arc<RendererStatistics>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RendererLoop {
    /// Wraps `core` without starting anything.
    pub fn new(core: RendererCore, config: LoopConfig) -> Self {
        let stats = Arc::clone(core.statistics());
        Self {
            config,
            core: Arc::new(Mutex::new(core)),
            stats,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Starts the renderer thread.
    pub fn start(&mut self) -> Result<(), LoopError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(LoopError::AlreadyRunning);
        }
        if self.config.frame_rate == 0 {
            return Err(LoopError::ZeroFrameRate);
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let core = Arc::clone(&self.core);
        let tick_duration = Duration::from_secs_f64(1.0 / f64::from(self.config.frame_rate));

        let handle = thread::spawn(move || {
            log::info!("Renderer thread started.");
            while running.load(Ordering::Relaxed) {
                let start_time = Instant::now();
                lock(&core).do_one_loop();

                let elapsed = start_time.elapsed();
                if elapsed < tick_duration {
                    thread::sleep(tick_duration - elapsed);
                }
            }
            log::info!("Renderer thread stopped.");
        });

        self.handle = Some(handle);
        Ok(())
    }

    /// Stops the renderer thread and waits for the current cycle to end.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Renderer thread panicked.");
            }
        }
    }

    /// Runs a single cycle on the calling thread.
    ///
    /// ## Returns
    /// The number of commands applied.
    pub fn do_one_loop(&mut self) -> Result<usize, LoopError> {
        if self.is_running() {
            return Err(LoopError::ThreadRunning);
        }
        Ok(lock(&self.core).do_one_loop())
    }

    /// Whether the renderer thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The loop's configuration.
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Counters of the wrapped renderer.
    pub fn statistics(&self) -> &Arc<RendererStatistics> {
        &self.stats
    }

    /// Runs `f` against the renderer state between cycles.
    pub fn inspect<R>(&self, f: impl FnOnce(&RendererCore) -> R) -> R {
        f(&*lock(&self.core))
    }
}

impl Drop for RendererLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(core: &Mutex<RendererCore>) -> MutexGuard<'_, RendererCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessPlatform;
    use strata_core::command::PublishScene;
    use strata_core::{CommandTransport, FrameTimerLimits, RendererCommand, RendererEvent, SceneId};

    type Transport = Arc<CommandTransport<RendererCommand>>;

    fn renderer_loop(config: LoopConfig) -> (RendererLoop, Transport, flume::Receiver<RendererEvent>) {
        let transport = Arc::new(CommandTransport::new());
        let (tx, rx) = flume::unbounded();
        let core = RendererCore::new(
            Arc::clone(&transport),
            tx,
            Box::new(HeadlessPlatform::new()),
            FrameTimerLimits::default(),
        );
        (RendererLoop::new(core, config), transport, rx)
    }

    #[test]
    fn test_manual_iteration() {
        let (mut renderer, transport, events) = renderer_loop(LoopConfig {
            mode: LoopMode::Manual,
            ..LoopConfig::default()
        });
        transport.enqueue(PublishScene { scene: SceneId(1) });

        assert_eq!(renderer.do_one_loop(), Ok(1));
        assert_eq!(
            events.try_recv(),
            Ok(RendererEvent::ScenePublished { scene: SceneId(1) })
        );
        assert_eq!(renderer.inspect(|core| core.scenes().len()), 1);
    }

    #[test]
    fn test_thread_processes_commands_until_stopped() {
        let (mut renderer, transport, events) = renderer_loop(LoopConfig {
            mode: LoopMode::Threaded,
            frame_rate: 200,
        });
        renderer.start().unwrap();
        assert_eq!(renderer.start(), Err(LoopError::AlreadyRunning));
        assert_eq!(renderer.do_one_loop(), Err(LoopError::ThreadRunning));

        transport.enqueue(PublishScene { scene: SceneId(7) });
        let event = events.recv_timeout(Duration::from_secs(5));
        assert_eq!(event, Ok(RendererEvent::ScenePublished { scene: SceneId(7) }));

        renderer.stop();
        assert!(!renderer.is_running());
        assert!(renderer.statistics().snapshot().cycles >= 1);
        assert_eq!(renderer.do_one_loop(), Ok(0));
    }

    #[test]
    fn test_zero_frame_rate_is_refused() {
        let (mut renderer, _, _) = renderer_loop(LoopConfig {
            mode: LoopMode::Threaded,
            frame_rate: 0,
        });
        assert_eq!(renderer.start(), Err(LoopError::ZeroFrameRate));
        assert!(!renderer.is_running());
    }
}
