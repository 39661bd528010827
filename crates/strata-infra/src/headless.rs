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

//! An in-memory platform for tests, demos and servers without a GPU.

use crate::backend::{DisplayBackend, FramePlan, PlatformFactory};
use crate::error::BackendError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strata_core::{ClearColor, DisplayBuffer, DisplayBufferId, DisplayConfig, DisplayId, SceneId};

#[derive(Debug, Default)]
struct Faults {
    uploads: HashMap<SceneId, u32>,
    shows: HashMap<SceneId, u32>,
    display_creations: u32,
    upload_costs: HashMap<SceneId, Duration>,
}

/// Failures to inject into headless backends.
///
/// Clones share the same plan, so a test can keep one and adjust it while the
/// renderer runs.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: Arc<Mutex<Faults>>,
}

impl FaultPlan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` uploads of `scene` fail.
    pub fn fail_uploads(&self, scene: SceneId, count: u32) {
        *self.lock().uploads.entry(scene).or_default() += count;
    }

    /// Makes the next `count` attempts to enable `scene` fail.
    pub fn fail_shows(&self, scene: SceneId, count: u32) {
        *self.lock().shows.entry(scene).or_default() += count;
    }

    /// Makes the next `count` display creations fail.
    pub fn fail_display_creations(&self, count: u32) {
        self.lock().display_creations += count;
    }

    /// Reports every upload of `scene` as taking `cost`.
    pub fn set_upload_cost(&self, scene: SceneId, cost: Duration) {
        self.lock().upload_costs.insert(scene, cost);
    }

    fn take_upload_failure(&self, scene: SceneId) -> bool {
        take(&mut self.lock().uploads, scene)
    }

    fn take_show_failure(&self, scene: SceneId) -> bool {
        take(&mut self.lock().shows, scene)
    }

    fn take_display_failure(&self) -> bool {
        let mut faults = self.lock();
        if faults.display_creations == 0 {
            return false;
        }
        faults.display_creations -= 1;
        true
    }

    fn upload_cost(&self, scene: SceneId) -> Duration {
        self.lock()
            .upload_costs
            .get(&scene)
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    fn lock(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn take(counters: &mut HashMap<SceneId, u32>, scene: SceneId) -> bool {
    match counters.get_mut(&scene) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

/// Shared log of the frames headless backends were asked to draw.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    frames: Arc<Mutex<Vec<FramePlan>>>,
}

impl FrameRecorder {
    /// Number of frames drawn across all displays.
    pub fn frame_count(&self) -> usize {
        self.lock().len()
    }

    /// The most recent frame drawn on `display`.
    pub fn last_frame(&self, display: DisplayId) -> Option<FramePlan> {
        self.lock()
            .iter()
            .rev()
            .find(|plan| plan.display == display)
            .cloned()
    }

    /// Forgets recorded frames.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn record(&self, plan: &FramePlan) {
        self.lock().push(plan.clone());
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FramePlan>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// [`PlatformFactory`] producing in-memory display backends.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPlatform {
    faults: FaultPlan,
    recorder: FrameRecorder,
}

impl HeadlessPlatform {
    /// Creates a platform without injected faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a platform following `faults`.
    pub fn with_faults(faults: FaultPlan) -> Self {
        Self {
            faults,
            recorder: FrameRecorder::default(),
        }
    }

    /// The fault plan shared with every backend.
    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// The frame log shared with every backend.
    pub fn recorder(&self) -> &FrameRecorder {
        &self.recorder
    }
}

impl PlatformFactory for HeadlessPlatform {
    fn create_backend(
        &mut self,
        display: DisplayId,
        config: &DisplayConfig,
    ) -> Result<Box<dyn DisplayBackend>, BackendError> {
        if self.faults.take_display_failure() {
            return Err(BackendError::DisplayCreation {
                display,
                reason: "injected fault".to_string(),
            });
        }
        log::debug!(
            "Headless {display} '{}' opened at {}x{}.",
            config.title,
            config.width,
            config.height
        );
        Ok(Box::new(HeadlessBackend {
            faults: self.faults.clone(),
            recorder: self.recorder.clone(),
            uploaded: HashSet::new(),
            enabled: HashSet::new(),
            buffers: HashMap::new(),
            clear_colors: HashMap::from([(DisplayBuffer::Framebuffer, config.clear_color)]),
        }))
    }
}

struct HeadlessBackend {
    faults: FaultPlan,
    recorder: FrameRecorder,
    uploaded: HashSet<SceneId>,
    enabled: HashSet<SceneId>,
    buffers: HashMap<DisplayBufferId, (u32, u32)>,
    clear_colors: HashMap<DisplayBuffer, ClearColor>,
}

impl DisplayBackend for HeadlessBackend {
    fn upload_scene(&mut self, scene: SceneId) -> Result<Duration, BackendError> {
        if self.faults.take_upload_failure(scene) {
            return Err(BackendError::Upload {
                scene,
                reason: "injected fault".to_string(),
            });
        }
        self.uploaded.insert(scene);
        Ok(self.faults.upload_cost(scene))
    }

    fn release_scene(&mut self, scene: SceneId) {
        self.enabled.remove(&scene);
        self.uploaded.remove(&scene);
    }

    fn enable_scene(&mut self, scene: SceneId) -> Result<(), BackendError> {
        if !self.uploaded.contains(&scene) {
            return Err(BackendError::SceneNotUploaded { scene });
        }
        if self.faults.take_show_failure(scene) {
            return Err(BackendError::Enable {
                scene,
                reason: "injected fault".to_string(),
            });
        }
        self.enabled.insert(scene);
        Ok(())
    }

    fn disable_scene(&mut self, scene: SceneId) {
        self.enabled.remove(&scene);
    }

    fn create_offscreen_buffer(
        &mut self,
        buffer: DisplayBufferId,
        width: u32,
        height: u32,
    ) -> Result<(), BackendError> {
        if self.buffers.contains_key(&buffer) {
            return Err(BackendError::OffscreenBuffer {
                buffer,
                reason: "already allocated".to_string(),
            });
        }
        self.buffers.insert(buffer, (width, height));
        Ok(())
    }

    fn destroy_offscreen_buffer(&mut self, buffer: DisplayBufferId) {
        self.buffers.remove(&buffer);
        self.clear_colors.remove(&DisplayBuffer::Offscreen(buffer));
    }

    fn set_clear_color(&mut self, buffer: DisplayBuffer, color: ClearColor) {
        self.clear_colors.insert(buffer, color);
    }

    fn render_frame(&mut self, plan: &FramePlan) -> Result<(), BackendError> {
        for pass in &plan.passes {
            if let Some(scene) = pass.scenes.iter().find(|s| !self.enabled.contains(s)) {
                return Err(BackendError::SceneNotUploaded { scene: *scene });
            }
        }
        self.recorder.record(plan);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RenderPass;

    fn backend(platform: &mut HeadlessPlatform) -> Box<dyn DisplayBackend> {
        platform
            .create_backend(DisplayId(0), &DisplayConfig::default())
            .expect("headless display")
    }

    #[test]
    fn test_injected_upload_failures_are_consumed() {
        let mut platform = HeadlessPlatform::new();
        platform.faults().fail_uploads(SceneId(4), 2);
        let mut display = backend(&mut platform);

        assert!(display.upload_scene(SceneId(4)).is_err());
        assert!(display.upload_scene(SceneId(4)).is_err());
        assert!(display.upload_scene(SceneId(4)).is_ok());
        assert!(display.upload_scene(SceneId(5)).is_ok());
    }

    #[test]
    fn test_enable_requires_upload() {
        let mut platform = HeadlessPlatform::new();
        let mut display = backend(&mut platform);

        assert_eq!(
            display.enable_scene(SceneId(1)),
            Err(BackendError::SceneNotUploaded { scene: SceneId(1) })
        );
        display.upload_scene(SceneId(1)).unwrap();
        assert!(display.enable_scene(SceneId(1)).is_ok());
    }

    #[test]
    fn test_upload_cost_is_reported() {
        let mut platform = HeadlessPlatform::new();
        platform
            .faults()
            .set_upload_cost(SceneId(2), Duration::from_millis(40));
        let mut display = backend(&mut platform);

        assert_eq!(display.upload_scene(SceneId(2)), Ok(Duration::from_millis(40)));
    }

    #[test]
    fn test_display_creation_fault() {
        let mut platform = HeadlessPlatform::new();
        platform.faults().fail_display_creations(1);

        assert!(platform
            .create_backend(DisplayId(3), &DisplayConfig::default())
            .is_err());
        assert!(platform
            .create_backend(DisplayId(3), &DisplayConfig::default())
            .is_ok());
    }

    #[test]
    fn test_frames_are_recorded() {
        let mut platform = HeadlessPlatform::new();
        let recorder = platform.recorder().clone();
        let mut display = backend(&mut platform);
        display.upload_scene(SceneId(1)).unwrap();
        display.enable_scene(SceneId(1)).unwrap();

        let plan = FramePlan {
            display: DisplayId(0),
            passes: vec![RenderPass {
                buffer: DisplayBuffer::Framebuffer,
                scenes: vec![SceneId(1)],
            }],
            offscreen_budget: Duration::ZERO,
        };
        display.render_frame(&plan).unwrap();

        assert_eq!(recorder.frame_count(), 1);
        assert_eq!(recorder.last_frame(DisplayId(0)), Some(plan));
        assert_eq!(recorder.last_frame(DisplayId(1)), None);
    }
}
