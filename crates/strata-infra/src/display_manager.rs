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

//! Open displays and the offscreen buffers they own.

use crate::backend::{DisplayBackend, PlatformFactory};
use std::collections::BTreeMap;
use strata_core::{ClearColor, DisplayBuffer, DisplayBufferId, DisplayConfig, DisplayId};

/// Size and flags of an offscreen buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether rendering into it may be cut short by the frame budget.
    pub interruptible: bool,
}

struct DisplayEntry {
    config: DisplayConfig,
    backend: Box<dyn DisplayBackend>,
    buffers: BTreeMap<DisplayBufferId, OffscreenBuffer>,
}

/// Displays owned by the renderer, keyed and iterated by id.
#[derive(Default)]
pub struct DisplayManager {
    displays: BTreeMap<DisplayId, DisplayEntry>,
}

impl DisplayManager {
    /// Creates a manager with no display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `display` through `platform`.
    ///
    /// ## Returns
    /// `false` if the id is taken or the platform refused.
    pub fn create(
        &mut self,
        platform: &mut dyn PlatformFactory,
        display: DisplayId,
        config: DisplayConfig,
    ) -> bool {
        if self.displays.contains_key(&display) {
            log::warn!("{display} already exists.");
            return false;
        }
        match platform.create_backend(display, &config) {
            Ok(backend) => {
                log::info!("Created {display} '{}'.", config.title);
                self.displays.insert(
                    display,
                    DisplayEntry {
                        config,
                        backend,
                        buffers: BTreeMap::new(),
                    },
                );
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Closes `display` together with its offscreen buffers.
    ///
    /// ## Returns
    /// `false` if the display does not exist.
    pub fn destroy(&mut self, display: DisplayId) -> bool {
        match self.displays.remove(&display) {
            Some(entry) => {
                log::info!(
                    "Destroyed {display} and {} offscreen buffer(s).",
                    entry.buffers.len()
                );
                true
            }
            None => false,
        }
    }

    /// Whether `display` is open.
    pub fn contains(&self, display: DisplayId) -> bool {
        self.displays.contains_key(&display)
    }

    /// The configuration `display` was opened with.
    pub fn config(&self, display: DisplayId) -> Option<&DisplayConfig> {
        self.displays.get(&display).map(|entry| &entry.config)
    }

    /// The backend of `display`.
    pub fn backend_mut(&mut self, display: DisplayId) -> Option<&mut dyn DisplayBackend> {
        match self.displays.get_mut(&display) {
            Some(entry) => Some(entry.backend.as_mut()),
            None => None,
        }
    }

    /// Open displays in id order.
    pub fn ids(&self) -> Vec<DisplayId> {
        self.displays.keys().copied().collect()
    }

    /// Allocates an offscreen buffer on `display`.
    ///
    /// ## Returns
    /// `false` if the display is missing, the id is taken anywhere, or the
    /// platform refused.
    pub fn create_buffer(
        &mut self,
        display: DisplayId,
        buffer: DisplayBufferId,
        info: OffscreenBuffer,
    ) -> bool {
        if self.buffer_display(buffer).is_some() {
            log::warn!("{buffer} already exists.");
            return false;
        }
        let Some(entry) = self.displays.get_mut(&display) else {
            log::warn!("Cannot create {buffer} on unknown {display}.");
            return false;
        };
        if let Err(e) = entry
            .backend
            .create_offscreen_buffer(buffer, info.width, info.height)
        {
            log::warn!("{e}");
            return false;
        }
        entry.buffers.insert(buffer, info);
        true
    }

    /// Frees an offscreen buffer of `display`.
    ///
    /// ## Returns
    /// `false` if the buffer is not on that display.
    pub fn destroy_buffer(&mut self, display: DisplayId, buffer: DisplayBufferId) -> bool {
        let Some(entry) = self.displays.get_mut(&display) else {
            return false;
        };
        if entry.buffers.remove(&buffer).is_none() {
            return false;
        }
        entry.backend.destroy_offscreen_buffer(buffer);
        true
    }

    /// The display owning `buffer`.
    pub fn buffer_display(&self, buffer: DisplayBufferId) -> Option<DisplayId> {
        self.displays
            .iter()
            .find(|(_, entry)| entry.buffers.contains_key(&buffer))
            .map(|(display, _)| *display)
    }

    /// Offscreen buffers of `display` in id order.
    pub fn buffers(&self, display: DisplayId) -> Vec<(DisplayBufferId, OffscreenBuffer)> {
        self.displays
            .get(&display)
            .map(|entry| entry.buffers.iter().map(|(id, info)| (*id, *info)).collect())
            .unwrap_or_default()
    }

    /// Whether `buffer` names a target of `display`. The framebuffer always does.
    pub fn has_target(&self, display: DisplayId, buffer: DisplayBuffer) -> bool {
        match (self.displays.get(&display), buffer) {
            (None, _) => false,
            (Some(_), DisplayBuffer::Framebuffer) => true,
            (Some(entry), DisplayBuffer::Offscreen(id)) => entry.buffers.contains_key(&id),
        }
    }

    /// Sets the clear colour of a target.
    ///
    /// ## Returns
    /// `false` if the target does not exist.
    pub fn set_clear_color(
        &mut self,
        display: DisplayId,
        buffer: DisplayBuffer,
        color: ClearColor,
    ) -> bool {
        if !self.has_target(display, buffer) {
            return false;
        }
        match self.backend_mut(display) {
            Some(backend) => {
                backend.set_clear_color(buffer, color);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessPlatform;

    fn buffer_info() -> OffscreenBuffer {
        OffscreenBuffer {
            width: 64,
            height: 32,
            interruptible: false,
        }
    }

    #[test]
    fn test_display_ids_are_unique() {
        let mut platform = HeadlessPlatform::new();
        let mut manager = DisplayManager::new();

        assert!(manager.create(&mut platform, DisplayId(1), DisplayConfig::default()));
        assert!(!manager.create(&mut platform, DisplayId(1), DisplayConfig::default()));
        assert!(manager.create(&mut platform, DisplayId(0), DisplayConfig::default()));
        assert_eq!(manager.ids(), vec![DisplayId(0), DisplayId(1)]);
    }

    #[test]
    fn test_platform_refusal_leaves_no_display() {
        let mut platform = HeadlessPlatform::new();
        platform.faults().fail_display_creations(1);
        let mut manager = DisplayManager::new();

        assert!(!manager.create(&mut platform, DisplayId(0), DisplayConfig::default()));
        assert!(!manager.contains(DisplayId(0)));
    }

    #[test]
    fn test_buffers_belong_to_one_display() {
        let mut platform = HeadlessPlatform::new();
        let mut manager = DisplayManager::new();
        manager.create(&mut platform, DisplayId(0), DisplayConfig::default());
        manager.create(&mut platform, DisplayId(1), DisplayConfig::default());

        assert!(manager.create_buffer(DisplayId(0), DisplayBufferId(5), buffer_info()));
        assert!(!manager.create_buffer(DisplayId(1), DisplayBufferId(5), buffer_info()));
        assert!(!manager.create_buffer(DisplayId(9), DisplayBufferId(6), buffer_info()));

        assert_eq!(manager.buffer_display(DisplayBufferId(5)), Some(DisplayId(0)));
        assert!(manager.has_target(DisplayId(0), DisplayBuffer::Offscreen(DisplayBufferId(5))));
        assert!(!manager.has_target(DisplayId(1), DisplayBuffer::Offscreen(DisplayBufferId(5))));
        assert!(!manager.destroy_buffer(DisplayId(1), DisplayBufferId(5)));
        assert!(manager.destroy_buffer(DisplayId(0), DisplayBufferId(5)));
        assert!(manager.buffers(DisplayId(0)).is_empty());
    }

    #[test]
    fn test_clear_color_needs_an_existing_target() {
        let mut platform = HeadlessPlatform::new();
        let mut manager = DisplayManager::new();
        manager.create(&mut platform, DisplayId(0), DisplayConfig::default());

        let red = ClearColor::rgba(1.0, 0.0, 0.0, 1.0);
        assert!(manager.set_clear_color(DisplayId(0), DisplayBuffer::Framebuffer, red));
        assert!(!manager.set_clear_color(
            DisplayId(0),
            DisplayBuffer::Offscreen(DisplayBufferId(2)),
            red
        ));
        assert!(!manager.set_clear_color(DisplayId(3), DisplayBuffer::Framebuffer, red));
    }
}
