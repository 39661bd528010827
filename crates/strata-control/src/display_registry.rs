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

//! Producer-side bookkeeping of displays and offscreen buffers.

use crate::error::ControlError;
use std::collections::HashMap;
use strata_core::{DisplayBufferId, DisplayId, EventResult};

/// Where a display or buffer stands from the producer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStatus {
    /// Creation was requested, no reply yet.
    Requested,
    /// The renderer confirmed the creation.
    Created,
    /// Destruction was requested, no reply yet.
    DestroyRequested,
}

#[derive(Debug, Clone)]
struct BufferEntry {
    display: DisplayId,
    status: CreationStatus,
}

/// Tracks displays and offscreen buffers and hands out their ids.
#[derive(Debug, Default)]
pub struct DisplayRegistry {
    displays: HashMap<DisplayId, CreationStatus>,
    buffers: HashMap<DisplayBufferId, BufferEntry>,
    next_display: u32,
    next_buffer: u32,
}

impl DisplayRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh display id and records its creation as requested.
    pub fn reserve_display(&mut self) -> DisplayId {
        let display = DisplayId(self.next_display);
        self.next_display += 1;
        self.displays.insert(display, CreationStatus::Requested);
        display
    }

    /// Reserves a fresh buffer id on a known display.
    pub fn reserve_buffer(&mut self, display: DisplayId) -> Result<DisplayBufferId, ControlError> {
        if !self.displays.contains_key(&display) {
            return Err(ControlError::UnknownDisplay { display });
        }
        let buffer = DisplayBufferId(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(
            buffer,
            BufferEntry {
                display,
                status: CreationStatus::Requested,
            },
        );
        Ok(buffer)
    }

    /// Returns `true` once the renderer confirmed `display` and no destruction is pending.
    #[must_use]
    pub fn is_display_created(&self, display: DisplayId) -> bool {
        self.displays.get(&display) == Some(&CreationStatus::Created)
    }

    /// Status of a display, if known.
    #[must_use]
    pub fn display_status(&self, display: DisplayId) -> Option<CreationStatus> {
        self.displays.get(&display).copied()
    }

    /// Status of an offscreen buffer, if known.
    #[must_use]
    pub fn buffer_status(&self, buffer: DisplayBufferId) -> Option<CreationStatus> {
        self.buffers.get(&buffer).map(|entry| entry.status)
    }

    /// The display owning `buffer`.
    #[must_use]
    pub fn buffer_display(&self, buffer: DisplayBufferId) -> Option<DisplayId> {
        self.buffers.get(&buffer).map(|entry| entry.display)
    }

    /// Marks a display for destruction.
    pub fn request_display_destruction(&mut self, display: DisplayId) -> Result<(), ControlError> {
        match self.displays.get_mut(&display) {
            Some(status) => {
                *status = CreationStatus::DestroyRequested;
                Ok(())
            }
            None => Err(ControlError::UnknownDisplay { display }),
        }
    }

    /// Marks a buffer of `display` for destruction.
    pub fn request_buffer_destruction(
        &mut self,
        display: DisplayId,
        buffer: DisplayBufferId,
    ) -> Result<(), ControlError> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(ControlError::UnknownOffscreenBuffer { buffer })?;
        if entry.display != display {
            return Err(ControlError::BufferNotOnDisplay { buffer, display });
        }
        entry.status = CreationStatus::DestroyRequested;
        Ok(())
    }

    /// Applies the renderer's reply to a display creation.
    ///
    /// ## Returns
    /// `true` if the display is now usable.
    pub fn display_created(&mut self, display: DisplayId, result: EventResult) -> bool {
        if result == EventResult::Ok {
            self.displays.insert(display, CreationStatus::Created);
            true
        } else {
            log::error!("Renderer could not create {display}.");
            self.displays.remove(&display);
            false
        }
    }

    /// Applies the renderer's reply to a display destruction.
    pub fn display_destroyed(&mut self, display: DisplayId, result: EventResult) {
        if result == EventResult::Ok {
            self.displays.remove(&display);
            self.buffers.retain(|_, entry| entry.display != display);
        } else if let Some(status) = self.displays.get_mut(&display) {
            log::error!("Renderer refused to destroy {display}; it stays alive.");
            *status = CreationStatus::Created;
        }
    }

    /// Applies the renderer's reply to a buffer creation.
    pub fn buffer_created(&mut self, buffer: DisplayBufferId, result: EventResult) {
        if result == EventResult::Ok {
            if let Some(entry) = self.buffers.get_mut(&buffer) {
                entry.status = CreationStatus::Created;
            }
        } else {
            log::error!("Renderer could not create offscreen {buffer}.");
            self.buffers.remove(&buffer);
        }
    }

    /// Applies the renderer's reply to a buffer destruction.
    pub fn buffer_destroyed(&mut self, buffer: DisplayBufferId, result: EventResult) {
        if result == EventResult::Ok {
            self.buffers.remove(&buffer);
        } else if let Some(entry) = self.buffers.get_mut(&buffer) {
            log::error!("Renderer refused to destroy offscreen {buffer}; it stays alive.");
            entry.status = CreationStatus::Created;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_becomes_usable_only_after_confirmation() {
        let mut registry = DisplayRegistry::new();
        let display = registry.reserve_display();
        assert!(!registry.is_display_created(display));

        assert!(registry.display_created(display, EventResult::Ok));
        assert!(registry.is_display_created(display));
    }

    #[test]
    fn test_failed_creation_forgets_the_display() {
        let mut registry = DisplayRegistry::new();
        let display = registry.reserve_display();
        assert!(!registry.display_created(display, EventResult::Fail));
        assert_eq!(registry.display_status(display), None);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut registry = DisplayRegistry::new();
        let first = registry.reserve_display();
        registry.display_created(first, EventResult::Ok);
        registry.request_display_destruction(first).unwrap();
        registry.display_destroyed(first, EventResult::Ok);
        let second = registry.reserve_display();
        assert_ne!(first, second);
    }

    #[test]
    fn test_refused_destruction_keeps_display_created() {
        let mut registry = DisplayRegistry::new();
        let display = registry.reserve_display();
        registry.display_created(display, EventResult::Ok);
        registry.request_display_destruction(display).unwrap();
        assert!(!registry.is_display_created(display));

        registry.display_destroyed(display, EventResult::Fail);
        assert!(registry.is_display_created(display));
    }

    #[test]
    fn test_buffers_belong_to_their_display() {
        let mut registry = DisplayRegistry::new();
        let a = registry.reserve_display();
        let b = registry.reserve_display();
        let buffer = registry.reserve_buffer(a).unwrap();

        assert_eq!(registry.buffer_display(buffer), Some(a));
        assert_eq!(
            registry.request_buffer_destruction(b, buffer),
            Err(ControlError::BufferNotOnDisplay { buffer, display: b })
        );
        assert_eq!(
            registry.reserve_buffer(DisplayId(99)),
            Err(ControlError::UnknownDisplay {
                display: DisplayId(99)
            })
        );
    }

    #[test]
    fn test_destroying_display_drops_its_buffers() {
        let mut registry = DisplayRegistry::new();
        let display = registry.reserve_display();
        let buffer = registry.reserve_buffer(display).unwrap();
        registry.buffer_created(buffer, EventResult::Ok);

        registry.display_destroyed(display, EventResult::Ok);
        assert_eq!(registry.buffer_status(buffer), None);
    }
}
