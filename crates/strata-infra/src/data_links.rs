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

//! Data flowing between scenes: consumer slots fed by a provider scene's slot
//! or by an offscreen buffer.

use std::collections::BTreeMap;
use strata_core::{DataSlotId, DisplayBufferId, SceneId};

/// What feeds a consumer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// A data slot of another scene.
    Data {
        /// The providing scene.
        scene: SceneId,
        /// The providing slot.
        slot: DataSlotId,
    },
    /// The content of an offscreen buffer.
    OffscreenBuffer(DisplayBufferId),
}

/// Consumer slots and their sources. A slot has at most one source.
#[derive(Debug, Default)]
pub struct DataLinkRegistry {
    links: BTreeMap<(SceneId, DataSlotId), LinkSource>,
}

impl DataLinkRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `consumer_slot` of `consumer_scene` from `source`.
    ///
    /// ## Returns
    /// `false` if the slot is already linked.
    pub fn link(&mut self, consumer_scene: SceneId, consumer_slot: DataSlotId, source: LinkSource) -> bool {
        if self.links.contains_key(&(consumer_scene, consumer_slot)) {
            return false;
        }
        self.links.insert((consumer_scene, consumer_slot), source);
        true
    }

    /// Removes the link of a consumer slot.
    ///
    /// ## Returns
    /// `false` if the slot was not linked.
    pub fn unlink(&mut self, consumer_scene: SceneId, consumer_slot: DataSlotId) -> bool {
        self.links.remove(&(consumer_scene, consumer_slot)).is_some()
    }

    /// Drops every link `scene` takes part in, as consumer or provider.
    ///
    /// ## Returns
    /// The consumer slots that lost their link, in order.
    pub fn remove_scene(&mut self, scene: SceneId) -> Vec<(SceneId, DataSlotId)> {
        let removed: Vec<(SceneId, DataSlotId)> = self
            .links
            .iter()
            .filter(|((consumer, _), source)| {
                *consumer == scene
                    || matches!(source, LinkSource::Data { scene: provider, .. } if *provider == scene)
            })
            .map(|(key, _)| *key)
            .collect();
        for key in &removed {
            self.links.remove(key);
        }
        removed
    }

    /// The source of a consumer slot.
    pub fn source(&self, consumer_scene: SceneId, consumer_slot: DataSlotId) -> Option<LinkSource> {
        self.links.get(&(consumer_scene, consumer_slot)).copied()
    }

    /// Whether any slot consumes `buffer`.
    pub fn is_buffer_linked(&self, buffer: DisplayBufferId) -> bool {
        self.links
            .values()
            .any(|source| *source == LinkSource::OffscreenBuffer(buffer))
    }

    /// Whether `scene` has a slot fed by `buffer`.
    pub fn consumes_buffer(&self, scene: SceneId, buffer: DisplayBufferId) -> bool {
        self.links.iter().any(|((consumer, _), source)| {
            *consumer == scene && *source == LinkSource::OffscreenBuffer(buffer)
        })
    }

    /// Number of linked slots.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether no slot is linked.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
