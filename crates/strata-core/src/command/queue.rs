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

//! An ordered, single-owner queue of tagged commands.

use super::{Payload, Tagged};
use crate::error::QueueError;

/// An append-only, insertion-ordered sequence of commands.
///
/// The queue owns every command it holds. It is not synchronised; share it
/// through a [`CommandTransport`](super::transport::CommandTransport).
#[derive(Debug)]
pub struct CommandQueue<C> {
    commands: Vec<C>,
}

impl<C: Tagged> CommandQueue<C> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Creates an empty queue able to hold `capacity` commands without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Appends a command, tagged by its own kind.
    pub fn append(&mut self, command: impl Into<C>) {
        self.commands.push(command.into());
    }

    /// Moves every command of `other` to the back of this queue, leaving `other` empty.
    pub fn append_queue(&mut self, other: &mut CommandQueue<C>) {
        if self.commands.is_empty() {
            self.swap_with(other);
        } else {
            self.commands.append(&mut other.commands);
        }
    }

    /// Number of queued commands.
    #[must_use]
    pub fn count(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The kind tag of the command at `index`.
    pub fn kind_at(&self, index: usize) -> Option<C::Kind> {
        self.commands.get(index).map(Tagged::kind)
    }

    /// Borrows the command at `index`.
    pub fn get(&self, index: usize) -> Option<&C> {
        self.commands.get(index)
    }

    /// Borrows the payload at `index` as the shape `P`.
    ///
    /// ## Errors
    /// [`QueueError::KindMismatch`] if the stored kind is not `P`'s kind, and
    /// [`QueueError::OutOfBounds`] if `index` is past the end.
    pub fn at<P: Payload<C>>(&self, index: usize) -> Result<&P, QueueError> {
        let command = self.commands.get(index).ok_or(QueueError::OutOfBounds {
            index,
            len: self.commands.len(),
        })?;
        P::extract(command).ok_or_else(|| QueueError::KindMismatch {
            index,
            expected: format!("{:?}", P::KIND),
            found: format!("{:?}", command.kind()),
        })
    }

    /// Iterates over the queued commands in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.commands.iter()
    }

    /// Releases every queued command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Exchanges the whole backing storage of two queues without touching the commands.
    pub fn swap_with(&mut self, other: &mut CommandQueue<C>) {
        std::mem::swap(&mut self.commands, &mut other.commands);
    }

    /// Removes every command, handing ownership to the caller in FIFO order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, C> {
        self.commands.drain(..)
    }
}

impl<C: Tagged> Default for CommandQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> IntoIterator for CommandQueue<C> {
    type Item = C;
    type IntoIter = std::vec::IntoIter<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a, C> IntoIterator for &'a CommandQueue<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandKind, HideScene, MapScene, RendererCommand, ShowScene};
    use crate::ids::{DisplayId, SceneId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A tiny vocabulary whose payloads count their own drops.
    #[derive(Debug)]
    enum Counted {
        Small(Tracked),
        Large(Tracked, [u64; 8]),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum CountedKind {
        Small,
        Large,
    }

    #[derive(Debug)]
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Tagged for Counted {
        type Kind = CountedKind;

        fn kind(&self) -> CountedKind {
            match self {
                Counted::Small(_) => CountedKind::Small,
                Counted::Large(..) => CountedKind::Large,
            }
        }
    }

    fn filled(drops: &Arc<AtomicUsize>, n: usize) -> CommandQueue<Counted> {
        let mut queue = CommandQueue::new();
        for i in 0..n {
            if i % 2 == 0 {
                queue.append(Counted::Small(Tracked(drops.clone())));
            } else {
                queue.append(Counted::Large(Tracked(drops.clone()), [i as u64; 8]));
            }
        }
        queue
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut queue = CommandQueue::<RendererCommand>::new();
        queue.append(ShowScene { scene: SceneId(1) });
        queue.append(MapScene {
            scene: SceneId(2),
            display: DisplayId(0),
        });
        queue.append(HideScene { scene: SceneId(1) });

        assert_eq!(queue.count(), 3);
        assert_eq!(queue.kind_at(0), Some(CommandKind::ShowScene));
        assert_eq!(queue.kind_at(1), Some(CommandKind::MapScene));
        assert_eq!(queue.kind_at(2), Some(CommandKind::HideScene));
        assert_eq!(queue.kind_at(3), None);
    }

    #[test]
    fn test_at_checks_the_kind_tag() {
        let mut queue = CommandQueue::<RendererCommand>::new();
        queue.append(ShowScene { scene: SceneId(9) });

        let show: &ShowScene = queue.at(0).expect("kind matches");
        assert_eq!(show.scene, SceneId(9));

        match queue.at::<HideScene>(0) {
            Err(QueueError::KindMismatch {
                index,
                expected,
                found,
            }) => {
                assert_eq!(index, 0);
                assert_eq!(expected, "HideScene");
                assert_eq!(found, "ShowScene");
            }
            other => panic!("expected a kind mismatch, got {other:?}"),
        }

        assert_eq!(
            queue.at::<ShowScene>(4).unwrap_err(),
            QueueError::OutOfBounds { index: 4, len: 1 }
        );
    }

    #[test]
    fn test_clear_releases_every_payload_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = filled(&drops, 10);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        queue.clear();
        assert_eq!(drops.load(Ordering::SeqCst), 10);
        assert!(queue.is_empty());

        drop(queue);
        assert_eq!(drops.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_drop_releases_every_payload_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let queue = filled(&drops, 7);
        drop(queue);
        assert_eq!(drops.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_drain_transfers_ownership_in_fifo_order() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut queue = filled(&drops, 4);

        let kinds: Vec<_> = queue.drain().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                CountedKind::Small,
                CountedKind::Large,
                CountedKind::Small,
                CountedKind::Large
            ]
        );
        assert_eq!(drops.load(Ordering::SeqCst), 4);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_swap_exchanges_storage_without_copying() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut full = filled(&drops, 5);
        let mut empty = CommandQueue::new();
        let storage = full.commands.as_ptr();

        full.swap_with(&mut empty);

        assert!(full.is_empty());
        assert_eq!(empty.count(), 5);
        assert_eq!(empty.commands.as_ptr(), storage);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_append_queue_preserves_order_across_batches() {
        let mut first = CommandQueue::<RendererCommand>::new();
        first.append(ShowScene { scene: SceneId(1) });
        let mut second = CommandQueue::<RendererCommand>::new();
        second.append(HideScene { scene: SceneId(1) });

        first.append_queue(&mut second);
        assert!(second.is_empty());
        assert_eq!(first.kind_at(0), Some(CommandKind::ShowScene));
        assert_eq!(first.kind_at(1), Some(CommandKind::HideScene));
    }
}
