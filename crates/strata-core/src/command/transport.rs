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

//! The double-buffered inbox between the producer and the renderer schedule.

use super::queue::CommandQueue;
use super::Tagged;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe command inbox.
///
/// Producers append to a pending queue under a lock. Once per processing cycle
/// the consumer swaps that queue with its (empty) working queue under the same
/// lock, so the lock is only ever held for one append or one swap and the
/// consumer never waits for new commands.
///
/// Typically shared as an `Arc<CommandTransport<RendererCommand>>`.
#[derive(Debug)]
pub struct CommandTransport<C> {
    pending: Mutex<CommandQueue<C>>,
}

impl<C: Tagged> CommandTransport<C> {
    /// Creates a transport with nothing pending.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(CommandQueue::new()),
        }
    }

    /// Appends a single command to the pending queue.
    pub fn enqueue(&self, command: impl Into<C>) {
        self.lock().append(command);
    }

    /// Moves a locally batched queue to the back of the pending queue.
    ///
    /// ## Returns
    /// The number of commands submitted. `batch` is left empty.
    pub fn enqueue_all(&self, batch: &mut CommandQueue<C>) -> usize {
        let count = batch.count();
        if count > 0 {
            self.lock().append_queue(batch);
        }
        count
    }

    /// Hands every pending command to `working`, leaving an empty pending queue behind.
    ///
    /// Called once per renderer cycle. Commands still sitting in `working` from
    /// an earlier cycle are released first.
    pub fn drain_into(&self, working: &mut CommandQueue<C>) {
        if !working.is_empty() {
            log::warn!(
                "Releasing {} unprocessed commands before draining the transport.",
                working.count()
            );
            working.clear();
        }
        self.lock().swap_with(working);
    }

    /// Number of commands waiting for the next drain.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().count()
    }

    fn lock(&self) -> MutexGuard<'_, CommandQueue<C>> {
        // A producer panicking mid-append cannot leave the Vec half-written,
        // so the queue stays usable after poisoning.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Tagged> Default for CommandTransport<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandKind, RendererCommand, ShowScene, SubscribeScene};
    use crate::ids::SceneId;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_hands_over_everything_once() {
        let transport = CommandTransport::<RendererCommand>::new();
        transport.enqueue(SubscribeScene { scene: SceneId(1) });
        transport.enqueue(ShowScene { scene: SceneId(1) });

        let mut working = CommandQueue::new();
        transport.drain_into(&mut working);
        assert_eq!(working.count(), 2);
        assert_eq!(working.kind_at(0), Some(CommandKind::SubscribeScene));
        assert_eq!(transport.pending_count(), 0);

        working.clear();
        transport.drain_into(&mut working);
        assert!(working.is_empty());
    }

    #[test]
    fn test_enqueue_all_appends_batch_after_pending() {
        let transport = CommandTransport::<RendererCommand>::new();
        transport.enqueue(SubscribeScene { scene: SceneId(1) });

        let mut batch = CommandQueue::new();
        batch.append(ShowScene { scene: SceneId(2) });
        batch.append(ShowScene { scene: SceneId(3) });
        assert_eq!(transport.enqueue_all(&mut batch), 2);
        assert!(batch.is_empty());

        let mut working = CommandQueue::new();
        transport.drain_into(&mut working);
        let scenes: Vec<_> = working.iter().filter_map(|c| c.scene()).collect();
        assert_eq!(scenes, vec![SceneId(1), SceneId(2), SceneId(3)]);
    }

    #[test]
    fn test_concurrent_producers_keep_per_producer_order() {
        let transport = Arc::new(CommandTransport::<RendererCommand>::new());
        let producers: Vec<_> = (0..4u64)
            .map(|p| {
                let transport = Arc::clone(&transport);
                thread::spawn(move || {
                    for i in 0..100u64 {
                        transport.enqueue(ShowScene {
                            scene: SceneId(p * 1000 + i),
                        });
                    }
                })
            })
            .collect();

        let mut received = Vec::new();
        let mut working = CommandQueue::new();
        for producer in producers {
            producer.join().expect("producer thread panicked");
        }
        transport.drain_into(&mut working);
        received.extend(working.drain().filter_map(|c| c.scene()));

        assert_eq!(received.len(), 400);
        for p in 0..4u64 {
            let own: Vec<_> = received
                .iter()
                .filter(|s| s.0 / 1000 == p)
                .map(|s| s.0 % 1000)
                .collect();
            assert_eq!(own, (0..100).collect::<Vec<_>>());
        }
    }
}
