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

/// Manages a generic, thread-safe event channel.
///
/// The renderer schedule publishes through cloned senders while the owner of
/// the bus drains the receiving end on its own thread. Events arrive in the
/// order each sender produced them.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new EventBus with an unbounded channel for a specific event type.
    ///
    /// ## Returns
    /// A new instance of the EventBus struct.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::info!("Generic EventBus initialized.");
        Self { sender, receiver }
    }

    /// Returns a clone of the sender end of the channel.
    /// Use this to allow other parts of the system to send events.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
