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

//! Error types for the command containers.

use thiserror::Error;

/// An error raised when reading from a [`CommandQueue`](crate::CommandQueue).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The payload at `index` is not of the kind the caller expected.
    #[error("command {index} is a {found} command, expected {expected}")]
    KindMismatch {
        /// Position of the offending command.
        index: usize,
        /// The kind the caller asked for.
        expected: String,
        /// The kind actually stored.
        found: String,
    },
    /// `index` is past the end of the queue.
    #[error("command index {index} out of bounds for a queue of {len}")]
    OutOfBounds {
        /// Requested position.
        index: usize,
        /// Number of queued commands.
        len: usize,
    },
}
