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

//! The closed command vocabulary exchanged between producer and renderer.
//!
//! Every command kind owns exactly one payload struct. [`RendererCommand`] is the
//! sum type over all payloads and its discriminant doubles as the kind tag, so
//! the containers in [`queue`] and [`transport`] never have to inspect payloads.
//! Adding a kind only touches the `command_vocabulary!` invocation below.

pub mod queue;
pub mod transport;

use crate::config::{ClearColor, DisplayConfig, FrameTimerLimits};
use crate::ids::{DataSlotId, DisplayBufferId, DisplayId, SceneId};
use crate::scene::DisplayBuffer;
use std::fmt;

/// A value that carries a kind tag.
///
/// Implemented by command sum types so that generic containers can report
/// and check kinds without knowing the vocabulary.
pub trait Tagged {
    /// The tag type, usually a field-less enum mirroring the variants.
    type Kind: Copy + Eq + fmt::Debug;

    /// Returns the kind tag of this value.
    fn kind(&self) -> Self::Kind;
}

/// A payload shape belonging to the vocabulary `C`.
pub trait Payload<C: Tagged>: Sized {
    /// The kind tag under which this payload is stored.
    const KIND: C::Kind;

    /// Borrows the payload out of `command` if it is of this shape.
    fn extract(command: &C) -> Option<&Self>;
}

macro_rules! command_vocabulary {
    ($( $(#[$meta:meta])* $name:ident ),+ $(,)?) => {
        /// A command sent from the producer side to the renderer.
        #[derive(Debug, Clone, PartialEq)]
        pub enum RendererCommand {
            $( $(#[$meta])* $name($name), )+
        }

        /// The kind tag of a [`RendererCommand`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CommandKind {
            $( $(#[$meta])* $name, )+
        }

        impl CommandKind {
            /// Every kind of the vocabulary, in declaration order.
            pub const ALL: &'static [CommandKind] = &[$(CommandKind::$name),+];
        }

        impl Tagged for RendererCommand {
            type Kind = CommandKind;

            fn kind(&self) -> CommandKind {
                match self {
                    $( RendererCommand::$name(_) => CommandKind::$name, )+
                }
            }
        }

        $(
            impl Payload<RendererCommand> for $name {
                const KIND: CommandKind = CommandKind::$name;

                fn extract(command: &RendererCommand) -> Option<&Self> {
                    match command {
                        RendererCommand::$name(payload) => Some(payload),
                        _ => None,
                    }
                }
            }

            impl From<$name> for RendererCommand {
                fn from(payload: $name) -> Self {
                    RendererCommand::$name(payload)
                }
            }
        )+
    };
}

command_vocabulary! {
    /// The producer made a scene available.
    PublishScene,
    /// The producer withdrew a scene.
    UnpublishScene,
    /// Request a subscription to a published scene.
    SubscribeScene,
    /// Drop the subscription of a scene.
    UnsubscribeScene,
    /// Map a subscribed scene to a display.
    MapScene,
    /// Unmap a scene from its display.
    UnmapScene,
    /// Start rendering a ready scene.
    ShowScene,
    /// Stop rendering a scene.
    HideScene,
    /// Assign a mapped scene to a display buffer.
    AssignSceneToDisplayBuffer,
    /// Create a display.
    CreateDisplay,
    /// Destroy a display.
    DestroyDisplay,
    /// Create an offscreen buffer on a display.
    CreateOffscreenBuffer,
    /// Destroy an offscreen buffer.
    DestroyOffscreenBuffer,
    /// Link a data provider slot to a data consumer slot.
    LinkData,
    /// Link an offscreen buffer to a texture consumer slot.
    LinkOffscreenBuffer,
    /// Remove the link of a consumer slot.
    UnlinkData,
    /// Change the clear colour of a display buffer.
    SetClearColor,
    /// Change the renderer's per-frame time budgets.
    SetFrameTimerLimits,
    /// Echo a token back once every earlier command has been applied.
    ConfirmationEcho,
}

/// Payload of [`RendererCommand::PublishScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishScene {
    /// The published scene.
    pub scene: SceneId,
}

/// Payload of [`RendererCommand::UnpublishScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnpublishScene {
    /// The withdrawn scene.
    pub scene: SceneId,
}

/// Payload of [`RendererCommand::SubscribeScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeScene {
    /// The scene to subscribe.
    pub scene: SceneId,
}

/// Payload of [`RendererCommand::UnsubscribeScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnsubscribeScene {
    /// The scene to unsubscribe.
    pub scene: SceneId,
}

/// Payload of [`RendererCommand::MapScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct MapScene {
    /// The scene to map.
    pub scene: SceneId,
    /// The display it is mapped to.
    pub display: DisplayId,
}

/// Payload of [`RendererCommand::UnmapScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnmapScene {
    /// The scene to unmap.
    pub scene: SceneId,
}

/// Payload of [`RendererCommand::ShowScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShowScene {
    /// The scene to show.
    pub scene: SceneId,
}

/// Payload of [`RendererCommand::HideScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct HideScene {
    /// The scene to hide.
    pub scene: SceneId,
}

/// Payload of [`RendererCommand::AssignSceneToDisplayBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssignSceneToDisplayBuffer {
    /// The mapped scene.
    pub scene: SceneId,
    /// Target buffer on the scene's display.
    pub buffer: DisplayBuffer,
    /// Order among scenes sharing the buffer, lower renders first.
    pub render_order: i32,
}

/// Payload of [`RendererCommand::CreateDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDisplay {
    /// Id reserved by the producer side for the new display.
    pub display: DisplayId,
    /// Surface description.
    pub config: DisplayConfig,
}

/// Payload of [`RendererCommand::DestroyDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub struct DestroyDisplay {
    /// The display to destroy.
    pub display: DisplayId,
}

/// Payload of [`RendererCommand::CreateOffscreenBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOffscreenBuffer {
    /// The owning display.
    pub display: DisplayId,
    /// Id reserved by the producer side for the new buffer.
    pub buffer: DisplayBufferId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Interruptible buffers may be rendered over several frames.
    pub interruptible: bool,
}

/// Payload of [`RendererCommand::DestroyOffscreenBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct DestroyOffscreenBuffer {
    /// The owning display.
    pub display: DisplayId,
    /// The buffer to destroy.
    pub buffer: DisplayBufferId,
}

/// Payload of [`RendererCommand::LinkData`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinkData {
    /// Scene providing the data.
    pub provider_scene: SceneId,
    /// Provider slot within `provider_scene`.
    pub provider_slot: DataSlotId,
    /// Scene consuming the data.
    pub consumer_scene: SceneId,
    /// Consumer slot within `consumer_scene`.
    pub consumer_slot: DataSlotId,
}

/// Payload of [`RendererCommand::LinkOffscreenBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOffscreenBuffer {
    /// Buffer used as texture source.
    pub buffer: DisplayBufferId,
    /// Scene consuming the texture.
    pub consumer_scene: SceneId,
    /// Texture consumer slot within `consumer_scene`.
    pub consumer_slot: DataSlotId,
}

/// Payload of [`RendererCommand::UnlinkData`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnlinkData {
    /// Scene owning the consumer slot.
    pub consumer_scene: SceneId,
    /// The consumer slot to unlink.
    pub consumer_slot: DataSlotId,
}

/// Payload of [`RendererCommand::SetClearColor`].
#[derive(Debug, Clone, PartialEq)]
pub struct SetClearColor {
    /// The display owning the buffer.
    pub display: DisplayId,
    /// The buffer whose clear colour changes.
    pub buffer: DisplayBuffer,
    /// New colour.
    pub color: ClearColor,
}

/// Payload of [`RendererCommand::SetFrameTimerLimits`].
#[derive(Debug, Clone, PartialEq)]
pub struct SetFrameTimerLimits {
    /// New budgets.
    pub limits: FrameTimerLimits,
}

/// Payload of [`RendererCommand::ConfirmationEcho`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationEcho {
    /// Opaque token echoed back unchanged.
    pub text: String,
}

impl RendererCommand {
    /// The scene a command is about, if it targets a single scene.
    ///
    /// Link commands report their consumer scene.
    pub fn scene(&self) -> Option<SceneId> {
        match self {
            RendererCommand::PublishScene(c) => Some(c.scene),
            RendererCommand::UnpublishScene(c) => Some(c.scene),
            RendererCommand::SubscribeScene(c) => Some(c.scene),
            RendererCommand::UnsubscribeScene(c) => Some(c.scene),
            RendererCommand::MapScene(c) => Some(c.scene),
            RendererCommand::UnmapScene(c) => Some(c.scene),
            RendererCommand::ShowScene(c) => Some(c.scene),
            RendererCommand::HideScene(c) => Some(c.scene),
            RendererCommand::AssignSceneToDisplayBuffer(c) => Some(c.scene),
            RendererCommand::LinkData(c) => Some(c.consumer_scene),
            RendererCommand::LinkOffscreenBuffer(c) => Some(c.consumer_scene),
            RendererCommand::UnlinkData(c) => Some(c.consumer_scene),
            RendererCommand::CreateDisplay(_)
            | RendererCommand::DestroyDisplay(_)
            | RendererCommand::CreateOffscreenBuffer(_)
            | RendererCommand::DestroyOffscreenBuffer(_)
            | RendererCommand::SetClearColor(_)
            | RendererCommand::SetFrameTimerLimits(_)
            | RendererCommand::ConfirmationEcho(_) => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let command: RendererCommand = MapScene {
            scene: SceneId(1),
            display: DisplayId(0),
        }
        .into();
        assert_eq!(command.kind(), CommandKind::MapScene);
        assert_eq!(command.scene(), Some(SceneId(1)));
    }

    #[test]
    fn test_extract_only_matching_payload() {
        let command: RendererCommand = ShowScene { scene: SceneId(5) }.into();
        assert_eq!(
            ShowScene::extract(&command),
            Some(&ShowScene { scene: SceneId(5) })
        );
        assert_eq!(HideScene::extract(&command), None);
    }

    #[test]
    fn test_display_commands_have_no_scene() {
        let command: RendererCommand = DestroyDisplay {
            display: DisplayId(2),
        }
        .into();
        assert_eq!(command.scene(), None);
    }

    #[test]
    fn test_every_kind_is_listed_once() {
        let kinds: std::collections::HashSet<_> = CommandKind::ALL.iter().copied().collect();
        assert_eq!(kinds.len(), CommandKind::ALL.len());
        assert_eq!(kinds.len(), 19);
        assert_eq!(<ConfirmationEcho as Payload<RendererCommand>>::KIND, CommandKind::ConfirmationEcho);
    }
}
