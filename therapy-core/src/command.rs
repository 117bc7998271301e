//! Command opcodes understood by the canvas server.
//!
//! Uses a proper enum with `TryFrom`, so unknown values never panic.
//! Opcodes are stable once assigned; new commands are appended.

use std::fmt;

use crate::error::TherapyError;

// ── Command ──────────────────────────────────────────────────────

/// All commands understood by the canvas server.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Liveness check, replies with a greeting string.
    Hello = 0,
    /// Append a line segment to a layer (created on demand).
    DrawLine = 1,
    /// Translate the view.
    Pan = 2,
    /// Scale the view.
    Zoom = 3,
    /// Map normalised screen coordinates to world coordinates.
    ScreenToWorld = 4,
    /// List layer names.
    GetLayers = 5,
    DeleteLayer = 6,
    ShowLayer = 7,
    HideLayer = 8,
    /// Move a layer's origin.
    SetLayerPos = 9,
    /// Window size in pixels.
    ScreenSize = 10,
}

impl Command {
    /// Every command, in opcode order.
    pub const ALL: [Command; 11] = [
        Command::Hello,
        Command::DrawLine,
        Command::Pan,
        Command::Zoom,
        Command::ScreenToWorld,
        Command::GetLayers,
        Command::DeleteLayer,
        Command::ShowLayer,
        Command::HideLayer,
        Command::SetLayerPos,
        Command::ScreenSize,
    ];

    /// The one-byte opcode sent as the first message part.
    pub fn opcode(self) -> u8 {
        self as u8
    }

    /// Returns `true` if the server produces a meaningful reply.
    ///
    /// The view and drawing commands are normally pushed; when sent over the
    /// request channel their reply carries no data.
    pub fn expects_reply(self) -> bool {
        !self.is_pushable()
    }

    /// Returns `true` if the command may travel over the push channel.
    pub fn is_pushable(self) -> bool {
        matches!(self, Command::DrawLine | Command::Pan | Command::Zoom)
    }
}

impl TryFrom<u8> for Command {
    type Error = TherapyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Command::ALL
            .get(value as usize)
            .copied()
            .ok_or(TherapyError::UnknownVariant {
                type_name: "Command",
                value: value as u64,
            })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_roundtrip() {
        for cmd in Command::ALL {
            assert_eq!(Command::try_from(cmd.opcode()).unwrap(), cmd);
        }
    }

    #[test]
    fn opcodes_are_stable() {
        assert_eq!(Command::Hello.opcode(), 0);
        assert_eq!(Command::DrawLine.opcode(), 1);
        assert_eq!(Command::Pan.opcode(), 2);
        assert_eq!(Command::Zoom.opcode(), 3);
        assert_eq!(Command::ScreenToWorld.opcode(), 4);
        assert_eq!(Command::GetLayers.opcode(), 5);
        assert_eq!(Command::DeleteLayer.opcode(), 6);
        assert_eq!(Command::ShowLayer.opcode(), 7);
        assert_eq!(Command::HideLayer.opcode(), 8);
        assert_eq!(Command::SetLayerPos.opcode(), 9);
        assert_eq!(Command::ScreenSize.opcode(), 10);
    }

    #[test]
    fn command_invalid() {
        assert!(matches!(
            Command::try_from(11),
            Err(TherapyError::UnknownVariant {
                type_name: "Command",
                value: 11
            })
        ));
    }

    #[test]
    fn pushable_commands_expect_no_reply() {
        assert!(Command::Pan.is_pushable());
        assert!(!Command::Pan.expects_reply());
        assert!(Command::GetLayers.expects_reply());
    }
}
