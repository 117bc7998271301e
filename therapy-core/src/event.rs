//! Input events published by the canvas server.
//!
//! # Wire format
//!
//! One message per event. Byte 0 is the [`EventKind`] tag, the rest is
//! decoded according to the tag:
//!
//! ```text
//! KEY_DOWN           str key, varint n, n × str modifier, bool repeat
//! MOUSE_MOTION       f32 x, f32 y
//! MOUSE_WHEEL        f32 x, f32 y
//! MOUSE_BUTTON_DOWN  u8 button, f32 x, f32 y
//! MOUSE_BUTTON_UP    u8 button, f32 x, f32 y
//! ```
//!
//! Adding a tag means adding an [`EventKind`] variant and an [`Event`]
//! variant; [`Event::decode`] and [`Event::kind`] then fail to compile until
//! the new case is handled.

use std::fmt;

use bytes::{Bytes, BytesMut};
use serde::Serialize;

use crate::error::{Result, TherapyError};
use crate::serial::{self, Cursor, Decodable, Encodable};

// ── EventKind ────────────────────────────────────────────────────

/// One-byte event-type tag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    KeyDown = 0,
    MouseMotion = 1,
    MouseWheel = 2,
    MouseButtonDown = 3,
    MouseButtonUp = 4,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::KeyDown,
        EventKind::MouseMotion,
        EventKind::MouseWheel,
        EventKind::MouseButtonDown,
        EventKind::MouseButtonUp,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Lower-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::KeyDown => "key_down",
            EventKind::MouseMotion => "mouse_motion",
            EventKind::MouseWheel => "mouse_wheel",
            EventKind::MouseButtonDown => "mouse_button_down",
            EventKind::MouseButtonUp => "mouse_button_up",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        EventKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl TryFrom<u8> for EventKind {
    type Error = TherapyError;

    fn try_from(value: u8) -> Result<Self> {
        EventKind::ALL
            .get(value as usize)
            .copied()
            .ok_or(TherapyError::UnknownVariant {
                type_name: "EventKind",
                value: value as u64,
            })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── MouseButton ──────────────────────────────────────────────────

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left = 0,
    Middle = 1,
    Right = 2,
    Unknown = 3,
}

impl TryFrom<u8> for MouseButton {
    type Error = TherapyError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MouseButton::Left),
            1 => Ok(MouseButton::Middle),
            2 => Ok(MouseButton::Right),
            3 => Ok(MouseButton::Unknown),
            _ => Err(TherapyError::UnknownVariant {
                type_name: "MouseButton",
                value: value as u64,
            }),
        }
    }
}

impl Encodable for MouseButton {
    fn encode(&self, buf: &mut BytesMut) {
        serial::write_u8(buf, *self as u8)
    }
}

impl Decodable for MouseButton {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        MouseButton::try_from(serial::read_u8(cur)?)
    }
}

// ── Event ────────────────────────────────────────────────────────

/// A decoded input event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    KeyDown {
        /// Key name as reported by the server, e.g. `"Left"` or `"Z"`.
        key: String,
        /// Held modifiers: any of `"shift"`, `"ctrl"`, `"alt"`, `"logo"`.
        modifiers: Vec<String>,
        repeat: bool,
    },
    MouseMotion {
        x: f32,
        y: f32,
    },
    /// Wheel deltas.
    MouseWheel {
        x: f32,
        y: f32,
    },
    MouseButtonDown {
        button: MouseButton,
        x: f32,
        y: f32,
    },
    MouseButtonUp {
        button: MouseButton,
        x: f32,
        y: f32,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::KeyDown { .. } => EventKind::KeyDown,
            Event::MouseMotion { .. } => EventKind::MouseMotion,
            Event::MouseWheel { .. } => EventKind::MouseWheel,
            Event::MouseButtonDown { .. } => EventKind::MouseButtonDown,
            Event::MouseButtonUp { .. } => EventKind::MouseButtonUp,
        }
    }

    /// Decode one event message.
    ///
    /// Bytes left over after the record are ignored so the server can grow
    /// a record without breaking older clients.
    pub fn decode(message: impl Into<Bytes>) -> Result<Self> {
        let mut cur = Cursor::new(message);
        let kind = EventKind::try_from(serial::read_u8(&mut cur)?)?;
        let event = match kind {
            EventKind::KeyDown => Event::KeyDown {
                key: String::decode(&mut cur)?,
                modifiers: Vec::<String>::decode(&mut cur)?,
                repeat: serial::read_bool(&mut cur)?,
            },
            EventKind::MouseMotion => Event::MouseMotion {
                x: serial::read_f32(&mut cur)?,
                y: serial::read_f32(&mut cur)?,
            },
            EventKind::MouseWheel => Event::MouseWheel {
                x: serial::read_f32(&mut cur)?,
                y: serial::read_f32(&mut cur)?,
            },
            EventKind::MouseButtonDown => Event::MouseButtonDown {
                button: MouseButton::decode(&mut cur)?,
                x: serial::read_f32(&mut cur)?,
                y: serial::read_f32(&mut cur)?,
            },
            EventKind::MouseButtonUp => Event::MouseButtonUp {
                button: MouseButton::decode(&mut cur)?,
                x: serial::read_f32(&mut cur)?,
                y: serial::read_f32(&mut cur)?,
            },
        };
        if !cur.is_empty() {
            tracing::trace!(kind = %kind, trailing = cur.remaining(), "ignoring trailing event bytes");
        }
        Ok(event)
    }

    /// Encode the event the way the server publishes it.
    pub fn to_bytes(&self) -> Bytes {
        serial::serialize(self)
    }

    /// Pointer position carried by mouse events (wheel deltas excluded).
    pub fn position(&self) -> Option<(f32, f32)> {
        match *self {
            Event::MouseMotion { x, y }
            | Event::MouseButtonDown { x, y, .. }
            | Event::MouseButtonUp { x, y, .. } => Some((x, y)),
            Event::KeyDown { .. } | Event::MouseWheel { .. } => None,
        }
    }
}

impl Encodable for Event {
    fn encode(&self, buf: &mut BytesMut) {
        serial::write_u8(buf, self.kind().tag());
        match self {
            Event::KeyDown {
                key,
                modifiers,
                repeat,
            } => {
                key.encode(buf);
                modifiers.encode(buf);
                repeat.encode(buf);
            }
            Event::MouseMotion { x, y } | Event::MouseWheel { x, y } => {
                x.encode(buf);
                y.encode(buf);
            }
            Event::MouseButtonDown { button, x, y } | Event::MouseButtonUp { button, x, y } => {
                button.encode(buf);
                x.encode(buf);
                y.encode(buf);
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_mouse_button_down() {
        let mut msg = vec![3u8, 0];
        msg.extend_from_slice(&1.5f32.to_le_bytes());
        msg.extend_from_slice(&2.5f32.to_le_bytes());

        let event = Event::decode(msg).unwrap();
        assert_eq!(
            event,
            Event::MouseButtonDown {
                button: MouseButton::Left,
                x: 1.5,
                y: 2.5
            }
        );
        assert_eq!(event.kind(), EventKind::MouseButtonDown);
    }

    #[test]
    fn decode_key_down() {
        let mut msg = vec![0u8];
        msg.extend_from_slice(&[4, b'L', b'e', b'f', b't']);
        msg.extend_from_slice(&[2, 5, b's', b'h', b'i', b'f', b't', 4, b'c', b't', b'r', b'l']);
        msg.push(1);

        let event = Event::decode(msg).unwrap();
        assert_eq!(
            event,
            Event::KeyDown {
                key: "Left".into(),
                modifiers: vec!["shift".into(), "ctrl".into()],
                repeat: true,
            }
        );
    }

    #[test]
    fn unknown_tag_is_protocol_error() {
        let err = Event::decode(vec![99u8, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            TherapyError::UnknownVariant {
                type_name: "EventKind",
                value: 99
            }
        ));
    }

    #[test]
    fn unknown_button_is_protocol_error() {
        let mut msg = vec![4u8, 9];
        msg.extend_from_slice(&[0; 8]);
        assert!(matches!(
            Event::decode(msg),
            Err(TherapyError::UnknownVariant {
                type_name: "MouseButton",
                ..
            })
        ));
    }

    #[test]
    fn truncated_motion() {
        let msg = vec![1u8, 0, 0, 0, 0, 0];
        assert!(matches!(
            Event::decode(msg),
            Err(TherapyError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn empty_message_is_truncated() {
        assert!(matches!(
            Event::decode(Bytes::new()),
            Err(TherapyError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut msg = Event::MouseWheel { x: 0.0, y: -1.0 }.to_bytes().to_vec();
        msg.push(0xaa);
        assert_eq!(
            Event::decode(msg).unwrap(),
            Event::MouseWheel { x: 0.0, y: -1.0 }
        );
    }

    #[test]
    fn encode_matches_server_layout() {
        let bytes = Event::MouseMotion { x: 0.25, y: -0.5 }.to_bytes();
        let mut expected = vec![1u8];
        expected.extend_from_slice(&0.25f32.to_le_bytes());
        expected.extend_from_slice(&(-0.5f32).to_le_bytes());
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn kind_names() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
            assert_eq!(EventKind::try_from(kind.tag()).unwrap(), kind);
        }
        assert_eq!(EventKind::from_name("scroll"), None);
    }

    #[test]
    fn display_and_position() {
        let event = Event::MouseButtonUp {
            button: MouseButton::Right,
            x: 1.0,
            y: 2.0,
        };
        let kind = EventKind::MouseButtonUp;
        assert_eq!(kind.to_string(), "mouse_button_up");
        assert_eq!(event.position(), Some((1.0, 2.0)));
    }
}
