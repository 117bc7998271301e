//! Domain-specific error types for the Therapy client.
//!
//! All fallible operations return `Result<T, TherapyError>`.
//! Nothing received from the wire can cause a panic; every failure is typed
//! and falls into one of the four [`ErrorClass`] categories.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = TherapyError> = std::result::Result<T, E>;

/// The canonical error type for the Therapy client.
#[derive(Debug, Error)]
pub enum TherapyError {
    // ── Decode Errors ────────────────────────────────────────────
    /// A decode ran past the end of the available bytes.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },

    /// Decoded bytes violate the encoding rules of their type.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    // ── Protocol Errors ──────────────────────────────────────────
    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// A message violated protocol rules.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// The ZMTP handshake with the peer failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The peer speaks a ZMTP version older than 3.0.
    #[error("unsupported ZMTP version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// A frame exceeded the codec limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u64, max: usize },

    // ── Transport Errors ─────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A background task's channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// A previous transport failure left this channel unusable.
    #[error("channel failed; reconnect to continue")]
    ChannelFailed,

    /// The outbound queue is full; the message was dropped.
    #[error("send queue full ({capacity} messages); message dropped")]
    QueueFull { capacity: usize },

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),
}

/// Coarse error taxonomy used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Decode attempted past the end of the input. Fatal to that decode.
    TruncatedInput,
    /// Bytes violate a type's encoding. Fatal to that decode.
    InvalidEncoding,
    /// Unknown opcode, tag or framing. The event stream keeps going.
    Protocol,
    /// The connection is gone. Fatal to the channel.
    Transport,
}

impl TherapyError {
    /// The taxonomy bucket this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::TruncatedInput { .. } => ErrorClass::TruncatedInput,
            Self::InvalidEncoding(_) => ErrorClass::InvalidEncoding,
            Self::UnknownVariant { .. }
            | Self::ProtocolViolation(_)
            | Self::Handshake(_)
            | Self::UnsupportedVersion { .. }
            | Self::FrameTooLarge { .. } => ErrorClass::Protocol,
            Self::Connection(_)
            | Self::ConnectionClosed
            | Self::ChannelClosed
            | Self::ChannelFailed
            | Self::QueueFull { .. }
            | Self::Timeout(_) => ErrorClass::Transport,
        }
    }

    /// Returns `true` if the channel that produced this error can no longer
    /// be used.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Transport && !matches!(self, Self::QueueFull { .. })
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<std::string::FromUtf8Error> for TherapyError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        TherapyError::InvalidEncoding(e.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for TherapyError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        TherapyError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = TherapyError::TruncatedInput {
            needed: 4,
            remaining: 1,
        };
        assert!(e.to_string().contains("needed 4"));

        let e = TherapyError::UnknownVariant {
            type_name: "EventKind",
            value: 99,
        };
        assert!(e.to_string().contains("EventKind"));
        assert!(e.to_string().contains("0x63"));
    }

    #[test]
    fn classes() {
        assert_eq!(
            TherapyError::InvalidEncoding("x".into()).class(),
            ErrorClass::InvalidEncoding
        );
        assert_eq!(
            TherapyError::ProtocolViolation("x").class(),
            ErrorClass::Protocol
        );
        assert_eq!(TherapyError::ConnectionClosed.class(), ErrorClass::Transport);
    }

    #[test]
    fn queue_full_is_not_fatal() {
        assert!(!TherapyError::QueueFull { capacity: 8 }.is_fatal());
        assert!(TherapyError::ChannelClosed.is_fatal());
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let e: TherapyError = io_err.into();
        assert!(matches!(e, TherapyError::Connection(_)));
        assert_eq!(e.class(), ErrorClass::Transport);
    }

    #[test]
    fn from_utf8() {
        let bad = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let e: TherapyError = bad.into();
        assert_eq!(e.class(), ErrorClass::InvalidEncoding);
    }
}
