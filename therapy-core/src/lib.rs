//! # therapy-core
//!
//! Remote-control client library for the Therapy canvas application.
//!
//! This crate contains:
//! - **Wire encoding**: `Encodable`/`Decodable`, varints, strings, floats
//! - **Commands and events**: `Command` opcodes, the `Event` record family
//! - **Transport**: a ZMTP 3.0 layer (`ZmtpCodec`, `ZmtpSocket`)
//! - **Channels**: request/reply, push with fan-out, event subscription
//! - **Client**: the `Canvas` trait, the async `Client`, a blocking facade
//! - **Tools**: keyboard navigation, line, pencil and stylus state machines
//! - **Error**: `TherapyError`, a `thiserror`-based error hierarchy

pub mod blocking;
pub mod channel;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod serial;
pub mod tools;
pub mod zmtp;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use channel::{
    EventChannel, EventFilter, EventListener, FanoutOutcome, PushChannel, PushFanout,
    RequestChannel, RequestState,
};
pub use client::{Canvas, Client};
pub use command::Command;
pub use config::{ClientConfig, DispatchMode, Endpoint};
pub use error::{ErrorClass, Result, TherapyError};
pub use event::{Event, EventKind, MouseButton};
pub use geometry::{DrawLine, Point, Rgba, ScreenSize};
pub use serial::{Cursor, Decodable, Encodable, VarInt, serialize};
pub use tools::{Brush, KeyboardNavigator, LineTool, PenState, Pencil, StylusTool, TipEvent};
