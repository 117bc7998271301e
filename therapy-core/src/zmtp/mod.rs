//! Minimal ZMTP 3.0 transport.
//!
//! The canvas server binds ZeroMQ sockets, so every channel speaks ZMTP
//! underneath: a 64-byte greeting, a `READY` command naming the socket
//! type, then length-prefixed frames grouped into multi-part messages.
//! Only the NULL security mechanism is supported.
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `codec`    | Frame encoder/decoder for `tokio_util::codec::Framed` |
//! | `greeting` | Greeting bytes, `READY` command, socket roles         |
//! | `socket`   | Handshaken connection sending/receiving messages      |

pub mod codec;
pub mod greeting;
pub mod socket;

pub use codec::{Frame, FrameFlags, MAX_FRAME_SIZE, ZmtpCodec};
pub use greeting::{Greeting, SocketType};
pub use socket::{FrameSink, FrameStream, ZmtpSocket, recv_parts, send_parts};
