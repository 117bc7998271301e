//! The three connections a client keeps to the canvas server.
//!
//! | Module      | Socket | Direction                       |
//! |-------------|--------|---------------------------------|
//! | `request`   | REQ    | command in, reply out           |
//! | `push`      | PUB    | command in, nothing back        |
//! | `subscribe` | SUB    | events out                      |

pub mod push;
pub mod request;
pub mod subscribe;

pub use push::{FanoutOutcome, PushChannel, PushFanout};
pub use request::{RequestChannel, RequestState};
pub use subscribe::{EventChannel, EventFilter, EventListener};
