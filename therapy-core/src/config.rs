//! Client connection settings.
//!
//! Each channel has its own [`Endpoint`], so requests, events and pushes
//! can go to different machines. The push side takes a list and fans out.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Well-known port of the request/reply channel.
pub const DEFAULT_REQUEST_PORT: u16 = 9464;
/// Well-known port of the event channel.
pub const DEFAULT_EVENT_PORT: u16 = 9465;
/// Well-known port of the push channel.
pub const DEFAULT_PUSH_PORT: u16 = 9466;

pub const DEFAULT_HOST: &str = "localhost";

// ── Endpoint ─────────────────────────────────────────────────────

/// Host and port of one remote socket.
///
/// `host` may be a name, an IPv4 literal or an IPv6 literal with or
/// without brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port` suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        let host = self.host.trim();
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.port)
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

// ── DispatchMode ─────────────────────────────────────────────────

/// How `draw_line`, `pan` and `zoom` reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Fire-and-forget over the push channel(s).
    #[default]
    Push,
    /// Request/reply over the request channel.
    Request,
}

// ── ClientConfig ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Request/reply channel.
    pub request: Endpoint,
    /// Event subscription channel.
    pub events: Endpoint,
    /// Push destinations. Every push goes to all of them.
    pub push: Vec<Endpoint>,
    pub dispatch: DispatchMode,
    /// TCP connect + handshake deadline in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-request reply deadline in milliseconds; 0 waits forever.
    pub request_timeout_ms: u64,
    /// Outbound queue length per push destination.
    pub push_queue: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_host(DEFAULT_HOST)
    }
}

impl ClientConfig {
    /// All three channels on one host, default ports.
    pub fn for_host(host: &str) -> Self {
        Self {
            request: Endpoint::new(host, DEFAULT_REQUEST_PORT),
            events: Endpoint::new(host, DEFAULT_EVENT_PORT),
            push: vec![Endpoint::new(host, DEFAULT_PUSH_PORT)],
            dispatch: DispatchMode::default(),
            connect_timeout_ms: 5000,
            request_timeout_ms: 0,
            push_queue: 1000,
        }
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Add another push destination on the default push port.
    pub fn with_push_peer(mut self, host: &str) -> Self {
        self.push.push(Endpoint::new(host, DEFAULT_PUSH_PORT));
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}
