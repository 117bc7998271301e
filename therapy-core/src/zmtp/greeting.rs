//! ZMTP 3.0 greeting and `READY` handshake command (NULL mechanism).
//!
//! ## Greeting (64 bytes)
//! ```text
//! signature   0xFF, 8 × padding, 0x7F   (10)
//! version     major, minor              (2)
//! mechanism   "NULL" zero-padded        (20)
//! as-server   0 or 1                    (1)
//! filler      zeros                     (31)
//! ```
//!
//! ## READY command body
//! ```text
//! name-size(1) "READY"
//! { name-size(1) name  value-size(4, BE) value }*
//! ```

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::TherapyError;

pub const GREETING_SIZE: usize = 64;

const SIGNATURE_HEAD: u8 = 0xFF;
const SIGNATURE_TAIL: u8 = 0x7F;
const MECHANISM_NULL: &[u8] = b"NULL";
const MECHANISM_LEN: usize = 20;

pub const VERSION_MAJOR: u8 = 3;
pub const VERSION_MINOR: u8 = 0;

const READY: &[u8] = b"READY";
const ERROR: &[u8] = b"ERROR";
const SOCKET_TYPE: &str = "Socket-Type";

// ── SocketType ───────────────────────────────────────────────────

/// ZeroMQ socket roles spoken by the client and its server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    Req,
    Rep,
    Pub,
    Sub,
}

impl SocketType {
    pub fn as_str(self) -> &'static str {
        match self {
            SocketType::Req => "REQ",
            SocketType::Rep => "REP",
            SocketType::Pub => "PUB",
            SocketType::Sub => "SUB",
        }
    }

    pub fn parse(name: &[u8]) -> Option<Self> {
        match name {
            b"REQ" => Some(SocketType::Req),
            b"REP" => Some(SocketType::Rep),
            b"PUB" => Some(SocketType::Pub),
            b"SUB" => Some(SocketType::Sub),
            _ => None,
        }
    }

    /// The only peer role this socket may talk to.
    pub fn peer(self) -> Self {
        match self {
            SocketType::Req => SocketType::Rep,
            SocketType::Rep => SocketType::Req,
            SocketType::Pub => SocketType::Sub,
            SocketType::Sub => SocketType::Pub,
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Greeting ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Greeting {
    pub major: u8,
    pub minor: u8,
    pub as_server: bool,
}

impl Greeting {
    pub fn new(as_server: bool) -> Self {
        Self {
            major: VERSION_MAJOR,
            minor: VERSION_MINOR,
            as_server,
        }
    }

    pub fn encode(&self) -> [u8; GREETING_SIZE] {
        let mut buf = [0u8; GREETING_SIZE];
        buf[0] = SIGNATURE_HEAD;
        buf[9] = SIGNATURE_TAIL;
        buf[10] = self.major;
        buf[11] = self.minor;
        buf[12..12 + MECHANISM_NULL.len()].copy_from_slice(MECHANISM_NULL);
        buf[32] = self.as_server as u8;
        buf
    }

    /// Parse and validate a peer greeting.
    pub fn decode(buf: &[u8; GREETING_SIZE]) -> Result<Self, TherapyError> {
        if buf[0] != SIGNATURE_HEAD || buf[9] & 0x01 != 0x01 {
            return Err(TherapyError::Handshake("peer is not a ZMTP endpoint".into()));
        }
        let (major, minor) = (buf[10], buf[11]);
        if major < VERSION_MAJOR {
            return Err(TherapyError::UnsupportedVersion { major, minor });
        }

        let mechanism = &buf[12..12 + MECHANISM_LEN];
        let name_len = mechanism
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MECHANISM_LEN);
        if &mechanism[..name_len] != MECHANISM_NULL {
            return Err(TherapyError::Handshake(format!(
                "unsupported security mechanism {:?}",
                String::from_utf8_lossy(&mechanism[..name_len])
            )));
        }

        Ok(Self {
            major,
            minor,
            as_server: buf[32] == 1,
        })
    }
}

// ── READY ────────────────────────────────────────────────────────

/// Body of the `READY` command announcing our socket type.
pub fn ready_command(socket_type: SocketType) -> Bytes {
    let value = socket_type.as_str().as_bytes();
    let mut buf = BytesMut::with_capacity(1 + READY.len() + 1 + SOCKET_TYPE.len() + 4 + value.len());
    buf.put_u8(READY.len() as u8);
    buf.put_slice(READY);
    buf.put_u8(SOCKET_TYPE.len() as u8);
    buf.put_slice(SOCKET_TYPE.as_bytes());
    buf.put_u32(value.len() as u32);
    buf.put_slice(value);
    buf.freeze()
}

/// Parse the peer's handshake command and return its socket type.
///
/// An `ERROR` command is turned into a handshake failure carrying the
/// peer's reason.
pub fn parse_ready(mut body: &[u8]) -> Result<SocketType, TherapyError> {
    let name = take_short(&mut body)?;
    if name == ERROR {
        let reason = take_short(&mut body).unwrap_or_default();
        return Err(TherapyError::Handshake(format!(
            "peer rejected handshake: {}",
            String::from_utf8_lossy(reason)
        )));
    }
    if name != READY {
        return Err(TherapyError::Handshake(format!(
            "expected READY, got {:?}",
            String::from_utf8_lossy(name)
        )));
    }

    let mut socket_type = None;
    while body.has_remaining() {
        let key = take_short(&mut body)?;
        if body.remaining() < 4 {
            return Err(TherapyError::Handshake("truncated READY property".into()));
        }
        let len = body.get_u32() as usize;
        if body.remaining() < len {
            return Err(TherapyError::Handshake("truncated READY property".into()));
        }
        let (value, rest) = body.split_at(len);
        body = rest;
        // Property names are case-insensitive.
        if key.eq_ignore_ascii_case(SOCKET_TYPE.as_bytes()) {
            socket_type = Some(SocketType::parse(value).ok_or_else(|| {
                TherapyError::Handshake(format!(
                    "unknown socket type {:?}",
                    String::from_utf8_lossy(value)
                ))
            })?);
        }
    }
    socket_type.ok_or_else(|| TherapyError::Handshake("READY without Socket-Type".into()))
}

fn take_short<'a>(body: &mut &'a [u8]) -> Result<&'a [u8], TherapyError> {
    let Some((&len, rest)) = body.split_first() else {
        return Err(TherapyError::Handshake("truncated command".into()));
    };
    if rest.len() < len as usize {
        return Err(TherapyError::Handshake("truncated command".into()));
    }
    let (value, rest) = rest.split_at(len as usize);
    *body = rest;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_layout() {
        let g = Greeting::new(false).encode();
        assert_eq!(g[0], 0xFF);
        assert_eq!(&g[1..9], &[0u8; 8]);
        assert_eq!(g[9], 0x7F);
        assert_eq!(&g[10..12], &[3, 0]);
        assert_eq!(&g[12..16], b"NULL");
        assert_eq!(&g[16..32], &[0u8; 16]);
        assert_eq!(g[32], 0);
        assert_eq!(&g[33..], &[0u8; 31]);
    }

    #[test]
    fn greeting_accepts_newer_minor() {
        let mut g = Greeting::new(true).encode();
        g[11] = 1;
        let parsed = Greeting::decode(&g).unwrap();
        assert_eq!((parsed.major, parsed.minor), (3, 1));
        assert!(parsed.as_server);
    }

    #[test]
    fn greeting_rejects_old_version() {
        let mut g = Greeting::new(false).encode();
        g[10] = 2;
        assert!(matches!(
            Greeting::decode(&g),
            Err(TherapyError::UnsupportedVersion { major: 2, .. })
        ));
    }

    #[test]
    fn greeting_rejects_other_mechanism() {
        let mut g = Greeting::new(false).encode();
        g[12..16].copy_from_slice(b"CURV");
        assert!(matches!(Greeting::decode(&g), Err(TherapyError::Handshake(_))));
    }

    #[test]
    fn ready_layout() {
        let body = ready_command(SocketType::Req);
        let mut expected = vec![5u8];
        expected.extend_from_slice(b"READY");
        expected.push(11);
        expected.extend_from_slice(b"Socket-Type");
        expected.extend_from_slice(&[0, 0, 0, 3]);
        expected.extend_from_slice(b"REQ");
        assert_eq!(&body[..], &expected[..]);
        assert_eq!(parse_ready(&body).unwrap(), SocketType::Req);
    }

    #[test]
    fn ready_with_extra_properties() {
        let mut body = BytesMut::new();
        body.put_u8(5);
        body.put_slice(b"READY");
        body.put_u8(8);
        body.put_slice(b"Identity");
        body.put_u32(0);
        body.put_u8(11);
        body.put_slice(b"socket-type");
        body.put_u32(3);
        body.put_slice(b"PUB");
        assert_eq!(parse_ready(&body).unwrap(), SocketType::Pub);
    }

    #[test]
    fn error_command() {
        let mut body = vec![5u8];
        body.extend_from_slice(b"ERROR");
        body.push(4);
        body.extend_from_slice(b"nope");
        let err = parse_ready(&body).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn peers() {
        assert_eq!(SocketType::Req.peer(), SocketType::Rep);
        assert_eq!(SocketType::Sub.peer(), SocketType::Pub);
    }
}
