//! Binary wire codec shared by every command and event.
//!
//! Layout matches the canvas server's serializer:
//!
//! ```text
//! u8      1 byte
//! bool    1 byte, 0 or 1
//! f32     4 bytes, IEEE-754 little-endian
//! varint  compact size: < 0xfd          → 1 byte
//!                       ≤ 0xffff        → 0xfd + u16 LE
//!                       ≤ 0xffff_ffff   → 0xfe + u32 LE
//!                       otherwise       → 0xff + u64 LE
//! str     varint byte length + UTF-8 bytes (no terminator)
//! Vec<T>  varint element count + elements
//! ```
//!
//! Encoding only ever appends to the buffer. Decoding reads through a
//! [`Cursor`] that moves forward and never seeks back.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, TherapyError};

// ── Cursor ───────────────────────────────────────────────────────

/// Forward-only read position over an immutable byte sequence.
#[derive(Debug, Clone)]
pub struct Cursor {
    buf: Bytes,
    pos: usize,
}

impl Cursor {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&[u8]> {
        if n > self.remaining() {
            return Err(TherapyError::TruncatedInput {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

// ── Primitives ───────────────────────────────────────────────────

pub fn write_u8(buf: &mut impl BufMut, value: u8) {
    buf.put_u8(value);
}

pub fn read_u8(cur: &mut Cursor) -> Result<u8> {
    Ok(cur.take(1)?[0])
}

pub fn write_bool(buf: &mut impl BufMut, value: bool) {
    buf.put_u8(value as u8);
}

pub fn read_bool(cur: &mut Cursor) -> Result<bool> {
    match read_u8(cur)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(TherapyError::InvalidEncoding(format!(
            "bool byte must be 0 or 1, got {other}"
        ))),
    }
}

pub fn write_f32(buf: &mut impl BufMut, value: f32) {
    buf.put_f32_le(value);
}

pub fn read_f32(cur: &mut Cursor) -> Result<f32> {
    Ok(f32::from_le_bytes(cur.take_array()?))
}

pub fn encode_varint(buf: &mut impl BufMut, value: u64) {
    match value {
        0..=0xfc => buf.put_u8(value as u8),
        0xfd..=0xffff => {
            buf.put_u8(0xfd);
            buf.put_u16_le(value as u16);
        }
        0x1_0000..=0xffff_ffff => {
            buf.put_u8(0xfe);
            buf.put_u32_le(value as u32);
        }
        _ => {
            buf.put_u8(0xff);
            buf.put_u64_le(value);
        }
    }
}

pub fn decode_varint(cur: &mut Cursor) -> Result<u64> {
    match read_u8(cur)? {
        0xfd => Ok(u16::from_le_bytes(cur.take_array()?) as u64),
        0xfe => Ok(u32::from_le_bytes(cur.take_array()?) as u64),
        0xff => Ok(u64::from_le_bytes(cur.take_array()?)),
        n => Ok(n as u64),
    }
}

pub fn encode_str(buf: &mut impl BufMut, value: &str) {
    encode_varint(buf, value.len() as u64);
    buf.put_slice(value.as_bytes());
}

pub fn decode_str(cur: &mut Cursor) -> Result<String> {
    let len = decode_len(cur)?;
    let bytes = cur.take(len)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| TherapyError::InvalidEncoding(e.to_string()))
}

/// Decode a varint length and check it against the remaining input before
/// anything is allocated for it.
fn decode_len(cur: &mut Cursor) -> Result<usize> {
    let len = decode_varint(cur)?;
    if len > cur.remaining() as u64 {
        return Err(TherapyError::TruncatedInput {
            needed: usize::try_from(len).unwrap_or(usize::MAX),
            remaining: cur.remaining(),
        });
    }
    Ok(len as usize)
}

// ── Traits ───────────────────────────────────────────────────────

/// A value with a fixed wire encoding.
pub trait Encodable {
    fn encode(&self, buf: &mut BytesMut);
}

/// A value that can be read back from its wire encoding.
pub trait Decodable: Sized {
    fn decode(cur: &mut Cursor) -> Result<Self>;
}

/// Encode a value into a fresh buffer.
pub fn serialize<T: Encodable + ?Sized>(value: &T) -> Bytes {
    let mut buf = BytesMut::new();
    value.encode(&mut buf);
    buf.freeze()
}

/// Unsigned length prefix, wrapped so it can travel through the traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl Encodable for VarInt {
    fn encode(&self, buf: &mut BytesMut) {
        encode_varint(buf, self.0)
    }
}

impl Decodable for VarInt {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        decode_varint(cur).map(VarInt)
    }
}

impl Encodable for u8 {
    fn encode(&self, buf: &mut BytesMut) {
        write_u8(buf, *self)
    }
}

impl Decodable for u8 {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        read_u8(cur)
    }
}

impl Encodable for bool {
    fn encode(&self, buf: &mut BytesMut) {
        write_bool(buf, *self)
    }
}

impl Decodable for bool {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        read_bool(cur)
    }
}

impl Encodable for f32 {
    fn encode(&self, buf: &mut BytesMut) {
        write_f32(buf, *self)
    }
}

impl Decodable for f32 {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        read_f32(cur)
    }
}

impl Encodable for str {
    fn encode(&self, buf: &mut BytesMut) {
        encode_str(buf, self)
    }
}

impl Encodable for String {
    fn encode(&self, buf: &mut BytesMut) {
        encode_str(buf, self)
    }
}

impl Decodable for String {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        decode_str(cur)
    }
}

impl<T: Encodable> Encodable for [T] {
    fn encode(&self, buf: &mut BytesMut) {
        encode_varint(buf, self.len() as u64);
        for item in self {
            item.encode(buf);
        }
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, buf: &mut BytesMut) {
        self.as_slice().encode(buf)
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        let count = decode_varint(cur)?;
        // Every element takes at least one byte.
        if count > cur.remaining() as u64 {
            return Err(TherapyError::TruncatedInput {
                needed: usize::try_from(count).unwrap_or(usize::MAX),
                remaining: cur.remaining(),
            });
        }
        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            items.push(T::decode(cur)?);
        }
        Ok(items)
    }
}

// ── Tests ────────────────────────────────────────────────────────
