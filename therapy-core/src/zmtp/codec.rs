//! ZMTP 3.0 frame codec for `tokio_util::codec::Framed`.
//!
//! ```text
//! short frame:  flags(1) size(1)      body
//! long frame:   flags(1) size(8, BE)  body
//! ```

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::TherapyError;

/// Largest frame the client accepts. Canvas replies are small; anything
/// bigger than this is a broken or hostile peer.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

bitflags! {
    /// Frame flag byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        /// More frames of the same message follow.
        const MORE = 0x01;
        /// Size field is 8 bytes.
        const LONG = 0x02;
        /// Frame carries a command rather than message data.
        const COMMAND = 0x04;
    }
}

/// A single ZMTP frame. `LONG` is derived from the body size on encode and
/// stripped on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub flags: FrameFlags,
    pub body: Bytes,
}

impl Frame {
    /// A message frame; `more` marks every part except the last.
    pub fn message(body: impl Into<Bytes>, more: bool) -> Self {
        let flags = if more {
            FrameFlags::MORE
        } else {
            FrameFlags::empty()
        };
        Self {
            flags,
            body: body.into(),
        }
    }

    pub fn command(body: impl Into<Bytes>) -> Self {
        Self {
            flags: FrameFlags::COMMAND,
            body: body.into(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.flags.contains(FrameFlags::COMMAND)
    }

    pub fn has_more(&self) -> bool {
        self.flags.contains(FrameFlags::MORE)
    }
}

#[derive(Debug, Clone)]
pub struct ZmtpCodec {
    max_frame_size: usize,
}

impl ZmtpCodec {
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl Default for ZmtpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ZmtpCodec {
    type Item = Frame;
    type Error = TherapyError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 2 {
            return Ok(None);
        }

        let flags = FrameFlags::from_bits(src[0])
            .ok_or(TherapyError::ProtocolViolation("reserved frame flag bits set"))?;

        let (header_len, size) = if flags.contains(FrameFlags::LONG) {
            if src.len() < 9 {
                return Ok(None);
            }
            let mut size = [0u8; 8];
            size.copy_from_slice(&src[1..9]);
            (9, u64::from_be_bytes(size))
        } else {
            (2, src[1] as u64)
        };

        if size > self.max_frame_size as u64 {
            return Err(TherapyError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        let size = size as usize;

        if src.len() < header_len + size {
            src.reserve(header_len + size - src.len());
            return Ok(None);
        }

        src.advance(header_len);
        let body = src.split_to(size).freeze();
        Ok(Some(Frame {
            flags: flags - FrameFlags::LONG,
            body,
        }))
    }
}

impl Encoder<Frame> for ZmtpCodec {
    type Error = TherapyError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = item.body.len();
        if len > self.max_frame_size {
            return Err(TherapyError::FrameTooLarge {
                size: len as u64,
                max: self.max_frame_size,
            });
        }

        let mut flags = item.flags - FrameFlags::LONG;
        if len > u8::MAX as usize {
            flags |= FrameFlags::LONG;
            dst.reserve(9 + len);
            dst.put_u8(flags.bits());
            dst.put_u64(len as u64);
        } else {
            dst.reserve(2 + len);
            dst.put_u8(flags.bits());
            dst.put_u8(len as u8);
        }
        dst.put_slice(&item.body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(frame: Frame) -> BytesMut {
        let mut dst = BytesMut::new();
        ZmtpCodec::new().encode(frame, &mut dst).unwrap();
        dst
    }

    #[test]
    fn short_frame_layout() {
        let dst = encode(Frame::message(vec![1u8], true));
        assert_eq!(&dst[..], &[0x01, 0x01, 0x01]);

        let dst = encode(Frame::message(Bytes::new(), false));
        assert_eq!(&dst[..], &[0x00, 0x00]);
    }

    #[test]
    fn long_frame_layout() {
        let body = vec![7u8; 300];
        let dst = encode(Frame::message(body.clone(), false));
        assert_eq!(dst[0], 0x02);
        assert_eq!(&dst[1..9], &300u64.to_be_bytes());
        assert_eq!(&dst[9..], &body[..]);

        let mut src = dst;
        let frame = ZmtpCodec::new().decode(&mut src).unwrap().unwrap();
        assert_eq!(frame.flags, FrameFlags::empty());
        assert_eq!(frame.body.len(), 300);
        assert!(src.is_empty());
    }

    #[test]
    fn partial_input_waits() {
        let mut codec = ZmtpCodec::new();
        let mut src = BytesMut::from(&[0x01u8, 0x03, b'a'][..]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(b"bc");
        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert!(frame.has_more());
        assert_eq!(&frame.body[..], b"abc");
    }

    #[test]
    fn two_frames_in_one_read() {
        let mut codec = ZmtpCodec::new();
        let mut src = BytesMut::from(&[0x01u8, 0x00, 0x00, 0x01, b'x'][..]);
        let first = codec.decode(&mut src).unwrap().unwrap();
        assert!(first.has_more());
        assert!(first.body.is_empty());
        let second = codec.decode(&mut src).unwrap().unwrap();
        assert!(!second.has_more());
        assert_eq!(&second.body[..], b"x");
    }

    #[test]
    fn reserved_bits_rejected() {
        let mut src = BytesMut::from(&[0x80u8, 0x00][..]);
        assert!(matches!(
            ZmtpCodec::new().decode(&mut src),
            Err(TherapyError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn oversized_frame_rejected() {
        let mut codec = ZmtpCodec { max_frame_size: 4 };
        let mut src = BytesMut::from(&[0x00u8, 0x05][..]);
        assert!(matches!(
            codec.decode(&mut src),
            Err(TherapyError::FrameTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn command_flag_survives() {
        let dst = encode(Frame::command(&b"\x05READY"[..]));
        assert_eq!(dst[0], 0x04);
        let mut src = dst;
        let frame = ZmtpCodec::new().decode(&mut src).unwrap().unwrap();
        assert!(frame.is_command());
    }
}
