//! Payload shapes carried by canvas commands.

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::serial::{Cursor, Decodable, Encodable};

/// A position in world (or normalised screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Encodable for Point {
    fn encode(&self, buf: &mut BytesMut) {
        self.x.encode(buf);
        self.y.encode(buf);
    }
}

impl Decodable for Point {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        Ok(Self {
            x: f32::decode(cur)?,
            y: f32::decode(cur)?,
        })
    }
}

/// Window size in pixels, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl Decodable for ScreenSize {
    fn decode(cur: &mut Cursor) -> Result<Self> {
        Ok(Self {
            width: f32::decode(cur)?,
            height: f32::decode(cur)?,
        })
    }
}

/// Straight-alpha colour, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl Encodable for Rgba {
    fn encode(&self, buf: &mut BytesMut) {
        self.r.encode(buf);
        self.g.encode(buf);
        self.b.encode(buf);
        self.a.encode(buf);
    }
}

/// `DRAWLINE` request: layer, endpoints, thickness, colour, in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawLine {
    pub layer: String,
    pub from: Point,
    pub to: Point,
    pub thickness: f32,
    pub color: Rgba,
}

impl DrawLine {
    pub fn new(layer: impl Into<String>, from: Point, to: Point, thickness: f32, color: Rgba) -> Self {
        Self {
            layer: layer.into(),
            from,
            to,
            thickness,
            color,
        }
    }
}

impl Encodable for DrawLine {
    fn encode(&self, buf: &mut BytesMut) {
        self.layer.encode(buf);
        self.from.encode(buf);
        self.to.encode(buf);
        self.thickness.encode(buf);
        self.color.encode(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::serialize;

    #[test]
    fn draw_line_field_order() {
        let line = DrawLine::new(
            "layerA",
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            0.01,
            Rgba::RED,
        );
        let bytes = serialize(&line);

        let mut expected = vec![6u8];
        expected.extend_from_slice(b"layerA");
        for v in [0.0f32, 0.0, 1.0, 1.0, 0.01, 1.0, 0.0, 0.0, 1.0] {
            expected.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn point_decode() {
        let mut raw = 3.0f32.to_le_bytes().to_vec();
        raw.extend_from_slice(&(-4.0f32).to_le_bytes());
        let p = Point::decode(&mut Cursor::new(raw)).unwrap();
        assert_eq!(p, Point::new(3.0, -4.0));
    }
}
