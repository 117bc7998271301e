//! Interactive drawing tools.
//!
//! Each tool is a plain state object: feed it events, it decides what to
//! draw, and its async `handle` performs that through any [`Canvas`].
//!
//! | Tool                | Input            | Output                    |
//! |---------------------|------------------|---------------------------|
//! | `KeyboardNavigator` | keys, wheel      | pan / zoom                |
//! | `LineTool`          | left clicks      | one line per two clicks   |
//! | `Pencil`            | left drag        | freehand segments         |
//! | `StylusTool`        | tip + axis       | freehand + cursor layer   |
//!
//! [`Canvas`]: crate::client::Canvas

pub mod line;
pub mod navigate;
pub mod pencil;
pub mod stylus;

#[cfg(test)]
pub(crate) mod recording;

pub use line::LineTool;
pub use navigate::{KeyboardNavigator, ViewAction};
pub use pencil::Pencil;
pub use stylus::{StylusTool, TipEvent};

use serde::{Deserialize, Serialize};

use crate::geometry::{DrawLine, Point, Rgba};

/// Layer drawn on when none is configured.
pub const DEFAULT_LAYER: &str = "genjix";

// ── Brush ────────────────────────────────────────────────────────

/// Where and how a tool draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub layer: String,
    pub thickness: f32,
    pub color: Rgba,
}

impl Brush {
    pub fn new(layer: impl Into<String>, thickness: f32, color: Rgba) -> Self {
        Self {
            layer: layer.into(),
            thickness,
            color,
        }
    }

    pub fn segment(&self, from: Point, to: Point) -> DrawLine {
        DrawLine::new(self.layer.clone(), from, to, self.thickness, self.color)
    }
}

// ── PenState ─────────────────────────────────────────────────────

/// Whether a freehand tool is laying down ink.
///
/// ```text
///  Idle ──press──► Drawing { last } ──release──► Idle
///                      │  ▲
///                      └──┘ advance
/// ```
///
/// `last` is `None` until the first position after a press is known.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PenState {
    #[default]
    Idle,
    Drawing { last: Option<Point> },
}

impl PenState {
    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing { .. })
    }

    pub fn press(&mut self, at: Option<Point>) {
        *self = Self::Drawing { last: at };
    }

    pub fn release(&mut self) {
        *self = Self::Idle;
    }

    /// Move the pen to `to`. Returns the segment to draw, if any.
    pub fn advance(&mut self, to: Point) -> Option<(Point, Point)> {
        match self {
            Self::Idle => None,
            Self::Drawing { last } => last.replace(to).map(|from| (from, to)),
        }
    }
}
