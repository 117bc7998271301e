//! Tablet stylus driver.
//!
//! Input is device-agnostic: tip contact changes and absolute positions
//! in normalised screen space. While the tip is up a crosshair layer
//! follows the stylus; while it is down the crosshair hides and the
//! stroke is drawn.

use std::str::FromStr;

use crate::client::Canvas;
use crate::error::{Result, TherapyError};
use crate::geometry::{DrawLine, Rgba};
use crate::tools::{Brush, PenState};

pub const DEFAULT_CURSOR_LAYER: &str = "stylus_cursor";
const CURSOR_SIZE: f32 = 0.02;
const CURSOR_THICKNESS: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TipEvent {
    Tip { down: bool },
    Axis { x: f32, y: f32 },
}

/// Parses `down`, `up` or `X Y`.
impl FromStr for TipEvent {
    type Err = TherapyError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "down" => return Ok(Self::Tip { down: true }),
            "up" => return Ok(Self::Tip { down: false }),
            _ => {}
        }
        let mut fields = s.split_whitespace().map(str::parse::<f32>);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(Ok(x)), Some(Ok(y)), None) => Ok(Self::Axis { x, y }),
            _ => Err(TherapyError::InvalidEncoding(format!(
                "expected `down`, `up` or `X Y`, got {s:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StylusTool {
    brush: Brush,
    cursor_layer: String,
    cursor_color: Rgba,
    state: PenState,
}

impl StylusTool {
    pub fn new(brush: Brush) -> Self {
        Self {
            cursor_color: brush.color,
            brush,
            cursor_layer: DEFAULT_CURSOR_LAYER.into(),
            state: PenState::Idle,
        }
    }

    pub fn with_cursor_layer(mut self, layer: impl Into<String>) -> Self {
        self.cursor_layer = layer.into();
        self
    }

    pub fn state(&self) -> PenState {
        self.state
    }

    pub fn cursor_layer(&self) -> &str {
        &self.cursor_layer
    }

    fn crosshair(&self) -> [DrawLine; 2] {
        let arm = |from: (f32, f32), to: (f32, f32)| {
            DrawLine::new(
                self.cursor_layer.clone(),
                from.into(),
                to.into(),
                CURSOR_THICKNESS,
                self.cursor_color,
            )
        };
        [
            arm((-CURSOR_SIZE, 0.0), (CURSOR_SIZE, 0.0)),
            arm((0.0, -CURSOR_SIZE), (0.0, CURSOR_SIZE)),
        ]
    }

    /// Clear the cursor layer and draw a fresh crosshair on it.
    pub async fn setup<C: Canvas + ?Sized>(&self, canvas: &C) -> Result<()> {
        canvas.delete_layer(&self.cursor_layer).await?;
        for line in self.crosshair() {
            canvas.draw_line(&line).await?;
        }
        Ok(())
    }

    pub async fn handle<C: Canvas + ?Sized>(&mut self, canvas: &C, event: TipEvent) -> Result<()> {
        match event {
            TipEvent::Tip { down: true } => {
                self.state.press(None);
                canvas.hide_layer(&self.cursor_layer).await?;
            }
            TipEvent::Tip { down: false } => {
                self.state.release();
                canvas.show_layer(&self.cursor_layer).await?;
            }
            TipEvent::Axis { x, y } => {
                let at = canvas.screen_to_world(x, y).await?;
                if self.state.is_drawing() {
                    if let Some((from, to)) = self.state.advance(at) {
                        canvas.draw_line(&self.brush.segment(from, to)).await?;
                    }
                } else {
                    canvas.set_layer_pos(&self.cursor_layer, at.x, at.y).await?;
                }
            }
        }
        Ok(())
    }
}
