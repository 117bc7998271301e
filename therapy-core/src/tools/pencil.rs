use crate::client::Canvas;
use crate::error::Result;
use crate::event::{Event, MouseButton};
use crate::geometry::{DrawLine, Point};
use crate::tools::{Brush, PenState};

/// Freehand drawing while the left button is held.
#[derive(Debug, Clone)]
pub struct Pencil {
    brush: Brush,
    state: PenState,
}

impl Pencil {
    pub fn new(brush: Brush) -> Self {
        Self {
            brush,
            state: PenState::Idle,
        }
    }

    pub fn state(&self) -> PenState {
        self.state
    }

    pub fn on_event(&mut self, event: &Event) -> Option<DrawLine> {
        match *event {
            Event::MouseButtonDown {
                button: MouseButton::Left,
                x,
                y,
            } => {
                self.state.press(Some(Point::new(x, y)));
                None
            }
            Event::MouseButtonUp {
                button: MouseButton::Left,
                ..
            } => {
                self.state.release();
                None
            }
            Event::MouseMotion { x, y } => self
                .state
                .advance(Point::new(x, y))
                .map(|(from, to)| self.brush.segment(from, to)),
            _ => None,
        }
    }

    pub async fn handle<C: Canvas + ?Sized>(&mut self, canvas: &C, event: &Event) -> Result<Option<DrawLine>> {
        let Some(line) = self.on_event(event) else {
            return Ok(None);
        };
        canvas.draw_line(&line).await?;
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rgba;
    use crate::tools::recording::{Call, RecordingCanvas};

    #[tokio::test]
    async fn drag_draws_connected_segments() {
        let brush = Brush::new("layer", 0.001, Rgba::RED);
        let mut pencil = Pencil::new(brush.clone());
        let canvas = RecordingCanvas::default();

        let events = [
            Event::MouseMotion { x: 5.0, y: 5.0 },
            Event::MouseButtonDown {
                button: MouseButton::Left,
                x: 0.0,
                y: 0.0,
            },
            Event::MouseMotion { x: 1.0, y: 0.0 },
            Event::MouseMotion { x: 1.0, y: 1.0 },
            Event::MouseButtonUp {
                button: MouseButton::Left,
                x: 1.0,
                y: 1.0,
            },
            Event::MouseMotion { x: 7.0, y: 7.0 },
        ];
        for ev in &events {
            pencil.handle(&canvas, ev).await.unwrap();
        }

        assert_eq!(
            canvas.take(),
            vec![
                Call::DrawLine(brush.segment(Point::new(0.0, 0.0), Point::new(1.0, 0.0))),
                Call::DrawLine(brush.segment(Point::new(1.0, 0.0), Point::new(1.0, 1.0))),
            ]
        );
        assert_eq!(pencil.state(), PenState::Idle);
    }

    #[test]
    fn right_button_does_not_draw() {
        let mut pencil = Pencil::new(Brush::new("layer", 0.001, Rgba::RED));
        pencil.on_event(&Event::MouseButtonDown {
            button: MouseButton::Right,
            x: 0.0,
            y: 0.0,
        });
        assert!(!pencil.state().is_drawing());
        assert!(pencil.on_event(&Event::MouseMotion { x: 1.0, y: 1.0 }).is_none());
    }
}
