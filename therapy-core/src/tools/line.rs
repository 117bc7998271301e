use crate::channel::EventFilter;
use crate::client::Canvas;
use crate::error::Result;
use crate::event::{Event, EventKind, MouseButton};
use crate::geometry::{DrawLine, Point};
use crate::tools::Brush;

/// Click twice, get a line.
#[derive(Debug, Clone)]
pub struct LineTool {
    brush: Brush,
    pending: Option<Point>,
}

impl LineTool {
    pub fn new(brush: Brush) -> Self {
        Self {
            brush,
            pending: None,
        }
    }

    pub fn filter() -> EventFilter {
        EventFilter::only([EventKind::MouseButtonDown])
    }

    /// The first click of an unfinished pair, if any.
    pub fn pending(&self) -> Option<Point> {
        self.pending
    }

    pub fn on_event(&mut self, event: &Event) -> Option<DrawLine> {
        let Event::MouseButtonDown {
            button: MouseButton::Left,
            x,
            y,
        } = *event
        else {
            return None;
        };
        let at = Point::new(x, y);
        match self.pending.take() {
            None => {
                self.pending = Some(at);
                None
            }
            Some(from) => Some(self.brush.segment(from, at)),
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

    fn click(button: MouseButton, x: f32, y: f32) -> Event {
        Event::MouseButtonDown { button, x, y }
    }

    #[tokio::test]
    async fn every_second_left_click_draws() {
        let brush = Brush::new("layer", 0.01, Rgba::RED);
        let mut tool = LineTool::new(brush.clone());
        let canvas = RecordingCanvas::default();

        let events = [
            click(MouseButton::Left, 0.0, 0.0),
            click(MouseButton::Right, 9.0, 9.0),
            click(MouseButton::Left, 1.0, 1.0),
            click(MouseButton::Left, 2.0, 2.0),
        ];
        for ev in &events {
            tool.handle(&canvas, ev).await.unwrap();
        }

        assert_eq!(
            canvas.take(),
            vec![Call::DrawLine(
                brush.segment(Point::new(0.0, 0.0), Point::new(1.0, 1.0))
            )]
        );
        assert_eq!(tool.pending(), Some(Point::new(2.0, 2.0)));
    }
}
