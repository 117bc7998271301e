use serde::{Deserialize, Serialize};

use crate::channel::EventFilter;
use crate::client::Canvas;
use crate::error::Result;
use crate::event::{Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewAction {
    Pan { x: f32, y: f32 },
    Zoom(f32),
}

/// Arrow keys pan, `Z`/`X` zoom out/in, the wheel zooms proportionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardNavigator {
    pub step: f32,
    pub zoom_out: f32,
    pub zoom_in: f32,
}

impl Default for KeyboardNavigator {
    fn default() -> Self {
        Self {
            step: 0.01,
            zoom_out: 0.95,
            zoom_in: 1.05,
        }
    }
}

impl KeyboardNavigator {
    pub fn filter() -> EventFilter {
        EventFilter::only([EventKind::KeyDown, EventKind::MouseWheel])
    }

    pub fn action(&self, event: &Event) -> Option<ViewAction> {
        match event {
            Event::KeyDown { key, .. } => match key.as_str() {
                "Left" => Some(ViewAction::Pan { x: self.step, y: 0.0 }),
                "Right" => Some(ViewAction::Pan { x: -self.step, y: 0.0 }),
                "Up" => Some(ViewAction::Pan { x: 0.0, y: -self.step }),
                "Down" => Some(ViewAction::Pan { x: 0.0, y: self.step }),
                "Z" => Some(ViewAction::Zoom(self.zoom_out)),
                "X" => Some(ViewAction::Zoom(self.zoom_in)),
                _ => None,
            },
            Event::MouseWheel { y, .. } => Some(ViewAction::Zoom(1.0 + y / 10.0)),
            _ => None,
        }
    }

    pub async fn handle<C: Canvas + ?Sized>(&self, canvas: &C, event: &Event) -> Result<Option<ViewAction>> {
        let Some(action) = self.action(event) else {
            return Ok(None);
        };
        match action {
            ViewAction::Pan { x, y } => canvas.pan(x, y).await?,
            ViewAction::Zoom(scale) => canvas.zoom(scale).await?,
        }
        Ok(Some(action))
    }
}
