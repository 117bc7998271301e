//! A `Canvas` that records calls instead of talking to a server.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::Canvas;
use crate::error::Result;
use crate::geometry::{DrawLine, Point, ScreenSize};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Hello,
    DrawLine(DrawLine),
    Pan(f32, f32),
    Zoom(f32),
    ScreenToWorld(f32, f32),
    GetLayers,
    DeleteLayer(String),
    ShowLayer(String),
    HideLayer(String),
    SetLayerPos(String, f32, f32),
    ScreenSize,
}

/// Maps screen to world by doubling both coordinates.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    calls: Mutex<Vec<Call>>,
}

impl RecordingCanvas {
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Canvas for RecordingCanvas {
    async fn hello(&self) -> Result<String> {
        self.record(Call::Hello);
        Ok("hello".into())
    }

    async fn draw_line(&self, line: &DrawLine) -> Result<()> {
        self.record(Call::DrawLine(line.clone()));
        Ok(())
    }

    async fn pan(&self, x: f32, y: f32) -> Result<()> {
        self.record(Call::Pan(x, y));
        Ok(())
    }

    async fn zoom(&self, scale: f32) -> Result<()> {
        self.record(Call::Zoom(scale));
        Ok(())
    }

    async fn screen_to_world(&self, x: f32, y: f32) -> Result<Point> {
        self.record(Call::ScreenToWorld(x, y));
        Ok(Point::new(x * 2.0, y * 2.0))
    }

    async fn get_layers(&self) -> Result<Vec<String>> {
        self.record(Call::GetLayers);
        Ok(Vec::new())
    }

    async fn delete_layer(&self, name: &str) -> Result<bool> {
        self.record(Call::DeleteLayer(name.into()));
        Ok(true)
    }

    async fn show_layer(&self, name: &str) -> Result<bool> {
        self.record(Call::ShowLayer(name.into()));
        Ok(true)
    }

    async fn hide_layer(&self, name: &str) -> Result<bool> {
        self.record(Call::HideLayer(name.into()));
        Ok(true)
    }

    async fn set_layer_pos(&self, name: &str, x: f32, y: f32) -> Result<bool> {
        self.record(Call::SetLayerPos(name.into(), x, y));
        Ok(true)
    }

    async fn screen_size(&self) -> Result<ScreenSize> {
        self.record(Call::ScreenSize);
        Ok(ScreenSize {
            width: 800.0,
            height: 600.0,
        })
    }
}
