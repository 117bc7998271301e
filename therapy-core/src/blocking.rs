//! Blocking wrappers for callers without an async runtime.
//!
//! The client owns a small runtime; push writers keep running on its
//! worker thread between calls. Must not be used from inside another
//! tokio runtime.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::channel::{EventChannel, EventFilter, PushFanout};
use crate::client::{self, Canvas};
use crate::config::{ClientConfig, DispatchMode};
use crate::error::Result;
use crate::event::Event;
use crate::geometry::{DrawLine, Point, ScreenSize};

#[derive(Debug)]
pub struct Client {
    inner: client::Client,
    rt: Arc<Runtime>,
}

impl Client {
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let rt = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("therapy-client")
            .enable_all()
            .build()?;
        let inner = rt.block_on(client::Client::connect(config))?;
        Ok(Self {
            inner,
            rt: Arc::new(rt),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.inner.dispatch_mode()
    }

    pub fn fanout(&self) -> Option<&PushFanout> {
        self.inner.fanout()
    }

    pub fn hello(&self) -> Result<String> {
        self.rt.block_on(self.inner.hello())
    }

    pub fn draw_line(&self, line: &DrawLine) -> Result<()> {
        self.rt.block_on(self.inner.draw_line(line))
    }

    pub fn pan(&self, x: f32, y: f32) -> Result<()> {
        self.rt.block_on(self.inner.pan(x, y))
    }

    pub fn zoom(&self, scale: f32) -> Result<()> {
        self.rt.block_on(self.inner.zoom(scale))
    }

    pub fn screen_to_world(&self, x: f32, y: f32) -> Result<Point> {
        self.rt.block_on(self.inner.screen_to_world(x, y))
    }

    pub fn get_layers(&self) -> Result<Vec<String>> {
        self.rt.block_on(self.inner.get_layers())
    }

    pub fn delete_layer(&self, name: &str) -> Result<bool> {
        self.rt.block_on(self.inner.delete_layer(name))
    }

    pub fn show_layer(&self, name: &str) -> Result<bool> {
        self.rt.block_on(self.inner.show_layer(name))
    }

    pub fn hide_layer(&self, name: &str) -> Result<bool> {
        self.rt.block_on(self.inner.hide_layer(name))
    }

    pub fn set_layer_pos(&self, name: &str, x: f32, y: f32) -> Result<bool> {
        self.rt.block_on(self.inner.set_layer_pos(name, x, y))
    }

    pub fn screen_size(&self) -> Result<ScreenSize> {
        self.rt.block_on(self.inner.screen_size())
    }

    /// Shut down, waiting for queued pushes to be written.
    pub fn close(self) {
        let Self { inner, rt } = self;
        rt.block_on(inner.close());
    }

    pub fn subscribe(&self, filter: EventFilter) -> Result<Events> {
        let channel = self.rt.block_on(self.inner.subscribe(filter))?;
        Ok(Events {
            channel,
            rt: Arc::clone(&self.rt),
        })
    }
}

/// Blocking iterator over an event channel. Ends after a transport
/// failure has been yielded.
#[derive(Debug)]
pub struct Events {
    channel: EventChannel,
    rt: Arc<Runtime>,
}

impl Events {
    pub fn set_filter(&mut self, filter: EventFilter) -> Result<()> {
        self.rt.block_on(self.channel.set_filter(filter))
    }
}

impl Iterator for Events {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rt.block_on(self.channel.next())
    }
}
