//! The canvas operations and the client that performs them.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::Mutex;
use tracing::{info, trace, warn};

use crate::channel::{EventChannel, EventFilter, PushFanout, RequestChannel};
use crate::command::Command;
use crate::config::{ClientConfig, DispatchMode};
use crate::error::Result;
use crate::geometry::{DrawLine, Point, ScreenSize};
use crate::serial::{Cursor, Decodable, Encodable, serialize};

/// Everything a tool can ask of the canvas.
///
/// Layer operations return whether the server found the layer.
#[async_trait]
pub trait Canvas: Send + Sync {
    async fn hello(&self) -> Result<String>;
    async fn draw_line(&self, line: &DrawLine) -> Result<()>;
    async fn pan(&self, x: f32, y: f32) -> Result<()>;
    async fn zoom(&self, scale: f32) -> Result<()>;
    async fn screen_to_world(&self, x: f32, y: f32) -> Result<Point>;
    async fn get_layers(&self) -> Result<Vec<String>>;
    async fn delete_layer(&self, name: &str) -> Result<bool>;
    async fn show_layer(&self, name: &str) -> Result<bool>;
    async fn hide_layer(&self, name: &str) -> Result<bool>;
    async fn set_layer_pos(&self, name: &str, x: f32, y: f32) -> Result<bool>;
    async fn screen_size(&self) -> Result<ScreenSize>;
}

/// A connected canvas client.
///
/// Safe to share between tasks: request/reply pairs are serialised in
/// arrival order, pushes never wait.
#[derive(Debug)]
pub struct Client {
    requests: Mutex<RequestChannel>,
    pushes: Option<PushFanout>,
    config: ClientConfig,
}

impl Client {
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let requests = RequestChannel::connect(
            &config.request,
            config.connect_timeout(),
            config.request_timeout(),
        )
        .await?;

        let pushes = match config.dispatch {
            DispatchMode::Push => Some(
                PushFanout::connect(&config.push, config.connect_timeout(), config.push_queue).await?,
            ),
            DispatchMode::Request => None,
        };

        info!(
            request = %config.request,
            dispatch = ?config.dispatch,
            "canvas client connected"
        );
        Ok(Self {
            requests: Mutex::new(requests),
            pushes,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.config.dispatch
    }

    /// The push destinations, for callers that want per-destination
    /// outcomes instead of the logged ones.
    pub fn fanout(&self) -> Option<&PushFanout> {
        self.pushes.as_ref()
    }

    /// Shut down, waiting for queued pushes to reach their destinations.
    pub async fn close(self) {
        if let Some(pushes) = self.pushes {
            pushes.close().await;
        }
    }

    /// Open an event channel to the configured event endpoint.
    pub async fn subscribe(&self, filter: EventFilter) -> Result<EventChannel> {
        EventChannel::connect(&self.config.events, filter, self.config.connect_timeout()).await
    }

    async fn request(&self, command: Command, payload: Bytes) -> Result<Cursor> {
        self.requests.lock().await.call(command, payload).await
    }

    async fn request_as<T: Decodable>(&self, command: Command, payload: Bytes) -> Result<T> {
        let mut reply = self.request(command, payload).await?;
        T::decode(&mut reply)
    }

    /// Send a pushable command by whichever route the dispatch mode picks.
    async fn dispatch(&self, command: Command, payload: Bytes) -> Result<()> {
        debug_assert!(command.is_pushable());
        match &self.pushes {
            Some(fanout) => {
                let outcome = fanout.push(command, payload);
                for (endpoint, e) in &outcome.failures {
                    warn!(%endpoint, %command, "push failed: {e}");
                }
                Ok(())
            }
            None => {
                let reply = self.request(command, payload).await?;
                if !reply.is_empty() {
                    trace!(%command, len = reply.remaining(), "ignoring reply body");
                }
                Ok(())
            }
        }
    }
}

fn layer_payload(name: &str) -> Bytes {
    serialize(name)
}

#[async_trait]
impl Canvas for Client {
    async fn hello(&self) -> Result<String> {
        self.request_as(Command::Hello, Bytes::new()).await
    }

    async fn draw_line(&self, line: &DrawLine) -> Result<()> {
        self.dispatch(Command::DrawLine, serialize(line)).await
    }

    async fn pan(&self, x: f32, y: f32) -> Result<()> {
        self.dispatch(Command::Pan, serialize(&Point::new(x, y))).await
    }

    async fn zoom(&self, scale: f32) -> Result<()> {
        self.dispatch(Command::Zoom, serialize(&scale)).await
    }

    async fn screen_to_world(&self, x: f32, y: f32) -> Result<Point> {
        self.request_as(Command::ScreenToWorld, serialize(&Point::new(x, y)))
            .await
    }

    async fn get_layers(&self) -> Result<Vec<String>> {
        self.request_as(Command::GetLayers, Bytes::new()).await
    }

    async fn delete_layer(&self, name: &str) -> Result<bool> {
        self.request_as(Command::DeleteLayer, layer_payload(name)).await
    }

    async fn show_layer(&self, name: &str) -> Result<bool> {
        self.request_as(Command::ShowLayer, layer_payload(name)).await
    }

    async fn hide_layer(&self, name: &str) -> Result<bool> {
        self.request_as(Command::HideLayer, layer_payload(name)).await
    }

    async fn set_layer_pos(&self, name: &str, x: f32, y: f32) -> Result<bool> {
        let mut buf = BytesMut::new();
        name.encode(&mut buf);
        Point::new(x, y).encode(&mut buf);
        self.request_as(Command::SetLayerPos, buf.freeze()).await
    }

    async fn screen_size(&self) -> Result<ScreenSize> {
        self.request_as(Command::ScreenSize, Bytes::new()).await
    }
}
