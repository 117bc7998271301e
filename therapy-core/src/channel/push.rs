//! Fire-and-forget command channel (ZMTP `PUB`) and its fan-out.
//!
//! Each destination gets a background writer fed by a bounded queue, so
//! [`PushChannel::push`] never waits on the network. Messages are
//! `[ opcode | payload ]`; no reply ever comes back.

use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::command::Command;
use crate::config::Endpoint;
use crate::error::{Result, TherapyError};
use crate::zmtp::{SocketType, ZmtpSocket, recv_parts, send_parts};

/// One push destination.
#[derive(Debug)]
pub struct PushChannel {
    endpoint: Endpoint,
    // Queue to the background writer task
    tx: mpsc::Sender<Vec<Bytes>>,
    capacity: usize,
    writer: JoinHandle<()>,
}

impl PushChannel {
    pub async fn connect(endpoint: &Endpoint, connect_timeout: Duration, queue: usize) -> Result<Self> {
        let socket = ZmtpSocket::connect(endpoint, SocketType::Pub, connect_timeout).await?;
        Ok(Self::spawn(socket, endpoint.clone(), queue))
    }

    /// Start the writer and reader tasks over a handshaken `PUB` socket.
    pub fn spawn<S>(socket: ZmtpSocket<S>, endpoint: Endpoint, queue: usize) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let capacity = queue.max(1);
        let (mut net_writer, mut net_reader) = socket.split();
        let (tx, mut rx) = mpsc::channel::<Vec<Bytes>>(capacity);
        let closed = CancellationToken::new();

        // Writer task: queue -> network
        let peer = endpoint.clone();
        let writer_closed = closed.clone();
        let writer = tokio::spawn(async move {
            loop {
                let parts = tokio::select! {
                    _ = writer_closed.cancelled() => break,
                    parts = rx.recv() => match parts {
                        Some(parts) => parts,
                        None => break,
                    },
                };
                if let Err(e) = send_parts(&mut net_writer, parts).await {
                    warn!(endpoint = %peer, "push write failed: {e}");
                    break;
                }
            }
            debug!(endpoint = %peer, "push writer stopped");
        });

        // Reader task: the subscriber only ever sends (un)subscriptions.
        // Its end of stream is how a dead peer shows up.
        let peer = endpoint.clone();
        tokio::spawn(async move {
            loop {
                match recv_parts(&mut net_reader).await {
                    Ok(parts) => {
                        let body = parts.first().map(|p| &p[..]).unwrap_or_default();
                        match body.split_first() {
                            Some((&1, prefix)) => trace!(endpoint = %peer, ?prefix, "peer subscribed"),
                            Some((&0, prefix)) => trace!(endpoint = %peer, ?prefix, "peer unsubscribed"),
                            _ => trace!(endpoint = %peer, "ignoring message from subscriber"),
                        }
                    }
                    Err(e) => {
                        debug!(endpoint = %peer, "push peer went away: {e}");
                        break;
                    }
                }
            }
            closed.cancel();
        });

        Self {
            endpoint,
            tx,
            capacity,
            writer,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Queue `command` for delivery and return immediately.
    ///
    /// `QueueFull` drops this message only; `ChannelClosed` means the
    /// destination is gone for good.
    pub fn push(&self, command: Command, payload: Bytes) -> Result<()> {
        let parts = vec![Bytes::from(vec![command.opcode()]), payload];
        self.tx.try_send(parts).map_err(|e| match e {
            TrySendError::Full(_) => TherapyError::QueueFull {
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => TherapyError::ChannelClosed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop accepting pushes and wait until the writer has flushed what
    /// is already queued, or the destination has gone away.
    pub async fn close(self) {
        let Self {
            endpoint,
            tx,
            writer,
            ..
        } = self;
        drop(tx);
        if let Err(e) = writer.await {
            warn!(%endpoint, "push writer task failed: {e}");
        }
    }
}

/// Per-destination result of one fan-out push.
#[derive(Debug, Default)]
pub struct FanoutOutcome {
    pub delivered: usize,
    pub failures: Vec<(Endpoint, TherapyError)>,
}

impl FanoutOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Every push goes to all destinations, independently.
#[derive(Debug)]
pub struct PushFanout {
    peers: Vec<PushChannel>,
}

impl PushFanout {
    /// Connect to all `endpoints` concurrently. Unreachable destinations
    /// are logged and left out; it is an error only if none connect.
    pub async fn connect(endpoints: &[Endpoint], connect_timeout: Duration, queue: usize) -> Result<Self> {
        let attempts = endpoints
            .iter()
            .map(|ep| PushChannel::connect(ep, connect_timeout, queue));
        let mut peers = Vec::with_capacity(endpoints.len());
        let mut last_err = None;
        for (endpoint, result) in endpoints.iter().zip(join_all(attempts).await) {
            match result {
                Ok(peer) => peers.push(peer),
                Err(e) => {
                    warn!(%endpoint, "push destination unavailable: {e}");
                    last_err = Some(e);
                }
            }
        }
        if peers.is_empty() {
            return Err(last_err.unwrap_or(TherapyError::ChannelClosed));
        }
        info!(destinations = peers.len(), "push fan-out ready");
        Ok(Self { peers })
    }

    pub fn from_peers(peers: Vec<PushChannel>) -> Self {
        Self { peers }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.peers.iter().map(PushChannel::endpoint)
    }

    /// Close every destination, waiting for each queue to drain.
    pub async fn close(self) {
        join_all(self.peers.into_iter().map(PushChannel::close)).await;
    }

    pub fn push(&self, command: Command, payload: Bytes) -> FanoutOutcome {
        let mut outcome = FanoutOutcome::default();
        for peer in &self.peers {
            match peer.push(command, payload.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => outcome.failures.push((peer.endpoint.clone(), e)),
            }
        }
        outcome
    }
}
