//! Event subscription channel (ZMTP `SUB`).
//!
//! Every event message starts with its tag byte, so a kind filter is a
//! set of one-byte subscription prefixes. Filtered-out kinds are also
//! discarded here in case the server ignores the prefixes.

use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::Endpoint;
use crate::error::{Result, TherapyError};
use crate::event::{Event, EventKind};
use crate::zmtp::{SocketType, ZmtpSocket};

const SUBSCRIBE: u8 = 0x01;
const UNSUBSCRIBE: u8 = 0x00;

/// Which event kinds a subscriber wants. Empty means all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    kinds: Vec<EventKind>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        let mut kinds: Vec<_> = kinds.into_iter().collect();
        kinds.sort_by_key(|k| k.tag());
        kinds.dedup();
        Self { kinds }
    }

    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    pub fn is_all(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn matches_tag(&self, tag: u8) -> bool {
        self.is_all() || self.kinds.iter().any(|k| k.tag() == tag)
    }

    pub fn matches(&self, kind: EventKind) -> bool {
        self.matches_tag(kind.tag())
    }

    fn prefixes(&self) -> Vec<Vec<u8>> {
        if self.is_all() {
            vec![Vec::new()]
        } else {
            self.kinds.iter().map(|k| vec![k.tag()]).collect()
        }
    }
}

impl FromIterator<EventKind> for EventFilter {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        Self::only(iter)
    }
}

#[derive(Debug)]
pub struct EventChannel<S = TcpStream> {
    socket: ZmtpSocket<S>,
    endpoint: Endpoint,
    filter: EventFilter,
    terminated: bool,
}

impl EventChannel<TcpStream> {
    pub async fn connect(endpoint: &Endpoint, filter: EventFilter, connect_timeout: Duration) -> Result<Self> {
        let socket = ZmtpSocket::connect(endpoint, SocketType::Sub, connect_timeout).await?;
        Self::new(socket, endpoint.clone(), filter).await
    }
}

impl<S> EventChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a handshaken `SUB` socket and send the filter's subscriptions.
    pub async fn new(socket: ZmtpSocket<S>, endpoint: Endpoint, filter: EventFilter) -> Result<Self> {
        let mut channel = Self {
            socket,
            endpoint,
            filter: EventFilter::all(),
            terminated: false,
        };
        channel.send_subscriptions(&filter, SUBSCRIBE).await?;
        channel.filter = filter;
        debug!(endpoint = %channel.endpoint, kinds = ?channel.filter.kinds(), "subscribed");
        Ok(channel)
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Replace the active filter.
    ///
    /// The stored filter only changes once both the unsubscribe and the
    /// subscribe messages have been sent.
    pub async fn set_filter(&mut self, filter: EventFilter) -> Result<()> {
        let old = self.filter.clone();
        self.send_subscriptions(&old, UNSUBSCRIBE).await?;
        self.send_subscriptions(&filter, SUBSCRIBE).await?;
        self.filter = filter;
        Ok(())
    }

    async fn send_subscriptions(&mut self, filter: &EventFilter, op: u8) -> Result<()> {
        for prefix in filter.prefixes() {
            let mut body = Vec::with_capacity(prefix.len() + 1);
            body.push(op);
            body.extend_from_slice(&prefix);
            self.socket.send_message(vec![Bytes::from(body)]).await?;
        }
        Ok(())
    }

    /// Wait for the next matching event.
    ///
    /// A message that fails to decode is reported and the stream goes on.
    /// A transport failure is reported once, after which this returns
    /// `None`.
    pub async fn next(&mut self) -> Option<Result<Event>> {
        if self.terminated {
            return None;
        }
        loop {
            let parts = match self.socket.recv_message().await {
                Ok(parts) => parts,
                Err(e) => {
                    warn!(endpoint = %self.endpoint, "event stream ended: {e}");
                    self.terminated = true;
                    return Some(Err(e));
                }
            };
            let Ok([message]) = <[Bytes; 1]>::try_from(parts) else {
                return Some(Err(TherapyError::ProtocolViolation(
                    "event message must be a single part",
                )));
            };

            // Unknown tags always reach the caller; only known kinds the
            // filter excludes are dropped.
            if let Some(&tag) = message.first() {
                match EventKind::try_from(tag) {
                    Err(e) => return Some(Err(e)),
                    Ok(kind) if !self.filter.matches(kind) => {
                        trace!(?kind, "discarding filtered event");
                        continue;
                    }
                    Ok(_) => {}
                }
            }
            return Some(Event::decode(message));
        }
    }

    /// Turn the channel into a `Stream` of events.
    pub fn into_stream(self) -> impl Stream<Item = Result<Event>> {
        futures::stream::unfold(self, |mut channel| async move {
            let item = channel.next().await?;
            Some((item, channel))
        })
    }
}

impl<S> EventChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Move the channel onto a background task feeding a bounded queue.
    pub fn spawn(mut self, capacity: usize) -> EventListener {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    _ = token.cancelled() => break,
                    item = self.next() => item,
                };
                let Some(item) = item else { break };
                tokio::select! {
                    _ = token.cancelled() => break,
                    sent = tx.send(item) => {
                        if sent.is_err() {
                            // Receiver dropped
                            break;
                        }
                    }
                }
            }
            debug!(endpoint = %self.endpoint, "event listener stopped");
        });

        EventListener {
            rx,
            shutdown,
            handle,
        }
    }
}

/// Handle to a background event listener.
#[derive(Debug)]
pub struct EventListener {
    rx: mpsc::Receiver<Result<Event>>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl EventListener {
    pub async fn recv(&mut self) -> Option<Result<Event>> {
        self.rx.recv().await
    }

    /// Stop the listener and wait for its task to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.handle.await {
            warn!("event listener task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MouseButton;
    use futures::StreamExt;
    use tokio::io::{DuplexStream, duplex};

    async fn pair(filter: EventFilter) -> (EventChannel<DuplexStream>, ZmtpSocket<DuplexStream>) {
        let (client, server) = duplex(1 << 16);
        let (client, server) = tokio::join!(
            ZmtpSocket::handshake(client, SocketType::Sub, false),
            ZmtpSocket::handshake(server, SocketType::Pub, true),
        );
        let channel = EventChannel::new(client.unwrap(), Endpoint::new("duplex", 0), filter)
            .await
            .unwrap();
        (channel, server.unwrap())
    }

    async fn publish(server: &mut ZmtpSocket<DuplexStream>, bytes: &[u8]) {
        server
            .send_message(vec![Bytes::copy_from_slice(bytes)])
            .await
            .unwrap();
    }

    fn button_down() -> Vec<u8> {
        let mut raw = vec![3u8, 0];
        raw.extend_from_slice(&0.5f32.to_le_bytes());
        raw.extend_from_slice(&0.25f32.to_le_bytes());
        raw
    }

    #[tokio::test]
    async fn subscribes_to_everything_by_default() {
        let (_channel, mut server) = pair(EventFilter::all()).await;
        let parts = server.recv_message().await.unwrap();
        assert_eq!(&parts[0][..], &[SUBSCRIBE]);
    }

    #[tokio::test]
    async fn filter_sends_tag_prefixes() {
        let filter = EventFilter::only([EventKind::MouseMotion, EventKind::KeyDown]);
        let (_channel, mut server) = pair(filter).await;
        assert_eq!(&server.recv_message().await.unwrap()[0][..], &[SUBSCRIBE, 0]);
        assert_eq!(&server.recv_message().await.unwrap()[0][..], &[SUBSCRIBE, 1]);
    }

    #[tokio::test]
    async fn changing_filter_unsubscribes_old_prefixes() {
        let (mut channel, mut server) = pair(EventFilter::only([EventKind::MouseWheel])).await;
        server.recv_message().await.unwrap();

        channel
            .set_filter(EventFilter::only([EventKind::MouseButtonUp]))
            .await
            .unwrap();
        assert_eq!(&server.recv_message().await.unwrap()[0][..], &[UNSUBSCRIBE, 2]);
        assert_eq!(&server.recv_message().await.unwrap()[0][..], &[SUBSCRIBE, 4]);
        assert_eq!(channel.filter().kinds(), &[EventKind::MouseButtonUp]);
    }

    #[tokio::test]
    async fn unknown_tag_does_not_end_stream() {
        let (mut channel, mut server) = pair(EventFilter::all()).await;
        publish(&mut server, &[99]).await;
        publish(&mut server, &button_down()).await;

        assert!(matches!(
            channel.next().await,
            Some(Err(TherapyError::UnknownVariant { value: 99, .. }))
        ));
        assert_eq!(
            channel.next().await.unwrap().unwrap(),
            Event::MouseButtonDown {
                button: MouseButton::Left,
                x: 0.5,
                y: 0.25
            }
        );
    }

    #[tokio::test]
    async fn unknown_tag_passes_through_filter() {
        let (mut channel, mut server) = pair(EventFilter::only([EventKind::MouseMotion])).await;
        publish(&mut server, &[99, 1, 2, 3]).await;

        let item = tokio::time::timeout(Duration::from_millis(500), channel.next())
            .await
            .unwrap();
        assert!(matches!(
            item,
            Some(Err(TherapyError::UnknownVariant {
                type_name: "EventKind",
                value: 99
            }))
        ));
    }

    #[tokio::test]
    async fn failed_filter_change_keeps_old_filter() {
        let before = EventFilter::only([EventKind::MouseWheel]);
        let (mut channel, server) = pair(before.clone()).await;
        drop(server);

        let result = channel
            .set_filter(EventFilter::only([EventKind::KeyDown]))
            .await;
        assert!(result.is_err());
        assert_eq!(channel.filter(), &before);
    }

    #[tokio::test]
    async fn non_matching_kinds_are_discarded() {
        let (mut channel, mut server) = pair(EventFilter::only([EventKind::MouseButtonDown])).await;
        let mut motion = vec![1u8];
        motion.extend_from_slice(&1.0f32.to_le_bytes());
        motion.extend_from_slice(&2.0f32.to_le_bytes());
        publish(&mut server, &motion).await;
        publish(&mut server, &button_down()).await;

        let event = channel.next().await.unwrap().unwrap();
        assert_eq!(event.kind(), EventKind::MouseButtonDown);
    }

    #[tokio::test]
    async fn transport_error_is_reported_once() {
        let (channel, server) = pair(EventFilter::all()).await;
        drop(server);

        let items: Vec<_> = channel.into_stream().collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().is_err_and(|e| e.is_fatal()));
    }

    #[tokio::test]
    async fn listener_delivers_and_shuts_down() {
        let (channel, mut server) = pair(EventFilter::all()).await;
        let mut listener = channel.spawn(4);

        publish(&mut server, &button_down()).await;
        let event = listener.recv().await.unwrap().unwrap();
        assert_eq!(event.position(), Some((0.5, 0.25)));

        tokio::time::timeout(Duration::from_secs(2), listener.shutdown())
            .await
            .unwrap();
    }
}
