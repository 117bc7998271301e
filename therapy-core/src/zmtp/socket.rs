use std::time::Duration;

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, trace};

use crate::config::Endpoint;
use crate::error::{Result, TherapyError};
use crate::zmtp::codec::{Frame, ZmtpCodec};
use crate::zmtp::greeting::{GREETING_SIZE, Greeting, SocketType, parse_ready, ready_command};

pub type FrameSink<S = TcpStream> = SplitSink<Framed<S, ZmtpCodec>, Frame>;
pub type FrameStream<S = TcpStream> = SplitStream<Framed<S, ZmtpCodec>>;

/// A handshaken ZMTP connection carrying multi-part messages.
#[derive(Debug)]
pub struct ZmtpSocket<S = TcpStream> {
    framed: Framed<S, ZmtpCodec>,
    socket_type: SocketType,
}

impl ZmtpSocket<TcpStream> {
    /// Open a TCP connection to `endpoint` and run the handshake as
    /// `socket_type`.
    pub async fn connect(
        endpoint: &Endpoint,
        socket_type: SocketType,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let addr = endpoint.address();
        debug!(%endpoint, %socket_type, "connecting");

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr.as_str()))
            .await
            .map_err(|_| TherapyError::Timeout(connect_timeout))??;
        stream.set_nodelay(true)?;

        let socket = Self::handshake(stream, socket_type, false).await?;
        debug!(%endpoint, %socket_type, "connected");
        Ok(socket)
    }
}

impl<S> ZmtpSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Exchange greetings and `READY` commands over an established stream.
    ///
    /// Fails if the peer's socket type cannot talk to `socket_type`.
    pub async fn handshake(mut stream: S, socket_type: SocketType, as_server: bool) -> Result<Self> {
        stream.write_all(&Greeting::new(as_server).encode()).await?;
        stream.flush().await?;

        let mut peer = [0u8; GREETING_SIZE];
        stream.read_exact(&mut peer).await.map_err(closed_on_eof)?;
        let greeting = Greeting::decode(&peer)?;
        trace!(major = greeting.major, minor = greeting.minor, "peer greeting");

        let mut framed = Framed::new(stream, ZmtpCodec::new());
        framed
            .send(Frame::command(ready_command(socket_type)))
            .await?;

        let frame = framed.next().await.ok_or(TherapyError::ConnectionClosed)??;
        if !frame.is_command() {
            return Err(TherapyError::Handshake(
                "expected READY command, got message data".into(),
            ));
        }
        let peer_type = parse_ready(&frame.body)?;
        if peer_type != socket_type.peer() {
            return Err(TherapyError::Handshake(format!(
                "{socket_type} socket cannot talk to {peer_type} peer"
            )));
        }

        Ok(Self {
            framed,
            socket_type,
        })
    }

    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Send one multi-part message; every part but the last carries `MORE`.
    pub async fn send_message(&mut self, parts: Vec<Bytes>) -> Result<()> {
        send_parts(&mut self.framed, parts).await
    }

    /// Receive the next complete multi-part message.
    pub async fn recv_message(&mut self) -> Result<Vec<Bytes>> {
        recv_parts(&mut self.framed).await
    }

    /// Separate the write and read halves so they can live on different
    /// tasks.
    pub fn split(self) -> (FrameSink<S>, FrameStream<S>) {
        self.framed.split()
    }
}

/// Write a multi-part message to any frame sink.
pub async fn send_parts<K>(sink: &mut K, parts: Vec<Bytes>) -> Result<()>
where
    K: futures::Sink<Frame, Error = TherapyError> + Unpin,
{
    if parts.is_empty() {
        return Err(TherapyError::ProtocolViolation("message has no parts"));
    }
    let last = parts.len() - 1;
    for (i, part) in parts.into_iter().enumerate() {
        sink.feed(Frame::message(part, i < last)).await?;
    }
    sink.flush().await
}

/// Read frames until a message is complete. Command frames between
/// messages (heartbeats, subscription commands) are skipped.
pub async fn recv_parts<T>(stream: &mut T) -> Result<Vec<Bytes>>
where
    T: futures::Stream<Item = Result<Frame>> + Unpin,
{
    let mut parts = Vec::new();
    loop {
        let frame = stream.next().await.ok_or(TherapyError::ConnectionClosed)??;
        if frame.is_command() {
            if !parts.is_empty() {
                return Err(TherapyError::ProtocolViolation(
                    "command frame inside a multi-part message",
                ));
            }
            trace!(len = frame.body.len(), "skipping command frame");
            continue;
        }
        let more = frame.has_more();
        parts.push(frame.body);
        if !more {
            return Ok(parts);
        }
    }
}

fn closed_on_eof(e: std::io::Error) -> TherapyError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        TherapyError::ConnectionClosed
    } else {
        TherapyError::Connection(e)
    }
}
