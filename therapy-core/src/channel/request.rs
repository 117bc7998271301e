//! Synchronous request/reply command channel (ZMTP `REQ`).
//!
//! ```text
//! Client ──[ "" | opcode | payload ]──► Server
//! Client ◄──[ "" | reply ]──────────── Server
//! ```
//!
//! The empty first part is the REQ envelope delimiter; callers only see
//! the opcode, the payload and the reply.

use std::time::Duration;

use bytes::Bytes;
use tokio::net::TcpStream;
use tracing::{trace, warn};

use crate::command::Command;
use crate::config::Endpoint;
use crate::error::{Result, TherapyError};
use crate::serial::Cursor;
use crate::zmtp::{SocketType, ZmtpSocket};

/// Where the channel is in its send/receive alternation.
///
/// ```text
///  Idle ──call──► AwaitingReply ──reply──► Idle
///                      │
///                      └── transport error / timeout ──► Failed
/// ```
///
/// A call abandoned mid-flight leaves the channel in `AwaitingReply`;
/// the next call is refused rather than reading the stale reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    AwaitingReply,
    Failed,
}

#[derive(Debug)]
pub struct RequestChannel<S = TcpStream> {
    socket: ZmtpSocket<S>,
    endpoint: Endpoint,
    state: RequestState,
    timeout: Option<Duration>,
}

impl RequestChannel<TcpStream> {
    pub async fn connect(
        endpoint: &Endpoint,
        connect_timeout: Duration,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let socket = ZmtpSocket::connect(endpoint, SocketType::Req, connect_timeout).await?;
        Ok(Self::new(socket, endpoint.clone(), request_timeout))
    }
}

impl<S> RequestChannel<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    pub fn new(socket: ZmtpSocket<S>, endpoint: Endpoint, timeout: Option<Duration>) -> Self {
        Self {
            socket,
            endpoint,
            state: RequestState::Idle,
            timeout,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send `command` with `payload` and wait for its reply.
    ///
    /// Returns a cursor over the reply body for the caller to decode.
    pub async fn call(&mut self, command: Command, payload: Bytes) -> Result<Cursor> {
        match self.state {
            RequestState::Idle => {}
            RequestState::AwaitingReply => {
                return Err(TherapyError::ProtocolViolation(
                    "previous request is still awaiting its reply",
                ));
            }
            RequestState::Failed => return Err(TherapyError::ChannelFailed),
        }

        trace!(%command, len = payload.len(), "request");
        self.state = RequestState::AwaitingReply;

        let parts = vec![Bytes::new(), Bytes::from(vec![command.opcode()]), payload];
        let socket = &mut self.socket;
        let exchange = async move {
            socket.send_message(parts).await?;
            socket.recv_message().await
        };
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .unwrap_or(Err(TherapyError::Timeout(limit))),
            None => exchange.await,
        };

        let parts = match result {
            Ok(parts) => parts,
            Err(e) => {
                warn!(endpoint = %self.endpoint, %command, "request failed: {e}");
                self.state = RequestState::Failed;
                return Err(e);
            }
        };
        self.state = RequestState::Idle;

        match <[Bytes; 2]>::try_from(parts) {
            Ok([delimiter, reply]) if delimiter.is_empty() => {
                trace!(%command, len = reply.len(), "reply");
                Ok(Cursor::new(reply))
            }
            _ => Err(TherapyError::ProtocolViolation("malformed reply envelope")),
        }
    }
}
