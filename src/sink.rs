//! Outbound sink for a single connection
//!
//! A `ClientSink` is the sending half of a connection's bounded outbound
//! queue. Exactly one writer task drains the queue, so lines queued
//! concurrently by many senders are written whole and in queue order.
//! A client that stops reading fills its queue; further lines for it are
//! refused rather than buffered.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ConnectionId;

/// Handle for queueing protocol lines to one connection
#[derive(Debug, Clone)]
pub struct ClientSink {
    /// Connection that owns the queue
    connection: ConnectionId,
    /// Server → Client line queue
    sender: mpsc::Sender<ServerMessage>,
}

impl ClientSink {
    /// Create a sink holding at most `capacity` queued lines, and the
    /// receiver its writer task will drain
    pub fn channel(
        connection: ConnectionId,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { connection, sender }, receiver)
    }

    /// Queue a line for this connection without waiting
    ///
    /// Returns `SendError::Full` if the queue is at capacity and
    /// `SendError::ChannelClosed` if the writer has gone away.
    pub fn deliver(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Queue a line, waiting for room in the queue
    ///
    /// Only the connection's own handler may wait; shared code uses `deliver`.
    pub async fn deliver_wait(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Connection that owns this sink
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
