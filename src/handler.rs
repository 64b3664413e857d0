//! Connection handler
//!
//! Runs the per-connection protocol: name negotiation, then content lines
//! until the client goes away. Inbound lines are read by the handler task;
//! outbound lines go through the connection's `ClientSink` and are written by
//! a dedicated writer task, which is the only code that writes the socket.

use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{AnyDelimiterCodecError, Framed};
use tracing::{debug, info, warn};

use crate::codec::ChatCodec;
use crate::config::ConnectionOptions;
use crate::error::AppError;
use crate::message::{validate_name, ServerMessage};
use crate::server::ServerHandle;
use crate::sink::ClientSink;
use crate::types::ConnectionId;

/// Protocol state of one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerState {
    /// Waiting for a unique name. `claim` holds a name whose registration
    /// has been requested but not yet answered.
    AwaitingName { claim: Option<String> },
    /// Registered under `name`; content lines are routed
    Active { name: String },
    /// Terminal
    Closed,
}

/// Handle a new connection
///
/// Sets up line framing and the writer task, runs the protocol until the
/// client disconnects or fails, then releases the name and closes the
/// connection. The returned error, if any, concerns this connection only.
pub async fn handle_connection<S>(
    stream: S,
    peer: String,
    server: ServerHandle,
    options: ConnectionOptions,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let connection = ConnectionId::new();
    info!("Connection {} opened from {}", connection, peer);

    let framed = Framed::new(stream, ChatCodec::new_with_max_length(options.max_line_length));
    let (writer, mut reader) = framed.split::<String>();

    let (sink, outbound) = ClientSink::channel(connection, options.outbound_capacity);
    let mut write_task = tokio::spawn(write_outbound(writer, outbound, connection));
    let mut writer_done = false;

    let mut handler = ConnectionHandler {
        connection,
        sink,
        server,
        idle_timeout: options.idle_timeout,
        state: HandlerState::AwaitingName { claim: None },
    };

    // Either side ending ends the connection
    let result = tokio::select! {
        result = handler.run(&mut reader) => result,
        _ = &mut write_task => {
            writer_done = true;
            Err(AppError::WriterClosed)
        }
    };

    handler.close().await;
    drop(handler);
    drop(reader);

    // The writer drains what is queued, then shuts the socket down once the
    // registry has dropped its copy of the sink.
    if !writer_done {
        let _ = write_task.await;
    }

    match &result {
        Ok(()) => info!("Connection {} closed", connection),
        Err(e) => info!("Connection {} closed: {}", connection, e),
    }

    result
}

/// State machine for one connection
struct ConnectionHandler {
    connection: ConnectionId,
    sink: ClientSink,
    server: ServerHandle,
    idle_timeout: Option<Duration>,
    state: HandlerState,
}

impl ConnectionHandler {
    /// Drive the protocol until end-of-stream or the first error
    async fn run<R>(&mut self, reader: &mut R) -> Result<(), AppError>
    where
        R: Stream<Item = Result<String, AnyDelimiterCodecError>> + Unpin,
    {
        loop {
            match self.state {
                HandlerState::AwaitingName { .. } => {
                    // waits on this client's own writer only
                    self.sink.deliver_wait(ServerMessage::SubmitName).await?;

                    let Some(name) = read_line(reader, self.idle_timeout).await? else {
                        debug!("Connection {} closed before choosing a name", self.connection);
                        return Ok(());
                    };

                    if let Err(reason) = validate_name(&name) {
                        debug!("Connection {} sent unusable name: {}", self.connection, reason);
                        continue;
                    }

                    self.state = HandlerState::AwaitingName {
                        claim: Some(name.clone()),
                    };
                    let accepted = self
                        .server
                        .try_register(name.clone(), self.sink.clone())
                        .await?;

                    self.state = if accepted {
                        HandlerState::Active { name }
                    } else {
                        HandlerState::AwaitingName { claim: None }
                    };
                }
                HandlerState::Active { ref name } => {
                    let name = name.clone();
                    let Some(line) = read_line(reader, self.idle_timeout).await? else {
                        debug!("'{}' reached end of stream", name);
                        return Ok(());
                    };
                    self.server.route(name, line).await?;
                }
                HandlerState::Closed => return Ok(()),
            }
        }
    }

    /// Enter `Closed`, releasing any name this connection holds or claimed
    ///
    /// Safe to call more than once.
    async fn close(&mut self) {
        let name = match std::mem::replace(&mut self.state, HandlerState::Closed) {
            HandlerState::Active { name } => Some(name),
            HandlerState::AwaitingName { claim } => claim,
            HandlerState::Closed => None,
        };

        if let Some(name) = name {
            // The registry only removes the name if this connection owns it
            if let Err(e) = self.server.unregister(name.clone(), self.connection).await {
                warn!("Failed to release '{}' for {}: {}", name, self.connection, e);
            }
        }
    }
}

/// Read the next line, honouring the idle timeout
///
/// `Ok(None)` means the client closed the stream.
async fn read_line<R>(reader: &mut R, idle_timeout: Option<Duration>) -> Result<Option<String>, AppError>
where
    R: Stream<Item = Result<String, AnyDelimiterCodecError>> + Unpin,
{
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, reader.next())
            .await
            .map_err(|_| AppError::IdleTimeout(limit))?,
        None => reader.next().await,
    };
    next.transpose().map_err(AppError::from)
}

/// Writer task: drain the outbound queue into the socket
async fn write_outbound<W>(
    mut writer: W,
    mut outbound: mpsc::Receiver<ServerMessage>,
    connection: ConnectionId,
) where
    W: Sink<String, Error = AnyDelimiterCodecError> + Unpin,
{
    while let Some(msg) = outbound.recv().await {
        if let Err(e) = writer.send(msg.to_string()).await {
            debug!("Write to {} failed: {}", connection, e);
            break;
        }
    }

    // The peer may already be gone
    let _ = writer.close().await;
    debug!("Writer for {} ended", connection);
}
