//! ChatServer actor implementation
//!
//! The single task that owns the `ClientRegistry`. Handlers never touch the
//! registry directly; they send `ServerCommand`s through a `ServerHandle`.
//! Each command is processed to completion before the next one, so
//! check-and-insert, removal, roster broadcast and routing never interleave.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::message::ServerMessage;
use crate::registry::ClientRegistry;
use crate::router;
use crate::sink::ClientSink;
use crate::types::ConnectionId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Claim a display name for a connection
    Register {
        name: String,
        sink: ClientSink,
        reply: oneshot::Sender<bool>,
    },
    /// Release a display name held by a connection
    Unregister {
        name: String,
        connection: ConnectionId,
    },
    /// Route a content line from a registered client
    Chat { sender: String, line: String },
    /// Read the current roster
    Roster { reply: oneshot::Sender<Vec<String>> },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// Registered clients
    registry: ClientRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: ClientRegistry::new(),
            receiver,
        }
    }

    /// Create the actor, spawn it on the current runtime and return its handle
    pub fn spawn(buffer: usize) -> ServerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(buffer);
        tokio::spawn(ChatServer::new(cmd_rx).run());
        ServerHandle::new(cmd_tx)
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Register { name, sink, reply } => {
                let accepted = self.handle_register(name, sink);
                // the handler may already be gone; the registration stands
                // until its Unregister arrives
                let _ = reply.send(accepted);
            }
            ServerCommand::Unregister { name, connection } => {
                self.handle_unregister(name, connection);
            }
            ServerCommand::Chat { sender, line } => {
                self.handle_chat(&sender, &line);
            }
            ServerCommand::Roster { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }
        }
    }

    /// Handle a name claim
    ///
    /// On success the new client gets `NAMEACCEPTED` before any roster line.
    fn handle_register(&mut self, name: String, sink: ClientSink) -> bool {
        let connection = sink.connection();
        let welcome = sink.clone();

        if !self.registry.try_register(&name, sink) {
            info!("Connection {} asked for taken name '{}'", connection, name);
            return false;
        }

        info!("Connection {} registered as '{}'", connection, name);
        let _ = welcome.deliver(ServerMessage::NameAccepted);
        self.broadcast_roster();

        debug!("Total clients: {}", self.registry.len());
        true
    }

    /// Handle a departure
    fn handle_unregister(&mut self, name: String, connection: ConnectionId) {
        let owned = self
            .registry
            .lookup(&name)
            .is_some_and(|sink| sink.connection() == connection);
        if !owned {
            warn!(
                "Connection {} tried to release '{}' which it does not hold",
                connection, name
            );
            return;
        }

        self.registry.unregister(&name);
        info!("'{}' left", name);
        self.broadcast_roster();

        debug!("Total clients: {}", self.registry.len());
    }

    /// Handle a content line
    fn handle_chat(&self, sender: &str, line: &str) {
        let outcome = router::route(&self.registry, sender, line);
        debug!(
            "Routed line from '{}': delivered={}, dropped={}, unknown={}",
            sender,
            outcome.delivered,
            outcome.dropped,
            outcome.unknown.len()
        );
    }

    /// Helper: Send the full roster to every registered client
    fn broadcast_roster(&self) {
        let roster = ServerMessage::ActiveUsers(self.registry.snapshot());
        self.registry.for_each(|name, sink| {
            if let Err(e) = sink.deliver(roster.clone()) {
                debug!("Roster not queued for '{}': {}", name, e);
            }
        });
    }
}

/// Cloneable front end for the ChatServer actor
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    /// Wrap a command channel
    pub fn new(sender: mpsc::Sender<ServerCommand>) -> Self {
        Self { sender }
    }

    /// Atomically claim `name` for the connection behind `sink`
    ///
    /// Ok(false) means the name is taken and nothing changed.
    pub async fn try_register(&self, name: String, sink: ClientSink) -> Result<bool, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(ServerCommand::Register { name, sink, reply }).await?;
        response.await.map_err(|_| AppError::ServerClosed)
    }

    /// Release `name` if `connection` holds it, then rebroadcast the roster
    pub async fn unregister(&self, name: String, connection: ConnectionId) -> Result<(), AppError> {
        self.send(ServerCommand::Unregister { name, connection }).await
    }

    /// Route a content line from `sender`
    pub async fn route(&self, sender: String, line: String) -> Result<(), AppError> {
        self.send(ServerCommand::Chat { sender, line }).await
    }

    /// Current registered names in registration order
    pub async fn roster(&self) -> Result<Vec<String>, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(ServerCommand::Roster { reply }).await?;
        response.await.map_err(|_| AppError::ServerClosed)
    }

    async fn send(&self, cmd: ServerCommand) -> Result<(), AppError> {
        self.sender.send(cmd).await.map_err(|_| AppError::ServerClosed)
    }
}
