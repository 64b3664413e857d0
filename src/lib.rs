//! Line Chat Relay Library
//!
//! A TCP chat relay speaking a newline-delimited text protocol. Clients
//! pick a unique display name, then send lines that are broadcast to
//! everyone or addressed to specific users with `name1>>name2>>message`.
//!
//! # Protocol
//! - Server → client: `SUBMITNAME`, `NAMEACCEPTED`, `MESSAGE <text>`,
//!   `ACTIVEUSERS<name1>:<name2>:...`
//! - Client → server: a name while `SUBMITNAME` is pending, then chat lines
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the `ClientRegistry`
//! - Each connection has a `handler` task talking to the actor through a
//!   `ServerHandle`, and a writer task draining its `ClientSink`
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use linechat::{acceptor, ChatServer, ConnectionOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = acceptor::bind("127.0.0.1:9001").await.unwrap();
//!     let server = ChatServer::spawn(256);
//!     acceptor::run(listener, server, ConnectionOptions::default()).await;
//! }
//! ```

pub mod acceptor;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod sink;
pub mod types;

// Re-export main types for convenience
pub use codec::ChatCodec;
pub use config::{ConnectionOptions, ServerConfig};
pub use error::{AppError, SendError};
pub use handler::{handle_connection, HandlerState};
pub use message::{ChatLine, ServerMessage};
pub use registry::ClientRegistry;
pub use router::{route, RouteOutcome};
pub use server::{ChatServer, ServerCommand, ServerHandle};
pub use sink::ClientSink;
pub use types::ConnectionId;
