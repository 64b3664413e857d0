//! Error types for the chat relay
//!
//! Defines connection-level errors and sink delivery errors.
//! Uses thiserror for ergonomic error definitions.

use std::time::Duration;

use thiserror::Error;
use tokio_util::codec::AnyDelimiterCodecError;

/// Application-level errors
///
/// Everything except `Bind` and `Config` is local to a single connection:
/// the handler logs it, cleans up, and the rest of the server carries on.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on a connection (fatal for that connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error, including over-long lines
    #[error("Line codec error: {0}")]
    Lines(#[from] AnyDelimiterCodecError),

    /// The listener could not be bound (fatal at startup)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection's writer task stopped (peer gone or write failed)
    #[error("Connection writer closed")]
    WriterClosed,

    /// The connection's outbound queue is full
    #[error("Outbound queue full")]
    OutboundFull,

    /// The registry task is gone
    #[error("Registry task closed")]
    ServerClosed,

    /// The client sent nothing within the configured idle timeout
    #[error("Idle for more than {0:?}")]
    IdleTimeout(Duration),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<SendError> for AppError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::ChannelClosed => AppError::WriterClosed,
            SendError::Full => AppError::OutboundFull,
        }
    }
}

/// Sink delivery errors
///
/// Occurs when a line is queued for a connection whose writer has gone away
/// or cannot keep up.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the outbound queue has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The queue is at capacity; the line was not queued
    #[error("Channel full")]
    Full,
}
