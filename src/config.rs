//! Server configuration
//!
//! Built from the command line (bind address) and the environment
//! (connection limits). Everything has a default, so running the binary
//! without arguments serves on port 9001.

use std::time::Duration;

use crate::error::AppError;

/// Default listening port
pub const DEFAULT_PORT: u16 = 9001;

/// Default bind host when only a port is given
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default maximum inbound line length in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Default number of outbound lines queued per connection
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Environment variable overriding the maximum line length
pub const MAX_LINE_LENGTH_ENV: &str = "LINECHAT_MAX_LINE_LENGTH";

/// Environment variable overriding the outbound queue capacity
pub const OUTBOUND_CAPACITY_ENV: &str = "LINECHAT_OUTBOUND_CAPACITY";

/// Environment variable enabling the idle timeout (seconds, 0 disables)
pub const IDLE_TIMEOUT_ENV: &str = "LINECHAT_IDLE_TIMEOUT_SECS";

/// Per-connection settings shared by every handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Longest accepted input line; longer lines drop the connection
    pub max_line_length: usize,
    /// Lines queued for a client before further lines to it are dropped
    pub outbound_capacity: usize,
    /// Disconnect clients that send nothing for this long
    pub idle_timeout: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            idle_timeout: None,
        }
    }
}

/// Full server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address passed to the listener, `host:port`
    pub bind_addr: String,
    pub connection: ConnectionOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            connection: ConnectionOptions::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process arguments and environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_sources(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Build a configuration from explicit arguments and an env lookup
    ///
    /// `args` excludes the program name. The first argument, if any, is the
    /// bind address or a bare port.
    pub fn from_sources<I, F>(args: I, env: F) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = args.into_iter().next() {
            config.bind_addr = parse_bind_addr(&addr)?;
        }

        if let Some(raw) = env(MAX_LINE_LENGTH_ENV) {
            config.connection.max_line_length = parse_positive(MAX_LINE_LENGTH_ENV, &raw)?;
        }

        if let Some(raw) = env(OUTBOUND_CAPACITY_ENV) {
            config.connection.outbound_capacity = parse_positive(OUTBOUND_CAPACITY_ENV, &raw)?;
        }

        if let Some(raw) = env(IDLE_TIMEOUT_ENV) {
            let secs: u64 = parse_number(IDLE_TIMEOUT_ENV, &raw)?;
            config.connection.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse_bind_addr(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Config("empty bind address".to_string()));
    }
    if raw.contains(':') {
        return Ok(raw.to_string());
    }
    let port: u16 = parse_number("port", raw)?;
    Ok(format!("{}:{}", DEFAULT_HOST, port))
}

fn parse_positive(what: &str, raw: &str) -> Result<usize, AppError> {
    let value: usize = parse_number(what, raw)?;
    if value == 0 {
        return Err(AppError::Config(format!("{} must be greater than zero", what)));
    }
    Ok(value)
}

fn parse_number<T: std::str::FromStr>(what: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} is not a valid number: '{}'", what, raw)))
}
