//! Error types for switchscrape.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::session::SessionState;

/// Main error type for switchscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel (read cycle) errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Table parser errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Whether this error is a deadline expiry rather than a hard failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(TransportError::Timeout(_)) => true,
            Error::Channel(ChannelError::PromptTimeout(_)) => true,
            Error::Session(SessionError::CommandFailed { source, .. }) => source.is_timeout(),
            _ => false,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: russh::Error,
    },

    /// SSH protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (interactive shell, prompt detection).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to allocate a PTY on the channel
    #[error("Failed to open PTY channel: {0}")]
    PtyOpenFailed(#[source] russh::Error),

    /// Failed to start the remote shell
    #[error("Failed to request shell: {0}")]
    ShellRequestFailed(#[source] russh::Error),

    /// No settled prompt observed before the deadline
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(Duration),

    /// Read or write on the shell stream failed
    #[error("Channel I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not connected
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// A previous read cycle failed or was abandoned; close and reconnect
    #[error("Session unusable in state {state:?} - close() and reconnect")]
    Unusable { state: SessionState },

    /// Session was closed
    #[error("Session closed")]
    Closed,

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// One command of a sequence failed
    #[error("Command '{command}' failed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: Box<Error>,
    },
}

/// Table parser errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An eligible row carried a malformed numeric field
    #[error("parse error on line: {line:?}")]
    InvalidRow { line: String },

    /// A numeric field could not be parsed as its expected type
    #[error("invalid number for {field:?} on line {line:?}: {reason}")]
    InvalidField {
        line: String,
        field: String,
        reason: String,
    },

    /// The table's required row was not found
    #[error("no {table} row found in output")]
    NoMatch { table: &'static str },
}

/// Result type alias using switchscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;
