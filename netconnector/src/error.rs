//! Error types for netconnector.
//!
//! Errors are layered the same way the crate is: transport, channel, driver,
//! platform and parser failures each have their own enum and all of them fold
//! into [`Error`]. Callers that need to react to a failure (retry, HTTP status,
//! scan accounting) go through [`Error::kind`] instead of matching variants.

use std::fmt;
use std::io;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Main error type for netconnector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Telnet/SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Terminal/expect errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Output template errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Transport layer errors (TCP connect, telnet negotiation, SSH handshake).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Every credential candidate was rejected
    #[error("Authentication failed for {host}: {reason}")]
    AuthenticationFailed { host: String, reason: String },

    /// Connection was closed by the peer
    #[error("Connection disconnected")]
    Disconnected,

    /// Connect or handshake timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching on the terminal stream).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Stream reached end of file
    #[error("Channel closed")]
    Closed,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (capability calls).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Port argument rejected by the vendor's port rule
    #[error("Invalid port '{port}'")]
    InvalidPort { port: String },

    /// The platform has no command for this capability
    #[error("Operation '{operation}' is not supported by {platform}")]
    Unsupported { operation: String, platform: String },

    /// Malformed method name or parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The device rejected a command
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No vendor signature matched the identification output
    #[error("Unknown device at {host}")]
    UnknownDevice { host: String },

    /// Platform name not present in the registry
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// Output template errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// No template registered under the key
    #[error("No template registered for '{key}'")]
    UnknownTemplate { key: String },

    /// Template failed to compile or run
    #[error("Template '{key}' failed: {message}")]
    Template { key: String, message: String },
}

/// Stable failure taxonomy exposed at the HTTP boundary and used for retry
/// decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    AuthenticationFailed,
    ConnectionUnavailable,
    UnknownDevice,
    InvalidPort,
    UnsupportedOperation,
    SaveConfigFailed,
    CommandFailed,
    InvalidRequest,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::ConnectionUnavailable => "ConnectionUnavailable",
            ErrorKind::UnknownDevice => "UnknownDevice",
            ErrorKind::InvalidPort => "InvalidPort",
            ErrorKind::UnsupportedOperation => "UnsupportedOperation",
            ErrorKind::SaveConfigFailed => "SaveConfigFailed",
            ErrorKind::CommandFailed => "CommandFailed",
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Map the error onto the public taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(TransportError::AuthenticationFailed { .. }) => {
                ErrorKind::AuthenticationFailed
            }
            Error::Transport(_) => ErrorKind::ConnectionUnavailable,
            Error::Channel(ChannelError::InvalidPattern(_)) => ErrorKind::Internal,
            Error::Channel(_) => ErrorKind::ConnectionUnavailable,
            Error::Driver(DriverError::InvalidPort { .. }) => ErrorKind::InvalidPort,
            Error::Driver(DriverError::Unsupported { .. }) => ErrorKind::UnsupportedOperation,
            Error::Driver(DriverError::InvalidRequest { .. }) => ErrorKind::InvalidRequest,
            Error::Driver(DriverError::CommandFailed { .. }) => ErrorKind::CommandFailed,
            Error::Platform(PlatformError::UnknownDevice { .. }) => ErrorKind::UnknownDevice,
            Error::Platform(_) => ErrorKind::Internal,
            Error::Parse(_) => ErrorKind::Internal,
        }
    }

    /// True when the session that produced this error should be considered
    /// broken. Only these failures are retried on another session.
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::ConnectionUnavailable
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        DriverError::InvalidRequest {
            message: message.into(),
        }
        .into()
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        ChannelError::InvalidPattern(err).into()
    }
}

/// Result type alias using netconnector's Error.
pub type Result<T> = std::result::Result<T, Error>;
