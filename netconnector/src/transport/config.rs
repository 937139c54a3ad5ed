//! Connection configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Command-line protocol used to reach a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Telnet,
    Ssh,
}

impl Protocol {
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Telnet => 23,
            Protocol::Ssh => 22,
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telnet" => Ok(Protocol::Telnet),
            "ssh" => Ok(Protocol::Ssh),
            other => Err(Error::invalid_request(format!(
                "unknown command protocol '{other}'"
            ))),
        }
    }
}

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Accept and learn unknown keys, reject changed keys.
    AcceptNew,

    /// Accept all keys without checking.
    #[default]
    Disabled,
}

/// Transport-level connection settings.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Protocol to dial.
    pub protocol: Protocol,

    /// Port override; defaults to the protocol's well-known port.
    pub port: Option<u16>,

    /// TCP connect + SSH handshake timeout.
    pub connect_timeout: Duration,

    /// Timeout for each step of the login dialogue.
    pub login_timeout: Duration,

    /// Terminal width requested for SSH PTYs.
    pub terminal_width: u32,

    /// Terminal height requested for SSH PTYs.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl ConnectConfig {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            ..Default::default()
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Telnet,
            port: None,
            connect_timeout: Duration::from_secs(10),
            login_timeout: Duration::from_secs(15),
            terminal_width: 200,
            terminal_height: 48,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}
