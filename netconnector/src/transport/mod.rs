//! Byte transports for device terminals.
//!
//! Both telnet and SSH are exposed as a [`TerminalStream`]: a duplex byte pipe
//! with a shared liveness flag. Everything above this layer (expect, paging,
//! login dialogues) is protocol agnostic.

pub mod config;
mod ssh;
mod telnet;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::Result;

pub use config::{ConnectConfig, HostKeyVerification, Protocol};
pub use ssh::{SshStream, offered_algorithms};
pub use telnet::{TelnetCodec, TelnetStream};

/// Duplex terminal byte stream.
#[async_trait]
pub trait TerminalStream: Send {
    /// Write raw bytes to the device.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read the next chunk of terminal data. `Ok(None)` means end of file.
    ///
    /// Must be cancel safe: callers wrap it in `tokio::time::timeout`.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>>;

    /// Handle to the liveness flag maintained by the transport.
    fn liveness(&self) -> Liveness;

    /// Close the stream. Closing twice is harmless.
    async fn close(&mut self) -> Result<()>;
}

/// Shared "transport is alive" flag.
///
/// The transport clears it on EOF, write failure or close; pools read it to
/// prune dead sessions without touching the session lock.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn mark_dead(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
