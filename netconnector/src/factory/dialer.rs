//! Opening terminal streams.

use async_trait::async_trait;
use log::debug;

use crate::error::Result;
use crate::model::Credential;
use crate::transport::{ConnectConfig, Protocol, SshStream, TelnetStream, TerminalStream};

/// Opens a byte stream to a device.
///
/// SSH authenticates with `credential` during the handshake; telnet ignores
/// it and the login happens in band.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(
        &self,
        host: &str,
        config: &ConnectConfig,
        credential: &Credential,
    ) -> Result<Box<dyn TerminalStream>>;
}

/// Dials real devices over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkDialer;

#[async_trait]
impl Dialer for NetworkDialer {
    async fn dial(
        &self,
        host: &str,
        config: &ConnectConfig,
        credential: &Credential,
    ) -> Result<Box<dyn TerminalStream>> {
        debug!("{host}: dialing {:?} port {}", config.protocol, config.port());
        match config.protocol {
            Protocol::Telnet => {
                let stream = TelnetStream::connect(host, config.port(), config.connect_timeout).await?;
                Ok(Box::new(stream))
            }
            Protocol::Ssh => {
                let stream = SshStream::connect(host, config, credential).await?;
                Ok(Box::new(stream))
            }
        }
    }
}
