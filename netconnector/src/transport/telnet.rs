//! Telnet transport over a plain TCP stream.
//!
//! Only the minimum of RFC 854 option negotiation is implemented: the client
//! lets the server echo and suppress go-ahead, and refuses everything else.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use log::{debug, trace};
use memchr::memchr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{Liveness, TerminalStream};
use crate::error::{Result, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_ECHO: u8 = 1;
const OPT_SGA: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Incremental telnet decoder.
///
/// Command sequences may be split across reads, so the decoder keeps its state
/// between calls.
#[derive(Debug)]
pub struct TelnetCodec {
    state: State,
    remote_enabled: [bool; 256],
    local_enabled: [bool; 256],
}

impl TelnetCodec {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            remote_enabled: [false; 256],
            local_enabled: [false; 256],
        }
    }

    /// Split `input` into terminal data and negotiation replies.
    pub fn decode(&mut self, input: &[u8], data: &mut BytesMut, replies: &mut BytesMut) {
        let mut rest = input;
        while !rest.is_empty() {
            match self.state {
                State::Data => match memchr(IAC, rest) {
                    Some(pos) => {
                        data.extend_from_slice(&rest[..pos]);
                        rest = &rest[pos + 1..];
                        self.state = State::Iac;
                    }
                    None => {
                        data.extend_from_slice(rest);
                        rest = &[];
                    }
                },
                State::Iac => {
                    let byte = rest[0];
                    rest = &rest[1..];
                    self.state = match byte {
                        IAC => {
                            data.put_u8(IAC);
                            State::Data
                        }
                        DO | DONT | WILL | WONT => State::Negotiate(byte),
                        SB => State::Sub,
                        _ => State::Data,
                    };
                }
                State::Negotiate(command) => {
                    let option = rest[0];
                    rest = &rest[1..];
                    if let Some(reply) = self.negotiate(command, option) {
                        replies.extend_from_slice(&[IAC, reply, option]);
                    }
                    self.state = State::Data;
                }
                State::Sub => match memchr(IAC, rest) {
                    Some(pos) => {
                        rest = &rest[pos + 1..];
                        self.state = State::SubIac;
                    }
                    None => rest = &[],
                },
                State::SubIac => {
                    let byte = rest[0];
                    rest = &rest[1..];
                    self.state = if byte == SE { State::Data } else { State::Sub };
                }
            }
        }
    }

    fn negotiate(&mut self, command: u8, option: u8) -> Option<u8> {
        let idx = option as usize;
        match command {
            WILL if matches!(option, OPT_ECHO | OPT_SGA) => {
                if self.remote_enabled[idx] {
                    None
                } else {
                    self.remote_enabled[idx] = true;
                    Some(DO)
                }
            }
            WILL => Some(DONT),
            DO if option == OPT_SGA => {
                if self.local_enabled[idx] {
                    None
                } else {
                    self.local_enabled[idx] = true;
                    Some(WILL)
                }
            }
            DO => Some(WONT),
            WONT => {
                self.remote_enabled[idx] = false;
                None
            }
            DONT => {
                self.local_enabled[idx] = false;
                None
            }
            _ => None,
        }
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Double every IAC byte in outgoing data.
fn escape_iac(data: &[u8]) -> Cow<'_, [u8]> {
    if memchr(IAC, data).is_none() {
        return Cow::Borrowed(data);
    }
    let mut out = Vec::with_capacity(data.len() + 8);
    for &byte in data {
        out.push(byte);
        if byte == IAC {
            out.push(IAC);
        }
    }
    Cow::Owned(out)
}

/// Telnet terminal stream.
pub struct TelnetStream<S = TcpStream> {
    io: S,
    codec: TelnetCodec,
    read_buf: Vec<u8>,
    liveness: Liveness,
    closed: bool,
}

impl TelnetStream<TcpStream> {
    /// Open a TCP connection to `host:port`.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        debug!("telnet connect to {host}:{port}");
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|source| TransportError::ConnectionFailed {
                host: host.to_string(),
                port,
                source,
            })?;
        stream.set_nodelay(true).map_err(TransportError::Io)?;
        Ok(Self::new(stream))
    }
}

impl<S> TelnetStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected byte stream.
    pub fn new(io: S) -> Self {
        Self {
            io,
            codec: TelnetCodec::new(),
            read_buf: vec![0; 4096],
            liveness: Liveness::new(),
            closed: false,
        }
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let result = async {
            self.io.write_all(data).await?;
            self.io.flush().await
        }
        .await;
        if let Err(e) = result {
            self.liveness.mark_dead();
            return Err(TransportError::Io(e).into());
        }
        Ok(())
    }
}

#[async_trait]
impl<S> TerminalStream for TelnetStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Disconnected.into());
        }
        let escaped = escape_iac(data).into_owned();
        self.write_raw(&escaped).await
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let n = match self.io.read(&mut self.read_buf).await {
                Ok(0) => {
                    debug!("telnet peer closed the connection");
                    self.liveness.mark_dead();
                    return Ok(None);
                }
                Ok(n) => n,
                Err(e) => {
                    self.liveness.mark_dead();
                    return Err(TransportError::Io(e).into());
                }
            };

            let mut data = BytesMut::with_capacity(n);
            let mut replies = BytesMut::new();
            self.codec
                .decode(&self.read_buf[..n], &mut data, &mut replies);

            if !replies.is_empty() {
                trace!("telnet negotiation reply {:?}", &replies[..]);
                self.write_raw(&replies).await?;
            }
            if !data.is_empty() {
                return Ok(Some(data.to_vec()));
            }
        }
    }

    fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.liveness.mark_dead();
        // The peer may already be gone; shutdown errors are not interesting.
        let _ = self.io.shutdown().await;
        Ok(())
    }
}
