//! Interactive terminal over a [`TerminalStream`].

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};
use crate::transport::{Liveness, TerminalStream};

/// Configuration for terminal behavior.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Default timeout for expect operations.
    pub timeout: Duration,

    /// Line terminator appended by [`Terminal::send_line`].
    pub newline: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            newline: "\n".to_string(),
        }
    }
}

/// Result of [`Terminal::expect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// A pattern matched; `before` is the text preceding it.
    Matched {
        index: usize,
        before: String,
        matched: String,
    },
    /// Nothing matched in time; `before` holds everything received.
    Timeout { before: String },
}

/// Expect-style terminal session.
///
/// Semantics follow pexpect: the earliest match in the buffered text wins,
/// text before the match is returned, the match is consumed and anything
/// after it stays buffered for the next call.
pub struct Terminal {
    host: String,
    stream: Box<dyn TerminalStream>,
    buffer: PatternBuffer,
    liveness: Liveness,
    config: TerminalConfig,
}

impl Terminal {
    pub fn new(host: impl Into<String>, stream: Box<dyn TerminalStream>, config: TerminalConfig) -> Self {
        let liveness = stream.liveness();
        Self {
            host: host.into(),
            stream,
            buffer: PatternBuffer::new(),
            liveness,
            config,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Send raw text.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        trace!("{} <- {:?}", self.host, text);
        self.stream.send(text.as_bytes()).await
    }

    /// Send text followed by the line terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = String::with_capacity(line.len() + self.config.newline.len());
        data.push_str(line);
        data.push_str(&self.config.newline);
        self.send(&data).await
    }

    /// Send a password followed by the line terminator, keeping it out of the logs.
    pub async fn send_secret_line(&mut self, secret: &SecretString) -> Result<()> {
        trace!("{} <- <secret>", self.host);
        let mut data = secret.expose_secret().as_bytes().to_vec();
        data.extend_from_slice(self.config.newline.as_bytes());
        self.stream.send(&data).await
    }

    /// Wait until one of `patterns` matches or `timeout` elapses.
    ///
    /// End of file is an error; a timeout is not.
    pub async fn expect(&mut self, patterns: &[&Regex], timeout: Duration) -> Result<Expect> {
        let deadline = Instant::now() + timeout;
        self.buffer.reset_scan();
        loop {
            if let Some(m) = self.buffer.find_earliest(patterns) {
                let (before, matched) = self.buffer.consume(&m);
                return Ok(Expect::Matched {
                    index: m.index,
                    before,
                    matched,
                });
            }

            let chunk = match tokio::time::timeout_at(deadline, self.stream.recv()).await {
                Ok(chunk) => chunk?,
                Err(_) => {
                    debug!("{}: no pattern matched within {:?}", self.host, timeout);
                    return Ok(Expect::Timeout {
                        before: self.buffer.take(),
                    });
                }
            };

            match chunk {
                Some(bytes) => {
                    trace!("{} -> {:?}", self.host, String::from_utf8_lossy(&bytes));
                    self.buffer.extend(&bytes);
                }
                None => {
                    debug!("{}: stream closed", self.host);
                    self.liveness.mark_dead();
                    return Err(ChannelError::Closed.into());
                }
            }
        }
    }

    /// Drop whatever is currently buffered.
    pub fn discard_buffered(&mut self) {
        self.buffer.clear();
    }

    /// Close the underlying stream.
    pub async fn close(&mut self) -> Result<()> {
        self.liveness.mark_dead();
        self.stream.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    fn regex(p: &str) -> Regex {
        Regex::new(p).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_expect_keeps_remainder() {
        let stream = ScriptedStream::new().greeting(["Username: extra"]);
        let mut terminal = Terminal::new("sw", Box::new(stream), TerminalConfig::default());
        let result = terminal
            .expect(&[&regex("(?i)username:")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(
            result,
            Expect::Matched {
                index: 0,
                before: String::new(),
                matched: "Username:".into()
            }
        );
        let rest = terminal
            .expect(&[&regex("nothing")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(rest, Expect::Timeout { before: " extra".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_is_error() {
        let stream = ScriptedStream::new().greeting(["bye"]).eof_after_greeting();
        let mut terminal = Terminal::new("sw", Box::new(stream), TerminalConfig::default());
        let err = terminal
            .expect(&[&regex("never")], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(!terminal.is_alive());
    }
}
