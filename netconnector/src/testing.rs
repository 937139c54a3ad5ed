//! Scripted in-memory terminal stream for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::channel::{Terminal, TerminalConfig};
use crate::driver::GenericDriver;
use crate::error::Result;
use crate::model::Credentials;
use crate::parser::OutputParser;
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::remote::SessionConnector;
use crate::transport::{ConnectConfig, Liveness, TerminalStream};

struct Step {
    input: String,
    replies: Vec<Vec<u8>>,
    eof: bool,
}

/// What the device side observed.
#[derive(Debug, Default)]
pub struct StreamLog {
    pub writes: Vec<String>,
    /// Writes that arrived while an earlier reply was still being delivered.
    pub overlaps: usize,
    pub closed: bool,
}

/// A fake device: every write must match the next scripted input exactly,
/// and queues that step's reply chunks for reading.
pub struct ScriptedStream {
    steps: VecDeque<Step>,
    pending: VecDeque<Vec<u8>>,
    eof_when_drained: bool,
    reply_delay: Option<Duration>,
    liveness: Liveness,
    log: Arc<Mutex<StreamLog>>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            pending: VecDeque::new(),
            eof_when_drained: false,
            reply_delay: None,
            liveness: Liveness::new(),
            log: Arc::new(Mutex::new(StreamLog::default())),
        }
    }

    /// Output available before anything is written (banner, login prompt).
    pub fn greeting<I, C>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        self.pending
            .extend(chunks.into_iter().map(|c| c.as_ref().to_vec()));
        self
    }

    pub fn eof_after_greeting(mut self) -> Self {
        self.eof_when_drained = true;
        self
    }

    /// Expect `input` next and answer with `replies`.
    pub fn on<I, C>(mut self, input: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        self.steps.push_back(Step {
            input: input.to_string(),
            replies: replies.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            eof: false,
        });
        self
    }

    /// Expect `input`, answer, then close the connection.
    pub fn on_then_eof<I, C>(mut self, input: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        self = self.on(input, replies);
        if let Some(step) = self.steps.back_mut() {
            step.eof = true;
        }
        self
    }

    /// Delay every delivered chunk.
    pub fn reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    pub fn log(&self) -> Arc<Mutex<StreamLog>> {
        self.log.clone()
    }

    pub fn liveness_handle(&self) -> Liveness {
        self.liveness.clone()
    }
}

#[async_trait]
impl TerminalStream for ScriptedStream {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data).into_owned();
        {
            let mut log = self.log.lock().unwrap();
            if !self.pending.is_empty() {
                log.overlaps += 1;
            }
            log.writes.push(text.clone());
        }
        let step = self
            .steps
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected write {text:?}: script exhausted"));
        assert_eq!(step.input, text, "device received an unexpected write");
        self.pending.extend(step.replies);
        if step.eof {
            self.eof_when_drained = true;
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(delay) = self.reply_delay {
            if !self.pending.is_empty() {
                tokio::time::sleep(delay).await;
            }
        }
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }
        if self.eof_when_drained {
            self.liveness.mark_dead();
            return Ok(None);
        }
        std::future::pending::<()>().await;
        unreachable!()
    }

    fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    async fn close(&mut self) -> Result<()> {
        self.liveness.mark_dead();
        self.log.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Builds drivers for one platform over queued scripted streams, skipping
/// the login and identification handshake.
pub struct ScriptedConnector {
    platform: Arc<PlatformDefinition>,
    streams: Mutex<VecDeque<Result<ScriptedStream>>>,
    opened: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    pub fn new(platform: &'static str, streams: Vec<Result<ScriptedStream>>) -> Arc<Self> {
        let platform = PlatformRegistry::builtin()
            .and_then(|registry| registry.get(platform))
            .unwrap_or_else(|e| panic!("unknown platform {platform}: {e}"));
        Self::with_platform(platform, streams)
    }

    /// Use a modified platform definition.
    pub fn with_platform(platform: Arc<PlatformDefinition>, streams: Vec<Result<ScriptedStream>>) -> Arc<Self> {
        Arc::new(Self {
            platform,
            streams: Mutex::new(streams.into()),
            opened: Mutex::new(vec![]),
        })
    }

    /// Addresses of every session opened so far.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionConnector for ScriptedConnector {
    async fn open(
        &self,
        address: &str,
        _config: &ConnectConfig,
        _credentials: &Credentials,
    ) -> Result<GenericDriver> {
        self.opened.lock().unwrap().push(address.to_string());
        let next = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no session scripted for {address}"));
        let stream = next?;
        let terminal = Terminal::new(address, Box::new(stream), TerminalConfig::default());
        let parser = Arc::new(OutputParser::builtin()?);
        Ok(GenericDriver::from_parts(terminal, self.platform.clone(), parser))
    }
}
