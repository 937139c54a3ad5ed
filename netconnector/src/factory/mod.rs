//! Vendor factory: log in, identify the device, build its driver.
//!
//! A connection moves through [`LoginState`]s:
//!
//! ```text
//! Connecting -> Authenticating -> ProbingSignature -> Dispatched
//!      ^              |                  |
//!      +-- reconnect -+                  +-> Failed (UnknownDevice)
//! ```
//!
//! Telnet logs in band; SSH authenticates during the handshake and then
//! runs the same in-band dialogue, since some devices ask again inside the
//! shell.

mod dialer;
mod login;
mod signature;

pub use dialer::{Dialer, NetworkDialer};
pub use login::LoginState;
pub use signature::{Dispatch, VendorSignature};

use std::sync::Arc;

use log::{debug, info, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::channel::{CTRL_C, ExecOptions, Terminal, TerminalConfig, execute_detailed};
use crate::driver::{DriverBuilder, GenericDriver};
use crate::error::{Error, ErrorKind, PlatformError, Result, TransportError};
use crate::model::Credentials;
use crate::parser::OutputParser;
use crate::platform::PlatformRegistry;
use crate::transport::{ConnectConfig, Protocol};

use login::{Dialogue, SHELL_PROMPT, login};

/// Commands whose output identifies the vendor, in order.
const IDENTIFY_COMMANDS: &[&str] = &["show version", "display version"];

/// Pager prompts seen while identifying, before the vendor is known.
const IDENTIFY_PAGER: &str = r"(?i)-+\s*more[^\n]*$|SPACE n Next Page|\(q\)uit[^\n]*$";

const IDENTIFY_PAGE_LIMIT: usize = 20;

/// Builds logged-in drivers for arbitrary devices.
pub struct VendorFactory {
    registry: Arc<PlatformRegistry>,
    parser: Arc<OutputParser>,
    signature: VendorSignature,
    dialer: Arc<dyn Dialer>,
}

impl VendorFactory {
    pub fn new(registry: Arc<PlatformRegistry>, parser: Arc<OutputParser>) -> Result<Self> {
        Ok(Self {
            registry,
            parser,
            signature: VendorSignature::builtin()?,
            dialer: Arc::new(NetworkDialer),
        })
    }

    /// Factory over the built-in platforms and grammars.
    pub fn builtin() -> Result<Self> {
        let registry = PlatformRegistry::builtin()?;
        let parser = Arc::new(OutputParser::builtin()?);
        registry.validate(&parser)?;
        Self::new(registry, parser)
    }

    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = dialer;
        self
    }

    pub fn with_signature(mut self, signature: VendorSignature) -> Self {
        self.signature = signature;
        self
    }

    pub fn registry(&self) -> &Arc<PlatformRegistry> {
        &self.registry
    }

    /// Log in to `host`, identify it and build its driver.
    pub async fn connect(
        &self,
        host: &str,
        config: &ConnectConfig,
        credentials: &Credentials,
    ) -> Result<GenericDriver> {
        match self.establish(host, config, credentials).await {
            Ok(driver) => Ok(driver),
            Err(e) => {
                transition(host, LoginState::Failed);
                debug!("{host}: {e}");
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        host: &str,
        config: &ConnectConfig,
        credentials: &Credentials,
    ) -> Result<GenericDriver> {
        let candidates = credentials.candidates();
        if candidates.is_empty() {
            return Err(Error::invalid_request("no login credentials supplied"));
        }

        let mut candidate = 0;
        let (mut terminal, prompt) = loop {
            let Some(credential) = candidates.get(candidate) else {
                return Err(TransportError::AuthenticationFailed {
                    host: host.to_string(),
                    reason: format!("{} credential(s) rejected", candidates.len()),
                }
                .into());
            };

            transition(host, LoginState::Connecting);
            let stream = match self.dialer.dial(host, config, credential).await {
                Ok(stream) => stream,
                Err(e) if config.protocol == Protocol::Ssh && e.kind() == ErrorKind::AuthenticationFailed => {
                    warn!("{host}: SSH login '{}' rejected", credential.login);
                    candidate += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let mut terminal = Terminal::new(
                host,
                stream,
                TerminalConfig {
                    timeout: config.login_timeout,
                    ..TerminalConfig::default()
                },
            );

            transition(host, LoginState::Authenticating);
            match login(&mut terminal, candidates, candidate, config.login_timeout).await? {
                Dialogue::Shell { candidate: used, prompt } => {
                    debug!("{host}: logged in as '{}'", candidates[used].login);
                    break (terminal, prompt);
                }
                Dialogue::Closed { next } => {
                    let _ = terminal.close().await;
                    candidate = next;
                }
            }
        };

        transition(host, LoginState::ProbingSignature);
        let platform_name = self.identify(&mut terminal, &prompt, config).await?;
        let platform = self.registry.get(&platform_name)?;
        terminal.discard_buffered();

        transition(host, LoginState::Dispatched);
        info!("{host}: identified as {platform_name}");
        DriverBuilder::new(terminal, platform, self.parser.clone())
            .secret(credentials.secret().map(|s| SecretString::from(s.expose_secret().to_owned())))
            .build()
            .await
    }

    /// Run the identifying commands until a signature matches.
    async fn identify(&self, terminal: &mut Terminal, prompt: &str, config: &ConnectConfig) -> Result<String> {
        let opts = ExecOptions::new(Regex::new(SHELL_PROMPT)?)
            .with_continuation(Regex::new(IDENTIFY_PAGER)?, " ")
            .with_page_limit(IDENTIFY_PAGE_LIMIT)
            .with_timeout(config.login_timeout);

        for command in IDENTIFY_COMMANDS {
            // The prompt often names the model (DES-3200-28:admin#).
            let mut transcript = identify_with(terminal, command, &opts).await?;
            transcript.push('\n');
            transcript.push_str(prompt);

            let mut table = &self.signature;
            loop {
                match table.evaluate(&transcript) {
                    Some(Dispatch::Platform(name)) => return Ok(name.clone()),
                    Some(Dispatch::Refine { command, signature }) => {
                        debug!("{}: refining with '{command}'", terminal.host());
                        transcript = identify_with(terminal, command, &opts).await?;
                        table = signature;
                    }
                    None => break,
                }
            }
        }

        Err(PlatformError::UnknownDevice {
            host: terminal.host().to_string(),
        }
        .into())
    }
}

/// Run one identifying command; one that never returns to the prompt is
/// interrupted.
async fn identify_with(terminal: &mut Terminal, command: &str, opts: &ExecOptions) -> Result<String> {
    let execution = execute_detailed(terminal, command, opts).await?;
    if execution.timed_out {
        terminal.send(CTRL_C).await?;
        let _ = terminal.expect(&[&opts.terminal_prompt], opts.timeout).await?;
    }
    Ok(execution.output)
}

fn transition(host: &str, state: LoginState) {
    debug!("{host}: {state}");
}
