//! In-band login dialogue.

use std::fmt;
use std::io;
use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::channel::{Expect, Terminal};
use crate::error::{ChannelError, Error, Result, TransportError};
use crate::model::Credential;

/// Connection lifecycle as seen by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Connecting,
    Authenticating,
    ProbingSignature,
    Dispatched,
    Failed,
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginState::Connecting => "connecting",
            LoginState::Authenticating => "authenticating",
            LoginState::ProbingSignature => "probing signature",
            LoginState::Dispatched => "dispatched",
            LoginState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Shell prompt of any supported vendor: the last line ends in `>`, `#` or `]`.
pub(crate) const SHELL_PROMPT: &str = r"(?:^|\n)[^\n]{1,80}?[>#\]]\s*$";

struct Prompts {
    login: Regex,
    password: Regex,
    shell: Regex,
    press_any_key: Regex,
    rejected: Regex,
    radius_timeout: Regex,
    unreachable: Regex,
}

static PROMPTS: Lazy<std::result::Result<Prompts, regex::Error>> = Lazy::new(|| {
    Ok(Prompts {
        login: Regex::new(r"(?i)(?:user ?name|login|user)\s*:\s*$")?,
        password: Regex::new(r"(?i)pass(?:word|wd)?\s*:\s*$")?,
        shell: Regex::new(SHELL_PROMPT)?,
        press_any_key: Regex::new(r"(?i)press (?:any key|enter|return)[^\n]*$")?,
        rejected: Regex::new(
            r"(?i)login invalid|login incorrect|authentication failed|bad password|access denied|wrong password|incorrect password|username or password",
        )?,
        radius_timeout: Regex::new(r"(?i)radius[^\n]*(?:timeout|timed out|not respond|no response)")?,
        unreachable: Regex::new(r"(?i)connection refused|no route to host|host is unreachable|unable to connect")?,
    })
});

fn prompts() -> Result<&'static Prompts> {
    PROMPTS
        .as_ref()
        .map_err(|e| ChannelError::InvalidPattern(e.clone()).into())
}

/// How a dialogue on one connection ended.
#[derive(Debug)]
pub(crate) enum Dialogue {
    /// Shell reached with this candidate; `prompt` is the matched prompt.
    Shell { candidate: usize, prompt: String },
    /// The device hung up; continue with this candidate on a new connection.
    Closed { next: usize },
}

/// Drive the login dialogue starting at `candidate`.
pub(crate) async fn login(
    terminal: &mut Terminal,
    candidates: &[Credential],
    mut candidate: usize,
    timeout: Duration,
) -> Result<Dialogue> {
    let p = prompts()?;
    let patterns = [
        &p.shell,
        &p.login,
        &p.password,
        &p.press_any_key,
        &p.rejected,
        &p.radius_timeout,
        &p.unreachable,
    ];
    let host = terminal.host().to_string();
    let rejected_all = |reason: &str| -> Error {
        TransportError::AuthenticationFailed {
            host: host.clone(),
            reason: reason.to_string(),
        }
        .into()
    };

    let mut login_sent = false;
    let mut password_sent = false;
    let mut nudged = false;

    loop {
        let step = match terminal.expect(&patterns, timeout).await {
            Ok(step) => step,
            Err(Error::Channel(ChannelError::Closed)) => {
                if !login_sent && !password_sent {
                    return Err(TransportError::Disconnected.into());
                }
                debug!("{host}: connection closed during login");
                return Ok(Dialogue::Closed { next: candidate + 1 });
            }
            Err(e) => return Err(e),
        };

        match step {
            Expect::Matched { index: 0, matched, .. } => {
                return Ok(Dialogue::Shell {
                    candidate,
                    prompt: matched.trim().to_string(),
                });
            }
            Expect::Matched { index: 1, .. } => {
                if login_sent {
                    candidate += 1;
                }
                let Some(credential) = candidates.get(candidate) else {
                    return Err(rejected_all("every login was rejected"));
                };
                debug!("{host}: sending login '{}'", credential.login);
                terminal.send_line(&credential.login).await?;
                login_sent = true;
                password_sent = false;
            }
            Expect::Matched { index: 2, .. } => {
                if password_sent {
                    candidate += 1;
                }
                let Some(credential) = candidates.get(candidate) else {
                    return Err(rejected_all("every password was rejected"));
                };
                terminal.send_secret_line(&credential.password).await?;
                password_sent = true;
            }
            Expect::Matched { index: 3, .. } => {
                terminal.send_line("").await?;
            }
            Expect::Matched { index: 4 | 5, matched, .. } => {
                warn!("{host}: login rejected ({})", matched.trim());
                candidate += 1;
                if candidate >= candidates.len() {
                    return Err(rejected_all(matched.trim()));
                }
                login_sent = false;
                password_sent = false;
            }
            Expect::Matched { matched, .. } => {
                let reason = io::Error::new(io::ErrorKind::ConnectionRefused, matched.trim().to_string());
                return Err(TransportError::Io(reason).into());
            }
            Expect::Timeout { before } => {
                if !nudged {
                    // Some devices print nothing until they see a keystroke.
                    debug!("{host}: no login prompt yet, sending newline");
                    terminal.send_line("").await?;
                    nudged = true;
                    continue;
                }
                debug!("{host}: login stalled after {before:?}");
                return Err(TransportError::Timeout(timeout).into());
            }
        }
    }
}
