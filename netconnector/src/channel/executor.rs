//! Prompt- and pagination-aware command execution.

use std::time::Duration;

use log::{debug, warn};
use regex::bytes::Regex;

use super::patterns::echo_pattern;
use super::terminal::{Expect, Terminal};
use super::CTRL_C;
use crate::error::{ChannelError, Result};

/// What to do when the terminal prompt never shows up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Log a warning and return whatever was captured.
    #[default]
    TruncateAndLog,
    /// Fail with a channel timeout (treated as a broken session).
    Fail,
}

/// Options for a single [`execute`] call.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Prompt that ends the command's output.
    pub terminal_prompt: Regex,

    /// Pager prompt (`--More--` and friends).
    pub continuation_prompt: Option<Regex>,

    /// Keystroke that advances the pager.
    pub continuation_key: String,

    /// Marker to wait for between the echo and the output proper.
    pub pre_output_boundary: Option<Regex>,

    /// Consume the echoed command before collecting output.
    pub echo_suppression: bool,

    /// Maximum number of pages to read before interrupting.
    pub page_limit: Option<usize>,

    /// In-band questions (`[Y/N]`, file name confirmations) and the line
    /// sent back for each.
    pub answers: Vec<(Regex, String)>,

    /// Timeout for each wait.
    pub timeout: Duration,

    pub timeout_policy: TimeoutPolicy,
}

impl ExecOptions {
    pub fn new(terminal_prompt: Regex) -> Self {
        Self {
            terminal_prompt,
            continuation_prompt: None,
            continuation_key: " ".to_string(),
            pre_output_boundary: None,
            echo_suppression: true,
            page_limit: None,
            answers: Vec::new(),
            timeout: Duration::from_secs(30),
            timeout_policy: TimeoutPolicy::default(),
        }
    }

    pub fn with_continuation(mut self, prompt: Regex, key: impl Into<String>) -> Self {
        self.continuation_prompt = Some(prompt);
        self.continuation_key = key.into();
        self
    }

    pub fn with_pre_output_boundary(mut self, boundary: Regex) -> Self {
        self.pre_output_boundary = Some(boundary);
        self
    }

    pub fn with_echo_suppression(mut self, enabled: bool) -> Self {
        self.echo_suppression = enabled;
        self
    }

    pub fn with_page_limit(mut self, pages: usize) -> Self {
        self.page_limit = Some(pages);
        self
    }

    pub fn with_answer(mut self, question: Regex, reply: impl Into<String>) -> Self {
        self.answers.push((question, reply.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }
}

/// Captured output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: String,
    /// The terminal prompt never arrived and the output was truncated.
    pub timed_out: bool,
}

fn timed_out(terminal: &Terminal, command: &str, opts: &ExecOptions) -> Result<()> {
    match opts.timeout_policy {
        TimeoutPolicy::TruncateAndLog => {
            warn!(
                "{}: '{}' timed out after {:?}, returning partial output",
                terminal.host(),
                command,
                opts.timeout
            );
            Ok(())
        }
        TimeoutPolicy::Fail => Err(ChannelError::PatternTimeout(opts.timeout).into()),
    }
}

/// Send `command` and collect its output up to the terminal prompt.
///
/// The returned text excludes the echo and the final prompt and has escape
/// sequences, carriage returns and pager banners removed. Page breaks are
/// replaced by a line break.
pub async fn execute(terminal: &mut Terminal, command: &str, opts: &ExecOptions) -> Result<String> {
    execute_detailed(terminal, command, opts)
        .await
        .map(|execution| execution.output)
}

/// Like [`execute`], but reports whether the output was cut short by a timeout.
pub async fn execute_detailed(
    terminal: &mut Terminal,
    command: &str,
    opts: &ExecOptions,
) -> Result<Execution> {
    debug!("{}: execute '{}'", terminal.host(), command);
    terminal.send_line(command).await?;

    let truncated = |output: String| Execution {
        output: output.trim_start_matches('\n').to_string(),
        timed_out: true,
    };

    if opts.echo_suppression && !command.trim().is_empty() {
        let echo = echo_pattern(command).map_err(ChannelError::from)?;
        if let Expect::Timeout { before } = terminal.expect(&[&echo], opts.timeout).await? {
            timed_out(terminal, command, opts)?;
            return Ok(truncated(before));
        }
    }

    if let Some(boundary) = &opts.pre_output_boundary {
        if let Expect::Timeout { before } = terminal.expect(&[boundary], opts.timeout).await? {
            timed_out(terminal, command, opts)?;
            return Ok(truncated(before));
        }
    }

    // Index 0 is the terminal prompt, then the pager (if any), then answers.
    let mut patterns = vec![&opts.terminal_prompt];
    if let Some(more) = &opts.continuation_prompt {
        patterns.push(more);
    }
    let first_answer = patterns.len();
    patterns.extend(opts.answers.iter().map(|(question, _)| question));

    let mut output = String::new();
    let mut pages_left = opts.page_limit;
    loop {
        match terminal.expect(&patterns, opts.timeout).await? {
            Expect::Matched { index: 0, before, .. } => {
                output.push_str(&before);
                break;
            }
            Expect::Matched { index, before, matched } if index >= first_answer => {
                output.push_str(&before);
                output.push_str(&matched);
                let (_, reply) = &opts.answers[index - first_answer];
                debug!("{}: answering '{}'", terminal.host(), matched.trim());
                terminal.send_line(reply).await?;
            }
            Expect::Matched { before, .. } => {
                output.push_str(&before);
                output.push('\n');
                if let Some(left) = pages_left.as_mut() {
                    *left = left.saturating_sub(1);
                    if *left == 0 {
                        warn!(
                            "{}: page limit reached for '{}', interrupting",
                            terminal.host(),
                            command
                        );
                        terminal.send(CTRL_C).await?;
                        // Resynchronise on the prompt the interrupt produces.
                        let _ = terminal
                            .expect(&[&opts.terminal_prompt], opts.timeout)
                            .await?;
                        break;
                    }
                }
                terminal.send(&opts.continuation_key).await?;
            }
            Expect::Timeout { before } => {
                output.push_str(&before);
                timed_out(terminal, command, opts)?;
                return Ok(truncated(output));
            }
        }
    }

    Ok(Execution {
        output: output.trim_start_matches('\n').to_string(),
        timed_out: false,
    })
}
