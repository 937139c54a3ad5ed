//! Privileged mode escalation.

use std::time::Duration;

use log::{debug, warn};
use regex::bytes::Regex;
use secrecy::SecretString;

use crate::channel::{CTRL_C, Expect, Terminal};
use crate::error::Result;
use crate::platform::PrivilegeLevel;

/// Enter `level` and report whether the device accepted.
///
/// A rejected or missing secret is not an error: the session falls back to
/// the prompt it had and continues unprivileged. `fallback` is the platform's
/// generic prompt.
pub(crate) async fn escalate(
    terminal: &mut Terminal,
    level: &PrivilegeLevel,
    secret: Option<&SecretString>,
    fallback: &Regex,
    timeout: Duration,
) -> Result<bool> {
    if level.requires_secret() && secret.is_none() {
        debug!("{}: no secret for '{}', staying unprivileged", terminal.host(), level.name);
        return Ok(false);
    }

    debug!("{}: entering '{}'", terminal.host(), level.name);
    terminal.send_line(&level.escalate_command).await?;

    let mut patterns = vec![&level.pattern, fallback];
    if let Some(auth) = &level.auth_prompt {
        patterns.push(auth);
    }

    let mut secret_sent = false;
    loop {
        match terminal.expect(&patterns, timeout).await? {
            Expect::Matched { index: 0, .. } => return Ok(true),
            Expect::Matched { index: 1, matched, .. } => {
                // The generic prompt also covers the privileged one.
                if level.matches(&matched) {
                    return Ok(true);
                }
                warn!("{}: '{}' rejected", terminal.host(), level.name);
                return Ok(false);
            }
            Expect::Matched { .. } => match secret {
                Some(secret) if !secret_sent => {
                    terminal.send_secret_line(secret).await?;
                    secret_sent = true;
                }
                _ => {
                    warn!("{}: secret for '{}' rejected", terminal.host(), level.name);
                    terminal.send(CTRL_C).await?;
                    let _ = terminal.expect(&[fallback], timeout).await?;
                    return Ok(false);
                }
            },
            Expect::Timeout { .. } => {
                warn!("{}: no answer to '{}'", terminal.host(), level.escalate_command);
                return Ok(false);
            }
        }
    }
}
