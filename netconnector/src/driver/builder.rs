//! Builder for drivers.

use std::sync::Arc;

use log::{debug, info, warn};
use secrecy::SecretString;

use super::generic::GenericDriver;
use super::privilege::escalate;
use crate::channel::Terminal;
use crate::error::Result;
use crate::model::normalize_mac;
use crate::parser::OutputParser;
use crate::platform::PlatformDefinition;

/// Runs the construction handshake on a logged-in terminal.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use netconnector::channel::Terminal;
/// # use netconnector::driver::DriverBuilder;
/// # use netconnector::parser::OutputParser;
/// # use netconnector::platform::PlatformRegistry;
/// # async fn example(terminal: Terminal) -> netconnector::Result<()> {
/// let platform = PlatformRegistry::builtin()?.get("cisco_ios")?;
/// let parser = Arc::new(OutputParser::builtin()?);
/// let driver = DriverBuilder::new(terminal, platform, parser)
///     .secret(None)
///     .build()
///     .await?;
/// println!("{:?}", driver.info());
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    terminal: Terminal,
    platform: Arc<PlatformDefinition>,
    parser: Arc<OutputParser>,
    secret: Option<SecretString>,
}

impl DriverBuilder {
    pub fn new(terminal: Terminal, platform: Arc<PlatformDefinition>, parser: Arc<OutputParser>) -> Self {
        Self {
            terminal,
            platform,
            parser,
            secret: None,
        }
    }

    /// Privileged mode secret.
    pub fn secret(mut self, secret: Option<SecretString>) -> Self {
        self.secret = secret;
        self
    }

    /// Enter privileged mode, run the on-open commands and read the
    /// device identity.
    pub async fn build(self) -> Result<GenericDriver> {
        let Self {
            terminal,
            platform,
            parser,
            secret,
        } = self;
        let mut driver = GenericDriver::from_parts(terminal, platform.clone(), parser);

        if let Some(level) = &platform.privilege {
            let privileged = escalate(
                driver.terminal_mut(),
                level,
                secret.as_ref(),
                &platform.prompt,
                platform.timeout,
            )
            .await?;
            driver.set_privileged(privileged);
        }

        for command in &platform.on_open_commands {
            driver.run(command).await?;
        }

        let mut info = driver.info().clone();
        for identity in &platform.identity {
            let output = driver.run(&identity.command).await?;
            let rows = match driver.parser().parse(&identity.template, &output) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("{}: '{}' not understood: {e}", driver.host(), identity.command);
                    continue;
                }
            };
            for row in &rows {
                fill(&mut info.model, row.get("model"));
                fill(&mut info.serial, row.get("serial"));
                fill(&mut info.os_version, row.get("version"));
                if let Some(mac) = row.get("mac").filter(|m| !m.is_empty()) {
                    fill(&mut info.mac, Some(&normalize_mac(mac).unwrap_or_else(|| mac.to_string())));
                }
            }
        }
        debug!("{}: identity {:?}", driver.host(), info);
        info!(
            "{}: {} {} ready (privileged: {})",
            driver.host(),
            info.vendor,
            info.model,
            driver.is_privileged()
        );
        driver.set_info(info);
        Ok(driver)
    }
}

/// First non-empty value wins.
fn fill(slot: &mut String, value: Option<&str>) {
    if slot.is_empty() {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *slot = value.to_string();
        }
    }
}
