//! Generic driver implementation that works with any platform.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::channel::{ExecOptions, Terminal, execute};
use crate::error::{DriverError, Result};
use crate::model::DeviceInfo;
use crate::parser::{OutputParser, Row};
use crate::platform::{DefaultBehavior, PlatformDefinition, Script, TableCommand, VendorBehavior};
use crate::transport::Liveness;

/// Driver that runs any [`PlatformDefinition`].
///
/// Owns the terminal of one logged-in session. Vendors differ only in the
/// platform data and the optional [`VendorBehavior`] hook.
pub struct GenericDriver {
    terminal: Terminal,

    platform: Arc<PlatformDefinition>,

    behavior: Arc<dyn VendorBehavior>,

    parser: Arc<OutputParser>,

    /// Executor options derived from the platform.
    exec: ExecOptions,

    info: DeviceInfo,

    /// Whether the privileged mode was entered.
    privileged: bool,
}

impl fmt::Debug for GenericDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericDriver")
            .field("host", &self.host())
            .field("platform", &self.platform.name)
            .field("info", &self.info)
            .field("privileged", &self.privileged)
            .finish_non_exhaustive()
    }
}

impl GenericDriver {
    pub(crate) fn from_parts(
        terminal: Terminal,
        platform: Arc<PlatformDefinition>,
        parser: Arc<OutputParser>,
    ) -> Self {
        let behavior = platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior));

        let mut exec = ExecOptions::new(platform.prompt.clone())
            .with_echo_suppression(platform.echo_suppression)
            .with_timeout(platform.timeout)
            .with_timeout_policy(platform.timeout_policy);
        if let Some(paging) = &platform.paging {
            exec = exec.with_continuation(paging.prompt.clone(), paging.key.clone());
        }
        if let Some(pages) = platform.page_limit {
            exec = exec.with_page_limit(pages);
        }
        if let Some(boundary) = &platform.pre_output_boundary {
            exec = exec.with_pre_output_boundary(boundary.clone());
        }
        for (question, reply) in &platform.answers {
            exec = exec.with_answer(question.clone(), reply.clone());
        }

        let info = DeviceInfo {
            vendor: platform.vendor.clone(),
            ..DeviceInfo::default()
        };

        Self {
            terminal,
            platform,
            behavior,
            parser,
            exec,
            info,
            privileged: false,
        }
    }

    pub fn host(&self) -> &str {
        self.terminal.host()
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub(crate) fn platform_arc(&self) -> Arc<PlatformDefinition> {
        self.platform.clone()
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn is_alive(&self) -> bool {
        self.terminal.is_alive()
    }

    pub fn liveness(&self) -> Liveness {
        self.terminal.liveness()
    }

    pub(crate) fn behavior(&self) -> &Arc<dyn VendorBehavior> {
        &self.behavior
    }

    pub(crate) fn exec_options(&self) -> &ExecOptions {
        &self.exec
    }

    pub(crate) fn terminal_mut(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    pub(crate) fn set_privileged(&mut self, privileged: bool) {
        self.privileged = privileged;
    }

    pub(crate) fn set_info(&mut self, info: DeviceInfo) {
        self.info = info;
    }

    /// Run a command and return its post-processed output.
    pub async fn run(&mut self, command: &str) -> Result<String> {
        let exec = self.exec.clone();
        self.run_with(command, &exec).await
    }

    pub(crate) async fn run_with(&mut self, command: &str, opts: &ExecOptions) -> Result<String> {
        let output = execute(&mut self.terminal, command, opts).await?;
        Ok(self.behavior.post_process_output(&output))
    }

    /// Run a command, failing if its output contains one of the platform's
    /// failure markers.
    pub async fn run_checked(&mut self, command: &str) -> Result<String> {
        let output = self.run(command).await?;
        if let Some(marker) = self
            .platform
            .failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
        {
            return Err(DriverError::CommandFailed {
                command: command.to_string(),
                message: marker.clone(),
            }
            .into());
        }
        Ok(output)
    }

    /// Run a table command (with `{port}` filled in) through its grammar.
    pub(crate) async fn run_table(&mut self, table: &TableCommand, port: &str) -> Result<Vec<Row>> {
        let command = render(&table.command, port, "");
        let output = self.run(&command).await?;
        self.parser.parse(&table.template, &output)
    }

    /// Send every line of a configuration script, stopping at the first
    /// rejected line.
    ///
    /// A rejected line is followed by the script's recovery lines so the
    /// session is back at its starting prompt before the error is returned.
    /// If recovery itself fails, that error is returned instead.
    pub(crate) async fn run_script(&mut self, script: &Script, port: &str, description: &str) -> Result<String> {
        info!("{}: configuring {port} on {}", self.host(), self.platform.name);
        let mut transcript = Vec::with_capacity(script.lines.len() + script.exit.len());
        let lines = script
            .lines
            .iter()
            .map(|line| render(line, port, description))
            .chain(script.exit.iter().cloned());
        for line in lines {
            match self.run_checked(&line).await {
                Ok(output) => transcript.push(output),
                Err(e) if e.is_transport() => return Err(e),
                Err(e) => {
                    warn!("{}: '{line}' rejected, leaving configuration mode", self.host());
                    for recovery in script.recovery() {
                        self.run(recovery).await?;
                    }
                    return Err(e);
                }
            }
        }
        Ok(transcript
            .into_iter()
            .filter(|out| !out.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    pub(crate) fn parser(&self) -> &OutputParser {
        &self.parser
    }

    /// Close the session.
    pub async fn close(&mut self) -> Result<()> {
        debug!("{}: closing session", self.host());
        self.terminal.close().await
    }
}

/// Fill the `{port}`, `{desc}`, `{board}` and `{index}` placeholders in one
/// pass; substituted text is never expanded again.
pub(crate) fn render(template: &str, port: &str, description: &str) -> String {
    let (board, index) = port.rsplit_once('/').unwrap_or(("", port));
    let placeholders = [
        ("{port}", port),
        ("{desc}", description),
        ("{board}", board),
        ("{index}", index),
    ];
    let mut out = String::with_capacity(template.len() + port.len() + description.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_placeholders() {
        assert_eq!(
            render("interface {port}", "GigabitEthernet 1/0/1", ""),
            "interface GigabitEthernet 1/0/1"
        );
        assert_eq!(render("interface adsl {board}", "0/2/7", ""), "interface adsl 0/2");
        assert_eq!(render("deactivate {index}", "0/2/7", ""), "deactivate 7");
        assert_eq!(
            render("config ports {port} description {desc}", "5", "client 5"),
            "config ports 5 description client 5"
        );
    }

    #[test]
    fn test_render_leaves_description_alone() {
        assert_eq!(
            render("port desc {port} description {desc}", "0/2/7", "see {index} {port}"),
            "port desc 0/2/7 description see {index} {port}"
        );
        assert_eq!(render("set {unknown} {port}", "3", ""), "set {unknown} 3");
    }
}
