//! Platform definition for vendor-specific configurations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::bytes::Regex;

use super::VendorBehavior;
use super::ports::PortRule;
use super::privilege_level::PrivilegeLevel;
use crate::channel::TimeoutPolicy;
use crate::channel::patterns::any_literal;
use crate::error::Result;
use crate::parser::TemplateKey;

/// Pager prompt and the keystroke that advances it.
#[derive(Debug, Clone)]
pub struct Paging {
    pub prompt: Regex,
    pub key: String,
}

/// A command whose output is read through a grammar.
#[derive(Debug, Clone)]
pub struct TableCommand {
    pub command: String,
    pub template: TemplateKey,
}

impl TableCommand {
    pub fn new(command: impl Into<String>, template: TemplateKey) -> Self {
        Self {
            command: command.into(),
            template,
        }
    }
}

/// Port listing for chassis devices without a single port table.
///
/// `boards` runs with `{port}` set to `frame` and yields `slot` and `board`
/// (the board type). Every board whose type matches `service` is then asked
/// for its ports with `ports`, run with `{port}` set to `frame/slot`; its rows
/// carry `num` and the status fields.
#[derive(Debug, Clone)]
pub struct BoardScan {
    pub frame: String,
    pub boards: TableCommand,
    pub service: regex::Regex,
    pub ports: TableCommand,
}

impl BoardScan {
    pub fn new(
        frame: impl Into<String>,
        boards: TableCommand,
        service: &str,
        ports: TableCommand,
    ) -> Result<Self> {
        Ok(Self {
            frame: frame.into(),
            boards,
            service: regex::Regex::new(service)?,
            ports,
        })
    }
}

/// Lines sent in order for a configuration change.
///
/// Lines may contain `{port}`, `{desc}`, `{board}` (the port without its last
/// segment) and `{index}` (the last segment).
///
/// `exit` returns the session to the mode it started in. It follows `lines`
/// and is also sent after a rejected line, unless `abort` is set, in which
/// case `abort` is sent instead.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub lines: Vec<String>,
    pub exit: Vec<String>,
    pub abort: Option<Vec<String>>,
}

fn owned<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines.into_iter().map(Into::into).collect()
}

impl Script {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: owned(lines),
            exit: Vec::new(),
            abort: None,
        }
    }

    pub fn with_exit<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exit = owned(lines);
        self
    }

    pub fn with_abort<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.abort = Some(owned(lines));
        self
    }

    /// Lines that leave the configuration mode after a rejected line.
    pub fn recovery(&self) -> &[String] {
        self.abort.as_deref().unwrap_or(&self.exit)
    }
}

/// Inventory command run during the construction handshake. The grammar may
/// yield any of `model`, `mac`, `serial` and `version`.
#[derive(Debug, Clone)]
pub struct IdentityCommand {
    pub command: String,
    pub template: TemplateKey,
}

/// Per-capability commands. A `None` means the capability is unsupported.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    pub interfaces: Option<TableCommand>,
    /// Used when `interfaces` is unset.
    pub board_scan: Option<BoardScan>,
    /// Extra grammars whose rows carry port/VLAN membership, merged into
    /// the interface list.
    pub interface_vlans: Vec<TableCommand>,
    pub vlans: Option<TableCommand>,
    pub mac: Option<TableCommand>,
    pub mac_table: Option<TableCommand>,
    pub port_down: Option<Script>,
    pub port_up: Option<Script>,
    pub description: Option<Script>,
    pub description_clear: Option<Script>,
    pub port_info: Option<String>,
    pub port_type: Option<TableCommand>,
    pub port_config: Option<String>,
    pub port_errors: Option<String>,
    pub running_config: Option<String>,
}

/// How `save_config` runs and how its output is judged.
#[derive(Debug, Clone)]
pub struct SavePolicy {
    pub command: String,
    /// Questions the save dialogue asks, with the reply for each.
    pub confirm: Vec<(Regex, String)>,
    /// Confirmation text; `None` accepts any output.
    pub success: Option<Regex>,
    /// Transient "device busy" text.
    pub busy: Option<Regex>,
    pub busy_delay: Duration,
    pub attempts: u32,
}

impl SavePolicy {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            confirm: Vec::new(),
            success: None,
            busy: None,
            busy_delay: Duration::from_secs(3),
            attempts: 3,
        }
    }

    pub fn with_confirm(mut self, question: &str, reply: impl Into<String>) -> Result<Self> {
        self.confirm.push((Regex::new(question)?, reply.into()));
        Ok(self)
    }

    pub fn with_success(mut self, markers: &[&str]) -> Result<Self> {
        self.success = Some(any_literal(markers)?);
        Ok(self)
    }

    pub fn with_busy(mut self, markers: &[&str]) -> Result<Self> {
        self.busy = Some(any_literal(markers)?);
        Ok(self)
    }

    pub fn with_busy_delay(mut self, delay: Duration) -> Self {
        self.busy_delay = delay;
        self
    }
}

/// Platform definition containing all vendor-specific configuration.
///
/// A [`GenericDriver`](crate::driver::GenericDriver) runs any definition;
/// vendors differ only in the data held here and an optional
/// [`VendorBehavior`].
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "cisco_ios", "huawei_vrp").
    pub name: String,

    /// Vendor as reported in [`DeviceInfo`](crate::model::DeviceInfo).
    pub vendor: String,

    /// Prompt of every CLI mode the driver visits.
    pub prompt: Regex,

    pub paging: Option<Paging>,

    pub page_limit: Option<usize>,

    pub echo_suppression: bool,

    pub pre_output_boundary: Option<Regex>,

    /// In-band questions answered while any command runs.
    pub answers: Vec<(Regex, String)>,

    /// Enable-mode escalation, if the platform has one.
    pub privilege: Option<PrivilegeLevel>,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    pub identity: Vec<IdentityCommand>,

    pub commands: CommandTable,

    pub port_rule: Arc<dyn PortRule>,

    pub save: Option<SavePolicy>,

    /// Interface names left out of `get_interfaces`.
    pub skip_interfaces: Option<regex::Regex>,

    pub timeout: Duration,

    pub timeout_policy: TimeoutPolicy,

    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(
        name: impl Into<String>,
        vendor: impl Into<String>,
        prompt: &str,
        port_rule: Arc<dyn PortRule>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            vendor: vendor.into(),
            prompt: Regex::new(prompt)?,
            paging: None,
            page_limit: None,
            echo_suppression: true,
            pre_output_boundary: None,
            answers: vec![],
            privilege: None,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            identity: vec![],
            commands: CommandTable::default(),
            port_rule,
            save: None,
            skip_interfaces: None,
            timeout: Duration::from_secs(30),
            timeout_policy: TimeoutPolicy::default(),
            behavior: None,
        })
    }

    pub fn with_paging(mut self, prompt: &str, key: impl Into<String>) -> Result<Self> {
        self.paging = Some(Paging {
            prompt: Regex::new(prompt)?,
            key: key.into(),
        });
        Ok(self)
    }

    pub fn with_page_limit(mut self, pages: usize) -> Self {
        self.page_limit = Some(pages);
        self
    }

    pub fn with_pre_output_boundary(mut self, boundary: &str) -> Result<Self> {
        self.pre_output_boundary = Some(Regex::new(boundary)?);
        Ok(self)
    }

    pub fn with_answer(mut self, question: &str, reply: impl Into<String>) -> Result<Self> {
        self.answers.push((Regex::new(question)?, reply.into()));
        Ok(self)
    }

    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege = Some(level);
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    pub fn with_identity(mut self, command: impl Into<String>, template: TemplateKey) -> Self {
        self.identity.push(IdentityCommand {
            command: command.into(),
            template,
        });
        self
    }

    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_save(mut self, policy: SavePolicy) -> Self {
        self.save = Some(policy);
        self
    }

    pub fn with_skip_interfaces(mut self, pattern: &str) -> Result<Self> {
        self.skip_interfaces = Some(regex::Regex::new(pattern)?);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Every grammar this platform relies on.
    pub fn template_keys(&self) -> Vec<TemplateKey> {
        let c = &self.commands;
        let tables = [&c.interfaces, &c.vlans, &c.mac, &c.mac_table, &c.port_type];
        let scan = c.board_scan.iter().flat_map(|s| [&s.boards, &s.ports]);
        tables
            .into_iter()
            .flatten()
            .chain(scan)
            .chain(c.interface_vlans.iter())
            .map(|t| t.template)
            .chain(self.identity.iter().map(|p| p.template))
            .collect()
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("vendor", &self.vendor)
            .field("prompt", &self.prompt)
            .field("paging", &self.paging)
            .field("privilege", &self.privilege)
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("commands", &self.commands)
            .field("port_rule", &self.port_rule)
            .field("save", &self.save)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}
