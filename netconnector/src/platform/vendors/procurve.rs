//! HP ProCurve / Aruba 2500-series switches.

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, PatternPortRule, PlatformDefinition, PortCase, PrivilegeLevel, SavePolicy,
    Script, TableCommand,
};

/// Platform name for HP ProCurve.
pub const PLATFORM_NAME: &str = "procurve";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

pub fn port_rule() -> Result<PatternPortRule> {
    PatternPortRule::new(r"(?i)[a-z]?\d+|trk\d+", PortCase::Keep)
}

fn config_script(line: &str) -> Script {
    Script::new(["configure", line]).with_exit(["end"])
}

/// Create the ProCurve platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let manager = PrivilegeLevel::new("manager", r"#\s*$", "enable")?.with_auth(r"(?i)password:\s*$")?;

    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interfaces brief", key("interfaces"))),
        vlans: Some(TableCommand::new("show vlans", key("vlans"))),
        mac: Some(TableCommand::new("show mac-address {port}", key("mac"))),
        port_down: Some(config_script("interface {port} disable")),
        port_up: Some(config_script("interface {port} enable")),
        description: Some(config_script("interface {port} name \"{desc}\"")),
        description_clear: Some(config_script("no interface {port} name")),
        port_info: Some("show interfaces {port}".into()),
        port_config: Some("show running-config interface {port}".into()),
        port_errors: Some("show interfaces {port} | include [Ee]rror|[Dd]rop".into()),
        running_config: Some("show running-config".into()),
        ..CommandTable::default()
    };

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "HP", CISCO_LIKE_PROMPT, Arc::new(port_rule()?))?
            .with_paging(r"-- MORE --, next page: Space", " ")?
            .with_answer(r"Press any key to continue", "")?
            .with_privilege(manager)
            .with_failure_pattern("Invalid input:")
            .with_on_open_command("no page")
            .with_identity("show system", key("system"))
            .with_commands(commands)
            .with_save(SavePolicy::new("write memory")),
    )
}
