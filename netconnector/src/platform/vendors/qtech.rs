//! Qtech QSW access switches.

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, InterfaceNameRule, InterfaceType, PlatformDefinition, PrivilegeLevel,
    SavePolicy, Script, TableCommand,
};

/// Platform name for Qtech.
pub const PLATFORM_NAME: &str = "qtech";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

pub fn port_rule() -> InterfaceNameRule {
    InterfaceNameRule::new(vec![InterfaceType::new("Ethernet", &["eth", "e"], 3..=3)])
        .with_default_type(0)
}

fn interface_script(line: &str) -> Script {
    Script::new(["config", "interface {port}", line]).with_exit(["end"])
}

/// Create the Qtech platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let enable = PrivilegeLevel::new("enable", r"#\s*$", "enable")?.with_auth(r"(?i)password:\s*$")?;

    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interface ethernet status", key("interfaces"))),
        vlans: Some(TableCommand::new("show vlan", key("vlans"))),
        mac: Some(TableCommand::new(
            "show mac-address-table interface {port}",
            key("mac"),
        )),
        mac_table: Some(TableCommand::new("show mac-address-table", key("mac"))),
        port_down: Some(interface_script("shutdown")),
        port_up: Some(interface_script("no shutdown")),
        description: Some(interface_script("description {desc}")),
        description_clear: Some(interface_script("no description")),
        port_info: Some("show interface {port}".into()),
        port_config: Some("show running-config interface {port}".into()),
        running_config: Some("show running-config".into()),
        ..CommandTable::default()
    };

    let save = SavePolicy::new("write")
        .with_confirm(r"\[Y/N\]", "y")?
        .with_success(&["successful", "OK"])?;

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "Qtech", CISCO_LIKE_PROMPT, Arc::new(port_rule()))?
            .with_paging(r"--More--", " ")?
            .with_privilege(enable)
            .with_failure_pattern("% Invalid input")
            .with_failure_pattern("% Incomplete command")
            .with_on_open_command("terminal length 0")
            .with_identity("show version", key("version"))
            .with_commands(commands)
            .with_save(save),
    )
}
