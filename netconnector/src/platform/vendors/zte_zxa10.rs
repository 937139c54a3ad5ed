//! ZTE ZXA10 OLTs (C300, C320).

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, PatternPortRule, PlatformDefinition, PortCase, SavePolicy, Script, TableCommand,
};

/// Platform name for ZTE ZXA10.
pub const PLATFORM_NAME: &str = "zte_zxa10";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

pub fn port_rule() -> Result<PatternPortRule> {
    PatternPortRule::new(
        r"(?:gei|xgei|gpon-olt|gpon-onu|epon-olt|epon-onu)_\d+/\d+/\d+(?::\d+)?",
        PortCase::Lower,
    )
}

fn interface_script(line: &str) -> Script {
    Script::new(["configure terminal", "interface {port}", line]).with_exit(["end"])
}

/// Create the ZTE ZXA10 platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interface brief", key("interfaces"))),
        vlans: Some(TableCommand::new("show vlan summary", key("vlans"))),
        mac: Some(TableCommand::new("show mac interface {port}", key("mac"))),
        mac_table: Some(TableCommand::new("show mac", key("mac"))),
        port_down: Some(interface_script("shutdown")),
        port_up: Some(interface_script("no shutdown")),
        description: Some(interface_script("description {desc}")),
        description_clear: Some(interface_script("no description")),
        port_info: Some("show interface {port}".into()),
        port_config: Some("show running-config interface {port}".into()),
        running_config: Some("show running-config".into()),
        ..CommandTable::default()
    };

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "ZTE", CISCO_LIKE_PROMPT, Arc::new(port_rule()?))?
            .with_paging(r"--More--", " ")?
            .with_failure_pattern("%Error")
            .with_failure_pattern("%Code")
            .with_on_open_command("terminal length 0")
            .with_identity("show system-group", key("system"))
            .with_commands(commands)
            .with_save(SavePolicy::new("write").with_success(&["[OK]", "successfully"])?),
    )
}
