//! ZTE ZXR10 access switches (2928E, 5250 and friends).
//!
//! Ports are plain numbers and are configured from config mode with
//! `set port` commands rather than an interface view.

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, NumericPortRule, PlatformDefinition, PrivilegeLevel, SavePolicy, Script,
    TableCommand,
};

/// Platform name for ZTE ZXR10.
pub const PLATFORM_NAME: &str = "zte_zxr10";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

fn config_script(line: &str) -> Script {
    Script::new(["configure terminal", line]).with_exit(["exit"])
}

/// Create the ZTE ZXR10 platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let enable = PrivilegeLevel::new("enable", r"#\s*$", "enable")?.with_auth(r"(?i)password:\s*$")?;

    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show port brief", key("interfaces"))),
        interface_vlans: vec![TableCommand::new("show vlan", key("vlans"))],
        vlans: Some(TableCommand::new("show vlan", key("vlans"))),
        mac: Some(TableCommand::new("show mac port {port}", key("mac"))),
        mac_table: Some(TableCommand::new("show mac", key("mac"))),
        port_down: Some(config_script("set port {port} disable")),
        port_up: Some(config_script("set port {port} enable")),
        description: Some(config_script("set port {port} description {desc}")),
        description_clear: Some(config_script("clear port {port} description")),
        port_info: Some("show port {port}".into()),
        port_errors: Some("show port {port} statistics".into()),
        running_config: Some("show running-config".into()),
        ..CommandTable::default()
    };

    Ok(PlatformDefinition::new(
        PLATFORM_NAME,
        "ZTE",
        CISCO_LIKE_PROMPT,
        Arc::new(NumericPortRule::new(64)),
    )?
    .with_paging(r"--More--", " ")?
    .with_privilege(enable)
    .with_failure_pattern("%Error")
    .with_failure_pattern("Invalid input")
    .with_on_open_command("terminal length 0")
    .with_identity("show version", key("version"))
    .with_commands(commands)
    .with_save(SavePolicy::new("write").with_success(&["[OK]", "successfully"])?))
}
