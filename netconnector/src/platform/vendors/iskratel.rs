//! Iskratel SI2000 DSL access nodes.

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, NumericPortRule, PlatformDefinition, SavePolicy, Script, TableCommand,
};

/// Platform name for Iskratel.
pub const PLATFORM_NAME: &str = "iskratel";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

/// Create the Iskratel platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show dsl port", key("interfaces"))),
        mac: Some(TableCommand::new(
            "show mac-address-table port {port}",
            key("mac"),
        )),
        mac_table: Some(TableCommand::new("show mac-address-table", key("mac"))),
        port_down: Some(Script::new(["set dsl port {port} disable"])),
        port_up: Some(Script::new(["set dsl port {port} enable"])),
        port_info: Some("show dsl port {port} detail".into()),
        running_config: Some("show running-config".into()),
        ..CommandTable::default()
    };

    Ok(PlatformDefinition::new(
        PLATFORM_NAME,
        "Iskratel",
        CISCO_LIKE_PROMPT,
        Arc::new(NumericPortRule::new(72)),
    )?
    .with_paging(r"--More--", " ")?
    .with_failure_pattern("Unknown command")
    .with_failure_pattern("Invalid")
    .with_identity("show version", key("version"))
    .with_commands(commands)
    .with_save(SavePolicy::new("save").with_success(&["saved"])?))
}
