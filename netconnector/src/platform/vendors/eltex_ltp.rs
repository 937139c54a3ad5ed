//! Eltex LTP GPON OLTs.
//!
//! Ports are ONTs addressed as `channel/ont`. Interfaces are the ONT state
//! lists of every GPON channel; an ONT is up when its state is `OK` and
//! administratively down when it is blocked.

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::model::InterfaceStatus;
use crate::parser::{Row, TemplateKey};
use crate::platform::{
    CommandTable, PatternPortRule, PlatformDefinition, PortCase, SavePolicy, TableCommand,
    VendorBehavior,
};

/// Platform name for Eltex LTP.
pub const PLATFORM_NAME: &str = "eltex_ltp";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

/// ONT states.
pub struct LtpBehavior;

impl VendorBehavior for LtpBehavior {
    fn interface_status(&self, row: &Row) -> InterfaceStatus {
        match row.get("oper").map(str::to_ascii_uppercase).as_deref() {
            Some("OK") => InterfaceStatus::Up,
            Some("BLOCKED") => InterfaceStatus::AdminDown,
            _ => InterfaceStatus::Down,
        }
    }
}

/// Create the Eltex LTP platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interface ont 0-7 state", key("interfaces"))),
        mac: Some(TableCommand::new("show mac interface ont {port}", key("mac"))),
        mac_table: Some(TableCommand::new("show mac", key("mac"))),
        port_info: Some("show interface ont {port} state".into()),
        port_config: Some("show interface ont {port} configuration".into()),
        running_config: Some("show running-config".into()),
        ..CommandTable::default()
    };

    Ok(PlatformDefinition::new(
        PLATFORM_NAME,
        "Eltex",
        CISCO_LIKE_PROMPT,
        Arc::new(PatternPortRule::new(r"\d+/\d+", PortCase::Keep)?),
    )?
    .with_paging(r"--More--", " ")?
    .with_failure_pattern("Unknown command")
    .with_failure_pattern("Error:")
    .with_identity("show version", key("version"))
    .with_commands(commands)
    .with_save(SavePolicy::new("save").with_success(&["saved", "successfully"])?)
    .with_behavior(Arc::new(LtpBehavior)))
}
