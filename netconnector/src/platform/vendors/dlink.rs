//! D-Link DES/DGS managed switches.
//!
//! ```text
//! DES-3200-28:user#
//! DES-3200-28:admin#
//! ```
//!
//! The port table folds link state into a speed column ("100M/Full/None" or
//! "Link Down"), so status mapping is vendor specific.

use std::sync::Arc;

use crate::error::Result;
use crate::model::InterfaceStatus;
use crate::parser::{Row, TemplateKey};
use crate::platform::{
    CommandTable, NumericPortRule, PlatformDefinition, PrivilegeLevel, SavePolicy, Script,
    TableCommand, VendorBehavior,
};

/// Platform name for D-Link.
pub const PLATFORM_NAME: &str = "dlink";

const PROMPT: &str = r"(?:^|\n)[\w.\-:]{1,63}[#>]\s*$";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

/// D-Link status columns.
pub struct DlinkBehavior;

impl VendorBehavior for DlinkBehavior {
    fn interface_status(&self, row: &Row) -> InterfaceStatus {
        if row
            .get("admin")
            .is_some_and(|a| a.eq_ignore_ascii_case("disabled"))
        {
            return InterfaceStatus::AdminDown;
        }
        match row.get("oper") {
            Some(oper) if !oper.eq_ignore_ascii_case("link down") => InterfaceStatus::Up,
            _ => InterfaceStatus::Down,
        }
    }
}

/// Create the D-Link platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let admin = PrivilegeLevel::new("admin", r":admin#\s*$", "enable admin")?
        .with_auth(r"(?i)pass(?:word)?:\s*$")?;

    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show ports description", key("interfaces"))),
        interface_vlans: vec![TableCommand::new("show vlan", key("vlans"))],
        vlans: Some(TableCommand::new("show vlan", key("vlans"))),
        mac: Some(TableCommand::new("show fdb port {port}", key("mac"))),
        mac_table: Some(TableCommand::new("show fdb", key("mac"))),
        port_down: Some(Script::new(["config ports {port} state disable"])),
        port_up: Some(Script::new(["config ports {port} state enable"])),
        description: Some(Script::new(["config ports {port} description {desc}"])),
        description_clear: Some(Script::new(["config ports {port} clear_description"])),
        port_info: Some("show ports {port}".into()),
        port_type: Some(TableCommand::new("show ports {port} media_type", key("port_media"))),
        port_errors: Some("show error ports {port}".into()),
        running_config: Some("show config current_config".into()),
        ..CommandTable::default()
    };

    Ok(PlatformDefinition::new(
        PLATFORM_NAME,
        "D-Link",
        PROMPT,
        Arc::new(NumericPortRule::new(64).with_units()),
    )?
    .with_paging(r"(?i)SPACE n Next Page", "a")?
    .with_privilege(admin)
    .with_failure_pattern("Fail!")
    .with_failure_pattern("Invalid")
    .with_failure_pattern("Available commands:")
    .with_on_open_command("disable clipaging")
    .with_identity("show switch", key("switch"))
    .with_commands(commands)
    .with_save(SavePolicy::new("save").with_success(&["Done", "Success"])?)
    .with_behavior(Arc::new(DlinkBehavior)))
}
