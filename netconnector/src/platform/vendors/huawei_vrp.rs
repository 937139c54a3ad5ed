//! Huawei VRP switches (S-series, Quidway).
//!
//! ```text
//! <HUAWEI>                      # user view
//! [HUAWEI]                      # system view
//! [HUAWEI-GigabitEthernet0/0/1] # interface view
//! ```

use std::sync::Arc;

use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, InterfaceNameRule, InterfaceType, PlatformDefinition, SavePolicy, Script,
    TableCommand,
};

/// Platform name for Huawei VRP.
pub const PLATFORM_NAME: &str = "huawei_vrp";

const PROMPT: &str = r"(?:^|\n)[<\[][~*]?[\w.\-/: ]+[>\]]\s*$";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

pub fn port_rule() -> InterfaceNameRule {
    InterfaceNameRule::new(vec![
        InterfaceType::new("GigabitEthernet", &["ge", "gi", "gig"], 3..=3),
        InterfaceType::new("XGigabitEthernet", &["xge"], 3..=3),
        InterfaceType::new("Ethernet", &["eth"], 3..=3),
        InterfaceType::new("Eth-Trunk", &["trunk"], 1..=1),
    ])
}

fn interface_script(lines: &[&str]) -> Script {
    let mut script = vec!["system-view", "interface {port}"];
    script.extend_from_slice(lines);
    Script::new(script).with_exit(["return"])
}

/// Create the Huawei VRP platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let commands = CommandTable {
        interfaces: Some(TableCommand::new("display interface description", key("interfaces"))),
        board_scan: None,
        interface_vlans: vec![TableCommand::new("display port vlan", key("port_vlans"))],
        vlans: Some(TableCommand::new("display vlan", key("vlans"))),
        mac: Some(TableCommand::new("display mac-address {port}", key("mac"))),
        mac_table: Some(TableCommand::new("display mac-address", key("mac"))),
        port_down: Some(interface_script(&["shutdown"])),
        port_up: Some(interface_script(&["undo shutdown"])),
        description: Some(interface_script(&["description {desc}"])),
        description_clear: Some(interface_script(&["undo description"])),
        port_info: Some("display interface {port}".into()),
        port_type: Some(TableCommand::new("display interface {port}", key("port_media"))),
        port_config: Some("display current-configuration interface {port}".into()),
        port_errors: Some("display interface {port} | include error".into()),
        running_config: Some("display current-configuration".into()),
    };

    let save = SavePolicy::new("save")
        .with_confirm(r"\[Y/N\]", "y")?
        .with_success(&["successfully"])?
        .with_busy(&["busy", "Please wait"])?;

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "Huawei", PROMPT, Arc::new(port_rule()))?
            .with_paging(r"-{2,}\s*More\s*-{2,}", " ")?
            .with_failure_pattern("Error:")
            .with_failure_pattern("Unrecognized command")
            .with_failure_pattern("Wrong parameter")
            .with_failure_pattern("Incomplete command")
            .with_on_open_command("screen-length 0 temporary")
            .with_identity("display version", key("version"))
            .with_identity("display bridge mac-address", key("bridge_mac"))
            .with_commands(commands)
            .with_save(save)
            .with_skip_interfaces(r"^(?:Vlanif|NULL|LoopBack|MEth)")?,
    )
}
