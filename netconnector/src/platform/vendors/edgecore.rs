//! Edge-Core ECS access switches.

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, InterfaceNameRule, InterfaceType, PlatformDefinition, PrivilegeLevel,
    SavePolicy, Script, TableCommand,
};

/// Platform name for Edge-Core.
pub const PLATFORM_NAME: &str = "edgecore";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

/// `Eth 1/ 5`, `e1/5` and a bare `1/5` all name `Ethernet 1/5`.
pub fn port_rule() -> InterfaceNameRule {
    InterfaceNameRule::new(vec![InterfaceType::new("Ethernet", &["eth", "e"], 2..=2)])
        .with_default_type(0)
}

fn interface_script(line: &str) -> Script {
    Script::new(["configure", "interface {port}", line]).with_exit(["end"])
}

/// Create the Edge-Core platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let enable = PrivilegeLevel::new("enable", r"#\s*$", "enable")?.with_auth(r"(?i)password:\s*$")?;

    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interfaces brief", key("interfaces"))),
        mac: Some(TableCommand::new(
            "show mac-address-table interface {port}",
            key("mac"),
        )),
        mac_table: Some(TableCommand::new("show mac-address-table", key("mac"))),
        port_down: Some(interface_script("shutdown")),
        port_up: Some(interface_script("no shutdown")),
        description: Some(interface_script("description {desc}")),
        description_clear: Some(interface_script("no description")),
        port_info: Some("show interfaces status {port}".into()),
        port_config: Some("show running-config interface {port}".into()),
        port_errors: Some("show interfaces counters {port}".into()),
        running_config: Some("show running-config".into()),
        ..CommandTable::default()
    };

    let save = SavePolicy::new("copy running-config startup-config")
        .with_confirm(r"(?i)file name\s*\[[^\]]*\]\s*:?\s*$", "")?
        .with_success(&["Success", "Write to FLASH finish"])?;

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "Edge-Core", CISCO_LIKE_PROMPT, Arc::new(port_rule()))?
            .with_paging(r"---More---", " ")?
            .with_privilege(enable)
            .with_failure_pattern("% Invalid")
            .with_failure_pattern("% Incomplete")
            .with_on_open_command("terminal length 0")
            .with_identity("show system", key("system"))
            .with_identity("show version", key("version"))
            .with_commands(commands)
            .with_save(save),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PortRule;
    use crate::platform::vendors::test_support::{column, parse};

    #[test]
    fn test_interface_brief_keeps_spaced_names() {
        let text = "\
Interface Name         Status     PVID Pri Speed/Duplex  Type         Trunk
--------- ------------ ---------- ---- --- ------------- ------------ -----
Eth 1/ 1  uplink       Up            1   0 Auto-1000full 1000BASE-T   None
Eth 1/ 2               Down         10   0 Auto          1000BASE-T   None
";
        let rows = parse(PLATFORM_NAME, "interfaces", text);
        assert_eq!(column(&rows, "name"), vec!["Eth 1/ 1", "Eth 1/ 2"]);
        assert_eq!(column(&rows, "desc"), vec!["uplink", ""]);
        assert_eq!(column(&rows, "pvid"), vec!["1", "10"]);
        assert_eq!(port_rule().normalize(rows[0].get("name").unwrap()).as_deref(), Some("Ethernet 1/1"));
    }

    #[test]
    fn test_mac_grammar() {
        let text = "\
 Interface MAC Address       VLAN Type
 --------- ----------------- ---- -----------------
  Eth 1/ 1 00-11-22-33-44-55    1 Learned
";
        let rows = parse(PLATFORM_NAME, "mac", text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("port"), Some("Eth 1/ 1"));
        assert_eq!(rows[0].get("vlan"), Some("1"));
    }

    #[test]
    fn test_identity_grammars() {
        let system = "\
 System Description       : ECS3510-28T
 MAC Address (Unit 1)     : 00-11-22-33-44-55
";
        let rows = parse(PLATFORM_NAME, "system", system);
        assert_eq!(rows[0].get("model"), Some("ECS3510-28T"));
        assert_eq!(rows[0].get("mac"), Some("00-11-22-33-44-55"));

        let version = "\
 Serial Number           : EC1234567
 Operation Code Version  : 1.5.2.3
";
        let rows = parse(PLATFORM_NAME, "version", version);
        assert_eq!(rows[0].get("serial"), Some("EC1234567"));
        assert_eq!(rows[0].get("version"), Some("1.5.2.3"));
    }
}
