//! Eltex MES access switches.

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, InterfaceNameRule, InterfaceType, PlatformDefinition, PrivilegeLevel,
    SavePolicy, Script, TableCommand,
};

/// Platform name for Eltex MES.
pub const PLATFORM_NAME: &str = "eltex_mes";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

pub fn port_rule() -> InterfaceNameRule {
    InterfaceNameRule::new(vec![
        InterfaceType::new("GigabitEthernet", &["gi", "ge"], 3..=3),
        InterfaceType::new("TenGigabitEthernet", &["te"], 3..=3),
        InterfaceType::new("FastEthernet", &["fa"], 3..=3),
        InterfaceType::new("Port-Channel", &["po"], 1..=1),
    ])
}

fn interface_script(line: &str) -> Script {
    Script::new(["configure", "interface {port}", line]).with_exit(["end"])
}

/// Create the Eltex MES platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let enable = PrivilegeLevel::new("enable", r"#\s*$", "enable")?.with_auth(r"(?i)password:\s*$")?;

    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interfaces description", key("interfaces"))),
        interface_vlans: vec![TableCommand::new("show vlan", key("vlans"))],
        vlans: Some(TableCommand::new("show vlan", key("vlans"))),
        mac: Some(TableCommand::new(
            "show mac address-table interface {port}",
            key("mac"),
        )),
        mac_table: Some(TableCommand::new("show mac address-table", key("mac"))),
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

    let save = SavePolicy::new("write")
        .with_confirm(r"\(Y/N\)", "Y")?
        .with_success(&["succeeded", "Copy succeeded"])?;

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "Eltex", CISCO_LIKE_PROMPT, Arc::new(port_rule()))?
            .with_paging(r"More: <space>", " ")?
            .with_privilege(enable)
            .with_failure_pattern("% Unrecognized command")
            .with_failure_pattern("% Wrong number of parameters")
            .with_failure_pattern("% Invalid")
            .with_on_open_command("terminal datadump")
            .with_identity("show version", key("version"))
            .with_identity("show system", key("system"))
            .with_commands(commands)
            .with_save(save)
            .with_skip_interfaces(r"^oob")?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PortRule;
    use crate::platform::vendors::test_support::{column, parse};

    #[test]
    fn test_port_rule() {
        let rule = port_rule();
        assert_eq!(rule.normalize("gi1/0/3").as_deref(), Some("GigabitEthernet 1/0/3"));
        assert_eq!(rule.normalize("Po1").as_deref(), Some("Port-Channel 1"));
    }

    #[test]
    fn test_interface_grammar() {
        let text = "\
Port      Admin Link  Description
--------  ----- ----  -----------
gi1/0/1   Up    Up    uplink
gi1/0/2   Up    Down
Po1       Up    Not Present
";
        let rows = parse(PLATFORM_NAME, "interfaces", text);
        assert_eq!(column(&rows, "name"), vec!["gi1/0/1", "gi1/0/2", "Po1"]);
        assert_eq!(column(&rows, "oper"), vec!["Up", "Down", "Not Present"]);
    }

    #[test]
    fn test_vlan_grammar_columns() {
        let text = "\
 Vlan       Name         Tagged Ports      UnTagged Ports      Created by
 ---- ----------------- ------------------ ------------------ ----------------
  1           1                            gi1/0/1-24,Po1-8         D
 20         voice        gi1/0/25          gi1/0/3                  S
";
        let rows = parse(PLATFORM_NAME, "vlans", text);
        assert_eq!(column(&rows, "vid"), vec!["1", "20"]);
        assert_eq!(column(&rows, "tagged"), vec!["", "gi1/0/25"]);
        assert_eq!(column(&rows, "untagged"), vec!["gi1/0/1-24,Po1-8", "gi1/0/3"]);
    }

    #[test]
    fn test_identity_grammars() {
        let rows = parse(PLATFORM_NAME, "version", "SW version    4.0.5.6 ( date  02-Mar-2016 time  18:00:48 )\n");
        assert_eq!(rows[0].get("version"), Some("4.0.5.6"));

        let system = "\
System Description:                       MES2124 28-port 1G Managed Switch
System MAC Address:                       a8:f9:4b:11:22:33
";
        let rows = parse(PLATFORM_NAME, "system", system);
        assert_eq!(rows[0].get("model"), Some("MES2124"));
        assert_eq!(rows[0].get("mac"), Some("a8:f9:4b:11:22:33"));
    }
}
