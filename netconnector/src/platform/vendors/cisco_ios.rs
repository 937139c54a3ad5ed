//! Cisco IOS access switches (Catalyst 2960/3750 and friends).
//!
//! ```text
//! sw1>                      # user mode
//! sw1#                      # enable mode
//! sw1(config-if)#           # interface configuration
//! ```

use std::sync::Arc;

use super::CISCO_LIKE_PROMPT;
use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, InterfaceNameRule, InterfaceType, PlatformDefinition, PrivilegeLevel, SavePolicy,
    Script, TableCommand,
};

/// Platform name for Cisco IOS.
pub const PLATFORM_NAME: &str = "cisco_ios";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

pub fn port_rule() -> InterfaceNameRule {
    InterfaceNameRule::new(vec![
        InterfaceType::new("FastEthernet", &["fa", "f"], 2..=3),
        InterfaceType::new("GigabitEthernet", &["gi", "g", "ge", "gig"], 2..=3),
        InterfaceType::new("TenGigabitEthernet", &["te", "ten"], 2..=3),
        InterfaceType::new("Port-channel", &["po", "port-channel"], 1..=1),
    ])
}

fn interface_script(lines: &[&str]) -> Script {
    let mut script = vec!["configure terminal", "interface {port}"];
    script.extend_from_slice(lines);
    Script::new(script).with_exit(["end"])
}

/// Create the Cisco IOS platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let enable = PrivilegeLevel::new("enable", r"#\s*$", "enable")?.with_auth(r"(?i)password:\s*$")?;

    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interfaces description", key("interfaces"))),
        board_scan: None,
        interface_vlans: vec![TableCommand::new("show interfaces trunk", key("trunk_vlans"))],
        vlans: Some(TableCommand::new("show vlan brief", key("vlans"))),
        mac: Some(TableCommand::new(
            "show mac address-table interface {port}",
            key("mac"),
        )),
        mac_table: Some(TableCommand::new("show mac address-table", key("mac"))),
        port_down: Some(interface_script(&["shutdown"])),
        port_up: Some(interface_script(&["no shutdown"])),
        description: Some(interface_script(&["description {desc}"])),
        description_clear: Some(interface_script(&["no description"])),
        port_info: Some("show interfaces {port}".into()),
        port_type: Some(TableCommand::new("show interfaces {port}", key("port_media"))),
        port_config: Some("show running-config interface {port}".into()),
        port_errors: Some("show interfaces {port} counters errors".into()),
        running_config: Some("show running-config".into()),
    };

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "Cisco", CISCO_LIKE_PROMPT, Arc::new(port_rule()))?
            .with_paging(r"--More--", " ")?
            .with_privilege(enable)
            .with_failure_pattern("% Invalid input")
            .with_failure_pattern("% Incomplete command")
            .with_failure_pattern("% Ambiguous command")
            .with_on_open_command("terminal length 0")
            .with_identity("show version", key("version"))
            .with_commands(commands)
            .with_save(SavePolicy::new("write memory").with_success(&["[OK]"])?)
            .with_skip_interfaces(r"^(?:Vl|Lo|Nu|Tu)\d")?,
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
        assert_eq!(rule.normalize("gi 1/0/1").as_deref(), Some("GigabitEthernet 1/0/1"));
        assert_eq!(rule.normalize("Fa0/24").as_deref(), Some("FastEthernet 0/24"));
        assert_eq!(rule.normalize("Po3").as_deref(), Some("Port-channel 3"));
        assert_eq!(rule.normalize("Vlan10"), None);
    }

    #[test]
    fn test_trunk_grammar_reads_active_section() {
        let text = "\
Port        Mode             Encapsulation  Status        Native vlan
Gi1/0/25    on               802.1q         trunking      1

Port        Vlans allowed on trunk
Gi1/0/25    1-4094

Port        Vlans allowed and active in management domain
Gi1/0/25    1,10,20,100
Gi1/0/26    1

Port        Vlans in spanning tree forwarding state and not pruned
Gi1/0/25    1,10
";
        let rows = parse(PLATFORM_NAME, "trunk_vlans", text);
        assert_eq!(column(&rows, "port"), vec!["Gi1/0/25", "Gi1/0/26"]);
        assert_eq!(column(&rows, "vlans"), vec!["1,10,20,100", "1"]);
    }

    #[test]
    fn test_vlan_and_mac_grammar() {
        let vlans = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Gi1/0/1, Gi1/0/2
10   users                            active    Gi1/0/3
1002 fddi-default                     act/unsup
";
        let rows = parse(PLATFORM_NAME, "vlans", vlans);
        assert_eq!(column(&rows, "vid"), vec!["1", "10", "1002"]);
        assert_eq!(column(&rows, "name"), vec!["default", "users", "fddi-default"]);

        let macs = "\
          Mac Address Table
-------------------------------------------

Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
  10    0011.2233.4455    DYNAMIC     Gi1/0/3
 100    aabb.ccdd.eeff    STATIC      Gi1/0/3
Total Mac Addresses for this criterion: 2
";
        let rows = parse(PLATFORM_NAME, "mac", macs);
        assert_eq!(column(&rows, "mac"), vec!["0011.2233.4455", "aabb.ccdd.eeff"]);
        assert_eq!(column(&rows, "type"), vec!["DYNAMIC", "STATIC"]);
        assert_eq!(column(&rows, "port"), vec!["Gi1/0/3", "Gi1/0/3"]);
    }
}
