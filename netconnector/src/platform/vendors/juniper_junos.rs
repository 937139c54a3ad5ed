//! Juniper EX switches running Junos.
//!
//! Configuration changes are committed; there is no separate save step.

use std::sync::Arc;

use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, PatternPortRule, PlatformDefinition, PortCase, Script, TableCommand,
    VendorBehavior,
};

/// Platform name for Juniper Junos.
pub const PLATFORM_NAME: &str = "juniper_junos";

const PROMPT: &str = r"(?:^|\n)(?:\{[\w:]+\}\n)?[\w.\-@]{1,63}[>#]\s*$";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

/// Strips the `{master:0}` routing-engine banner Junos prints before prompts.
pub struct JuniperBehavior;

impl VendorBehavior for JuniperBehavior {
    fn post_process_output(&self, output: &str) -> String {
        output
            .lines()
            .filter(|line| {
                let line = line.trim();
                !(line.starts_with('{') && line.ends_with('}'))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn commit_script(line: &str) -> Script {
    Script::new(["configure", line])
        .with_exit(["commit and-quit"])
        .with_abort(["rollback", "exit configuration-mode"])
}

/// Create the Juniper Junos platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show interfaces terse", key("interfaces"))),
        vlans: Some(TableCommand::new("show vlans", key("vlans"))),
        port_down: Some(commit_script("set interfaces {port} disable")),
        port_up: Some(commit_script("delete interfaces {port} disable")),
        description: Some(commit_script("set interfaces {port} description \"{desc}\"")),
        description_clear: Some(commit_script("delete interfaces {port} description")),
        port_info: Some("show interfaces {port}".into()),
        port_config: Some("show configuration interfaces {port}".into()),
        port_errors: Some("show interfaces {port} extensive | match error".into()),
        running_config: Some("show configuration".into()),
        ..CommandTable::default()
    };

    Ok(PlatformDefinition::new(
        PLATFORM_NAME,
        "Juniper",
        PROMPT,
        Arc::new(PatternPortRule::new(
            r"(?:ge|xe|et|fe|mge)-\d+/\d+/\d+",
            PortCase::Lower,
        )?),
    )?
    .with_paging(r"---\(more[^)]*\)---", " ")?
    .with_failure_pattern("syntax error")
    .with_failure_pattern("unknown command")
    .with_failure_pattern("error:")
    .with_on_open_command("set cli screen-length 0")
    .with_identity("show version", key("version"))
    .with_identity("show chassis hardware", key("chassis"))
    .with_commands(commands)
    .with_behavior(Arc::new(JuniperBehavior)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::test_support::{column, parse};

    #[test]
    fn test_banner_lines_removed() {
        let out = JuniperBehavior.post_process_output("{master:0}\nge-0/0/1 up up\n");
        assert_eq!(out, "ge-0/0/1 up up");
    }

    #[test]
    fn test_terse_skips_logical_units() {
        let text = "\
Interface               Admin Link Proto    Local                 Remote
ge-0/0/0                up    up
ge-0/0/0.0              up    up   eth-switch
ge-0/0/1                down  down
";
        let rows = parse(PLATFORM_NAME, "interfaces", text);
        assert_eq!(column(&rows, "name"), vec!["ge-0/0/0", "ge-0/0/1"]);
        assert_eq!(column(&rows, "admin"), vec!["up", "down"]);
    }

    #[test]
    fn test_vlans_and_identity() {
        let vlans = "\
Routing instance        VLAN name             Tag          Interfaces
default-switch          default               1
default-switch          users                 10           ge-0/0/1.0*
";
        let rows = parse(PLATFORM_NAME, "vlans", vlans);
        assert_eq!(column(&rows, "name"), vec!["default", "users"]);
        assert_eq!(column(&rows, "vid"), vec!["1", "10"]);

        let version = "\
fpc0:
--------------------------------------------------------------------------
Hostname: sw1
Model: ex2200-24t-4g
Junos: 12.3R12.4
";
        let rows = parse(PLATFORM_NAME, "version", version);
        assert_eq!(rows[0].get("model"), Some("ex2200-24t-4g"));
        assert_eq!(rows[0].get("version"), Some("12.3R12.4"));
    }
}
