//! Extreme Networks ExtremeXOS switches.
//!
//! ```text
//! X440-24p.1 #
//! * X440-24p.2 #     # unsaved changes
//! ```

use std::sync::Arc;

use crate::error::Result;
use crate::parser::TemplateKey;
use crate::platform::{
    CommandTable, DefaultBehavior, NumericPortRule, PlatformDefinition, SavePolicy, Script,
    TableCommand, VendorBehavior,
};

/// Platform name for ExtremeXOS.
pub const PLATFORM_NAME: &str = "extreme_xos";

const PROMPT: &str = r"(?:^|\n)\*?\s?[\w.\-]+\.\d+\s?[#>]\s*$";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

/// Display strings may not contain spaces.
pub struct ExtremeBehavior;

impl VendorBehavior for ExtremeBehavior {
    fn sanitize_description(&self, description: &str) -> String {
        DefaultBehavior
            .sanitize_description(description)
            .replace(' ', "_")
    }
}

/// Create the ExtremeXOS platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let commands = CommandTable {
        interfaces: Some(TableCommand::new("show ports no-refresh", key("interfaces"))),
        vlans: Some(TableCommand::new("show vlan", key("vlans"))),
        mac: Some(TableCommand::new("show fdb ports {port}", key("mac"))),
        mac_table: Some(TableCommand::new("show fdb", key("mac"))),
        port_down: Some(Script::new(["disable ports {port}"])),
        port_up: Some(Script::new(["enable ports {port}"])),
        description: Some(Script::new([
            "configure ports {port} description-string {desc}",
        ])),
        description_clear: Some(Script::new([
            "unconfigure ports {port} description-string",
        ])),
        port_info: Some("show ports {port} information detail".into()),
        port_errors: Some("show ports {port} rxerrors no-refresh".into()),
        running_config: Some("show configuration".into()),
        ..CommandTable::default()
    };

    let save = SavePolicy::new("save configuration")
        .with_confirm(r"\(y/N\)", "y")?
        .with_success(&["successfully"])?;

    Ok(PlatformDefinition::new(
        PLATFORM_NAME,
        "Extreme",
        PROMPT,
        Arc::new(NumericPortRule::new(128).with_units()),
    )?
    .with_paging(r"Press <SPACE> to continue or <Q> to quit:", " ")?
    .with_failure_pattern("Invalid input detected")
    .with_failure_pattern("Error:")
    .with_on_open_command("disable clipaging")
    .with_identity("show switch", key("switch"))
    .with_commands(commands)
    .with_save(save)
    .with_behavior(Arc::new(ExtremeBehavior)))
}
