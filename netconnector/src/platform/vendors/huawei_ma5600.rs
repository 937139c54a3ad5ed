//! Huawei MA5600/MA5800 access concentrators (DSLAM/OLT).
//!
//! Ports are `frame/slot/port`. Port state changes go through the board's
//! interface view, so the scripts split the port into `{board}` and `{index}`.
//! Commands with optional trailing parameters stop at `{ <cr>||<K> }:`,
//! which is answered with a bare newline.
//!
//! There is no chassis-wide port table: ports are listed board by board,
//! and a port's state is its line activation state.

use std::sync::Arc;

use crate::error::Result;
use crate::model::InterfaceStatus;
use crate::parser::{Row, TemplateKey};
use crate::platform::{
    BoardScan, CommandTable, PatternPortRule, PlatformDefinition, PortCase, PrivilegeLevel,
    SavePolicy, Script, TableCommand, VendorBehavior,
};

/// Platform name for Huawei MA5600.
pub const PLATFORM_NAME: &str = "huawei_ma5600";

const PROMPT: &str = r"(?:^|\n)[\w.\-]+(?:\([\w\-/]+\))?[>#]\s*$";

/// Board types with subscriber ports (xDSL and PON line cards).
const SERVICE_BOARDS: &str = r"^H\d{3}(?:AD|VD|SH|GP|EP)";

const fn key(command: &'static str) -> TemplateKey {
    TemplateKey::new(PLATFORM_NAME, command)
}

/// Line activation states.
pub struct Ma5600Behavior;

impl VendorBehavior for Ma5600Behavior {
    fn interface_status(&self, row: &Row) -> InterfaceStatus {
        match row.get("oper").map(str::to_ascii_lowercase).as_deref() {
            Some("activated") => InterfaceStatus::Up,
            Some("deactivated") => InterfaceStatus::AdminDown,
            _ => InterfaceStatus::Down,
        }
    }
}

pub fn port_rule() -> Result<PatternPortRule> {
    PatternPortRule::new(r"\d+/\d+/\d+", PortCase::Keep)
}

fn board_script(action: &str) -> Script {
    Script::new([
        "config".to_string(),
        "interface adsl {board}".to_string(),
        format!("{action} {{index}}"),
    ])
    .with_exit(["quit", "quit"])
}

/// Create the Huawei MA5600 platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let enable = PrivilegeLevel::new("enable", r"#\s*$", "enable")?;

    let boards = BoardScan::new(
        "0",
        TableCommand::new("display board {port}", key("boards")),
        SERVICE_BOARDS,
        TableCommand::new("display board {port}", key("ports")),
    )?;

    let commands = CommandTable {
        board_scan: Some(boards),
        vlans: Some(TableCommand::new("display vlan all", key("vlans"))),
        mac: Some(TableCommand::new("display mac-address port {port}", key("mac"))),
        mac_table: Some(TableCommand::new("display mac-address all", key("mac"))),
        port_down: Some(board_script("deactivate")),
        port_up: Some(board_script("activate")),
        description: Some(
            Script::new(["config", "port desc {port} description {desc}"]).with_exit(["quit"]),
        ),
        description_clear: Some(Script::new(["config", "undo port desc {port}"]).with_exit(["quit"])),
        port_info: Some("display line operation port {port}".into()),
        port_config: Some("display current-configuration port {port}".into()),
        running_config: Some("display current-configuration".into()),
        ..CommandTable::default()
    };

    let save = SavePolicy::new("save")
        .with_success(&["successfully", "complete"])?
        .with_busy(&["busy", "is being saved"])?;

    Ok(
        PlatformDefinition::new(PLATFORM_NAME, "Huawei", PROMPT, Arc::new(port_rule()?))?
            .with_paging(r"-+\s*More \( Press 'Q' to break \)\s*-+", " ")?
            .with_answer(r"\{ <cr>[^}]*\}:\s*$", "")?
            .with_privilege(enable)
            .with_failure_pattern("Unknown command")
            .with_failure_pattern("Parameter error")
            .with_failure_pattern("Failure:")
            .with_on_open_command("undo smart")
            .with_on_open_command("scroll")
            .with_identity("display version", key("version"))
            .with_commands(commands)
            .with_save(save)
            .with_behavior(Arc::new(Ma5600Behavior)),
    )
}
