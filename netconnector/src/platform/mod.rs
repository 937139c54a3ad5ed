//! Platform definitions for multi-vendor support.
//!
//! A platform is data: prompts, pagination, privilege flow, a port rule, a
//! command table with grammar keys, and a save policy. The few things that
//! cannot be expressed as data go through [`VendorBehavior`].

mod definition;
mod ports;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::{
    BoardScan, CommandTable, IdentityCommand, Paging, PlatformDefinition, SavePolicy, Script,
    TableCommand,
};
pub use ports::{
    InterfaceNameRule, InterfaceType, NumericPortRule, PatternPortRule, PortCase, PortRule,
};
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;

use crate::model::InterfaceStatus;
use crate::parser::Row;

/// Longest description a device is asked to store.
pub const MAX_DESCRIPTION_LEN: usize = 64;

/// Trait for vendor-specific behavior.
pub trait VendorBehavior: Send + Sync {
    /// Map a parsed interface row onto a status.
    ///
    /// The default reads the `admin`, `oper` and `protocol` fields; an
    /// interface whose line protocol is not up is reported down.
    fn interface_status(&self, row: &Row) -> InterfaceStatus {
        let status = InterfaceStatus::from_fields(row.get("admin"), row.get("oper").unwrap_or("down"));
        match row.get("protocol") {
            Some(protocol)
                if status == InterfaceStatus::Up
                    && !protocol.to_ascii_lowercase().starts_with("up") =>
            {
                InterfaceStatus::Down
            }
            _ => status,
        }
    }

    /// Post-process command output.
    fn post_process_output(&self, output: &str) -> String {
        output.to_string()
    }

    /// Make a description safe to send: control characters and double
    /// quotes removed, length capped.
    fn sanitize_description(&self, description: &str) -> String {
        description
            .chars()
            .filter(|c| !c.is_control() && *c != '"')
            .take(MAX_DESCRIPTION_LEN)
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Default vendor behavior implementation.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {}
