//! Interface collection over SNMP.
//!
//! The crate ships no SNMP wire implementation. A deployment provides an
//! [`SnmpWalker`] and [`SnmpCollector`] turns its table walks into
//! [`Interface`]s.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join5;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::model::{Interface, InterfaceStatus};

/// IF-MIB columns walked by the collector.
pub mod oids {
    pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
    pub const IF_ADMIN_STATUS: &str = "1.3.6.1.2.1.2.2.1.7";
    pub const IF_OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8";
    pub const IF_NAME: &str = "1.3.6.1.2.1.31.1.1.1.1";
    pub const IF_ALIAS: &str = "1.3.6.1.2.1.31.1.1.1.18";
}

/// Walks one SNMP table column.
#[async_trait]
pub trait SnmpWalker: Send + Sync {
    /// `(row index, value)` pairs under `oid`, in walk order.
    async fn walk(&self, address: &str, community: &str, oid: &str) -> Result<Vec<(u32, String)>>;
}

/// Interfaces that are not physical ports.
static PSEUDO_INTERFACE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:vlan|vl\d|vlanif|loopback|inloopback|lo\d*$|null|mgmt|meth|management|dsl|adsl|vdsl|shdsl|pstn|cpu|system|aux)",
    )
    .ok()
});

fn is_pseudo(name: &str) -> bool {
    PSEUDO_INTERFACE
        .as_ref()
        .is_some_and(|re| re.is_match(name.trim()))
}

/// Map IF-MIB admin/oper status codes.
pub fn status(admin: Option<&str>, oper: Option<&str>) -> InterfaceStatus {
    if admin.map(str::trim) == Some("2") {
        return InterfaceStatus::AdminDown;
    }
    match oper.map(str::trim) {
        Some("1") => InterfaceStatus::Up,
        Some("5") => InterfaceStatus::Dormant,
        Some("6") => InterfaceStatus::NotPresent,
        _ => InterfaceStatus::Down,
    }
}

pub struct SnmpCollector {
    walker: Arc<dyn SnmpWalker>,
}

impl SnmpCollector {
    pub fn new(walker: Arc<dyn SnmpWalker>) -> Self {
        Self { walker }
    }

    /// Physical interfaces of `address`, ordered by ifIndex.
    pub async fn interfaces(&self, address: &str, community: &str) -> Result<Vec<Interface>> {
        let walker = &self.walker;
        let (names, aliases, admin, oper, descr) = try_join5(
            walker.walk(address, community, oids::IF_NAME),
            walker.walk(address, community, oids::IF_ALIAS),
            walker.walk(address, community, oids::IF_ADMIN_STATUS),
            walker.walk(address, community, oids::IF_OPER_STATUS),
            walker.walk(address, community, oids::IF_DESCR),
        )
        .await?;

        let aliases: HashMap<u32, String> = aliases.into_iter().collect();
        let admin: HashMap<u32, String> = admin.into_iter().collect();
        let oper: HashMap<u32, String> = oper.into_iter().collect();
        let descr: HashMap<u32, String> = descr.into_iter().collect();

        let mut rows: Vec<(u32, String)> = names;
        if rows.is_empty() {
            // Old agents have no ifXTable.
            rows = descr.iter().map(|(index, d)| (*index, d.clone())).collect();
        }
        rows.sort_by_key(|(index, _)| *index);

        let interfaces: Vec<Interface> = rows
            .into_iter()
            .filter(|(index, name)| {
                !is_pseudo(name) && !descr.get(index).is_some_and(|d| is_pseudo(d))
            })
            .map(|(index, name)| Interface {
                name: name.trim().to_string(),
                status: status(
                    admin.get(&index).map(String::as_str),
                    oper.get(&index).map(String::as_str),
                ),
                description: aliases.get(&index).map(|a| a.trim().to_string()).unwrap_or_default(),
                vlans: Vec::new(),
            })
            .collect();
        debug!("{address}: {} interfaces over SNMP", interfaces.len());
        Ok(interfaces)
    }
}
