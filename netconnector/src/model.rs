//! Vendor-independent data model returned by drivers.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// One login/password candidate.
#[derive(Debug)]
pub struct Credential {
    pub login: String,
    pub password: SecretString,
}

impl Credential {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self {
            login: self.login.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
        }
    }
}

/// Ordered credential candidates plus the privilege-mode secret.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    candidates: Vec<Credential>,
    secret: Option<Credential>,
}

impl Credentials {
    pub fn new(candidates: Vec<Credential>) -> Self {
        Self {
            candidates,
            secret: None,
        }
    }

    /// Single login/password pair.
    pub fn single(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(vec![Credential::new(login, password)])
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.secret = if secret.is_empty() {
            None
        } else {
            Some(Credential::new(String::new(), secret))
        };
        self
    }

    pub fn candidates(&self) -> &[Credential] {
        &self.candidates
    }

    pub fn secret(&self) -> Option<&SecretString> {
        self.secret.as_ref().map(|c| &c.password)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Operational status of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceStatus {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "admin_down")]
    AdminDown,
    #[serde(rename = "notPresent")]
    NotPresent,
    #[serde(rename = "dormant")]
    Dormant,
}

const ADMIN_DOWN_WORDS: &[&str] = &[
    "down",
    "disabled",
    "disable",
    "no",
    "d",
    "admin down",
    "administratively down",
    "*down",
    "a-down",
    "shutdown",
];

impl InterfaceStatus {
    /// Map vendor admin/oper columns onto the five statuses.
    ///
    /// `admin` is optional because many vendors fold it into the oper column
    /// (`*down`, `A-DOWN`, `Disabled`).
    pub fn from_fields(admin: Option<&str>, oper: &str) -> Self {
        let oper = oper.trim().to_ascii_lowercase();
        if let Some(admin) = admin {
            let admin = admin.trim().to_ascii_lowercase();
            if ADMIN_DOWN_WORDS.contains(&admin.as_str()) {
                return InterfaceStatus::AdminDown;
            }
        }
        match oper.as_str() {
            "*down" | "a-down" | "admin down" | "administratively down" | "disabled" => {
                InterfaceStatus::AdminDown
            }
            "up" | "connected" | "a" | "yes" => InterfaceStatus::Up,
            "notpresent" | "not present" | "np" => InterfaceStatus::NotPresent,
            "dormant" => InterfaceStatus::Dormant,
            _ => InterfaceStatus::Down,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceStatus::Up => "up",
            InterfaceStatus::Down => "down",
            InterfaceStatus::AdminDown => "admin_down",
            InterfaceStatus::NotPresent => "notPresent",
            InterfaceStatus::Dormant => "dormant",
        }
    }
}

impl fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical or logical port as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub status: InterfaceStatus,
    pub description: String,
    /// Sorted, duplicate-free VLAN ids in 1..=4096.
    pub vlans: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub vid: u16,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacType {
    Static,
    Dynamic,
    Security,
}

impl MacType {
    /// Interpret a vendor's MAC type column. Unknown words count as dynamic.
    pub fn from_vendor(text: &str) -> Self {
        let text = text.trim().to_ascii_lowercase();
        match text.as_str() {
            "static" | "permanent" | "config" | "mgmt" | "s" | "system" => MacType::Static,
            "security" | "secure" | "sticky" | "deleteontimeout" | "deleteonreset" => {
                MacType::Security
            }
            _ => MacType::Dynamic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacEntry {
    pub vlan: u16,
    /// Twelve lowercase hex characters, no separators.
    pub mac: String,
    #[serde(rename = "type")]
    pub kind: MacType,
    pub port: String,
}

/// Strip separators from a MAC address in any vendor notation.
///
/// Returns `None` unless exactly twelve hex digits remain.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let mac: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (mac.len() == 12 && mac.chars().all(|c| c.is_ascii_hexdigit())).then_some(mac)
}

/// Identity gathered during the construction handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub vendor: String,
    pub model: String,
    pub mac: String,
    pub serial: String,
    pub os_version: String,
}

/// Target administrative state for `set_port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    Up,
    Down,
}

impl FromStr for PortStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(PortStatus::Up),
            "down" => Ok(PortStatus::Down),
            other => Err(Error::invalid_request(format!(
                "port status must be 'up' or 'down', got '{other}'"
            ))),
        }
    }
}

/// Physical medium behind a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortMedium {
    Copper,
    Sfp,
    Combo,
    Unknown,
}

const FIBER_MARKERS: &[&str] = &[
    "sfp", "fiber", "fibre", "optical", "-sx", "-lx", "-lh", "-zx", "basex", "base-x", "(f)",
    "gbic", "xfp",
];
const COPPER_MARKERS: &[&str] = &["copper", "base-t", "baset", "basetx", "-tx", "rj45", "(c)", "electric"];

impl PortMedium {
    /// Classify a set of medium descriptions. Both kinds present means a combo port.
    pub fn classify<'a>(descriptions: impl IntoIterator<Item = &'a str>) -> Self {
        let mut fiber = false;
        let mut copper = false;
        for text in descriptions {
            let text = text.to_ascii_lowercase();
            if text.contains("combo") {
                return PortMedium::Combo;
            }
            if FIBER_MARKERS.iter().any(|m| text.contains(m)) {
                fiber = true;
            } else if COPPER_MARKERS.iter().any(|m| text.contains(m)) {
                copper = true;
            }
        }
        match (fiber, copper) {
            (true, true) => PortMedium::Combo,
            (true, false) => PortMedium::Sfp,
            (false, true) => PortMedium::Copper,
            (false, false) => PortMedium::Unknown,
        }
    }
}

/// Outcome of `save_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Failed { attempts: u32 },
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Saved => "Saved OK",
            SaveStatus::Failed { .. } => ErrorKind::SaveConfigFailed.as_str(),
        }
    }
}

impl Serialize for SaveStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A downloadable configuration dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigFile {
    pub filename: String,
    pub content: String,
}
