//! # netconnector
//!
//! Async telnet/SSH CLI automation for multi-vendor access networks.
//!
//! netconnector logs in to switches, DSLAMs and GPON OLTs, works out which
//! vendor it is talking to and exposes one capability surface for all of
//! them: interfaces, VLANs, MAC tables, port control and configuration save.
//!
//! ## Features
//!
//! - Telnet (RFC 854 option negotiation) and SSH via russh
//! - Prompt and pager aware command execution
//! - Vendor detection from `show version` / `display version` transcripts
//! - TextFSM grammars for every supported vendor
//! - A keyed, bounded, expiring session pool with retry on broken sessions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use netconnector::remote::{ConnectionSpec, Method, MethodParams, RemoteConfig, RemoteFactory};
//! use netconnector::{Credentials, Protocol, VendorFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netconnector::Error> {
//!     let factory = Arc::new(VendorFactory::builtin()?);
//!     let remote = RemoteFactory::new(factory, RemoteConfig::default());
//!
//!     let interfaces = remote
//!         .perform(
//!             "192.168.1.10",
//!             &ConnectionSpec::new(Protocol::Telnet),
//!             &Credentials::single("admin", "secret"),
//!             Method::GetInterfaces,
//!             &MethodParams::default(),
//!         )
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&interfaces).unwrap_or_default());
//!
//!     remote.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod factory;
pub mod model;
pub mod parser;
pub mod platform;
pub mod pool;
pub mod ranges;
pub mod remote;
pub mod scan;
pub mod snmp;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use driver::{Driver, DriverBuilder, GenericDriver, Outcome};
pub use error::{Error, ErrorKind, Result};
pub use factory::VendorFactory;
pub use model::{Credential, Credentials, DeviceInfo, Interface, InterfaceStatus, MacEntry, Vlan};
pub use platform::{PlatformDefinition, PlatformRegistry, PrivilegeLevel};
pub use transport::{ConnectConfig, Protocol};
