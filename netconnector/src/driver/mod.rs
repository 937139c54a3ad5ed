//! Device drivers.
//!
//! There is one driver implementation, [`GenericDriver`], which runs any
//! [`PlatformDefinition`](crate::platform::PlatformDefinition). The
//! capability surface is the [`Driver`] trait.

mod builder;
mod capabilities;
mod generic;
mod privilege;
mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use response::Outcome;

use std::future::Future;

use crate::error::Result;
use crate::model::{
    ConfigFile, DeviceInfo, Interface, MacEntry, PortMedium, PortStatus, SaveStatus, Vlan,
};

/// Capabilities every device session offers.
///
/// Each call returns [`Outcome::Unsupported`] when the platform has no
/// command for it and [`Outcome::InvalidPort`] when a port argument fails the
/// vendor's port rule; in both cases nothing is sent to the device.
pub trait Driver: Send {
    /// Ports with status, description and VLAN membership.
    fn get_interfaces(&mut self) -> impl Future<Output = Result<Outcome<Vec<Interface>>>> + Send;

    /// VLANs configured on the device.
    fn get_vlans(&mut self) -> impl Future<Output = Result<Outcome<Vec<Vlan>>>> + Send;

    /// MAC addresses learned on one port.
    fn get_mac(&mut self, port: &str) -> impl Future<Output = Result<Outcome<Vec<MacEntry>>>> + Send;

    /// The whole MAC address table.
    fn get_mac_table(&mut self) -> impl Future<Output = Result<Outcome<Vec<MacEntry>>>> + Send;

    /// Disable and re-enable a port.
    fn reload_port(&mut self, port: &str) -> impl Future<Output = Result<Outcome<String>>> + Send;

    /// Set a port's administrative state.
    fn set_port(
        &mut self,
        port: &str,
        status: PortStatus,
    ) -> impl Future<Output = Result<Outcome<String>>> + Send;

    /// Write the running configuration to startup storage.
    fn save_config(&mut self) -> impl Future<Output = Result<Outcome<SaveStatus>>> + Send;

    /// Set a port description; an empty description clears it.
    fn set_description(
        &mut self,
        port: &str,
        description: &str,
    ) -> impl Future<Output = Result<Outcome<String>>> + Send;

    fn get_port_info(&mut self, port: &str) -> impl Future<Output = Result<Outcome<String>>> + Send;

    fn get_port_type(&mut self, port: &str) -> impl Future<Output = Result<Outcome<PortMedium>>> + Send;

    fn get_port_config(&mut self, port: &str) -> impl Future<Output = Result<Outcome<String>>> + Send;

    fn get_port_errors(&mut self, port: &str) -> impl Future<Output = Result<Outcome<String>>> + Send;

    /// Identity gathered while the session was built.
    fn get_device_info(&mut self) -> impl Future<Output = Result<Outcome<DeviceInfo>>> + Send;

    /// Running configuration as a downloadable file.
    fn get_config(&mut self) -> impl Future<Output = Result<Outcome<ConfigFile>>> + Send;
}
