//! Remote session factory: run one capability call against a device.
//!
//! Sessions come from the [`PoolManager`] (or are opened for a single call),
//! and a call that fails on a broken session is retried once on another.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::driver::{Driver, GenericDriver, Outcome};
use crate::error::{Error, Result};
use crate::factory::VendorFactory;
use crate::model::{
    ConfigFile, Credential, Credentials, DeviceInfo, Interface, MacEntry, PortMedium, PortStatus,
    SaveStatus, Vlan,
};
use crate::pool::{Checkout, PoolConfig, PoolManager, Session};
use crate::snmp::SnmpCollector;
use crate::transport::{ConnectConfig, Protocol};

/// Opens logged-in, identified sessions.
#[async_trait]
pub trait SessionConnector: Send + Sync + 'static {
    async fn open(
        &self,
        address: &str,
        config: &ConnectConfig,
        credentials: &Credentials,
    ) -> Result<GenericDriver>;
}

#[async_trait]
impl SessionConnector for VendorFactory {
    async fn open(
        &self,
        address: &str,
        config: &ConnectConfig,
        credentials: &Credentials,
    ) -> Result<GenericDriver> {
        self.connect(address, config, credentials).await
    }
}

/// Where sessions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// An idle pooled session, or a new one.
    #[default]
    Pooled,
    /// Any pooled session, waiting for a busy one if needed, or a new one.
    Shared,
    /// A new session, closed after the call.
    Ephemeral,
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub mode: SessionMode,
    /// Open a replacement in the background after a session breaks.
    pub respawn: bool,
    /// Transport settings; the protocol comes from each request.
    pub connect: ConnectConfig,
    pub pool: PoolConfig,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::Pooled,
            respawn: true,
            connect: ConnectConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

/// How interfaces are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanProtocol {
    Telnet,
    Ssh,
    Snmp,
}

/// The `connection` object of a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSpec {
    #[serde(default)]
    pub cmd_protocol: Protocol,
    #[serde(default)]
    pub port_scan_protocol: Option<ScanProtocol>,
    #[serde(default)]
    pub snmp_community: Option<String>,
    #[serde(default)]
    pub pool_size: Option<usize>,
}

impl ConnectionSpec {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            cmd_protocol: protocol,
            ..Self::default()
        }
    }

    fn uses_snmp(&self) -> bool {
        self.port_scan_protocol == Some(ScanProtocol::Snmp)
    }
}

/// A string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// The `auth` object of a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSpec {
    #[serde(default)]
    pub login: OneOrMany,
    #[serde(default)]
    pub password: OneOrMany,
    #[serde(default)]
    pub privilege_mode_password: Option<String>,
}

impl AuthSpec {
    /// Pair logins with passwords by position. A single login or password is
    /// paired with every entry of the other list.
    pub fn into_credentials(self) -> Credentials {
        let logins = self.login.into_vec();
        let passwords = self.password.into_vec();
        let pairs: Vec<Credential> = match (logins.len(), passwords.len()) {
            (1, n) if n > 1 => passwords
                .into_iter()
                .map(|password| Credential::new(logins[0].clone(), password))
                .collect(),
            (n, 1) if n > 1 => logins
                .into_iter()
                .map(|login| Credential::new(login, passwords[0].clone()))
                .collect(),
            (l, p) => {
                if l != p {
                    warn!("{l} login(s) but {p} password(s), extra entries ignored");
                }
                logins
                    .into_iter()
                    .zip(passwords)
                    .map(|(login, password)| Credential::new(login, password))
                    .collect()
            }
        };
        Credentials::new(pairs).with_secret(self.privilege_mode_password.unwrap_or_default())
    }
}

/// Capability names accepted by [`RemoteFactory::perform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetInterfaces,
    GetVlans,
    GetMac,
    GetMacTable,
    ReloadPort,
    SetPort,
    SaveConfig,
    SetDescription,
    GetPortInfo,
    GetPortType,
    GetPortConfig,
    GetPortErrors,
    GetDeviceInfo,
    GetConfig,
}

impl Method {
    pub const ALL: [Method; 14] = [
        Method::GetInterfaces,
        Method::GetVlans,
        Method::GetMac,
        Method::GetMacTable,
        Method::ReloadPort,
        Method::SetPort,
        Method::SaveConfig,
        Method::SetDescription,
        Method::GetPortInfo,
        Method::GetPortType,
        Method::GetPortConfig,
        Method::GetPortErrors,
        Method::GetDeviceInfo,
        Method::GetConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetInterfaces => "getInterfaces",
            Method::GetVlans => "getVlans",
            Method::GetMac => "getMac",
            Method::GetMacTable => "getMacTable",
            Method::ReloadPort => "reloadPort",
            Method::SetPort => "setPort",
            Method::SaveConfig => "saveConfig",
            Method::SetDescription => "setDescription",
            Method::GetPortInfo => "getPortInfo",
            Method::GetPortType => "getPortType",
            Method::GetPortConfig => "getPortConfig",
            Method::GetPortErrors => "getPortErrors",
            Method::GetDeviceInfo => "getDeviceInfo",
            Method::GetConfig => "getConfig",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Accepts `getMac` as well as `get_mac`.
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s.chars().filter(|c| *c != '_').collect();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::invalid_request(format!("unknown method '{s}'")))
    }
}

/// The `params` object of a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodParams {
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "desc")]
    pub description: Option<String>,
}

/// Result of a capability call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MethodOutput {
    Interfaces(Vec<Interface>),
    Vlans(Vec<Vlan>),
    Macs(Vec<MacEntry>),
    Text(String),
    Save(SaveStatus),
    PortType(PortMedium),
    DeviceInfo(DeviceInfo),
    File(ConfigFile),
    /// The platform has no command for the method. Serializes as `null`.
    Unsupported,
}

/// A validated call, ready to run on a driver.
#[derive(Debug, Clone)]
enum Call {
    GetInterfaces,
    GetVlans,
    GetMac(String),
    GetMacTable,
    ReloadPort(String),
    SetPort(String, PortStatus),
    SaveConfig,
    SetDescription(String, String),
    GetPortInfo(String),
    GetPortType(String),
    GetPortConfig(String),
    GetPortErrors(String),
    GetDeviceInfo,
    GetConfig,
}

impl Call {
    fn new(method: Method, params: &MethodParams) -> Result<Self> {
        let port = || {
            params
                .port
                .clone()
                .ok_or_else(|| Error::invalid_request(format!("{method} needs a 'port' parameter")))
        };
        Ok(match method {
            Method::GetInterfaces => Call::GetInterfaces,
            Method::GetVlans => Call::GetVlans,
            Method::GetMac => Call::GetMac(port()?),
            Method::GetMacTable => Call::GetMacTable,
            Method::ReloadPort => Call::ReloadPort(port()?),
            Method::SetPort => {
                let status = params
                    .status
                    .as_deref()
                    .ok_or_else(|| Error::invalid_request("setPort needs a 'status' parameter"))?
                    .parse()?;
                Call::SetPort(port()?, status)
            }
            Method::SaveConfig => Call::SaveConfig,
            Method::SetDescription => {
                Call::SetDescription(port()?, params.description.clone().unwrap_or_default())
            }
            Method::GetPortInfo => Call::GetPortInfo(port()?),
            Method::GetPortType => Call::GetPortType(port()?),
            Method::GetPortConfig => Call::GetPortConfig(port()?),
            Method::GetPortErrors => Call::GetPortErrors(port()?),
            Method::GetDeviceInfo => Call::GetDeviceInfo,
            Method::GetConfig => Call::GetConfig,
        })
    }

    fn method(&self) -> Method {
        match self {
            Call::GetInterfaces => Method::GetInterfaces,
            Call::GetVlans => Method::GetVlans,
            Call::GetMac(_) => Method::GetMac,
            Call::GetMacTable => Method::GetMacTable,
            Call::ReloadPort(_) => Method::ReloadPort,
            Call::SetPort(..) => Method::SetPort,
            Call::SaveConfig => Method::SaveConfig,
            Call::SetDescription(..) => Method::SetDescription,
            Call::GetPortInfo(_) => Method::GetPortInfo,
            Call::GetPortType(_) => Method::GetPortType,
            Call::GetPortConfig(_) => Method::GetPortConfig,
            Call::GetPortErrors(_) => Method::GetPortErrors,
            Call::GetDeviceInfo => Method::GetDeviceInfo,
            Call::GetConfig => Method::GetConfig,
        }
    }

    fn port(&self) -> Option<&str> {
        match self {
            Call::GetMac(port)
            | Call::ReloadPort(port)
            | Call::SetPort(port, _)
            | Call::SetDescription(port, _)
            | Call::GetPortInfo(port)
            | Call::GetPortType(port)
            | Call::GetPortConfig(port)
            | Call::GetPortErrors(port) => Some(port),
            _ => None,
        }
    }

    async fn invoke(&self, driver: &mut GenericDriver) -> Result<MethodOutput> {
        let outcome: Outcome<MethodOutput> = match self {
            Call::GetInterfaces => driver.get_interfaces().await?.map(MethodOutput::Interfaces),
            Call::GetVlans => driver.get_vlans().await?.map(MethodOutput::Vlans),
            Call::GetMac(port) => driver.get_mac(port).await?.map(MethodOutput::Macs),
            Call::GetMacTable => driver.get_mac_table().await?.map(MethodOutput::Macs),
            Call::ReloadPort(port) => driver.reload_port(port).await?.map(MethodOutput::Text),
            Call::SetPort(port, status) => driver.set_port(port, *status).await?.map(MethodOutput::Text),
            Call::SaveConfig => driver.save_config().await?.map(MethodOutput::Save),
            Call::SetDescription(port, description) => driver
                .set_description(port, description)
                .await?
                .map(MethodOutput::Text),
            Call::GetPortInfo(port) => driver.get_port_info(port).await?.map(MethodOutput::Text),
            Call::GetPortType(port) => driver.get_port_type(port).await?.map(MethodOutput::PortType),
            Call::GetPortConfig(port) => driver.get_port_config(port).await?.map(MethodOutput::Text),
            Call::GetPortErrors(port) => driver.get_port_errors(port).await?.map(MethodOutput::Text),
            Call::GetDeviceInfo => driver.get_device_info().await?.map(MethodOutput::DeviceInfo),
            Call::GetConfig => driver.get_config().await?.map(MethodOutput::File),
        };
        let platform = &driver.platform().name;
        match outcome {
            Outcome::Unsupported => {
                info!("{}: {} is not supported on {platform}", driver.host(), self.method());
                Ok(MethodOutput::Unsupported)
            }
            outcome => outcome.into_result(self.method().as_str(), platform, self.port()),
        }
    }
}

/// Why an attempt failed.
enum Failure {
    /// No session could be opened.
    Open(Error),
    /// The call failed on an established session.
    Call(Error),
}

impl Failure {
    fn retryable(&self) -> bool {
        matches!(self, Failure::Call(e) if e.is_transport())
    }

    fn into_error(self) -> Error {
        match self {
            Failure::Open(e) | Failure::Call(e) => e,
        }
    }
}

fn is_broken(result: &Result<MethodOutput>) -> bool {
    matches!(result, Err(e) if e.is_transport())
}

/// Pooled capability calls with retry.
pub struct RemoteFactory {
    connector: Arc<dyn SessionConnector>,
    pools: Arc<PoolManager<GenericDriver>>,
    snmp: Option<Arc<SnmpCollector>>,
    config: RemoteConfig,
}

impl RemoteFactory {
    pub fn new(connector: Arc<dyn SessionConnector>, config: RemoteConfig) -> Self {
        let pools = Arc::new(PoolManager::new(config.pool.clone()));
        Self {
            connector,
            pools,
            snmp: None,
            config,
        }
    }

    /// Collect interfaces over SNMP when a request asks for it.
    pub fn with_snmp(mut self, collector: Arc<SnmpCollector>) -> Self {
        self.snmp = Some(collector);
        self
    }

    pub fn pools(&self) -> &Arc<PoolManager<GenericDriver>> {
        &self.pools
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Run `method` against the device at `address`.
    pub async fn perform(
        &self,
        address: &str,
        connection: &ConnectionSpec,
        credentials: &Credentials,
        method: Method,
        params: &MethodParams,
    ) -> Result<MethodOutput> {
        let call = Call::new(method, params)?;

        if matches!(call, Call::GetInterfaces) && connection.uses_snmp() {
            return self.snmp_interfaces(address, connection).await;
        }

        let config = ConnectConfig {
            protocol: connection.cmd_protocol,
            ..self.config.connect.clone()
        };

        match self.attempt(address, connection, &config, credentials, &call).await {
            Ok(output) => Ok(output),
            Err(failure) if failure.retryable() => {
                let e = failure.into_error();
                warn!("{address}: {method} failed on a broken session ({e}), retrying once");
                self.attempt(address, connection, &config, credentials, &call)
                    .await
                    .map_err(Failure::into_error)
            }
            Err(failure) => Err(failure.into_error()),
        }
    }

    async fn snmp_interfaces(&self, address: &str, connection: &ConnectionSpec) -> Result<MethodOutput> {
        let Some(snmp) = &self.snmp else {
            info!("{address}: SNMP collection requested but no collector is configured");
            return Ok(MethodOutput::Unsupported);
        };
        let community = connection
            .snmp_community
            .as_deref()
            .ok_or_else(|| Error::invalid_request("SNMP collection needs 'snmp_community'"))?;
        snmp.interfaces(address, community).await.map(MethodOutput::Interfaces)
    }

    async fn attempt(
        &self,
        address: &str,
        connection: &ConnectionSpec,
        config: &ConnectConfig,
        credentials: &Credentials,
        call: &Call,
    ) -> std::result::Result<MethodOutput, Failure> {
        if self.config.mode == SessionMode::Ephemeral {
            let mut driver = self
                .connector
                .open(address, config, credentials)
                .await
                .map_err(Failure::Open)?;
            let result = call.invoke(&mut driver).await;
            Session::close(&mut driver).await;
            return result.map_err(Failure::Call);
        }

        let mut lease = match self.pools.acquire(address, connection.pool_size).await {
            Checkout::Idle(lease) => lease,
            Checkout::Busy(entry) if self.config.mode == SessionMode::Shared => {
                debug!("{address}: waiting for busy session {}", entry.id());
                entry.lock().await
            }
            Checkout::Busy(_) => return self.with_new_session(address, config, credentials, call, false).await,
            Checkout::Empty => return self.with_new_session(address, config, credentials, call, true).await,
        };

        let result = call.invoke(&mut lease).await;
        if is_broken(&result) || !lease.is_alive() {
            let id = lease.id();
            Session::close(&mut *lease).await;
            drop(lease);
            self.pools.remove(address, id).await;
            self.respawn(address, config, credentials);
        }
        result.map_err(Failure::Call)
    }

    /// Open a session, run `call` on it and offer it to the pool.
    async fn with_new_session(
        &self,
        address: &str,
        config: &ConnectConfig,
        credentials: &Credentials,
        call: &Call,
        creator: bool,
    ) -> std::result::Result<MethodOutput, Failure> {
        let mut driver = match self.connector.open(address, config, credentials).await {
            Ok(driver) => driver,
            Err(e) => {
                if creator {
                    self.pools.release_creation(address).await;
                }
                return Err(Failure::Open(e));
            }
        };
        let result = call.invoke(&mut driver).await;
        if is_broken(&result) || !driver.is_alive() {
            Session::close(&mut driver).await;
            if creator {
                self.pools.release_creation(address).await;
            }
        } else {
            self.pools.add(address, driver).await;
        }
        result.map_err(Failure::Call)
    }

    fn respawn(&self, address: &str, config: &ConnectConfig, credentials: &Credentials) {
        if !self.config.respawn {
            return;
        }
        let connector = self.connector.clone();
        let pools = self.pools.clone();
        let address = address.to_string();
        let config = config.clone();
        let credentials = credentials.clone();
        tokio::spawn(async move {
            match connector.open(&address, &config, &credentials).await {
                Ok(driver) => {
                    info!("{address}: replacement session ready");
                    pools.add(&address, driver).await;
                }
                Err(e) => warn!("{address}: replacement session failed: {e}"),
            }
        });
    }

    /// Close every pooled session.
    pub async fn shutdown(&self) {
        self.pools.drain().await;
    }
}
