//! [`Driver`] implementation for [`GenericDriver`].

use indexmap::IndexMap;
use log::{debug, info, warn};

use super::Driver;
use super::generic::{GenericDriver, render};
use super::response::Outcome;
use crate::channel::ExecOptions;
use crate::error::Result;
use crate::model::{
    ConfigFile, DeviceInfo, Interface, MacEntry, MacType, PortMedium, PortStatus, SaveStatus, Vlan,
    normalize_mac,
};
use crate::parser::Row;
use crate::platform::{BoardScan, PortRule, Script, TableCommand};
use crate::ranges::{expand_ports, vlan_ids};

/// Answer `Unsupported` when the platform has no entry for a capability.
macro_rules! supported {
    ($value:expr) => {
        match $value {
            Some(value) => value,
            None => return Ok(Outcome::Unsupported),
        }
    };
}

/// Canonicalize a port argument or answer `InvalidPort`.
macro_rules! port {
    ($driver:expr, $raw:expr) => {
        match $driver.platform().port_rule.normalize($raw) {
            Some(port) => port,
            None => {
                debug!("{}: rejected port '{}'", $driver.host(), $raw);
                return Ok(Outcome::InvalidPort);
            }
        }
    };
}

fn port_key(rule: &dyn PortRule, raw: &str) -> String {
    rule.normalize(raw).unwrap_or_else(|| raw.trim().to_string())
}

/// Port a row names: `name` or `port`, else `frame/slot/num` joined from
/// whichever of those parts are present.
fn row_port(row: &Row) -> Option<String> {
    if let Some(name) = row.get("name").or_else(|| row.get("port")) {
        return Some(name.to_string());
    }
    let num = row.get("num")?;
    let parts: Vec<&str> = ["frame", "slot"]
        .into_iter()
        .filter_map(|field| row.get(field))
        .chain([num])
        .collect();
    Some(parts.join("/"))
}

fn add_vlans(interface: &mut Interface, vlans: impl IntoIterator<Item = u16>) {
    interface.vlans.extend(vlans);
}

/// Fold one VLAN membership row into the interface map.
///
/// Rows come in two shapes: a VLAN with tagged/untagged port lists, or a
/// port with its VLAN list and PVID.
fn merge_membership(interfaces: &mut IndexMap<String, Interface>, rule: &dyn PortRule, row: &Row) {
    if let Some(vid) = row.get("vid").and_then(|v| vlan_ids(v).first().copied()) {
        let members = ["tagged", "untagged"]
            .into_iter()
            .filter_map(|field| row.get(field))
            .flat_map(expand_ports);
        for member in members {
            if let Some(interface) = interfaces.get_mut(&port_key(rule, &member)) {
                add_vlans(interface, [vid]);
            }
        }
        return;
    }

    let Some(port) = row.get("port") else {
        return;
    };
    let Some(interface) = interfaces.get_mut(&port_key(rule, port)) else {
        return;
    };
    if let Some(vlans) = row.get("vlans") {
        add_vlans(interface, vlan_ids(vlans));
    }
    let trunk = row.get("mode").is_some_and(|m| m.eq_ignore_ascii_case("trunk"));
    if !trunk {
        if let Some(pvid) = row.get("pvid") {
            add_vlans(interface, vlan_ids(pvid));
        }
    }
}

fn mac_entry(row: &Row, fallback_port: &str) -> Option<MacEntry> {
    let mac = normalize_mac(row.get("mac")?)?;
    let vlan: u16 = row.get("vlan")?.parse().ok()?;
    if !(1..=4096).contains(&vlan) {
        return None;
    }
    let kind = row
        .get("type")
        .filter(|t| !t.is_empty())
        .map(MacType::from_vendor)
        .unwrap_or(MacType::Dynamic);
    let port = row_port(row).unwrap_or_else(|| fallback_port.to_string());
    Some(MacEntry { vlan, mac, kind, port })
}

impl GenericDriver {
    async fn collect_macs(&mut self, table: &TableCommand, port: &str) -> Result<Vec<MacEntry>> {
        let rows = self.run_table(table, port).await?;
        Ok(rows.iter().filter_map(|row| mac_entry(row, port)).collect())
    }

    /// Port rows of every service board, each named `frame/slot/num`.
    async fn scan_boards(&mut self, scan: &BoardScan) -> Result<Vec<Row>> {
        let boards: Vec<String> = self
            .run_table(&scan.boards, &scan.frame)
            .await?
            .iter()
            .filter(|row| row.get("board").is_some_and(|board| scan.service.is_match(board)))
            .filter_map(|row| row.get("slot").map(|slot| format!("{}/{slot}", scan.frame)))
            .collect();
        debug!("{}: {} service boards", self.host(), boards.len());

        let mut rows: Vec<Row> = Vec::new();
        for board in boards {
            for row in self.run_table(&scan.ports, &board).await? {
                let Some(num) = row.get("num") else {
                    continue;
                };
                let name = format!("{board}/{num}");
                let fields = row
                    .fields()
                    .filter(|(field, _)| *field != "name")
                    .map(|(field, value)| (field.to_string(), value.to_string()));
                rows.push(std::iter::once(("name".to_string(), name)).chain(fields).collect());
            }
        }
        Ok(rows)
    }

    async fn show(&mut self, command: &str, port: &str) -> Result<String> {
        self.run(&render(command, port, "")).await
    }

    async fn apply(&mut self, script: &Script, port: &str, description: &str) -> Result<String> {
        self.run_script(script, port, description).await
    }
}

impl Driver for GenericDriver {
    async fn get_interfaces(&mut self) -> Result<Outcome<Vec<Interface>>> {
        let platform = self.platform_arc();
        let rows = match (&platform.commands.interfaces, &platform.commands.board_scan) {
            (Some(table), _) => self.run_table(table, "").await?,
            (None, Some(scan)) => self.scan_boards(scan).await?,
            (None, None) => return Ok(Outcome::Unsupported),
        };
        let rule = platform.port_rule.as_ref();
        let behavior = self.behavior().clone();

        let mut interfaces: IndexMap<String, Interface> = IndexMap::new();
        for row in rows {
            let Some(name) = row_port(&row) else {
                continue;
            };
            if platform.skip_interfaces.as_ref().is_some_and(|skip| skip.is_match(&name)) {
                continue;
            }
            let key = port_key(rule, &name);
            let mut interface = Interface {
                name,
                status: behavior.interface_status(&row),
                description: row.get("desc").unwrap_or_default().to_string(),
                vlans: vec![],
            };
            for field in ["pvid", "vlans"] {
                if let Some(vlans) = row.get(field) {
                    add_vlans(&mut interface, vlan_ids(vlans));
                }
            }
            interfaces.entry(key).or_insert(interface);
        }

        for table in &platform.commands.interface_vlans {
            for row in self.run_table(table, "").await? {
                merge_membership(&mut interfaces, rule, &row);
            }
        }

        Ok(Outcome::Done(
            interfaces
                .into_values()
                .map(|mut interface| {
                    interface.vlans.sort_unstable();
                    interface.vlans.dedup();
                    interface
                })
                .collect(),
        ))
    }

    async fn get_vlans(&mut self) -> Result<Outcome<Vec<Vlan>>> {
        let platform = self.platform_arc();
        let table = supported!(&platform.commands.vlans);

        let mut vlans: IndexMap<u16, Vlan> = IndexMap::new();
        for row in self.run_table(table, "").await? {
            let name = row.get("name").unwrap_or_default();
            let ids = row
                .get("vid")
                .or_else(|| row.get("vids"))
                .map(vlan_ids)
                .unwrap_or_default();
            for vid in ids {
                vlans.entry(vid).or_insert_with(|| Vlan {
                    vid,
                    name: name.to_string(),
                });
            }
        }
        Ok(Outcome::Done(vlans.into_values().collect()))
    }

    async fn get_mac(&mut self, port: &str) -> Result<Outcome<Vec<MacEntry>>> {
        let platform = self.platform_arc();
        let table = supported!(&platform.commands.mac);
        let port = port!(self, port);
        let macs = self.collect_macs(table, &port).await?;
        Ok(Outcome::Done(macs))
    }

    async fn get_mac_table(&mut self) -> Result<Outcome<Vec<MacEntry>>> {
        let platform = self.platform_arc();
        let table = supported!(&platform.commands.mac_table);
        let macs = self.collect_macs(table, "").await?;
        info!("{}: {} MAC entries", self.host(), macs.len());
        Ok(Outcome::Done(macs))
    }

    async fn reload_port(&mut self, port: &str) -> Result<Outcome<String>> {
        let platform = self.platform_arc();
        let down = supported!(&platform.commands.port_down);
        let up = supported!(&platform.commands.port_up);
        let port = port!(self, port);
        let mut output = self.apply(down, &port, "").await?;
        let after = self.apply(up, &port, "").await?;
        if !after.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&after);
        }
        Ok(Outcome::Done(output))
    }

    async fn set_port(&mut self, port: &str, status: PortStatus) -> Result<Outcome<String>> {
        let platform = self.platform_arc();
        let script = match status {
            PortStatus::Up => supported!(&platform.commands.port_up),
            PortStatus::Down => supported!(&platform.commands.port_down),
        };
        let port = port!(self, port);
        self.apply(script, &port, "").await.map(Outcome::Done)
    }

    async fn save_config(&mut self) -> Result<Outcome<SaveStatus>> {
        let platform = self.platform_arc();
        let policy = supported!(&platform.save);

        let opts = policy
            .confirm
            .iter()
            .fold(self.exec_options().clone(), |opts: ExecOptions, (question, reply)| {
                opts.with_answer(question.clone(), reply.clone())
            });

        for attempt in 1..=policy.attempts {
            let output = self.run_with(&policy.command, &opts).await?;
            if policy.busy.as_ref().is_some_and(|busy| busy.is_match(output.as_bytes())) {
                warn!(
                    "{}: device busy while saving (attempt {attempt}/{}), retrying in {:?}",
                    self.host(),
                    policy.attempts,
                    policy.busy_delay
                );
                tokio::time::sleep(policy.busy_delay).await;
                continue;
            }
            match &policy.success {
                Some(success) if !success.is_match(output.as_bytes()) => {
                    warn!("{}: save not confirmed (attempt {attempt}/{})", self.host(), policy.attempts);
                }
                _ => {
                    info!("{}: configuration saved", self.host());
                    return Ok(Outcome::Done(SaveStatus::Saved));
                }
            }
        }
        warn!("{}: giving up on save after {} attempts", self.host(), policy.attempts);
        Ok(Outcome::Done(SaveStatus::Failed {
            attempts: policy.attempts,
        }))
    }

    async fn set_description(&mut self, port: &str, description: &str) -> Result<Outcome<String>> {
        let platform = self.platform_arc();
        let description = self.behavior().sanitize_description(description);
        let script = if description.is_empty() {
            supported!(&platform.commands.description_clear)
        } else {
            supported!(&platform.commands.description)
        };
        let port = port!(self, port);
        self.apply(script, &port, &description).await.map(Outcome::Done)
    }

    async fn get_port_info(&mut self, port: &str) -> Result<Outcome<String>> {
        let platform = self.platform_arc();
        let command = supported!(&platform.commands.port_info);
        let port = port!(self, port);
        self.show(command, &port).await.map(Outcome::Done)
    }

    async fn get_port_type(&mut self, port: &str) -> Result<Outcome<PortMedium>> {
        let platform = self.platform_arc();
        let table = supported!(&platform.commands.port_type);
        let port = port!(self, port);
        let rows = self.run_table(table, &port).await?;
        let medium = PortMedium::classify(rows.iter().filter_map(|row| row.get("medium")));
        Ok(Outcome::Done(medium))
    }

    async fn get_port_config(&mut self, port: &str) -> Result<Outcome<String>> {
        let platform = self.platform_arc();
        let command = supported!(&platform.commands.port_config);
        let port = port!(self, port);
        self.show(command, &port).await.map(Outcome::Done)
    }

    async fn get_port_errors(&mut self, port: &str) -> Result<Outcome<String>> {
        let platform = self.platform_arc();
        let command = supported!(&platform.commands.port_errors);
        let port = port!(self, port);
        self.show(command, &port).await.map(Outcome::Done)
    }

    async fn get_device_info(&mut self) -> Result<Outcome<DeviceInfo>> {
        Ok(Outcome::Done(self.info().clone()))
    }

    async fn get_config(&mut self) -> Result<Outcome<ConfigFile>> {
        let platform = self.platform_arc();
        let command = supported!(&platform.commands.running_config);
        let content = self.run(command).await?;
        Ok(Outcome::Done(ConfigFile {
            filename: format!("{}.cfg", self.host()),
            content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::channel::{Terminal, TerminalConfig};
    use crate::parser::OutputParser;
    use crate::platform::PlatformDefinition;
    use crate::platform::vendors::{
        cisco_ios, dlink, eltex_ltp, huawei_ma5600, huawei_vrp, juniper_junos, procurve,
    };
    use crate::testing::ScriptedStream;

    fn driver(platform: PlatformDefinition, stream: ScriptedStream) -> GenericDriver {
        let terminal = Terminal::new("10.0.0.1", Box::new(stream), TerminalConfig::default());
        GenericDriver::from_parts(
            terminal,
            Arc::new(platform),
            Arc::new(OutputParser::builtin().unwrap()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cisco_interfaces_with_trunk_vlans() {
        let stream = ScriptedStream::new()
            .on(
                "show interfaces description\n",
                [
                    "show interfaces description\r\n",
                    "Interface                      Status         Protocol Description\r\n",
                    "Vl1                            up             up       mgmt\r\n",
                    "Gi1/0/1                        up             up       client 1\r\n",
                    "Gi1/0/2                        admin down     down     \r\n",
                    "Gi1/0/25                       up             up       uplink\r\n",
                    "sw1#",
                ],
            )
            .on(
                "show interfaces trunk\n",
                [
                    "show interfaces trunk\r\n",
                    "Port        Vlans allowed on trunk\r\n",
                    "Gi1/0/25    1-4094\r\n",
                    "\r\n",
                    "Port        Vlans allowed and active in management domain\r\n",
                    "Gi1/0/25    1,10,20\r\n",
                    "\r\n",
                    "Port        Vlans in spanning tree forwarding state and not pruned\r\n",
                    "Gi1/0/25    1\r\n",
                    "sw1#",
                ],
            );
        let mut driver = driver(cisco_ios::platform().unwrap(), stream);
        let interfaces = driver.get_interfaces().await.unwrap().done().unwrap();

        let names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Gi1/0/1", "Gi1/0/2", "Gi1/0/25"]);
        assert_eq!(interfaces[0].status, crate::model::InterfaceStatus::Up);
        assert_eq!(interfaces[0].description, "client 1");
        assert_eq!(interfaces[1].status, crate::model::InterfaceStatus::AdminDown);
        assert_eq!(interfaces[2].vlans, vec![1, 10, 20]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dlink_membership_from_vlan_table() {
        let stream = ScriptedStream::new()
            .on(
                "show ports description\n",
                [
                    "show ports description\r\n",
                    " 1   Enabled  Auto/Disabled  100M/Full/None  Enabled\r\n",
                    "     Description: client\r\n",
                    " 2   Disabled Auto/Disabled  Link Down       Enabled\r\n",
                    "     Description: \r\n",
                    "DES-3200-28:admin#",
                ],
            )
            .on(
                "show vlan\n",
                [
                    "show vlan\r\n",
                    "VID             : 10         VLAN Name     : users\r\n",
                    "Current Tagged Ports   : 2\r\n",
                    "Current Untagged Ports : 1-2\r\n",
                    "\r\n",
                    "VID             : 5000       VLAN Name     : bogus\r\n",
                    "Current Tagged Ports   : 1\r\n",
                    "Current Untagged Ports : \r\n",
                    "DES-3200-28:admin#",
                ],
            );
        let mut driver = driver(dlink::platform().unwrap(), stream);
        let interfaces = driver.get_interfaces().await.unwrap().done().unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].name, "1");
        assert_eq!(interfaces[0].status, crate::model::InterfaceStatus::Up);
        assert_eq!(interfaces[0].vlans, vec![10]);
        assert_eq!(interfaces[1].status, crate::model::InterfaceStatus::AdminDown);
        assert_eq!(interfaces[1].vlans, vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_port_sends_nothing() {
        let stream = ScriptedStream::new();
        let log = stream.log();
        let mut driver = driver(cisco_ios::platform().unwrap(), stream);
        assert_eq!(driver.get_mac("99/zz").await.unwrap(), Outcome::InvalidPort);
        assert_eq!(driver.set_port("??", PortStatus::Down).await.unwrap(), Outcome::InvalidPort);
        assert!(log.lock().unwrap().writes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_is_data() {
        let stream = ScriptedStream::new();
        let log = stream.log();
        let mut driver = driver(procurve::platform().unwrap(), stream);
        assert_eq!(driver.get_mac_table().await.unwrap(), Outcome::Unsupported);
        assert!(log.lock().unwrap().writes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cisco_mac_for_port() {
        let stream = ScriptedStream::new().on(
            "show mac address-table interface GigabitEthernet 1/0/3\n",
            [
                "show mac address-table interface GigabitEthernet 1/0/3\r\n",
                "Vlan    Mac Address       Type        Ports\r\n",
                "----    -----------       --------    -----\r\n",
                "  10    0011.2233.4455    DYNAMIC     Gi1/0/3\r\n",
                "9999    0011.2233.4466    DYNAMIC     Gi1/0/3\r\n",
                "sw1#",
            ],
        );
        let mut driver = driver(cisco_ios::platform().unwrap(), stream);
        let macs = driver.get_mac("gi 1/0/3").await.unwrap().done().unwrap();
        assert_eq!(
            macs,
            vec![MacEntry {
                vlan: 10,
                mac: "001122334455".into(),
                kind: MacType::Dynamic,
                port: "Gi1/0/3".into(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ma5600_mac_port_from_frame_slot() {
        let stream = ScriptedStream::new().on(
            "display mac-address all\n",
            [
                "display mac-address all\r\n",
                "  SRV-P BUNDLE TYPE MAC            MAC TYPE F /S /P  VPI  VCI   VLAN ID\r\n",
                "  ---------------------------------------------------------------------\r\n",
                "   3219    -   adl  0011-2233-4455 dynamic  0 /2 /7  1    32     100\r\n",
                "MA5600#",
            ],
        );
        let mut driver = driver(huawei_ma5600::platform().unwrap(), stream);
        let macs = driver.get_mac_table().await.unwrap().done().unwrap();
        assert_eq!(macs.len(), 1);
        assert_eq!(macs[0].port, "0/2/7");
        assert_eq!(macs[0].vlan, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ma5600_interfaces_board_by_board() {
        let stream = ScriptedStream::new()
            .on(
                "display board 0\n",
                [
                    "display board 0\r\n",
                    "  -------------------------------------------------------------------------\r\n",
                    "  SlotID  BoardName  Status          SubType0 SubType1    Online/Offline\r\n",
                    "  -------------------------------------------------------------------------\r\n",
                    "  2       H808ADLF   Normal\r\n",
                    "  4       H805ADPD   Failed\r\n",
                    "  7       H801SCUB   Active_normal\r\n",
                    "  -------------------------------------------------------------------------\r\n",
                    "MA5600#",
                ],
            )
            .on(
                "display board 0/2\n",
                [
                    "display board 0/2\r\n",
                    "  Board Name        : H808ADLF\r\n",
                    "  Board Status      : Normal\r\n",
                    "  Port   Status      Line Profile  Alm Prof  Ext Prof\r\n",
                    "     0   Activated         1002        1          --\r\n",
                    "     1   Deactivated       1002        1          --\r\n",
                    "MA5600#",
                ],
            );
        let log = stream.log();
        let mut driver = driver(huawei_ma5600::platform().unwrap(), stream);
        let interfaces = driver.get_interfaces().await.unwrap().done().unwrap();

        let names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["0/2/0", "0/2/1"]);
        assert_eq!(interfaces[0].status, crate::model::InterfaceStatus::Up);
        assert_eq!(interfaces[1].status, crate::model::InterfaceStatus::AdminDown);
        assert_eq!(
            log.lock().unwrap().writes,
            vec!["display board 0\n", "display board 0/2\n"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ltp_ont_interfaces_and_macs() {
        let stream = ScriptedStream::new()
            .on(
                "show interface ont 0-7 state\n",
                [
                    "show interface ont 0-7 state\r\n",
                    "GPON-port 0 ONT state list\r\n",
                    "  ##  ID   Serial          State          RSSI    Version      Description\r\n",
                    "   1   0   ELTX62000001    OK             -21.94  3.26.3.30    flat 12\r\n",
                    "   2   5   ELTX62000002    BLOCKED        n/a     n/a\r\n",
                    "Total ONT count: 2\r\n",
                    "LTP-8X#",
                ],
            )
            .on(
                "show mac interface ont 0/5\n",
                [
                    "show mac interface ont 0/5\r\n",
                    "  ##    Serv port  VLAN    MAC                  Interface\r\n",
                    "   1    0          100     A8:F9:4B:00:11:22    ont 0/5\r\n",
                    "LTP-8X#",
                ],
            );
        let mut driver = driver(eltex_ltp::platform().unwrap(), stream);
        let interfaces = driver.get_interfaces().await.unwrap().done().unwrap();
        let names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["0/0", "0/5"]);
        assert_eq!(interfaces[0].description, "flat 12");
        assert_eq!(interfaces[1].status, crate::model::InterfaceStatus::AdminDown);

        let macs = driver.get_mac("0/5").await.unwrap().done().unwrap();
        assert_eq!(macs.len(), 1);
        assert_eq!(macs[0].port, "0/5");
        assert_eq!(macs[0].vlan, 100);
        assert_eq!(macs[0].mac, "a8f94b001122");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_retries_while_busy() {
        let stream = ScriptedStream::new()
            .on("save\n", ["save\r\nThe system is busy, please wait\r\n<sw>"])
            .on("save\n", ["save\r\nAre you sure to continue?[Y/N]"])
            .on("y\n", ["y\r\nSave the configuration successfully.\r\n<sw>"]);
        let log = stream.log();
        let mut driver = driver(huawei_vrp::platform().unwrap(), stream);
        let started = tokio::time::Instant::now();
        let status = driver.save_config().await.unwrap().done().unwrap();
        assert_eq!(status, SaveStatus::Saved);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(log.lock().unwrap().writes, vec!["save\n", "save\n", "y\n"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_gives_up() {
        let mut stream = ScriptedStream::new();
        for _ in 0..3 {
            stream = stream.on("write memory\n", ["write memory\r\n% Error opening nvram:/startup-config\r\nsw1#"]);
        }
        let mut driver = driver(cisco_ios::platform().unwrap(), stream);
        let status = driver.save_config().await.unwrap().done().unwrap();
        assert_eq!(status, SaveStatus::Failed { attempts: 3 });
        assert_eq!(status.as_str(), "SaveConfigFailed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_description_is_sanitized_and_cleared() {
        let stream = ScriptedStream::new()
            .on("config ports 5 description client 5\n", ["config ports 5 description client 5\r\nSuccess.\r\nsw:admin#"])
            .on("config ports 5 clear_description\n", ["config ports 5 clear_description\r\nSuccess.\r\nsw:admin#"]);
        let log = stream.log();
        let mut driver = driver(dlink::platform().unwrap(), stream);
        assert!(driver.set_description("5", "\"client\x07 5\"").await.unwrap().is_done());
        assert!(driver.set_description("5", "  ").await.unwrap().is_done());
        assert_eq!(log.lock().unwrap().writes.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_config_line_leaves_config_mode() {
        let stream = ScriptedStream::new()
            .on("configure terminal\n", ["configure terminal\r\nsw1(config)#"])
            .on("interface GigabitEthernet 1/0/1\n", ["interface GigabitEthernet 1/0/1\r\nsw1(config-if)#"])
            .on("shutdown\n", ["shutdown\r\n% Invalid input detected at '^' marker.\r\nsw1(config-if)#"])
            .on("end\n", ["end\r\nsw1#"])
            .on(
                "show interfaces description\n",
                [
                    "show interfaces description\r\n",
                    "Interface                      Status         Protocol Description\r\n",
                    "Gi1/0/1                        up             up       client 1\r\n",
                    "sw1#",
                ],
            )
            .on("show interfaces trunk\n", ["show interfaces trunk\r\nsw1#"]);
        let log = stream.log();
        let mut driver = driver(cisco_ios::platform().unwrap(), stream);

        let err = driver.set_port("gi1/0/1", PortStatus::Down).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::CommandFailed);
        assert_eq!(log.lock().unwrap().writes[3], "end\n");

        let interfaces = driver.get_interfaces().await.unwrap().done().unwrap();
        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].description, "client 1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_junos_rejected_line_rolls_back() {
        let stream = ScriptedStream::new()
            .on("configure\n", ["configure\r\nEntering configuration mode\r\n\r\n[edit]\r\nadmin@ex2200#"])
            .on(
                "set interfaces ge-0/0/1 disable\n",
                ["set interfaces ge-0/0/1 disable\r\nsyntax error.\r\n\r\n[edit]\r\nadmin@ex2200#"],
            )
            .on("rollback\n", ["rollback\r\nload complete\r\n\r\n[edit]\r\nadmin@ex2200#"])
            .on("exit configuration-mode\n", ["exit configuration-mode\r\nExiting configuration mode\r\n\r\nadmin@ex2200>"]);
        let log = stream.log();
        let mut driver = driver(juniper_junos::platform().unwrap(), stream);

        driver.set_port("ge-0/0/1", PortStatus::Down).await.unwrap_err();
        let writes = log.lock().unwrap().writes.clone();
        assert!(!writes.iter().any(|w| w.starts_with("commit")));
        assert_eq!(writes.last().unwrap(), "exit configuration-mode\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paged_interfaces_with_escapes() {
        let stream = ScriptedStream::new()
            .on(
                "show interfaces description\n",
                [
                    "show interfaces description\r\n",
                    "Interface                      Status         Protocol Description\r\n",
                    "Gi1/0/1                        up             up       client 1\r\n",
                    "Gi1/0/2                        down           down     client 2\r\n",
                    " --More-- ",
                ],
            )
            .on(
                " ",
                [
                    "\x08\x08\x08\x08\x08\x08\x08\x08\x08\x08\x1b[K",
                    "Gi1/0/3                        up             up       client 3\r\n",
                    "Gi1/0/4                        admin down     down     \r\n",
                    " --More-- ",
                ],
            )
            .on(
                " ",
                [
                    "\x08\x08\x08\x08\x08\x08\x08\x08\x08\x08\x1b[K",
                    "Gi1/0/5                        up             up       client 5\r\n",
                    "sw1#",
                ],
            )
            .on("show interfaces trunk\n", ["show interfaces trunk\r\nsw1#"]);
        let mut driver = driver(cisco_ios::platform().unwrap(), stream);
        let interfaces = driver.get_interfaces().await.unwrap().done().unwrap();

        let names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Gi1/0/1", "Gi1/0/2", "Gi1/0/3", "Gi1/0/4", "Gi1/0/5"]);
        assert_eq!(interfaces[2].description, "client 3");
        assert_eq!(interfaces[3].status, crate::model::InterfaceStatus::AdminDown);
        assert_eq!(interfaces[4].description, "client 5");
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_config_is_a_file() {
        let stream = ScriptedStream::new().on(
            "show running-config\n",
            ["show running-config\r\nhostname sw1\r\n!\r\nend\r\nsw1#"],
        );
        let mut driver = driver(cisco_ios::platform().unwrap(), stream);
        let file = driver.get_config().await.unwrap().done().unwrap();
        assert_eq!(file.filename, "10.0.0.1.cfg");
        assert!(file.content.contains("hostname sw1"));
    }
}
