//! Batch collection of interfaces and MAC tables.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::model::{Credentials, Interface, MacEntry};
use crate::remote::{ConnectionSpec, Method, MethodOutput, MethodParams, RemoteFactory};

/// Concurrent devices per scan.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Interfaces,
    MacTable,
}

impl ScanKind {
    fn method(&self) -> Method {
        match self {
            ScanKind::Interfaces => Method::GetInterfaces,
            ScanKind::MacTable => Method::GetMacTable,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanJob {
    pub address: String,
    pub connection: ConnectionSpec,
    pub credentials: Credentials,
    pub kind: ScanKind,
}

/// Receives scan results, typically for persistence.
#[async_trait]
pub trait ScanSink: Send + Sync {
    async fn interfaces(&self, address: &str, interfaces: &[Interface]) -> Result<()>;

    async fn macs(&self, address: &str, entries: &[MacEntry]) -> Result<()>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct ScanRunner {
    remote: Arc<RemoteFactory>,
    sink: Arc<dyn ScanSink>,
    limit: Arc<Semaphore>,
}

impl ScanRunner {
    pub fn new(remote: Arc<RemoteFactory>, sink: Arc<dyn ScanSink>) -> Self {
        Self {
            remote,
            sink,
            limit: Arc::new(Semaphore::new(DEFAULT_SCAN_CONCURRENCY)),
        }
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.limit = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// Run every job; one device failing does not stop the others.
    pub async fn run(&self, jobs: Vec<ScanJob>) -> ScanReport {
        let started = Instant::now();
        let total = jobs.len();
        let failed = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for job in jobs {
            let remote = self.remote.clone();
            let sink = self.sink.clone();
            let limit = self.limit.clone();
            let failed = failed.clone();
            tasks.spawn(async move {
                let Ok(_permit) = limit.acquire_owned().await else {
                    return;
                };
                if let Err(e) = scan_one(&remote, sink.as_ref(), &job).await {
                    warn!("{}: {:?} scan failed: {e}", job.address, job.kind);
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("scan task aborted: {e}");
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }

        let failed = failed.load(Ordering::Relaxed);
        let report = ScanReport {
            succeeded: total.saturating_sub(failed),
            failed,
        };
        info!(
            "scanned {total} device(s) in {:?}: {} ok, {} failed",
            started.elapsed(),
            report.succeeded,
            report.failed
        );
        report
    }
}

async fn scan_one(remote: &RemoteFactory, sink: &dyn ScanSink, job: &ScanJob) -> Result<()> {
    let output = remote
        .perform(
            &job.address,
            &job.connection,
            &job.credentials,
            job.kind.method(),
            &MethodParams::default(),
        )
        .await?;
    match output {
        MethodOutput::Interfaces(interfaces) => sink.interfaces(&job.address, &interfaces).await,
        MethodOutput::Macs(entries) => sink.macs(&job.address, &entries).await,
        _ => Err(Error::invalid_request(format!(
            "{} returned no scan rows",
            job.kind.method()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::platform::vendors::zte_zxr10;
    use crate::remote::{RemoteConfig, SessionMode};
    use crate::testing::{ScriptedConnector, ScriptedStream};
    use crate::transport::Protocol;

    #[derive(Default)]
    struct MemorySink {
        interfaces: Mutex<Vec<(String, Interface)>>,
        macs: Mutex<Vec<(String, MacEntry)>>,
    }

    #[async_trait]
    impl ScanSink for MemorySink {
        async fn interfaces(&self, address: &str, interfaces: &[Interface]) -> Result<()> {
            let mut stored = self.interfaces.lock().unwrap();
            stored.extend(interfaces.iter().map(|i| (address.to_string(), i.clone())));
            Ok(())
        }

        async fn macs(&self, address: &str, entries: &[MacEntry]) -> Result<()> {
            let mut stored = self.macs.lock().unwrap();
            stored.extend(entries.iter().map(|m| (address.to_string(), m.clone())));
            Ok(())
        }
    }

    const MAC_TABLE: &str = "\
show mac\r
MAC_Address    VLAN  Port   Type\r
0011.2233.4455 10    1      Dynamic\r
00aa.bbcc.ddee 20    2      Static\r
zxr10#";

    fn job(address: &str) -> ScanJob {
        ScanJob {
            address: address.to_string(),
            connection: ConnectionSpec::new(Protocol::Telnet),
            credentials: Credentials::single("admin", "secret"),
            kind: ScanKind::MacTable,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_counted_not_fatal() {
        let healthy = ScriptedStream::new().on("show mac\n", [MAC_TABLE]);
        let unknown: Result<ScriptedStream> = Err(crate::error::PlatformError::UnknownDevice {
            host: "10.0.0.3".into(),
        }
        .into());
        let connector = ScriptedConnector::new(zte_zxr10::PLATFORM_NAME, vec![Ok(healthy), unknown]);
        let config = RemoteConfig {
            mode: SessionMode::Ephemeral,
            ..RemoteConfig::default()
        };
        let remote = Arc::new(RemoteFactory::new(connector, config));
        let sink = Arc::new(MemorySink::default());

        let runner = ScanRunner::new(remote, sink.clone()).with_concurrency(1);
        let report = runner.run(vec![job("10.0.0.2"), job("10.0.0.3")]).await;

        assert_eq!(report, ScanReport { succeeded: 1, failed: 1 });
        let macs = sink.macs.lock().unwrap();
        assert_eq!(macs.len(), 2);
        assert_eq!(macs[0].0, "10.0.0.2");
        assert_eq!(macs[0].1.mac, "001122334455");
        assert_eq!(macs[1].1.vlan, 20);
    }
}
