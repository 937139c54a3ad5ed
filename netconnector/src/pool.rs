//! Keyed, bounded, expiring cache of logged-in sessions.
//!
//! One [`ConnectionPool`] per device address. Each entry wraps its session in
//! a `tokio::sync::Mutex`; holding the lock is what "in use" means, so at
//! most one command runs on a session at a time.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::driver::GenericDriver;
use crate::transport::Liveness;

/// What the pool needs from a session.
#[async_trait]
pub trait Session: Send + 'static {
    /// Transport liveness, readable without the session lock.
    fn liveness(&self) -> Liveness;

    async fn close(&mut self);
}

#[async_trait]
impl Session for GenericDriver {
    fn liveness(&self) -> Liveness {
        GenericDriver::liveness(self)
    }

    async fn close(&mut self) {
        if let Err(e) = GenericDriver::close(self).await {
            debug!("{}: close failed: {e}", self.host());
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Sessions kept per address.
    pub capacity: usize,
    /// Idle time after which a whole pool is closed.
    pub ttl: Duration,
    pub sweep_interval: Duration,
    /// How often a caller checks whether another caller finished creating
    /// the first session of a pool.
    pub creation_poll: Duration,
    /// How long it waits before taking over the creation.
    pub creation_wait: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            ttl: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(30),
            creation_poll: Duration::from_millis(300),
            creation_wait: Duration::from_secs(30),
        }
    }
}

/// A pooled session.
pub struct PoolEntry<S> {
    id: u64,
    session: Arc<Mutex<S>>,
    liveness: Liveness,
}

impl<S> Clone for PoolEntry<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            session: self.session.clone(),
            liveness: self.liveness.clone(),
        }
    }
}

impl<S> fmt::Debug for PoolEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEntry")
            .field("id", &self.id)
            .field("alive", &self.liveness.is_alive())
            .finish()
    }
}

impl<S: Session> PoolEntry<S> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Wait for exclusive use.
    pub async fn lock(&self) -> Lease<S> {
        Lease {
            entry: self.clone(),
            guard: self.session.clone().lock_owned().await,
        }
    }

    fn try_lock(&self) -> Option<Lease<S>> {
        let guard = self.session.clone().try_lock_owned().ok()?;
        Some(Lease {
            entry: self.clone(),
            guard,
        })
    }
}

/// Exclusive use of a pooled session. Dropping it returns the session.
pub struct Lease<S> {
    entry: PoolEntry<S>,
    guard: OwnedMutexGuard<S>,
}

impl<S> Lease<S> {
    pub fn id(&self) -> u64 {
        self.entry.id
    }
}

impl<S> Deref for Lease<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.guard
    }
}

impl<S> DerefMut for Lease<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.guard
    }
}

/// Result of [`PoolManager::acquire`].
pub enum Checkout<S> {
    /// An idle session, already locked for the caller.
    Idle(Lease<S>),
    /// Every live session is in use; lock one to share it.
    Busy(PoolEntry<S>),
    /// No live session. The caller creates one and offers it with
    /// [`PoolManager::add`], or calls [`PoolManager::release_creation`].
    Empty,
}

struct ConnectionPool<S> {
    entries: Vec<PoolEntry<S>>,
    capacity: usize,
    expires_at: Instant,
    /// Set while the first session of this pool is being created.
    creating: bool,
}

/// Every pool, keyed by device address.
pub struct PoolManager<S> {
    config: PoolConfig,
    pools: Mutex<HashMap<String, ConnectionPool<S>>>,
    next_id: AtomicU64,
}

impl<S: Session> PoolManager<S> {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            pools: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Find a session for `address`, extending the pool's expiry.
    ///
    /// `capacity` overrides the configured pool size for this address.
    pub async fn acquire(&self, address: &str, capacity: Option<usize>) -> Checkout<S> {
        let mut waited = Duration::ZERO;
        loop {
            let mut pools = self.pools.lock().await;
            let now = Instant::now();
            let pool = pools.entry(address.to_string()).or_insert_with(|| ConnectionPool {
                entries: Vec::new(),
                capacity: self.config.capacity,
                expires_at: now + self.config.ttl,
                creating: false,
            });
            if let Some(capacity) = capacity {
                pool.capacity = capacity.max(1);
            }

            let before = pool.entries.len();
            pool.entries.retain(PoolEntry::is_alive);
            if pool.entries.len() < before {
                debug!("{address}: pruned {} dead session(s)", before - pool.entries.len());
            }

            if pool.entries.is_empty() && pool.creating {
                if waited < self.config.creation_wait {
                    drop(pools);
                    tokio::time::sleep(self.config.creation_poll).await;
                    waited += self.config.creation_poll;
                    continue;
                }
                warn!("{address}: session creation still pending after {waited:?}, taking over");
                pool.creating = false;
            }

            pool.expires_at = now + self.config.ttl;

            if let Some(lease) = pool.entries.iter().find_map(PoolEntry::try_lock) {
                debug!("{address}: reusing idle session {}", lease.id());
                return Checkout::Idle(lease);
            }
            if let Some(entry) = pool.entries.first() {
                return Checkout::Busy(entry.clone());
            }
            pool.creating = true;
            return Checkout::Empty;
        }
    }

    /// Offer a new session to the pool for `address`.
    ///
    /// Returns the pooled entry, or `None` when the pool is full and the
    /// session was closed.
    pub async fn add(&self, address: &str, mut session: S) -> Option<PoolEntry<S>> {
        {
            let mut pools = self.pools.lock().await;
            let now = Instant::now();
            let pool = pools.entry(address.to_string()).or_insert_with(|| ConnectionPool {
                entries: Vec::new(),
                capacity: self.config.capacity,
                expires_at: now + self.config.ttl,
                creating: false,
            });
            pool.creating = false;
            pool.entries.retain(PoolEntry::is_alive);
            if pool.entries.len() < pool.capacity {
                let entry = PoolEntry {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    liveness: session.liveness(),
                    session: Arc::new(Mutex::new(session)),
                };
                pool.entries.push(entry.clone());
                debug!("{address}: pooled session {} ({}/{})", entry.id, pool.entries.len(), pool.capacity);
                return Some(entry);
            }
        }
        debug!("{address}: pool full, closing surplus session");
        session.close().await;
        None
    }

    /// Clear the creation mark after a failed creation.
    pub async fn release_creation(&self, address: &str) {
        if let Some(pool) = self.pools.lock().await.get_mut(address) {
            pool.creating = false;
        }
    }

    /// Drop a broken entry. The caller closes it.
    pub async fn remove(&self, address: &str, id: u64) {
        if let Some(pool) = self.pools.lock().await.get_mut(address) {
            pool.entries.retain(|entry| entry.id != id);
        }
    }

    /// Number of sessions pooled for `address`.
    pub async fn pool_len(&self, address: &str) -> usize {
        self.pools
            .lock()
            .await
            .get(address)
            .map_or(0, |pool| pool.entries.len())
    }

    pub async fn addresses(&self) -> Vec<String> {
        self.pools.lock().await.keys().cloned().collect()
    }

    /// Close and forget every pool whose expiry has passed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(String, ConnectionPool<S>)> = {
            let mut pools = self.pools.lock().await;
            let keys: Vec<String> = pools
                .iter()
                .filter(|(_, pool)| pool.expires_at <= now && !pool.creating)
                .map(|(address, _)| address.clone())
                .collect();
            keys.into_iter()
                .filter_map(|address| pools.remove_entry(&address))
                .collect()
        };
        for (address, pool) in &expired {
            info!("{address}: pool expired, closing {} session(s)", pool.entries.len());
            close_all(&pool.entries).await;
        }
        expired.len()
    }

    /// Close every session.
    pub async fn drain(&self) {
        let pools: Vec<ConnectionPool<S>> = self.pools.lock().await.drain().map(|(_, pool)| pool).collect();
        for pool in &pools {
            close_all(&pool.entries).await;
        }
    }

    /// Run [`sweep`](Self::sweep) every `sweep_interval` until the manager
    /// is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.sweep().await;
            }
        })
    }
}

async fn close_all<S: Session>(entries: &[PoolEntry<S>]) {
    for entry in entries {
        entry.session.lock().await.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;

    struct FakeSession {
        liveness: Liveness,
        closed: Arc<AtomicBool>,
    }

    impl FakeSession {
        fn new() -> (Self, Arc<AtomicBool>, Liveness) {
            let closed = Arc::new(AtomicBool::new(false));
            let liveness = Liveness::new();
            let session = Self {
                liveness: liveness.clone(),
                closed: closed.clone(),
            };
            (session, closed, liveness)
        }
    }

    #[async_trait]
    impl Session for FakeSession {
        fn liveness(&self) -> Liveness {
            self.liveness.clone()
        }

        async fn close(&mut self) {
            self.liveness.mark_dead();
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn manager() -> Arc<PoolManager<FakeSession>> {
        Arc::new(PoolManager::new(PoolConfig::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_then_idle() {
        let pools = manager();
        assert!(matches!(pools.acquire("10.0.0.1", None).await, Checkout::Empty));
        let (session, _, _) = FakeSession::new();
        let entry = pools.add("10.0.0.1", session).await.unwrap();

        match pools.acquire("10.0.0.1", None).await {
            Checkout::Idle(lease) => assert_eq!(lease.id(), entry.id()),
            _ => panic!("expected the idle session"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_entry_is_shared() {
        let pools = manager();
        let _ = pools.acquire("sw", None).await;
        let (session, _, _) = FakeSession::new();
        pools.add("sw", session).await.unwrap();

        let Checkout::Idle(lease) = pools.acquire("sw", None).await else {
            panic!("expected idle");
        };
        let Checkout::Busy(entry) = pools.acquire("sw", None).await else {
            panic!("expected busy");
        };
        assert_eq!(entry.id(), lease.id());
        drop(lease);
        let shared = entry.lock().await;
        assert_eq!(shared.id(), entry.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_is_never_exceeded() {
        let pools = manager();
        let mut closed_flags = vec![];
        for _ in 0..7 {
            let (session, closed, _) = FakeSession::new();
            closed_flags.push(closed);
            pools.add("sw", session).await;
        }
        assert_eq!(pools.pool_len("sw").await, 5);
        let closed = closed_flags.iter().filter(|c| c.load(Ordering::SeqCst)).count();
        assert_eq!(closed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_request_capacity() {
        let pools = manager();
        let _ = pools.acquire("sw", Some(1)).await;
        let (first, _, _) = FakeSession::new();
        let (second, second_closed, _) = FakeSession::new();
        assert!(pools.add("sw", first).await.is_some());
        assert!(pools.add("sw", second).await.is_none());
        assert!(second_closed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_entries_are_pruned() {
        let pools = manager();
        let (session, _, liveness) = FakeSession::new();
        pools.add("sw", session).await.unwrap();
        liveness.mark_dead();
        assert!(matches!(pools.acquire("sw", None).await, Checkout::Empty));
        assert_eq!(pools.pool_len("sw").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_creator() {
        let pools = manager();
        assert!(matches!(pools.acquire("sw", None).await, Checkout::Empty));

        let creator = pools.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let (session, _, _) = FakeSession::new();
            creator.add("sw", session).await;
        });

        let started = Instant::now();
        let checkout = pools.acquire("sw", None).await;
        assert!(matches!(checkout, Checkout::Idle(_)));
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_creation_mark_is_cleared() {
        let pools = manager();
        assert!(matches!(pools.acquire("sw", None).await, Checkout::Empty));
        let started = Instant::now();
        assert!(matches!(pools.acquire("sw", None).await, Checkout::Empty));
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_closes_expired_pools() {
        let pools = manager();
        let (session, closed, _) = FakeSession::new();
        pools.add("sw", session).await.unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(pools.sweep().await, 0);
        // Acquire extends the expiry.
        drop(pools.acquire("sw", None).await);
        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(pools.sweep().await, 0);

        tokio::time::advance(Duration::from_secs(21)).await;
        assert_eq!(pools.sweep().await, 1);
        assert!(closed.load(Ordering::SeqCst));
        assert!(pools.addresses().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper() {
        let pools = manager();
        let (session, closed, _) = FakeSession::new();
        pools.add("sw", session).await.unwrap();
        let handle = pools.spawn_sweeper();

        tokio::time::sleep(Duration::from_secs(151)).await;
        assert!(closed.load(Ordering::SeqCst));
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_closes_everything() {
        let pools = manager();
        let (a, a_closed, _) = FakeSession::new();
        let (b, b_closed, _) = FakeSession::new();
        pools.add("sw1", a).await;
        pools.add("sw2", b).await;
        pools.drain().await;
        assert!(a_closed.load(Ordering::SeqCst));
        assert!(b_closed.load(Ordering::SeqCst));
        assert_eq!(pools.pool_len("sw1").await, 0);
    }
}
