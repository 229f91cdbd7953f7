//! The connection pool and its acquisition engine.
//!
//! All slot mutation happens under one `parking_lot` mutex. The
//! scan-and-claim step is a single critical section, so two callers can
//! never claim the same slot; network I/O (bind, rebind, probe, unbind)
//! runs outside the lock with the slot provisionally marked active.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ldap_connector::{BindRequest, Connector, ConnectorError, ConnectorFactory};
use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::lease::Lease;
use crate::slot::Slot;

/// State shared between the pool and its outstanding leases.
pub(crate) struct PoolShared<C> {
    pub(crate) slots: Mutex<Vec<Slot<C>>>,
    pub(crate) closed: AtomicBool,
    pub(crate) metrics: Mutex<MetricsInner>,
}

/// Internal metrics counters.
#[derive(Debug, Default, Clone)]
pub(crate) struct MetricsInner {
    connectors_created: u64,
    connectors_closed: u64,
    checkouts_successful: u64,
    checkouts_failed: u64,
    probes_performed: u64,
    probes_failed: u64,
    rebinds_performed: u64,
    stale_evictions: u64,
}

impl<C: Connector> PoolShared<C> {
    /// Close a connector from a sync context (lease drop). The unbind
    /// round-trip is best-effort: it runs on the current runtime when
    /// one exists, otherwise dropping the connector closes the
    /// transport.
    pub(crate) fn discard_detached(&self, mut connector: C) {
        self.metrics.lock().connectors_closed += 1;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = connector.unbind().await {
                    tracing::debug!(error = %e, "unbind failure on release; should be harmless");
                }
            });
        }
    }
}

/// What the claimed slot held, decided inside the critical section.
enum Claim<C> {
    /// Slot was empty; build a connector in it.
    Create,
    /// Slot held a connector past the lifetime ceiling; close it, then
    /// build a replacement.
    Replace(C),
    /// Slot holds a session already bound as the requested identity;
    /// probe it and reuse.
    Probe(C),
    /// Slot holds a session bound as someone else; rebind it in place.
    Rebind(C),
}

/// A bounded pool of live, bound directory sessions.
///
/// See the crate docs for an overview and example. The pool is shared
/// by cloning behind an [`Arc`]; all methods take `&self`.
pub struct Pool<F: ConnectorFactory> {
    config: PoolConfig,
    endpoints: Vec<String>,
    factory: F,
    shared: Arc<PoolShared<F::Connector>>,
}

impl<F: ConnectorFactory> Pool<F> {
    /// Create a pool from a validated configuration.
    ///
    /// No connectors are established up front; slots fill lazily on
    /// first acquisition.
    pub fn new(config: PoolConfig, factory: F) -> Result<Self, PoolError> {
        config.validate()?;
        let endpoints = config.endpoints();

        let slots: Vec<Slot<F::Connector>> = (0..config.size).map(Slot::empty).collect();
        let shared = Arc::new(PoolShared {
            slots: Mutex::new(slots),
            closed: AtomicBool::new(false),
            metrics: Mutex::new(MetricsInner::default()),
        });

        tracing::info!(
            uri = %config.uri,
            size = config.size,
            use_pool = config.use_pool,
            "connection pool created"
        );

        Ok(Self {
            config,
            endpoints,
            factory,
            shared,
        })
    }

    /// Acquire a connector bound as the pool's default identity.
    pub async fn acquire(&self) -> Result<Lease<F::Connector>, PoolError> {
        self.acquire_as(None, None).await
    }

    /// Acquire a connector bound as the given identity, overriding the
    /// pool defaults for this single acquisition.
    ///
    /// Finds the first free slot and reuses, rebinds, or rebuilds its
    /// connector as needed; fails with [`PoolError::PoolExhausted`]
    /// when every slot is checked out.
    pub async fn acquire_as(
        &self,
        bind: Option<&str>,
        passwd: Option<&str>,
    ) -> Result<Lease<F::Connector>, PoolError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let bind = bind.or(self.config.bind.as_deref());
        let passwd = passwd.or(self.config.passwd.as_deref());

        if !self.config.use_pool {
            return match self.connect_any(bind, passwd).await {
                Ok((connector, _)) => {
                    self.shared.metrics.lock().checkouts_successful += 1;
                    Ok(Lease::transient(connector, Arc::clone(&self.shared)))
                }
                Err(e) => {
                    self.shared.metrics.lock().checkouts_failed += 1;
                    Err(e)
                }
            };
        }

        // Scan-and-claim. The slot leaves this block marked active, so
        // no other caller can touch it while we do I/O on it.
        let claimed = {
            let mut slots = self.shared.slots.lock();
            slots.iter_mut().find(|s| !s.active).map(|slot| {
                slot.active = true;
                let claim = match slot.connector.take() {
                    None => Claim::Create,
                    Some(conn) if slot.is_stale(self.config.max_lifetime) => {
                        slot.created_at = None;
                        slot.bound_as = None;
                        slot.cred = None;
                        slot.endpoint = None;
                        Claim::Replace(conn)
                    }
                    Some(conn) if slot.matches(bind, passwd) => Claim::Probe(conn),
                    Some(conn) => Claim::Rebind(conn),
                };
                (slot.index, claim)
            })
        };

        let Some((index, claim)) = claimed else {
            self.shared.metrics.lock().checkouts_failed += 1;
            return Err(PoolError::PoolExhausted {
                size: self.config.size,
                uri: self.config.uri.clone(),
            });
        };

        match self.settle_claim(index, claim, bind, passwd).await {
            Ok(connector) => {
                self.shared.metrics.lock().checkouts_successful += 1;
                Ok(Lease::pooled(connector, index, Arc::clone(&self.shared)))
            }
            Err(e) => {
                // Leave the slot empty and inactive so a later
                // acquisition can retry it.
                if let Some(stray) = {
                    let mut slots = self.shared.slots.lock();
                    slots[index].reset()
                } {
                    self.discard(stray, "failed acquisition").await;
                }
                self.shared.metrics.lock().checkouts_failed += 1;
                Err(e)
            }
        }
    }

    /// Turn a claimed slot into a live connector: reuse, rebind, or
    /// rebuild per what the slot held.
    async fn settle_claim(
        &self,
        index: usize,
        claim: Claim<F::Connector>,
        bind: Option<&str>,
        passwd: Option<&str>,
    ) -> Result<F::Connector, PoolError> {
        match claim {
            Claim::Create => self.rebuild(index, bind, passwd).await,
            Claim::Replace(stale) => {
                tracing::debug!(slot = index, "evicting connector past max lifetime");
                self.shared.metrics.lock().stale_evictions += 1;
                self.discard(stale, "stale").await;
                self.rebuild(index, bind, passwd).await
            }
            Claim::Probe(mut connector) => {
                self.shared.metrics.lock().probes_performed += 1;
                match with_timeout(self.config.timeout, connector.probe()).await {
                    Ok(()) => Ok(connector),
                    Err(e) => {
                        self.shared.metrics.lock().probes_failed += 1;
                        tracing::debug!(slot = index, error = %e, "liveness probe failed; rebinding");
                        self.try_rebind(index, connector, bind, passwd).await
                    }
                }
            }
            Claim::Rebind(connector) => self.try_rebind(index, connector, bind, passwd).await,
        }
    }

    /// Rebind an existing session under the requested identity,
    /// falling back to a full rebuild when the session is broken.
    ///
    /// A successful rebind keeps the slot's `created_at`: the physical
    /// connection is unchanged, so its age keeps counting toward the
    /// lifetime ceiling.
    async fn try_rebind(
        &self,
        index: usize,
        mut connector: F::Connector,
        bind: Option<&str>,
        passwd: Option<&str>,
    ) -> Result<F::Connector, PoolError> {
        match with_timeout(self.config.timeout, connector.rebind(bind, passwd)).await {
            Ok(()) => {
                let mut slots = self.shared.slots.lock();
                let slot = &mut slots[index];
                slot.bound_as = bind.map(str::to_string);
                slot.cred = passwd.map(str::to_string);
                drop(slots);
                self.shared.metrics.lock().rebinds_performed += 1;
                Ok(connector)
            }
            Err(e) if e.is_credentials_rejection() => {
                tracing::error!(slot = index, "invalid credentials on rebind; cancelling");
                self.discard(connector, "credentials rejected").await;
                Err(PoolError::Bind {
                    who: bind.unwrap_or("").to_string(),
                    source: e,
                })
            }
            Err(e) => {
                tracing::debug!(slot = index, error = %e, "rebind failed; rebuilding connector");
                self.discard(connector, "rebind failure").await;
                self.rebuild(index, bind, passwd).await
            }
        }
    }

    /// Build a fresh connector for the claimed slot and record its
    /// metadata.
    async fn rebuild(
        &self,
        index: usize,
        bind: Option<&str>,
        passwd: Option<&str>,
    ) -> Result<F::Connector, PoolError> {
        let (connector, endpoint) = self.connect_any(bind, passwd).await?;

        if self.shared.closed.load(Ordering::Acquire) {
            self.discard(connector, "pool shut down").await;
            return Err(PoolError::Closed);
        }

        let mut slots = self.shared.slots.lock();
        let slot = &mut slots[index];
        slot.created_at = Some(Instant::now());
        slot.bound_as = bind.map(str::to_string);
        slot.cred = passwd.map(str::to_string);
        slot.endpoint = Some(endpoint);
        Ok(connector)
    }

    /// Walk the endpoint list in order, attempting up to `retry_max`
    /// binds per endpoint with `retry_delay` between attempts. The
    /// first endpoint and attempt that yields a bound connector wins.
    async fn connect_any(
        &self,
        bind: Option<&str>,
        passwd: Option<&str>,
    ) -> Result<(F::Connector, String), PoolError> {
        let mut attempts = 0u32;
        let mut last_error: Option<ConnectorError> = None;

        for endpoint in &self.endpoints {
            for attempt in 1..=self.config.retry_max {
                attempts += 1;
                tracing::debug!(endpoint = %endpoint, attempt, "attempting to create a new connector");

                let request = BindRequest {
                    endpoint,
                    bind_dn: bind,
                    password: passwd,
                    use_tls: self.config.use_tls,
                    timeout: self.config.timeout,
                };

                match with_timeout(self.config.timeout, self.factory.bind(request)).await {
                    Ok(connector) => {
                        self.shared.metrics.lock().connectors_created += 1;
                        return Ok((connector, endpoint.clone()));
                    }
                    Err(e) if e.is_credentials_rejection() => {
                        // Hard failure: retrying the same bad credentials
                        // cannot succeed and may lock the account, and
                        // failed binds replicate across servers, so the
                        // remaining endpoints are skipped too.
                        tracing::error!(endpoint = %endpoint, "invalid credentials; cancelling retry");
                        return Err(PoolError::Bind {
                            who: bind.unwrap_or("").to_string(),
                            source: e,
                        });
                    }
                    Err(e) => {
                        if attempt < self.config.retry_max {
                            tracing::info!(
                                endpoint = %endpoint,
                                error = %e,
                                delay = ?self.config.retry_delay,
                                "failed to create and bind connector; will retry"
                            );
                            tokio::time::sleep(self.config.retry_delay).await;
                        } else {
                            tracing::warn!(
                                endpoint = %endpoint,
                                error = %e,
                                "failed to create and bind connector; endpoint exhausted"
                            );
                        }
                        last_error = Some(e);
                    }
                }
            }
        }

        // validate() guarantees at least one endpoint and one attempt,
        // so last_error is always set by the time we get here.
        let source = last_error.unwrap_or(ConnectorError::Unavailable {
            message: "no endpoints configured".to_string(),
        });
        Err(PoolError::Connection { attempts, source })
    }

    async fn discard(&self, mut connector: F::Connector, reason: &str) {
        if let Err(e) = connector.unbind().await {
            tracing::debug!(error = %e, reason, "unbind failure on discard; should be harmless");
        }
        self.shared.metrics.lock().connectors_closed += 1;
    }

    /// Unbind and evict every inactive connector bound as `bind_dn`.
    ///
    /// Useful after a credential change: warm sessions bound with the
    /// old password are dropped instead of being handed out again.
    /// Slots currently leased are left alone.
    pub async fn purge(&self, bind_dn: &str) {
        let victims: Vec<F::Connector> = {
            let mut slots = self.shared.slots.lock();
            slots
                .iter_mut()
                .filter(|s| !s.active && s.bound_as.as_deref() == Some(bind_dn))
                .filter_map(Slot::reset)
                .collect()
        };
        for connector in victims {
            self.discard(connector, "purge").await;
        }
    }

    /// Shut the pool down, unbinding every pooled connector.
    ///
    /// Idempotent. Connectors still out on a lease are closed when the
    /// lease drops. Further acquisitions fail with
    /// [`PoolError::Closed`].
    pub async fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let connectors: Vec<F::Connector> = {
            let mut slots = self.shared.slots.lock();
            slots.iter_mut().filter_map(Slot::reset).collect()
        };
        for connector in connectors {
            self.discard(connector, "shutdown").await;
        }
        tracing::info!("connection pool shut down");
    }

    /// Whether the pool has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Number of slots currently holding a live connector, leased ones
    /// included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared
            .slots
            .lock()
            .iter()
            .filter(|s| s.connector.is_some() || s.active)
            .count()
    }

    /// Whether no slot holds a live connector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of per-slot state for diagnostics.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let slots = self.shared.slots.lock();
        PoolStatus {
            size: self.config.size,
            max_lifetime: self.config.max_lifetime,
            slots: slots
                .iter()
                .map(|s| SlotStatus {
                    index: s.index,
                    connected: s.connector.is_some() || s.active,
                    active: s.active,
                    endpoint: s.endpoint.clone(),
                    age: s.created_at.map(|t| t.elapsed()),
                    idle: s.last_used.map(|t| t.elapsed()),
                    bound_as: s.bound_as.clone(),
                })
                .collect(),
        }
    }

    /// Counters accumulated since pool creation.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.shared.metrics.lock();
        PoolMetrics {
            connectors_created: inner.connectors_created,
            connectors_closed: inner.connectors_closed,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            probes_performed: inner.probes_performed,
            probes_failed: inner.probes_failed,
            rebinds_performed: inner.rebinds_performed,
            stale_evictions: inner.stale_evictions,
        }
    }

    /// The pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T, ConnectorError>>,
) -> Result<T, ConnectorError> {
    match timeout {
        Some(d) => match tokio::time::timeout(d, fut).await {
            Ok(result) => result,
            Err(_) => Err(ConnectorError::Timeout(d)),
        },
        None => fut.await,
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolMetrics {
    /// Connectors established since pool creation.
    pub connectors_created: u64,
    /// Connectors unbound/closed since pool creation.
    pub connectors_closed: u64,
    /// Successful acquisitions.
    pub checkouts_successful: u64,
    /// Failed acquisitions (exhausted, connection or bind failures).
    pub checkouts_failed: u64,
    /// Liveness probes performed on reuse.
    pub probes_performed: u64,
    /// Liveness probes that failed.
    pub probes_failed: u64,
    /// In-place rebinds under a new identity.
    pub rebinds_performed: u64,
    /// Connectors evicted for exceeding the lifetime ceiling.
    pub stale_evictions: u64,
}

/// Point-in-time state of one slot.
#[derive(Debug, Clone)]
pub struct SlotStatus {
    /// Slot position, stable for the pool's lifetime.
    pub index: usize,
    /// Whether the slot holds (or has lent out) a live connector.
    pub connected: bool,
    /// Whether the slot is currently checked out.
    pub active: bool,
    /// Endpoint URI the connector is bound to.
    pub endpoint: Option<String>,
    /// Age of the connector.
    pub age: Option<Duration>,
    /// Time since the slot was last released.
    pub idle: Option<Duration>,
    /// Identity the connector is bound as.
    pub bound_as: Option<String>,
}

/// Point-in-time state of the whole pool.
///
/// `Display` renders a human-readable table; presentation only, no
/// behavioural contract.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    /// Configured pool size.
    pub size: usize,
    /// Configured lifetime ceiling.
    pub max_lifetime: Duration,
    /// Per-slot snapshots, in index order.
    pub slots: Vec<SlotStatus>,
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header = [
            format!("Slot ({} max)", self.size),
            "Connected".to_string(),
            "Active".to_string(),
            "URI".to_string(),
            format!("Lifetime ({}s max)", self.max_lifetime.as_secs()),
            "Bind DN".to_string(),
        ];

        let rows: Vec<[String; 6]> = self
            .slots
            .iter()
            .map(|s| {
                [
                    (s.index + 1).to_string(),
                    if s.connected { "connected" } else { "not connected" }.to_string(),
                    if s.active { "active" } else { "inactive" }.to_string(),
                    s.endpoint.clone().unwrap_or_default(),
                    s.age.map(|a| a.as_secs().to_string()).unwrap_or_default(),
                    s.bound_as.clone().unwrap_or_default(),
                ]
            })
            .collect();

        let mut widths = [0usize; 6];
        for (i, cell) in header.iter().enumerate() {
            widths[i] = cell.len();
        }
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let rule = |f: &mut std::fmt::Formatter<'_>| -> std::fmt::Result {
            for w in widths {
                write!(f, "+-{}-", "-".repeat(w))?;
            }
            writeln!(f, "+")
        };
        let line = |f: &mut std::fmt::Formatter<'_>, row: &[String; 6]| -> std::fmt::Result {
            for (i, cell) in row.iter().enumerate() {
                write!(f, "| {:<width$} ", cell, width = widths[i])?;
            }
            writeln!(f, "|")
        };

        rule(f)?;
        line(f, &header)?;
        rule(f)?;
        for row in &rows {
            line(f, row)?;
        }
        rule(f)
    }
}
