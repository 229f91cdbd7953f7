//! Scriptable in-memory directory for pool tests.
//!
//! The mock records every bind attempt, rebind, probe, and unbind, and
//! can be told to take endpoints down, reject identities, or break
//! probes/rebinds mid-test.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ldap_connector::{BindRequest, Connector, ConnectorError, ConnectorFactory};
use parking_lot::Mutex;

#[derive(Default)]
pub struct DirState {
    pub down_endpoints: HashSet<String>,
    pub rejected_identities: HashSet<String>,
    pub fail_probes: bool,
    pub fail_rebinds: bool,
    /// (endpoint, who) of every establish attempt, failed ones included.
    pub bind_attempts: Vec<(String, String)>,
    /// (connector id, who) of every rebind on a live session.
    pub rebinds: Vec<(u64, String)>,
    pub probes: Vec<u64>,
    pub unbinds: Vec<u64>,
}

/// Shared handle scripting the mock directory's behaviour.
#[derive(Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<DirState>>,
    next_id: Arc<AtomicU64>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_down(&self, endpoint: &str) {
        self.state.lock().down_endpoints.insert(endpoint.to_string());
    }

    pub fn reject_identity(&self, who: &str) {
        self.state
            .lock()
            .rejected_identities
            .insert(who.to_string());
    }

    pub fn fail_probes(&self, fail: bool) {
        self.state.lock().fail_probes = fail;
    }

    pub fn fail_rebinds(&self, fail: bool) {
        self.state.lock().fail_rebinds = fail;
    }

    pub fn bind_attempts(&self) -> Vec<(String, String)> {
        self.state.lock().bind_attempts.clone()
    }

    pub fn rebinds(&self) -> Vec<(u64, String)> {
        self.state.lock().rebinds.clone()
    }

    pub fn probe_count(&self) -> usize {
        self.state.lock().probes.len()
    }

    pub fn unbound_ids(&self) -> Vec<u64> {
        self.state.lock().unbinds.clone()
    }

    pub fn factory(&self) -> MockFactory {
        MockFactory { dir: self.clone() }
    }
}

/// One mock session. Each successful establish gets a fresh id, so
/// tests can tell reuse apart from rebuild.
pub struct MockConnector {
    id: u64,
    endpoint: String,
    who: String,
    state: Arc<Mutex<DirState>>,
}

impl MockConnector {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn who(&self) -> &str {
        &self.who
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn rebind(
        &mut self,
        bind_dn: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), ConnectorError> {
        let _ = password;
        let who = bind_dn.unwrap_or("").to_string();
        let mut state = self.state.lock();
        state.rebinds.push((self.id, who.clone()));
        if state.fail_rebinds {
            return Err(ConnectorError::Unavailable {
                message: "session broken".to_string(),
            });
        }
        if state.rejected_identities.contains(&who) {
            return Err(ConnectorError::CredentialsRejected { who });
        }
        drop(state);
        self.who = who;
        Ok(())
    }

    async fn probe(&mut self) -> Result<(), ConnectorError> {
        let mut state = self.state.lock();
        state.probes.push(self.id);
        if state.fail_probes {
            return Err(ConnectorError::Unavailable {
                message: "probe failed".to_string(),
            });
        }
        Ok(())
    }

    async fn unbind(&mut self) -> Result<(), ConnectorError> {
        self.state.lock().unbinds.push(self.id);
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub struct MockFactory {
    dir: MockDirectory,
}

#[async_trait]
impl ConnectorFactory for MockFactory {
    type Connector = MockConnector;

    async fn bind(&self, request: BindRequest<'_>) -> Result<MockConnector, ConnectorError> {
        let who = request.who().to_string();
        let mut state = self.dir.state.lock();
        state
            .bind_attempts
            .push((request.endpoint.to_string(), who.clone()));
        if state.down_endpoints.contains(request.endpoint) {
            return Err(ConnectorError::Unavailable {
                message: format!("{} is down", request.endpoint),
            });
        }
        if state.rejected_identities.contains(&who) {
            return Err(ConnectorError::CredentialsRejected { who });
        }
        drop(state);

        Ok(MockConnector {
            id: self.dir.next_id.fetch_add(1, Ordering::Relaxed),
            endpoint: request.endpoint.to_string(),
            who,
            state: Arc::clone(&self.dir.state),
        })
    }
}
