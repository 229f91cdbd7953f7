//! The connector capability traits.
//!
//! A connector is not just a TCP socket: it is a session-layer object
//! that has already authenticated against a directory server. The pool
//! only ever talks to these two traits, so alternative transports (or
//! test doubles) plug in without touching pool logic.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ConnectorError;

/// Parameters for establishing one bound directory session.
#[derive(Debug, Clone, Copy)]
pub struct BindRequest<'a> {
    /// Server URI to connect to, e.g. `ldap://ldap1.example.com`.
    pub endpoint: &'a str,
    /// Identity to bind as; `None` binds anonymously.
    pub bind_dn: Option<&'a str>,
    /// Credentials for the bind identity.
    pub password: Option<&'a str>,
    /// Negotiate StartTLS before binding.
    pub use_tls: bool,
    /// Bound applied to each network operation; `None` means no
    /// explicit timeout.
    pub timeout: Option<Duration>,
}

impl BindRequest<'_> {
    /// The effective bind DN, empty string for anonymous binds.
    #[must_use]
    pub fn who(&self) -> &str {
        self.bind_dn.unwrap_or("")
    }
}

/// One live, bound directory session.
///
/// The pool owns every connector for its whole lifetime; callers only
/// ever borrow one through a lease and must not retain it past release.
#[async_trait]
pub trait Connector: Send + 'static {
    /// Re-authenticate the existing session as a different identity.
    ///
    /// On success the session keeps its underlying transport; on
    /// failure the session state is unspecified and the caller should
    /// discard the connector.
    async fn rebind(
        &mut self,
        bind_dn: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), ConnectorError>;

    /// Cheap liveness check, a "whoami"-style no-op request.
    async fn probe(&mut self) -> Result<(), ConnectorError>;

    /// Gracefully terminate the session.
    ///
    /// Failures are reported but a connector is considered dead after
    /// this call either way.
    async fn unbind(&mut self) -> Result<(), ConnectorError>;

    /// The endpoint URI this session is connected to.
    fn endpoint(&self) -> &str;
}

/// Establishes new [`Connector`] sessions.
///
/// Separated from [`Connector`] so the factory can carry shared
/// configuration (TLS settings, test scripts) while each connector
/// owns only its session.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    /// The connector type this factory produces.
    type Connector: Connector;

    /// Connect to `request.endpoint` and bind as the requested identity.
    async fn bind(&self, request: BindRequest<'_>) -> Result<Self::Connector, ConnectorError>;
}
