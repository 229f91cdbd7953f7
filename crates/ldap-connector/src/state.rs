//! `ldap3`-backed connector.
//!
//! [`StateConnector`] just remembers who is bound and where it is
//! connected, on top of an async `ldap3` session handle.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::exop::WhoAmI;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError};

use crate::connector::{BindRequest, Connector, ConnectorFactory};
use crate::error::ConnectorError;

/// LDAP resultCode for invalidCredentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

fn map_ldap_error(who: &str, err: LdapError) -> ConnectorError {
    match err {
        LdapError::LdapResult { result } if result.rc == RC_INVALID_CREDENTIALS => {
            ConnectorError::CredentialsRejected {
                who: who.to_string(),
            }
        }
        other => ConnectorError::Unavailable {
            message: other.to_string(),
        },
    }
}

/// A live `ldap3` session that remembers who it is bound as.
pub struct StateConnector {
    ldap: Ldap,
    endpoint: String,
    who: String,
    timeout: Option<Duration>,
}

impl StateConnector {
    /// The identity this session is currently bound as (empty for
    /// anonymous).
    #[must_use]
    pub fn who(&self) -> &str {
        &self.who
    }

    async fn simple_bind(
        &mut self,
        bind_dn: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), ConnectorError> {
        let who = bind_dn.unwrap_or("");
        let pw = password.unwrap_or("");

        let op = if let Some(timeout) = self.timeout {
            self.ldap.with_timeout(timeout).simple_bind(who, pw).await
        } else {
            self.ldap.simple_bind(who, pw).await
        };

        op.and_then(ldap3::LdapResult::success)
            .map_err(|e| map_ldap_error(who, e))?;

        self.who = who.to_string();
        Ok(())
    }
}

impl std::fmt::Debug for StateConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateConnector")
            .field("endpoint", &self.endpoint)
            .field("who", &self.who)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for StateConnector {
    async fn rebind(
        &mut self,
        bind_dn: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), ConnectorError> {
        tracing::debug!(endpoint = %self.endpoint, who = bind_dn.unwrap_or(""), "rebinding session");
        self.simple_bind(bind_dn, password).await
    }

    async fn probe(&mut self) -> Result<(), ConnectorError> {
        let op = if let Some(timeout) = self.timeout {
            self.ldap.with_timeout(timeout).extended(WhoAmI).await
        } else {
            self.ldap.extended(WhoAmI).await
        };

        let _ = op
            .and_then(ldap3::result::ExopResult::success)
            .map_err(|e| map_ldap_error(&self.who, e))?;
        Ok(())
    }

    async fn unbind(&mut self) -> Result<(), ConnectorError> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| map_ldap_error(&self.who, e))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Factory producing [`StateConnector`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateConnectorFactory;

impl StateConnectorFactory {
    /// Create a new factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectorFactory for StateConnectorFactory {
    type Connector = StateConnector;

    async fn bind(&self, request: BindRequest<'_>) -> Result<StateConnector, ConnectorError> {
        let who = request.who();

        let mut settings = LdapConnSettings::new().set_starttls(request.use_tls);
        if let Some(timeout) = request.timeout {
            settings = settings.set_conn_timeout(timeout);
        }

        tracing::debug!(endpoint = %request.endpoint, who, "establishing directory session");

        let (conn, ldap) = LdapConnAsync::with_settings(settings, request.endpoint)
            .await
            .map_err(|e| map_ldap_error(who, e))?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!(error = %e, "directory connection driver terminated");
            }
        });

        let mut connector = StateConnector {
            ldap,
            endpoint: request.endpoint.to_string(),
            who: String::new(),
            timeout: request.timeout,
        };
        connector
            .simple_bind(request.bind_dn, request.password)
            .await?;

        Ok(connector)
    }
}
