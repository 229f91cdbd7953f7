//! Connector-level error types.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while establishing or operating a directory session.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The server was reachable but rejected the bind credentials
    /// (LDAP resultCode 49, invalidCredentials).
    ///
    /// This is never worth retrying with the same credentials, and
    /// repeated attempts risk locking the directory account.
    #[error("bind credentials rejected for {who:?}")]
    CredentialsRejected {
        /// The bind DN that was rejected (empty for anonymous).
        who: String,
    },

    /// A network operation exceeded the configured timeout.
    #[error("directory operation timed out after {0:?}")]
    Timeout(Duration),

    /// The server could not be reached or the session broke mid-operation.
    #[error("directory unavailable: {message}")]
    Unavailable {
        /// Description of the underlying transport failure.
        message: String,
    },
}

impl ConnectorError {
    /// Whether this failure is a credential rejection.
    ///
    /// Credential rejections abort the retry/failover loop immediately;
    /// everything else counts as a failed attempt within the retry budget.
    #[must_use]
    pub fn is_credentials_rejection(&self) -> bool {
        matches!(self, Self::CredentialsRejected { .. })
    }
}
