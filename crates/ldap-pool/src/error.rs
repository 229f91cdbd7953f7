//! Pool-level error types.

use ldap_connector::ConnectorError;
use thiserror::Error;

/// Errors surfaced by pool construction and acquisition.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool configuration is invalid; fatal to pool creation.
    #[error("invalid pool configuration: {0}")]
    Configuration(String),

    /// Every slot is checked out. Recoverable: retry later or grow the
    /// pool. Never corrupts pool state.
    #[error("all {size} pool slots are active for {uri}")]
    PoolExhausted {
        /// Configured pool size.
        size: usize,
        /// Configured server URI list.
        uri: String,
    },

    /// Every endpoint exhausted its retry budget during bind/rebuild.
    /// The attempted slot is left empty so a future acquisition can
    /// retry it.
    #[error("unable to bind to any directory endpoint after {attempts} attempts")]
    Connection {
        /// Total bind attempts made across all endpoints.
        attempts: u32,
        /// The last underlying failure.
        #[source]
        source: ConnectorError,
    },

    /// A reachable server rejected the bind credentials. Not retried:
    /// the same credentials cannot succeed, and repeated attempts may
    /// lock the account.
    #[error("directory bind rejected for {who:?}")]
    Bind {
        /// The rejected bind DN (empty for anonymous).
        who: String,
        /// The underlying rejection.
        #[source]
        source: ConnectorError,
    },

    /// The pool has been shut down.
    #[error("pool is shut down")]
    Closed,
}
