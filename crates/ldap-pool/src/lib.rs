//! # ldap-pool
//!
//! A bounded pool of live, bound directory sessions.
//!
//! Establishing an authenticated LDAP session is expensive: TCP connect,
//! optional StartTLS negotiation, then a bind round-trip. This pool
//! amortizes that cost by keeping a fixed set of bound connectors warm
//! across requests, handing them out under an RAII lease, and
//! transparently recovering from server restarts, timeouts, and
//! transient failures.
//!
//! ## Features
//!
//! - Fixed-size slot pool with first-fit acquisition
//! - Reuse without rebinding when the requested identity matches
//! - Rebind in place on identity change, full rebuild on broken sessions
//! - Retry with delay across an ordered list of server endpoints
//! - Lifetime ceiling: stale connectors are evicted before hand-out
//! - RAII lease: release is guaranteed on every exit path
//! - Pooling can be disabled entirely (fresh session per acquisition)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use ldap_connector::StateConnectorFactory;
//! use ldap_pool::{Pool, PoolConfig};
//!
//! let config = PoolConfig::new("ldap://ldap1.example.com, ldap://ldap2.example.com")
//!     .bind("cn=service,dc=example,dc=com")
//!     .passwd("secret")
//!     .size(10)
//!     .max_lifetime(Duration::from_secs(600));
//!
//! let pool = Pool::new(config, StateConnectorFactory::new())?;
//!
//! {
//!     let mut lease = pool.acquire().await?;
//!     // Use the connector through the lease...
//! } // released here, connector stays warm
//!
//! pool.shutdown().await;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod endpoints;
pub mod error;
pub mod lease;
pub mod pool;
mod slot;

pub use config::PoolConfig;
pub use error::PoolError;
pub use lease::Lease;
pub use pool::{Pool, PoolMetrics, PoolStatus, SlotStatus};

// Re-export the capability boundary so most users need only this crate.
pub use ldap_connector::{
    BindRequest, Connector, ConnectorError, ConnectorFactory, StateConnector,
    StateConnectorFactory,
};

/// Pool of `ldap3`-backed sessions, the common production configuration.
pub type LdapPool = Pool<StateConnectorFactory>;
