//! # ldap-connector
//!
//! The connector capability consumed by [`ldap-pool`]: a live,
//! protocol-bound directory session that can be rebound under a new
//! identity, probed for liveness, and unbound.
//!
//! The pool itself is generic over the [`Connector`] and
//! [`ConnectorFactory`] traits defined here; [`StateConnector`] is the
//! production implementation backed by the `ldap3` crate.
//!
//! [`ldap-pool`]: https://crates.io/crates/ldap-pool
//!
//! ## Example
//!
//! ```rust,ignore
//! use ldap_connector::{BindRequest, ConnectorFactory, StateConnectorFactory};
//!
//! let factory = StateConnectorFactory::new();
//! let conn = factory
//!     .bind(BindRequest {
//!         endpoint: "ldap://ldap.example.com",
//!         bind_dn: Some("cn=admin,dc=example,dc=com"),
//!         password: Some("secret"),
//!         use_tls: true,
//!         timeout: None,
//!     })
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod connector;
pub mod error;
pub mod state;

pub use connector::{BindRequest, Connector, ConnectorFactory};
pub use error::ConnectorError;
pub use state::{StateConnector, StateConnectorFactory};
