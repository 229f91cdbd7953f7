//! Pool configuration.

use std::time::Duration;

use crate::endpoints;
use crate::error::PoolError;

/// Configuration for a directory connection pool.
///
/// Immutable once the pool is constructed. Defaults: 10 slots, 3
/// retries per endpoint with a 100 ms delay, a 600 s connector
/// lifetime ceiling, no TLS, no explicit operation timeout.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Server URI list, comma or whitespace separated.
    pub uri: String,

    /// Default bind DN; `None` binds anonymously.
    pub bind: Option<String>,

    /// Default bind credentials.
    pub passwd: Option<String>,

    /// Number of slots in the pool.
    pub size: usize,

    /// Bind attempts per endpoint before failing over to the next one.
    pub retry_max: u32,

    /// Delay between bind attempts against the same endpoint.
    pub retry_delay: Duration,

    /// Negotiate StartTLS when establishing connectors.
    pub use_tls: bool,

    /// Timeout applied to each network operation; `None` means no
    /// explicit timeout.
    pub timeout: Option<Duration>,

    /// Whether to pool connectors at all. When `false`, every
    /// acquisition builds a fresh connector that is discarded on
    /// release.
    pub use_pool: bool,

    /// Maximum age of a pooled connector before it is evicted and
    /// rebuilt.
    pub max_lifetime: Duration,
}

impl PoolConfig {
    /// Create a configuration for the given server URI list with
    /// default settings.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            bind: None,
            passwd: None,
            size: 10,
            retry_max: 3,
            retry_delay: Duration::from_millis(100),
            use_tls: false,
            timeout: None,
            use_pool: true,
            max_lifetime: Duration::from_secs(600),
        }
    }

    /// Set the default bind DN.
    #[must_use]
    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = Some(bind.into());
        self
    }

    /// Set the default bind credentials.
    #[must_use]
    pub fn passwd(mut self, passwd: impl Into<String>) -> Self {
        self.passwd = Some(passwd.into());
        self
    }

    /// Set the pool size.
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the number of bind attempts per endpoint.
    #[must_use]
    pub fn retry_max(mut self, retry_max: u32) -> Self {
        self.retry_max = retry_max;
        self
    }

    /// Set the delay between bind attempts.
    #[must_use]
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Enable or disable StartTLS negotiation.
    #[must_use]
    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Set the per-operation network timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable connector pooling.
    #[must_use]
    pub fn use_pool(mut self, use_pool: bool) -> Self {
        self.use_pool = use_pool;
        self
    }

    /// Set the connector lifetime ceiling.
    #[must_use]
    pub fn max_lifetime(mut self, max_lifetime: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    /// Resolve the configured URI list into an ordered endpoint
    /// sequence.
    #[must_use]
    pub fn endpoints(&self) -> Vec<String> {
        endpoints::resolve(&self.uri)
    }

    /// Validate the configuration.
    ///
    /// Fails on an empty URI list, a zero retry budget, or a zero pool
    /// size while pooling is enabled (disable reuse with
    /// [`use_pool`](Self::use_pool) instead).
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.endpoints().is_empty() {
            return Err(PoolError::Configuration(format!(
                "no server endpoints in uri {:?}",
                self.uri
            )));
        }
        if self.retry_max == 0 {
            return Err(PoolError::Configuration(
                "retry_max must be at least 1".to_string(),
            ));
        }
        if self.use_pool && self.size == 0 {
            return Err(PoolError::Configuration(
                "pool size must be positive; disable pooling with use_pool(false)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PoolConfig::new("ldap://localhost");
        assert_eq!(config.size, 10);
        assert_eq!(config.retry_max, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(100));
        assert!(!config.use_tls);
        assert!(config.timeout.is_none());
        assert!(config.use_pool);
        assert_eq!(config.max_lifetime, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_uri_rejected() {
        let config = PoolConfig::new("  , ");
        assert!(matches!(
            config.validate(),
            Err(PoolError::Configuration(_))
        ));
    }

    #[test]
    fn zero_size_rejected_only_when_pooling() {
        let config = PoolConfig::new("ldap://localhost").size(0);
        assert!(config.validate().is_err());

        let config = PoolConfig::new("ldap://localhost").size(0).use_pool(false);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_retry_budget_rejected() {
        let config = PoolConfig::new("ldap://localhost").retry_max(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_fluent() {
        let config = PoolConfig::new("ldap://a ldap://b")
            .bind("cn=admin,dc=example,dc=com")
            .passwd("secret")
            .size(4)
            .retry_max(2)
            .retry_delay(Duration::ZERO)
            .use_tls(true)
            .timeout(Duration::from_secs(5))
            .max_lifetime(Duration::from_secs(60));

        assert_eq!(config.endpoints(), vec!["ldap://a", "ldap://b"]);
        assert_eq!(config.bind.as_deref(), Some("cn=admin,dc=example,dc=com"));
        assert_eq!(config.size, 4);
        assert!(config.use_tls);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
