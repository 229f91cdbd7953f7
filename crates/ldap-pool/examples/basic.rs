//! Minimal pool usage against a local directory server.
//!
//! Run with a directory listening on localhost:389:
//!
//! ```sh
//! cargo run --example basic
//! ```

use std::time::Duration;

use ldap_pool::{Connector, LdapPool, PoolConfig, StateConnectorFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let config = PoolConfig::new("ldap://localhost:389")
        .bind("cn=admin,dc=example,dc=com")
        .passwd("admin")
        .size(4)
        .timeout(Duration::from_secs(5))
        .max_lifetime(Duration::from_secs(600));

    let pool = LdapPool::new(config, StateConnectorFactory::new())?;

    {
        let lease = pool.acquire().await?;
        println!(
            "bound as {:?} via {} (slot {:?})",
            lease.who(),
            lease.endpoint(),
            lease.slot_index()
        );
    } // released here; the session stays warm

    println!("{}", pool.status());

    pool.shutdown().await;
    Ok(())
}
