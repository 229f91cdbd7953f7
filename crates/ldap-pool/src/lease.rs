//! Scoped lease over a pooled connector.
//!
//! A [`Lease`] is the only way a caller ever touches a connector. It
//! derefs to the connector for the duration of the borrow and releases
//! the slot on drop, so release happens on every exit path: normal
//! completion, early `?` return, or panic.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use ldap_connector::Connector;

use crate::pool::PoolShared;

enum LeaseMode {
    /// Returns to its slot on drop; the connector stays warm.
    Pooled { index: usize },
    /// Built outside the pool (`use_pool = false`); the connector is
    /// discarded on drop, never reused.
    Transient,
}

/// A connector checked out of the pool.
///
/// The pool owns all connector lifetimes; do not retain the connector
/// past the lease. Dropping the lease resets the slot's `active` flag
/// even if the caller's work failed.
pub struct Lease<C: Connector> {
    connector: Option<C>,
    shared: Arc<PoolShared<C>>,
    mode: LeaseMode,
}

impl<C: Connector> Lease<C> {
    pub(crate) fn pooled(connector: C, index: usize, shared: Arc<PoolShared<C>>) -> Self {
        Self {
            connector: Some(connector),
            shared,
            mode: LeaseMode::Pooled { index },
        }
    }

    pub(crate) fn transient(connector: C, shared: Arc<PoolShared<C>>) -> Self {
        Self {
            connector: Some(connector),
            shared,
            mode: LeaseMode::Transient,
        }
    }

    /// Index of the slot this lease references, `None` for a transient
    /// (unpooled) lease.
    #[must_use]
    pub fn slot_index(&self) -> Option<usize> {
        match self.mode {
            LeaseMode::Pooled { index } => Some(index),
            LeaseMode::Transient => None,
        }
    }
}

impl<C: Connector> std::fmt::Debug for Lease<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("slot_index", &self.slot_index())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Deref for Lease<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // Invariant: `connector` is Some until drop.
        match &self.connector {
            Some(c) => c,
            None => unreachable!("lease connector taken before drop"),
        }
    }
}

impl<C: Connector> DerefMut for Lease<C> {
    fn deref_mut(&mut self) -> &mut C {
        match &mut self.connector {
            Some(c) => c,
            None => unreachable!("lease connector taken before drop"),
        }
    }
}

impl<C: Connector> Drop for Lease<C> {
    fn drop(&mut self) {
        let Some(connector) = self.connector.take() else {
            return;
        };

        match self.mode {
            LeaseMode::Transient => {
                self.shared.discard_detached(connector);
            }
            LeaseMode::Pooled { index } => {
                if self.shared.closed.load(Ordering::Acquire) {
                    // Pool shut down while this lease was out; the slot
                    // is gone, close the straggler.
                    self.shared.discard_detached(connector);
                    return;
                }

                let mut slots = self.shared.slots.lock();
                let slot = &mut slots[index];
                slot.connector = Some(connector);
                slot.active = false;
                slot.last_used = Some(Instant::now());
                tracing::trace!(slot = index, "connector returned to pool");
            }
        }
    }
}
