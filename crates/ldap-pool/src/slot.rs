//! Slot bookkeeping.

use std::time::{Duration, Instant};

/// One fixed pool position holding at most one connector.
///
/// The connector itself is moved out of the slot while leased; the
/// metadata stays behind so diagnostics can still describe the slot.
/// Invariant: `active` is true exactly while the slot is claimed by one
/// caller, and only that caller may touch the slot until release.
pub(crate) struct Slot<C> {
    pub(crate) index: usize,
    pub(crate) connector: Option<C>,
    pub(crate) created_at: Option<Instant>,
    pub(crate) active: bool,
    pub(crate) bound_as: Option<String>,
    pub(crate) cred: Option<String>,
    pub(crate) endpoint: Option<String>,
    pub(crate) last_used: Option<Instant>,
}

impl<C> Slot<C> {
    pub(crate) fn empty(index: usize) -> Self {
        Self {
            index,
            connector: None,
            created_at: None,
            active: false,
            bound_as: None,
            cred: None,
            endpoint: None,
            last_used: None,
        }
    }

    /// Age of the connector held here, zero when empty.
    pub(crate) fn age(&self) -> Duration {
        self.created_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// Whether the connector has outlived the given ceiling.
    pub(crate) fn is_stale(&self, max_lifetime: Duration) -> bool {
        self.created_at.is_some() && self.age() > max_lifetime
    }

    /// Whether the held session is bound exactly as the requested
    /// identity and credentials.
    pub(crate) fn matches(&self, bind: Option<&str>, passwd: Option<&str>) -> bool {
        self.bound_as.as_deref() == bind && self.cred.as_deref() == passwd
    }

    /// Drop all state, returning the connector (if any) for the caller
    /// to unbind. The slot becomes empty and inactive.
    pub(crate) fn reset(&mut self) -> Option<C> {
        self.created_at = None;
        self.active = false;
        self.bound_as = None;
        self.cred = None;
        self.endpoint = None;
        self.last_used = None;
        self.connector.take()
    }
}
