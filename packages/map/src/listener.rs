//! Scoped event listener registration.
//!
//! A listener is attached by acquiring a [`ListenerGuard`] and detached when
//! the guard is dropped. Holding guards inside a state value ties listener
//! lifetime to that state: leaving the state releases its listeners, so a
//! step can never leave a stale handler behind.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use strum_macros::{AsRefStr, Display};

/// What a listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ListenerKind {
    /// Clicks landing on a trail feature.
    TrailClick,
    /// Clicks anywhere on the map.
    MapClick,
}

#[derive(Debug, Default)]
struct ListenerTable {
    next_id: u64,
    active: BTreeMap<u64, ListenerKind>,
}

/// Registry of attached listeners, shared between a map and the guards it
/// hands out.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<ListenerTable>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener; it stays attached until the guard is dropped.
    #[must_use = "dropping the guard immediately detaches the listener"]
    pub fn attach(&self, kind: ListenerKind) -> ListenerGuard {
        let mut table = self.inner.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.active.insert(id, kind);
        log::trace!("Attached {kind} listener #{id}");

        ListenerGuard {
            registry: Rc::downgrade(&self.inner),
            id,
            kind,
        }
    }

    /// Number of attached listeners of `kind`.
    #[must_use]
    pub fn count(&self, kind: ListenerKind) -> usize {
        self.inner
            .borrow()
            .active
            .values()
            .filter(|k| **k == kind)
            .count()
    }

    /// Kinds of all attached listeners, in attach order.
    #[must_use]
    pub fn active(&self) -> Vec<ListenerKind> {
        self.inner.borrow().active.values().copied().collect()
    }

    /// Whether no listeners are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().active.is_empty()
    }
}

/// Keeps a listener attached for as long as it lives.
#[derive(Debug)]
pub struct ListenerGuard {
    registry: Weak<RefCell<ListenerTable>>,
    id: u64,
    kind: ListenerKind,
}

impl ListenerGuard {
    /// What this listener reacts to.
    #[must_use]
    pub const fn kind(&self) -> ListenerKind {
        self.kind
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(table) = self.registry.upgrade() {
            table.borrow_mut().active.remove(&self.id);
            log::trace!("Detached {} listener #{}", self.kind, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_detaches_on_drop() {
        let registry = ListenerRegistry::new();
        let guard = registry.attach(ListenerKind::MapClick);
        assert_eq!(registry.count(ListenerKind::MapClick), 1);
        assert_eq!(guard.kind(), ListenerKind::MapClick);

        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn counts_per_kind_in_attach_order() {
        let registry = ListenerRegistry::new();
        let _a = registry.attach(ListenerKind::TrailClick);
        let _b = registry.attach(ListenerKind::MapClick);
        let _c = registry.attach(ListenerKind::TrailClick);

        assert_eq!(registry.count(ListenerKind::TrailClick), 2);
        assert_eq!(
            registry.active(),
            vec![
                ListenerKind::TrailClick,
                ListenerKind::MapClick,
                ListenerKind::TrailClick
            ]
        );
    }

    #[test]
    fn guard_outliving_registry_is_harmless() {
        let registry = ListenerRegistry::new();
        let guard = registry.attach(ListenerKind::TrailClick);
        drop(registry);
        drop(guard);
    }
}
