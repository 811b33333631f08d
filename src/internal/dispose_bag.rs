//! Internal disposal bag for singleton teardown.

use std::sync::Arc;

use crate::description::BeanDescription;
use crate::AnyBean;

/// A cached singleton awaiting its destroy callbacks.
pub(crate) struct DisposableEntry {
    pub(crate) name: String,
    pub(crate) bean: AnyBean,
    pub(crate) description: Arc<BeanDescription>,
}

/// Singletons in creation-completion order; drained last-in first-out.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<DisposableEntry>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, entry: DisposableEntry) {
        self.entries.push(entry);
    }

    /// Takes every entry, most recently created first.
    pub(crate) fn drain_reverse(&mut self) -> Vec<DisposableEntry> {
        let mut entries = std::mem::take(&mut self.entries);
        entries.reverse();
        entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
