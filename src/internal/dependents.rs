//! Declared depends-on edges between bean names.
//!
//! Only edges coming from `depends_on` are recorded here, so a depends-on
//! cycle is found by walking this graph rather than the resolution path,
//! where ordinary property references would show up as false re-entries.

use parking_lot::Mutex;

use crate::internal::{FastMap, FastSet};

#[derive(Default)]
pub(crate) struct DependentGraph {
    // dependency -> beans that declared depends-on for it
    dependents: Mutex<FastMap<String, FastSet<String>>>,
}

impl DependentGraph {
    /// Records that `dependent` declared depends-on for `dependency`.
    pub(crate) fn register(&self, dependency: &str, dependent: &str) {
        self.dependents
            .lock()
            .entry(dependency.to_string())
            .or_default()
            .insert(dependent.to_string());
    }

    /// Whether `candidate` depends on `bean`, directly or transitively.
    pub(crate) fn is_dependent(&self, bean: &str, candidate: &str) -> bool {
        let dependents = self.dependents.lock();
        let mut seen = FastSet::default();
        let mut pending = vec![bean];
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(direct) = dependents.get(current) else {
                continue;
            };
            if direct.contains(candidate) {
                return true;
            }
            pending.extend(direct.iter().map(String::as_str));
        }
        false
    }

    /// Beans that declared depends-on for `bean`, sorted.
    pub(crate) fn dependents_of(&self, bean: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .dependents
            .lock()
            .get(bean)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}
