//! Two-tier singleton cache with per-name creation slots.
//!
//! The permanent cache holds fully initialized singletons. The early cache
//! holds instances that are constructed but still being populated; only the
//! thread that owns a name's creation slot writes them. One mutex guards all
//! maps and is never held while user code runs, so creations of different
//! names proceed in parallel and a thread asking for a name another thread
//! is creating parks on the condvar until that creation finishes.
//!
//! Factory bean products live in a second view over the same state. Both
//! views share the lock, the condvar and the wait-for graph, so a wait cycle
//! that runs through a singleton and a product is detected like any other.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::trace;

use crate::error::{BeanError, BeanResult};
use crate::internal::FastMap;
use crate::AnyBean;

/// Which cache a [`SingletonRegistry`] view fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tier {
    Singleton = 0,
    Product = 1,
}

struct EarlyReference {
    bean: AnyBean,
    processed: bool,
    handed_out: bool,
}

#[derive(Default)]
struct TierState {
    singletons: FastMap<String, AnyBean>,
    early: FastMap<String, EarlyReference>,
    creating: FastMap<String, ThreadId>,
    creation_order: Vec<String>,
}

impl TierState {
    fn clear(&mut self) {
        self.singletons.clear();
        self.early.clear();
        self.creation_order.clear();
    }
}

#[derive(Default)]
struct State {
    tiers: [TierState; 2],
    waiting: FastMap<ThreadId, (Tier, String)>,
    destroying: bool,
}

impl State {
    #[inline]
    fn tier(&self, tier: Tier) -> &TierState {
        &self.tiers[tier as usize]
    }

    #[inline]
    fn tier_mut(&mut self, tier: Tier) -> &mut TierState {
        &mut self.tiers[tier as usize]
    }

    /// Follows the wait-for graph from `owner` across both tiers; reaching
    /// `me` means blocking would deadlock.
    fn closes_wait_cycle(&self, me: ThreadId, mut owner: ThreadId) -> bool {
        for _ in 0..=self.waiting.len() {
            if owner == me {
                return true;
            }
            let Some((tier, name)) = self.waiting.get(&owner) else {
                return false;
            };
            let Some(next) = self.tier(*tier).creating.get(name) else {
                return false;
            };
            owner = *next;
        }
        false
    }

    fn creating_on(&self, me: ThreadId) -> Option<&String> {
        self.tiers
            .iter()
            .flat_map(|tier| tier.creating.iter())
            .find(|(_, owner)| **owner == me)
            .map(|(name, _)| name)
    }

    fn any_creating(&self) -> bool {
        self.tiers.iter().any(|tier| !tier.creating.is_empty())
    }
}

struct Shared {
    state: Mutex<State>,
    changed: Condvar,
}

pub(crate) struct SingletonRegistry {
    shared: Arc<Shared>,
    tier: Tier,
}

/// Clears a creation slot however the creation ends, including unwinding.
struct CreationSlot<'a> {
    registry: &'a SingletonRegistry,
    name: &'a str,
}

impl Drop for CreationSlot<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.registry.shared.state.lock();
            let tier = state.tier_mut(self.registry.tier);
            tier.creating.remove(self.name);
            tier.early.remove(self.name);
        }
        self.registry.shared.changed.notify_all();
    }
}

impl SingletonRegistry {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                changed: Condvar::new(),
            }),
            tier: Tier::Singleton,
        }
    }

    /// A view of `tier` over this registry's state.
    pub(crate) fn view(&self, tier: Tier) -> Self {
        Self {
            shared: self.shared.clone(),
            tier,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock()
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<AnyBean> {
        self.lock().tier(self.tier).singletons.get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.lock().tier(self.tier).singletons.contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().tier(self.tier).singletons.len()
    }

    /// Cached names in creation-completion order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.lock().tier(self.tier).creation_order.clone()
    }

    /// Whether any thread is currently creating `name`.
    pub(crate) fn is_in_creation(&self, name: &str) -> bool {
        self.lock().tier(self.tier).creating.contains_key(name)
    }

    /// Returns the cached singleton, or runs `create` exactly once across
    /// all threads and caches its result.
    ///
    /// Re-entry for `name` on the creating thread is answered with the early
    /// reference when one has been exposed and fails with
    /// `CircularDependencyUnresolvable` otherwise. `path` builds the
    /// resolution path for that error. `early` turns the raw exposed
    /// instance into the reference handed out; it runs at most once per
    /// creation, and only if someone actually needs the early reference.
    pub(crate) fn get_or_create<P, E, F>(&self, name: &str, path: P, early: E, create: F) -> BeanResult<AnyBean>
    where
        P: Fn() -> Vec<String>,
        E: Fn(AnyBean) -> BeanResult<AnyBean>,
        F: FnOnce() -> BeanResult<AnyBean>,
    {
        let me = thread::current().id();
        let mut state = self.lock();
        loop {
            if let Some(bean) = state.tier(self.tier).singletons.get(name) {
                return Ok(bean.clone());
            }
            match state.tier(self.tier).creating.get(name).copied() {
                Some(owner) if owner == me => {
                    trace!(bean = %name, tier = ?self.tier, "Currently in creation on this thread");
                    return self
                        .hand_out_early(state, name, &early)
                        .unwrap_or_else(|| Err(BeanError::CircularDependencyUnresolvable { path: path() }));
                }
                Some(owner) => {
                    if state.closes_wait_cycle(me, owner) {
                        // Another thread waits on us while owning `name`.
                        trace!(bean = %name, tier = ?self.tier, "Breaking cross-thread wait cycle");
                        return self
                            .hand_out_early(state, name, &early)
                            .unwrap_or_else(|| Err(BeanError::CircularDependencyUnresolvable { path: path() }));
                    }
                    state.waiting.insert(me, (self.tier, name.to_string()));
                    self.shared.changed.wait(&mut state);
                    state.waiting.remove(&me);
                }
                None => {
                    if state.destroying {
                        return Err(BeanError::FactoryClosed(name.to_string()));
                    }
                    state.tier_mut(self.tier).creating.insert(name.to_string(), me);
                    break;
                }
            }
        }
        drop(state);

        let _slot = CreationSlot { registry: self, name };
        let bean = create()?;
        let mut state = self.lock();
        let tier = state.tier_mut(self.tier);
        tier.singletons.insert(name.to_string(), bean.clone());
        tier.creation_order.push(name.to_string());
        Ok(bean)
    }

    /// The early reference for `name`, processed through `early` on first
    /// use. `None` if nothing was exposed for `name`.
    fn hand_out_early<E>(&self, mut state: MutexGuard<'_, State>, name: &str, early: &E) -> Option<BeanResult<AnyBean>>
    where
        E: Fn(AnyBean) -> BeanResult<AnyBean>,
    {
        let entry = state.tier_mut(self.tier).early.get_mut(name)?;
        entry.handed_out = true;
        if entry.processed {
            return Some(Ok(entry.bean.clone()));
        }
        let raw = entry.bean.clone();
        drop(state);

        let processed = match early(raw) {
            Ok(bean) => bean,
            Err(e) => return Some(Err(e)),
        };
        let mut state = self.lock();
        let tier = state.tier_mut(self.tier);
        if let Some(entry) = tier.early.get_mut(name) {
            if entry.processed {
                return Some(Ok(entry.bean.clone()));
            }
            entry.bean = processed.clone();
            entry.processed = true;
            return Some(Ok(processed));
        }
        // Creation finished while the hook ran.
        Some(Ok(tier.singletons.get(name).cloned().unwrap_or(processed)))
    }

    /// Publishes a constructed but unpopulated instance so re-entrant
    /// requests can reference it.
    pub(crate) fn expose_early(&self, name: &str, bean: AnyBean) {
        self.lock().tier_mut(self.tier).early.insert(
            name.to_string(),
            EarlyReference {
                bean,
                processed: false,
                handed_out: false,
            },
        );
    }

    /// The early reference for `name` if anyone received it.
    pub(crate) fn handed_out_early(&self, name: &str) -> Option<AnyBean> {
        let state = self.lock();
        state
            .tier(self.tier)
            .early
            .get(name)
            .filter(|early| early.handed_out)
            .map(|early| early.bean.clone())
    }

    /// Enters the exclusive teardown phase for every tier: refuses new
    /// creations and waits for in-flight ones to finish.
    pub(crate) fn begin_destruction(&self) -> BeanResult<()> {
        let me = thread::current().id();
        let mut state = self.lock();
        if let Some(name) = state.creating_on(me) {
            return Err(BeanError::FactoryClosed(name.clone()));
        }
        state.destroying = true;
        while state.any_creating() {
            self.shared.changed.wait(&mut state);
        }
        Ok(())
    }

    /// Drops every cached instance in every tier and reopens the registry.
    pub(crate) fn finish_destruction(&self) {
        {
            let mut state = self.lock();
            for tier in state.tiers.iter_mut() {
                tier.clear();
            }
            state.destroying = false;
        }
        self.shared.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    fn bean(v: u32) -> AnyBean {
        Arc::new(v)
    }

    #[test]
    fn creates_once_across_threads() {
        let registry = Arc::new(SingletonRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    registry
                        .get_or_create("s", Vec::new, Ok, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(5));
                            Ok(bean(7))
                        })
                        .unwrap()
                })
            })
            .collect();

        let beans: Vec<AnyBean> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for b in &beans[1..] {
            assert!(Arc::ptr_eq(&beans[0], b));
        }
    }

    #[test]
    fn reentry_without_early_reference_fails() {
        let registry = SingletonRegistry::new();
        let result = registry.get_or_create("a", Vec::new, Ok, || {
            registry.get_or_create("a", || vec!["a".into(), "a".into()], Ok, || Ok(bean(1)))
        });
        match result {
            Err(BeanError::CircularDependencyUnresolvable { path }) => assert_eq!(path, vec!["a", "a"]),
            _ => panic!("expected circular error"),
        }
        assert!(!registry.is_in_creation("a"));
        assert!(!registry.contains("a"));
    }

    #[test]
    fn reentry_sees_early_reference() {
        let registry = SingletonRegistry::new();
        let raw = bean(3);
        let result = registry
            .get_or_create("a", Vec::new, Ok, || {
                registry.expose_early("a", raw.clone());
                assert!(registry.handed_out_early("a").is_none());
                let early = registry.get_or_create("a", Vec::new, Ok, || Ok(bean(99)))?;
                assert!(Arc::ptr_eq(&early, &raw));
                assert!(registry.handed_out_early("a").is_some());
                Ok(raw.clone())
            })
            .unwrap();
        assert!(Arc::ptr_eq(&result, &raw));
        assert_eq!(registry.names(), vec!["a"]);
    }

    #[test]
    fn failed_creation_clears_slot() {
        let registry = SingletonRegistry::new();
        let failed = registry.get_or_create("a", Vec::new, Ok, || Err(BeanError::DepthExceeded(0)));
        assert!(failed.is_err());
        assert!(!registry.is_in_creation("a"));

        let created = registry.get_or_create("a", Vec::new, Ok, || Ok(bean(1))).unwrap();
        assert_eq!(*created.downcast::<u32>().unwrap(), 1);
    }

    #[test]
    fn destruction_blocks_new_creations() {
        let registry = SingletonRegistry::new();
        registry.get_or_create("a", Vec::new, Ok, || Ok(bean(1))).unwrap();
        registry.begin_destruction().unwrap();
        assert!(registry.get("a").is_some());
        assert!(matches!(
            registry.get_or_create("b", Vec::new, Ok, || Ok(bean(2))),
            Err(BeanError::FactoryClosed(name)) if name == "b"
        ));
        registry.finish_destruction();
        assert_eq!(registry.len(), 0);
        assert!(registry.get_or_create("b", Vec::new, Ok, || Ok(bean(2))).is_ok());
    }

    #[test]
    fn tiers_keep_separate_caches() {
        let registry = SingletonRegistry::new();
        let products = registry.view(Tier::Product);
        registry.get_or_create("svc", Vec::new, Ok, || Ok(bean(1))).unwrap();
        let product = products.get_or_create("svc", Vec::new, Ok, || Ok(bean(2))).unwrap();

        assert_eq!(*product.downcast::<u32>().unwrap(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(products.names(), vec!["svc"]);

        registry.begin_destruction().unwrap();
        registry.finish_destruction();
        assert!(!products.contains("svc"));
    }

    #[test]
    fn wait_cycle_across_tiers_fails_fast() {
        let registry = SingletonRegistry::new();
        let products = registry.view(Tier::Product);
        let both_owned = Barrier::new(2);

        let (singleton, product) = crossbeam_utils::thread::scope(|s| {
            let singleton = s.spawn(|_| {
                registry.get_or_create("s", Vec::new, Ok, || {
                    both_owned.wait();
                    products.get_or_create("p", || vec!["s".into(), "p".into()], Ok, || Ok(bean(1)))?;
                    Ok(bean(2))
                })
            });
            let product = s.spawn(|_| {
                products.get_or_create("p", Vec::new, Ok, || {
                    both_owned.wait();
                    registry.get_or_create("s", || vec!["p".into(), "s".into()], Ok, || Ok(bean(3)))?;
                    Ok(bean(4))
                })
            });
            (singleton.join().unwrap(), product.join().unwrap())
        })
        .unwrap();

        // Whichever thread closed the cycle fails; the other then finishes.
        let circular = [&singleton, &product]
            .iter()
            .filter(|r| matches!(r, Err(BeanError::CircularDependencyUnresolvable { .. })))
            .count();
        assert_eq!(circular, 1);
        assert!(singleton.is_ok() || product.is_ok());
        assert!(!registry.is_in_creation("s"));
        assert!(!products.is_in_creation("p"));
    }
}
