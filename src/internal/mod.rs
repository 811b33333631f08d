//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dependents;
pub(crate) mod dispose_bag;
pub(crate) mod singletons;

pub(crate) use circular::{FrameKind, ResolutionFrame};
pub(crate) use dependents::DependentGraph;
pub(crate) use dispose_bag::{DisposableEntry, DisposeBag};
pub(crate) use singletons::{SingletonRegistry, Tier};

#[cfg(feature = "ahash")]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V>;

#[cfg(feature = "ahash")]
pub(crate) type FastSet<T> = std::collections::HashSet<T, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type FastSet<T> = std::collections::HashSet<T>;
