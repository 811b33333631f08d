//! Type identity for bean classes and type-directed lookups.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::AnyBean;

const RUNTIME_TYPE_NAME: &str = "<runtime type>";

/// Identifies a Rust type the way the container compares types.
///
/// Equality and hashing use only the `TypeId`; the name is carried along for
/// diagnostics. Keys read off a live instance only know the `TypeId`.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{type_key, TypeKey};
///
/// let a = type_key::<String>();
/// let b = TypeKey::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "alloc::string::String");
/// assert_ne!(a, type_key::<u32>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Key for the concrete type behind a bean instance.
    pub fn of_instance(bean: &AnyBean) -> Self {
        Self {
            id: Any::type_id(&**bean),
            name: RUNTIME_TYPE_NAME,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Short name without the module path, for log lines.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[inline(always)]
pub fn type_key<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}
