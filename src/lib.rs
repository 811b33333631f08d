//! # ferrous-beans
//!
//! Name-based bean container for Rust, inspired by the Spring `BeanFactory`.
//!
//! ## Features
//!
//! - **Name-based resolution**: beans are looked up by name or alias, or by type
//! - **Scopes**: singletons created once and shared, prototypes created per lookup
//! - **Circular setter references**: resolved through early references
//! - **Factory beans**: `name` yields the product, `&name` yields the factory
//! - **Lifecycle hooks**: post-processors, init and destroy callbacks
//! - **Thread-safe**: each singleton is created exactly once under concurrent first access
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_beans::{BeanDescription, BeanFactory, TypedClass, Value};
//! use std::sync::{Arc, OnceLock};
//!
//! #[derive(Default)]
//! struct Husband { wife: OnceLock<Arc<Wife>> }
//!
//! #[derive(Default)]
//! struct Wife { husband: OnceLock<Arc<Husband>> }
//!
//! let factory = BeanFactory::new();
//! factory.register_description(
//!     BeanDescription::new(
//!         "husband",
//!         TypedClass::<Husband>::with_default()
//!             .property("wife", |h: &Husband, v: Value| {
//!                 let _ = h.wife.set(v.bean::<Wife>()?);
//!                 Ok(())
//!             })
//!             .build(),
//!     )
//!     .property_ref("wife", "wife"),
//! ).unwrap();
//! factory.register_description(
//!     BeanDescription::new(
//!         "wife",
//!         TypedClass::<Wife>::with_default()
//!             .property("husband", |w: &Wife, v: Value| {
//!                 let _ = w.husband.set(v.bean::<Husband>()?);
//!                 Ok(())
//!             })
//!             .build(),
//!     )
//!     .property_ref("husband", "husband"),
//! ).unwrap();
//!
//! let husband = factory.get_bean_as::<Husband>("husband").unwrap();
//! let wife = factory.get_bean_as::<Wife>("wife").unwrap();
//! assert!(Arc::ptr_eq(husband.wife.get().unwrap(), &wife));
//! assert!(Arc::ptr_eq(wife.husband.get().unwrap(), &husband));
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use ferrous_beans::{same_bean, BeanDescription, BeanFactory, TypedClass};
//!
//! #[derive(Default)]
//! struct Request;
//!
//! let factory = BeanFactory::new();
//! factory
//!     .register_description(BeanDescription::new("request", TypedClass::<Request>::with_default().build()).prototype())
//!     .unwrap();
//!
//! assert!(factory.is_prototype("request").unwrap());
//! let a = factory.get_bean("request").unwrap();
//! let b = factory.get_bean("request").unwrap();
//! assert!(!same_bean(&a, &b));
//! ```

use std::any::Any;
use std::sync::Arc;

// Module declarations
pub mod class;
pub mod config;
pub mod description;
pub mod error;
pub mod factory;
pub mod instantiation;
pub mod key;
pub mod lifecycle;
pub mod populate;
pub mod registry;
pub mod scope;
pub mod traits;
pub mod value;

// Internal modules
mod internal;

// Re-export core types
pub use class::{BeanClass, TypedClass};
pub use config::{ConfigError, FactoryConfig};
pub use description::{BeanDescription, FactoryMethod};
pub use error::{BeanError, BeanResult, CapabilityError};
pub use factory::{BeanFactory, BeanFactoryBuilder};
pub use instantiation::{DefaultInstantiationStrategy, FactoryTarget, InstantiationStrategy};
pub use key::{type_key, TypeKey};
pub use lifecycle::{BeanPostProcessor, LifecycleProcessor};
pub use populate::PropertyPopulator;
pub use registry::DescriptionRegistry;
pub use scope::{Scope, UnknownScope};
pub use traits::{BeanResolver, DisposableBean, FactoryBean, InitializingBean};
pub use value::{Literal, Value, ValueError, ValueSpec};

/// A bean instance as the container stores it.
pub type AnyBean = Arc<dyn Any + Send + Sync>;

/// Name prefix that selects a factory bean itself instead of its product.
pub const FACTORY_BEAN_PREFIX: &str = "&";

/// Reference equality for beans.
///
/// Compares the data pointers only, so two `AnyBean`s wrapping the same
/// allocation are equal however they were obtained.
#[inline]
pub fn same_bean(a: &AnyBean, b: &AnyBean) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_singleton_resolution() {
        let factory = BeanFactory::new();
        factory
            .register_description(BeanDescription::new(
                "answer",
                TypedClass::<usize>::new().constructor(|_| Ok(42)).build(),
            ))
            .unwrap();

        let a = factory.get_bean_as::<usize>("answer").unwrap();
        let b = factory.get_bean_as::<usize>("answer").unwrap();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_prototype_resolution() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let factory = BeanFactory::new();
        factory
            .register_description(
                BeanDescription::new(
                    "instance",
                    TypedClass::<String>::new()
                        .constructor(move |_| {
                            let c = counter_clone.fetch_add(1, Ordering::SeqCst) + 1;
                            Ok(format!("instance-{}", c))
                        })
                        .build(),
                )
                .prototype(),
            )
            .unwrap();

        let a = factory.get_bean_as::<String>("instance").unwrap();
        let b = factory.get_bean_as::<String>("instance").unwrap();

        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_same_bean_ignores_vtable() {
        let a: AnyBean = Arc::new(5u8);
        let b = a.clone();
        let c: AnyBean = Arc::new(5u8);
        assert!(same_bean(&a, &b));
        assert!(!same_bean(&a, &c));
    }

    #[test]
    fn test_resolver_trait_object() {
        let factory = BeanFactory::new();
        factory
            .register_description(BeanDescription::new(
                "greeting",
                TypedClass::<String>::new().constructor(|_| Ok("hello".to_string())).build(),
            ))
            .unwrap();

        let resolver: &dyn BeanResolver = &factory;
        let bean = resolver.resolve_bean("greeting").unwrap();
        assert_eq!(bean.downcast_ref::<String>().map(String::as_str), Some("hello"));
    }
}
