//! Initialization and destruction callbacks around a populated bean.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::description::BeanDescription;
use crate::error::{BeanError, BeanResult, CapabilityError};
use crate::AnyBean;

/// Hooks invoked around bean initialization.
///
/// Hooks run in registration order. The after-initialization hook may return
/// a different instance (a wrapper or proxy); that instance becomes the
/// resolved bean.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{AnyBean, BeanPostProcessor, CapabilityError};
///
/// struct Tracing;
///
/// impl BeanPostProcessor for Tracing {
///     fn after_initialization(&self, bean: AnyBean, name: &str) -> Result<AnyBean, CapabilityError> {
///         println!("bean '{}' ready", name);
///         Ok(bean)
///     }
/// }
/// ```
pub trait BeanPostProcessor: Send + Sync {
    fn before_initialization(&self, bean: AnyBean, name: &str) -> Result<AnyBean, CapabilityError> {
        let _ = name;
        Ok(bean)
    }

    fn after_initialization(&self, bean: AnyBean, name: &str) -> Result<AnyBean, CapabilityError> {
        let _ = name;
        Ok(bean)
    }

    /// Called when a raw singleton is exposed for circular references. A
    /// processor that wraps beans should wrap here too, so dependents that
    /// receive the early reference see the same object the cache ends up
    /// holding.
    fn early_reference(&self, bean: AnyBean, name: &str) -> Result<AnyBean, CapabilityError> {
        let _ = name;
        Ok(bean)
    }

    fn before_destruction(&self, bean: &AnyBean, name: &str) -> Result<(), CapabilityError> {
        let _ = (bean, name);
        Ok(())
    }
}

/// Runs the registered hooks and the description's declared callbacks.
#[derive(Default)]
pub struct LifecycleProcessor {
    processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
}

impl LifecycleProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        self.processors.write().push(processor);
    }

    pub fn post_processor_count(&self) -> usize {
        self.processors.read().len()
    }

    // Snapshot so user hooks run without holding the lock.
    fn snapshot(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.processors.read().clone()
    }

    /// Pre-initialization hooks, `InitializingBean`, the declared init
    /// method, then post-initialization hooks. Returns the final instance.
    pub fn initialize(&self, bean: AnyBean, description: &BeanDescription) -> BeanResult<AnyBean> {
        let name = description.name();
        let fail = |source: CapabilityError| BeanError::InitializationFailure {
            name: name.to_string(),
            source,
        };
        let processors = self.snapshot();

        let mut current = bean;
        for processor in &processors {
            current = processor.before_initialization(current, name).map_err(fail)?;
        }

        let class = description.class();
        if let Some(initializing) = class.as_initializing(&current) {
            trace!(bean = %name, "Invoking after_properties_set");
            initializing.after_properties_set().map_err(fail)?;
        }
        if let Some(method) = description.init_method_name() {
            trace!(bean = %name, method = %method, "Invoking init method");
            class.invoke(&current, method).map_err(fail)?;
        }

        for processor in &processors {
            current = processor.after_initialization(current, name).map_err(fail)?;
        }
        Ok(current)
    }

    /// The reference handed out while `bean` is still being populated.
    pub fn early_reference(&self, bean: AnyBean, description: &BeanDescription) -> BeanResult<AnyBean> {
        let name = description.name();
        let mut current = bean;
        for processor in self.snapshot() {
            current = processor
                .early_reference(current, name)
                .map_err(|source| BeanError::InitializationFailure {
                    name: name.to_string(),
                    source,
                })?;
        }
        Ok(current)
    }

    /// Post-initialization hooks applied to an object a factory bean made.
    pub fn post_process_product(&self, product: AnyBean, factory_name: &str) -> BeanResult<AnyBean> {
        let mut current = product;
        for processor in self.snapshot() {
            current = processor
                .after_initialization(current, factory_name)
                .map_err(|source| BeanError::InitializationFailure {
                    name: factory_name.to_string(),
                    source,
                })?;
        }
        Ok(current)
    }

    /// Destruction hooks, `DisposableBean`, then the declared destroy
    /// method. Every step runs even if an earlier one failed; the first
    /// failure is returned.
    pub fn destroy(&self, bean: &AnyBean, description: &BeanDescription) -> BeanResult<()> {
        let name = description.name();
        let mut first_error: Option<CapabilityError> = None;
        let mut record = |result: Result<(), CapabilityError>| {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        };

        for processor in self.snapshot() {
            record(processor.before_destruction(bean, name));
        }
        let class = description.class();
        if let Some(disposable) = class.as_disposable(bean) {
            record(disposable.destroy());
        }
        if let Some(method) = description.destroy_method_name() {
            record(class.invoke(bean, method));
        }

        match first_error {
            Some(source) => Err(BeanError::DestructionFailure {
                name: name.to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}
