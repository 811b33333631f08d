//! The bean factory: resolution engine, singleton cache owner and teardown.
//!
//! All lookups reduce to one primitive, [`BeanFactory::do_get_bean`], which
//! resolves aliases, consults the singleton cache, creates the bean when
//! needed and finally hands out either the bean or, for factory beans, the
//! product it manufactures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, debug_span, info, trace, warn};

use crate::class::BeanClass;
use crate::config::FactoryConfig;
use crate::description::BeanDescription;
use crate::error::{BeanError, BeanResult};
use crate::instantiation::{DefaultInstantiationStrategy, FactoryTarget, InstantiationStrategy};
use crate::internal::circular;
use crate::internal::{
    DependentGraph, DisposableEntry, DisposeBag, FrameKind, ResolutionFrame, SingletonRegistry, Tier,
};
use crate::key::{type_key, TypeKey};
use crate::lifecycle::{BeanPostProcessor, LifecycleProcessor};
use crate::populate::PropertyPopulator;
use crate::registry::DescriptionRegistry;
use crate::scope::Scope;
use crate::traits::{BeanResolver, FactoryBean};
use crate::value::Value;
use crate::{same_bean, AnyBean, FACTORY_BEAN_PREFIX};

mod queries;

static NEXT_FACTORY_ID: AtomicUsize = AtomicUsize::new(1);

/// Splits a requested name into "wants the factory itself" and the bare name.
pub(crate) fn split_factory_prefix(name: &str) -> (bool, &str) {
    match name.strip_prefix(FACTORY_BEAN_PREFIX) {
        Some(rest) => (true, rest.trim_start_matches(FACTORY_BEAN_PREFIX)),
        None => (false, name),
    }
}

/// Name-based bean container.
///
/// The factory owns the description registry, the singleton cache and the
/// circular-reference machinery. It is cheap to clone (an `Arc` inside) and
/// safe to share across threads: concurrent first requests for one
/// singleton create it exactly once, while requests for different names
/// never block each other.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanDescription, BeanFactory, TypedClass, Value};
/// use std::sync::{Arc, OnceLock};
///
/// struct Database { url: String }
///
/// #[derive(Default)]
/// struct UserService { db: OnceLock<Arc<Database>> }
///
/// let factory = BeanFactory::new();
/// factory.register_description(
///     BeanDescription::new(
///         "database",
///         TypedClass::<Database>::new()
///             .constructor(|args| {
///                 let [url] = Value::take_args::<1>(args)?;
///                 Ok(Database { url: url.as_str()?.to_string() })
///             })
///             .build(),
///     )
///     .constructor_arg("postgres://localhost"),
/// ).unwrap();
/// factory.register_description(
///     BeanDescription::new(
///         "userService",
///         TypedClass::<UserService>::with_default()
///             .property("db", |svc: &UserService, v: Value| {
///                 let _ = svc.db.set(v.bean::<Database>()?);
///                 Ok(())
///             })
///             .build(),
///     )
///     .property_ref("db", "database"),
/// ).unwrap();
///
/// let service = factory.get_bean_as::<UserService>("userService").unwrap();
/// assert_eq!(service.db.get().unwrap().url, "postgres://localhost");
/// ```
pub struct BeanFactory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    id: usize,
    config: FactoryConfig,
    registry: DescriptionRegistry,
    singletons: SingletonRegistry,
    products: SingletonRegistry,
    dependents: DependentGraph,
    disposers: Mutex<DisposeBag>,
    lifecycle: LifecycleProcessor,
    populator: PropertyPopulator,
    strategy: Box<dyn InstantiationStrategy>,
}

/// Builder for a [`BeanFactory`] with non-default collaborators.
///
/// ```rust
/// use ferrous_beans::{BeanFactory, FactoryConfig};
///
/// let factory = BeanFactory::builder()
///     .config(FactoryConfig::default().with_circular_references(false))
///     .build();
/// assert!(!factory.config().allow_circular_references);
/// ```
#[derive(Default)]
pub struct BeanFactoryBuilder {
    config: FactoryConfig,
    strategy: Option<Box<dyn InstantiationStrategy>>,
    post_processors: Vec<Arc<dyn BeanPostProcessor>>,
}

impl BeanFactoryBuilder {
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn instantiation_strategy(mut self, strategy: impl InstantiationStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    pub fn post_processor(mut self, processor: Arc<dyn BeanPostProcessor>) -> Self {
        self.post_processors.push(processor);
        self
    }

    pub fn build(self) -> BeanFactory {
        let lifecycle = LifecycleProcessor::new();
        for processor in self.post_processors {
            lifecycle.add_post_processor(processor);
        }
        let singletons = SingletonRegistry::new();
        let products = singletons.view(Tier::Product);
        let inner = FactoryInner {
            id: NEXT_FACTORY_ID.fetch_add(1, Ordering::Relaxed),
            registry: DescriptionRegistry::new(self.config.allow_description_overriding),
            config: self.config,
            singletons,
            products,
            dependents: DependentGraph::default(),
            disposers: Mutex::new(DisposeBag::default()),
            lifecycle,
            populator: PropertyPopulator::new(),
            strategy: self
                .strategy
                .unwrap_or_else(|| Box::new(DefaultInstantiationStrategy)),
        };
        BeanFactory { inner: Arc::new(inner) }
    }
}

impl BeanFactory {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> BeanFactoryBuilder {
        BeanFactoryBuilder::default()
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    // ----- Registration -----

    /// Registers a description under its name.
    pub fn register_description(&self, description: BeanDescription) -> BeanResult<()> {
        self.inner.registry.register(description)
    }

    /// Registers `alias` as an alternate name for `name`.
    pub fn register_alias(&self, name: &str, alias: &str) -> BeanResult<()> {
        self.inner.registry.register_alias(name, alias)
    }

    /// Removes a description. An already cached singleton stays cached
    /// until teardown.
    pub fn remove_description(&self, name: &str) -> BeanResult<()> {
        let canonical = self.inner.registry.resolve_alias(name)?;
        self.inner.registry.remove(&canonical).map(|_| ())
    }

    pub fn get_description(&self, name: &str) -> BeanResult<Arc<BeanDescription>> {
        let (_, bare) = split_factory_prefix(name);
        self.inner.registry.describe(bare)
    }

    pub fn contains_description(&self, name: &str) -> bool {
        self.inner
            .registry
            .resolve_alias(name)
            .map(|canonical| self.inner.registry.contains(&canonical))
            .unwrap_or(false)
    }

    /// Canonical names in registration order.
    pub fn description_names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    pub fn description_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn add_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        self.inner.lifecycle.add_post_processor(processor);
    }

    pub fn post_processor_count(&self) -> usize {
        self.inner.lifecycle.post_processor_count()
    }

    // ----- Lookups -----

    /// Returns the bean registered under `name`, creating it if needed.
    ///
    /// `name` may be an alias. A `&` prefix asks for a factory bean itself
    /// instead of its product.
    pub fn get_bean(&self, name: &str) -> BeanResult<AnyBean> {
        self.do_get_bean(name, None)
    }

    /// Like [`get_bean`](Self::get_bean) with constructor arguments that
    /// replace the declared ones for this creation. Arguments passed for a
    /// singleton that already exists are ignored.
    pub fn get_bean_with_args(&self, name: &str, args: Vec<Value>) -> BeanResult<AnyBean> {
        self.do_get_bean(name, Some(args))
    }

    /// Returns the bean downcast to `T`, failing with `BeanTypeMismatch` if
    /// it is something else.
    pub fn get_bean_as<T: Send + Sync + 'static>(&self, name: &str) -> BeanResult<Arc<T>> {
        self.typed_bean(name, None)
    }

    pub fn get_bean_as_with_args<T: Send + Sync + 'static>(&self, name: &str, args: Vec<Value>) -> BeanResult<Arc<T>> {
        self.typed_bean(name, Some(args))
    }

    /// Returns the single bean of type `T`.
    ///
    /// When several beans match, the one marked primary wins; otherwise (or
    /// when nothing matches) the lookup fails with `NoUniqueBeanOfType`.
    pub fn get_bean_of_type<T: Send + Sync + 'static>(&self) -> BeanResult<Arc<T>> {
        let name = self.unique_candidate::<T>()?;
        self.typed_bean(&name, None)
    }

    pub fn get_bean_of_type_with_args<T: Send + Sync + 'static>(&self, args: Vec<Value>) -> BeanResult<Arc<T>> {
        let name = self.unique_candidate::<T>()?;
        self.typed_bean(&name, Some(args))
    }

    fn unique_candidate<T: 'static>(&self) -> BeanResult<String> {
        let required = type_key::<T>();
        let mut candidates = self.bean_names_for_type(&required);
        if candidates.len() == 1 {
            return Ok(candidates.remove(0));
        }

        let primaries: Vec<&String> = candidates
            .iter()
            .filter(|candidate| {
                let (_, bare) = split_factory_prefix(candidate);
                self.inner
                    .registry
                    .describe(bare)
                    .map(|d| d.is_primary())
                    .unwrap_or(false)
            })
            .collect();
        if let [primary] = primaries.as_slice() {
            return Ok((*primary).clone());
        }
        Err(BeanError::NoUniqueBeanOfType {
            required: required.name(),
            candidates,
        })
    }

    fn typed_bean<T: Send + Sync + 'static>(&self, name: &str, args: Option<Vec<Value>>) -> BeanResult<Arc<T>> {
        let required = type_key::<T>();
        // Reject what the description already rules out before creating anything.
        if let Ok(Some(false)) = self.match_without_init(name, &required) {
            return Err(self.type_mismatch(name, &required));
        }

        let bean = self.do_get_bean(name, args)?;
        bean.downcast::<T>().map_err(|_| self.type_mismatch(name, &required))
    }

    fn type_mismatch(&self, name: &str, required: &TypeKey) -> BeanError {
        BeanError::BeanTypeMismatch {
            name: name.to_string(),
            required: required.name(),
            actual: self
                .predict_type(name)
                .ok()
                .flatten()
                .map_or_else(|| "unknown".to_string(), |ty| ty.name().to_string()),
        }
    }

    /// The resolution primitive every lookup reduces to.
    pub(crate) fn do_get_bean(&self, name: &str, args: Option<Vec<Value>>) -> BeanResult<AnyBean> {
        let (factory_deref, bare) = split_factory_prefix(name);
        let canonical = self.inner.registry.resolve_alias(bare)?;

        if let Some(bean) = self.inner.singletons.get(&canonical) {
            trace!(bean = %canonical, "Returning cached instance of singleton bean");
            if args.is_some() {
                debug!(bean = %canonical, "Ignoring explicit arguments for already created singleton");
            }
            let description = self.inner.registry.describe(&canonical).ok();
            return self.object_for_instance(bean, bare, &canonical, factory_deref, description.as_deref());
        }

        let description = self.describe_canonical(bare, &canonical)?;
        let max_depth = self.inner.config.max_resolution_depth;
        let kind = match description.scope_kind() {
            Scope::Singleton => FrameKind::Singleton,
            Scope::Prototype => FrameKind::Prototype,
        };
        let _frame = ResolutionFrame::enter(self.inner.id, &canonical, kind, max_depth)?;

        for dependency in description.depends_on_names() {
            let (_, bare_dependency) = split_factory_prefix(dependency);
            let dependency_canonical = self.inner.registry.resolve_alias(bare_dependency)?;
            if dependency_canonical == canonical
                || self.inner.dependents.is_dependent(&canonical, &dependency_canonical)
            {
                let mut path = circular::path_to(self.inner.id, &canonical);
                path.push(dependency_canonical);
                return Err(BeanError::CircularDependencyUnresolvable { path });
            }
            self.inner.dependents.register(&dependency_canonical, &canonical);
            trace!(bean = %canonical, depends_on = %dependency, "Initializing declared dependency");
            self.do_get_bean(dependency, None)?;
        }

        let bean = match description.scope_kind() {
            Scope::Singleton => {
                let id = self.inner.id;
                self.inner.singletons.get_or_create(
                    &canonical,
                    || circular::path_to(id, &canonical),
                    |raw| self.inner.lifecycle.early_reference(raw, &description),
                    || self.create_bean(&canonical, &description, args),
                )?
            }
            Scope::Prototype => self.create_bean(&canonical, &description, args)?,
        };

        self.object_for_instance(bean, bare, &canonical, factory_deref, Some(description.as_ref()))
    }

    fn describe_canonical(&self, requested: &str, canonical: &str) -> BeanResult<Arc<BeanDescription>> {
        self.inner.registry.describe(canonical).map_err(|e| match e {
            BeanError::NoSuchBeanDescription(_) => BeanError::NoSuchBeanDescription(requested.to_string()),
            other => other,
        })
    }

    /// Builds, wires and initializes one instance of `description`.
    fn create_bean(
        &self,
        name: &str,
        description: &Arc<BeanDescription>,
        args: Option<Vec<Value>>,
    ) -> BeanResult<AnyBean> {
        let span = debug_span!("create_bean", bean = %name);
        let _enter = span.enter();
        debug!("Creating instance of bean");

        let args = match args {
            Some(explicit) => explicit,
            None => self
                .inner
                .populator
                .resolve_arguments(description.constructor_args(), self)?,
        };

        let factory = match description
            .factory_method_ref()
            .and_then(|fm| fm.factory_bean.as_deref())
        {
            Some(factory_name) => {
                let bean = self.do_get_bean(factory_name, None)?;
                let class: Arc<dyn BeanClass> = self.get_description(factory_name)?.class().clone();
                Some((bean, class))
            }
            None => None,
        };
        let raw = self.inner.strategy.instantiate(
            description,
            args,
            factory.as_ref().map(|(bean, class)| FactoryTarget {
                bean,
                class: class.as_ref(),
            }),
        )?;

        let singleton = description.is_singleton();
        if singleton && self.inner.config.allow_circular_references {
            debug!("Eagerly caching bean to allow for resolving potential circular references");
            self.inner.singletons.expose_early(name, raw.clone());
        }

        self.inner.populator.populate(&raw, description, self)?;
        let mut exposed = self.inner.lifecycle.initialize(raw.clone(), description)?;

        if singleton {
            if let Some(early) = self.inner.singletons.handed_out_early(name) {
                if same_bean(&exposed, &raw) {
                    exposed = early;
                } else if !same_bean(&exposed, &early) && !self.inner.config.allow_raw_injection_despite_wrapping {
                    return Err(BeanError::WrappedEarlyReference(name.to_string()));
                }
            }
            self.inner.disposers.lock().push(DisposableEntry {
                name: name.to_string(),
                bean: raw,
                description: description.clone(),
            });
        }

        debug!("Finished creating instance of bean");
        Ok(exposed)
    }

    /// Either the bean itself or, for a factory bean looked up by its plain
    /// name, the object it manufactures.
    fn object_for_instance(
        &self,
        bean: AnyBean,
        requested: &str,
        canonical: &str,
        factory_deref: bool,
        description: Option<&BeanDescription>,
    ) -> BeanResult<AnyBean> {
        let is_factory = description.is_some_and(BeanDescription::is_factory_bean);
        if factory_deref {
            return match description {
                Some(d) if is_factory && d.class().as_factory_bean(&bean).is_some() => Ok(bean),
                _ => Err(BeanError::NotAFactoryBean(requested.to_string())),
            };
        }
        let Some(description) = description.filter(|_| is_factory) else {
            return Ok(bean);
        };

        let factory = description
            .class()
            .as_factory_bean(&bean)
            .ok_or_else(|| BeanError::NotAFactoryBean(canonical.to_string()))?;
        if description.is_singleton() && factory.is_singleton() {
            let id = self.inner.id;
            self.inner.products.get_or_create(
                canonical,
                || circular::path_to(id, canonical),
                Ok,
                || self.object_from_factory(factory.as_ref(), canonical),
            )
        } else {
            self.object_from_factory(factory.as_ref(), canonical)
        }
    }

    fn object_from_factory(&self, factory: &dyn FactoryBean, name: &str) -> BeanResult<AnyBean> {
        trace!(bean = %name, "Requesting object from factory bean");
        let product = factory
            .get_object()
            .map_err(|source| BeanError::InstantiationFailure {
                name: name.to_string(),
                source,
            })?;
        self.inner.lifecycle.post_process_product(product, name)
    }

    // ----- Lifecycle -----

    /// Creates every non-lazy singleton in registration order. Factory beans
    /// are created; their products only when the factory asks for eager
    /// initialization.
    pub fn pre_instantiate_singletons(&self) -> BeanResult<()> {
        let mut created = 0usize;
        for description in self.inner.registry.descriptions() {
            if !description.is_singleton() || description.is_lazy_init() {
                continue;
            }
            let name = description.name();
            if description.is_factory_bean() {
                let factory = self.get_bean(&format!("{}{}", FACTORY_BEAN_PREFIX, name))?;
                let eager = description
                    .class()
                    .as_factory_bean(&factory)
                    .is_some_and(|f| f.is_eager_init());
                if eager {
                    self.get_bean(name)?;
                }
            } else {
                self.get_bean(name)?;
            }
            created += 1;
        }
        info!(count = created, "Pre-instantiated singletons");
        Ok(())
    }

    /// Destroys every cached singleton, most recently created first.
    ///
    /// New singleton creation is refused while this runs and in-flight
    /// creations are waited for. Destroy callback failures are logged and do
    /// not stop the teardown. The factory is usable again afterwards.
    pub fn destroy_singletons(&self) -> BeanResult<()> {
        // Covers the product tier too; both share one state.
        self.inner.singletons.begin_destruction()?;

        let entries = self.inner.disposers.lock().drain_reverse();
        info!(count = entries.len(), "Destroying singletons");
        for entry in entries {
            debug!(bean = %entry.name, "Invoking destroy callbacks");
            if let Err(e) = self.inner.lifecycle.destroy(&entry.bean, &entry.description) {
                warn!(bean = %entry.name, error = %e, "Destroy callback failed");
            }
        }

        self.inner.singletons.finish_destruction();
        Ok(())
    }

    // ----- Diagnostics -----

    pub fn singleton_count(&self) -> usize {
        self.inner.singletons.len()
    }

    /// Cached singleton names in creation-completion order.
    pub fn singleton_names(&self) -> Vec<String> {
        self.inner.singletons.names()
    }

    pub fn contains_singleton(&self, name: &str) -> bool {
        let (_, bare) = split_factory_prefix(name);
        self.inner
            .registry
            .resolve_alias(bare)
            .map(|canonical| self.inner.singletons.contains(&canonical))
            .unwrap_or(false)
    }

    /// Beans that declared depends-on for `name` and have been resolved.
    pub fn dependent_beans(&self, name: &str) -> Vec<String> {
        let (_, bare) = split_factory_prefix(name);
        self.inner
            .registry
            .resolve_alias(bare)
            .map(|canonical| self.inner.dependents.dependents_of(&canonical))
            .unwrap_or_default()
    }

    /// Whether some thread is creating the singleton `name` right now.
    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        let (_, bare) = split_factory_prefix(name);
        self.inner
            .registry
            .resolve_alias(bare)
            .map(|canonical| self.inner.singletons.is_in_creation(&canonical))
            .unwrap_or(false)
    }
}

impl Default for BeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BeanFactory {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for BeanFactory {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            if let Some(bag) = self.inner.disposers.try_lock() {
                if !bag.is_empty() {
                    warn!(
                        pending = bag.len(),
                        "BeanFactory dropped with undestroyed singletons; call destroy_singletons() first"
                    );
                }
            }
        }
    }
}

impl BeanResolver for BeanFactory {
    fn resolve_bean(&self, name: &str) -> BeanResult<AnyBean> {
        self.do_get_bean(name, None)
    }
}

impl std::fmt::Debug for BeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanFactory")
            .field("id", &self.inner.id)
            .field("descriptions", &self.inner.registry.len())
            .field("singletons", &self.inner.singletons.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_prefix_is_stripped_repeatedly() {
        assert_eq!(split_factory_prefix("svc"), (false, "svc"));
        assert_eq!(split_factory_prefix("&svc"), (true, "svc"));
        assert_eq!(split_factory_prefix("&&svc"), (true, "svc"));
    }

    #[test]
    fn factories_get_distinct_ids() {
        let a = BeanFactory::new();
        let b = BeanFactory::new();
        assert_ne!(a.inner.id, b.inner.id);
        assert_eq!(a.clone().inner.id, a.inner.id);
    }
}
