//! The type-construction capability the container consumes.
//!
//! The resolution engine never reflects over types itself. Each description
//! carries a [`BeanClass`] that knows how to construct its type, call its
//! factory methods, assign its properties and invoke its named callbacks.
//! [`TypedClass`] builds one from closures for a concrete `T`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CapabilityError;
use crate::key::TypeKey;
use crate::traits::{DisposableBean, FactoryBean, InitializingBean};
use crate::value::Value;
use crate::AnyBean;

/// Construction, property assignment and callback invocation for one bean type.
///
/// Only [`type_key`](BeanClass::type_key) and
/// [`construct`](BeanClass::construct) are required; the remaining methods
/// report "unsupported" by default.
pub trait BeanClass: Send + Sync {
    /// The type of instances this class produces.
    fn type_key(&self) -> TypeKey;

    /// Whether instances can stand in for `ty`. Covers trait objects and
    /// other views the type opts into.
    fn is_assignable_to(&self, ty: &TypeKey) -> bool {
        self.type_key() == *ty
    }

    /// Builds a raw, unpopulated instance from constructor arguments.
    fn construct(&self, args: Vec<Value>) -> Result<AnyBean, CapabilityError>;

    /// Calls a factory method. `target` is `None` for a static (associated)
    /// factory method and the factory bean instance otherwise.
    fn invoke_factory_method(
        &self,
        target: Option<&AnyBean>,
        method: &str,
        args: Vec<Value>,
    ) -> Result<AnyBean, CapabilityError> {
        let _ = (target, args);
        Err(format!("no factory method '{}' on {}", method, self.type_key()).into())
    }

    /// Assigns a named property on an already constructed instance.
    fn set_property(&self, bean: &AnyBean, property: &str, value: Value) -> Result<(), CapabilityError> {
        let _ = (bean, value);
        Err(format!("no writable property '{}' on {}", property, self.type_key()).into())
    }

    /// Invokes a named no-argument callback (init or destroy method).
    fn invoke(&self, bean: &AnyBean, method: &str) -> Result<(), CapabilityError> {
        let _ = bean;
        Err(format!("no method '{}' on {}", method, self.type_key()).into())
    }

    fn as_factory_bean(&self, bean: &AnyBean) -> Option<Arc<dyn FactoryBean>> {
        let _ = bean;
        None
    }

    fn as_initializing(&self, bean: &AnyBean) -> Option<Arc<dyn InitializingBean>> {
        let _ = bean;
        None
    }

    fn as_disposable(&self, bean: &AnyBean) -> Option<Arc<dyn DisposableBean>> {
        let _ = bean;
        None
    }
}

type Ctor<T> = Box<dyn Fn(Vec<Value>) -> Result<T, CapabilityError> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&T, Value) -> Result<(), CapabilityError> + Send + Sync>;
type Method<T> = Box<dyn Fn(&T) -> Result<(), CapabilityError> + Send + Sync>;
type StaticFactory = Box<dyn Fn(Vec<Value>) -> Result<AnyBean, CapabilityError> + Send + Sync>;
type InstanceFactory<T> = Box<dyn Fn(&T, Vec<Value>) -> Result<AnyBean, CapabilityError> + Send + Sync>;
type View<T, V> = Box<dyn Fn(Arc<T>) -> Arc<V> + Send + Sync>;

/// Closure-backed [`BeanClass`] for a concrete type `T`.
///
/// Setters receive `&T`, so types that take setter injection hold their
/// injectable fields behind interior mutability. That is what lets an early
/// reference handed out during a circular resolution end up identical to the
/// fully populated bean.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanClass, TypedClass, Value};
/// use std::sync::{Arc, RwLock};
///
/// #[derive(Default)]
/// struct Greeter {
///     greeting: RwLock<String>,
/// }
///
/// let class = TypedClass::<Greeter>::with_default()
///     .property("greeting", |g: &Greeter, v: Value| {
///         *g.greeting.write().unwrap() = v.as_str()?.to_string();
///         Ok(())
///     })
///     .build();
///
/// assert_eq!(class.type_key().short_name(), "Greeter");
/// ```
pub struct TypedClass<T> {
    ctor: Option<Ctor<T>>,
    setters: HashMap<String, Setter<T>>,
    methods: HashMap<String, Method<T>>,
    static_factories: HashMap<String, StaticFactory>,
    instance_factories: HashMap<String, InstanceFactory<T>>,
    assignable: Vec<TypeKey>,
    factory_view: Option<View<T, dyn FactoryBean>>,
    initializing_view: Option<View<T, dyn InitializingBean>>,
    disposable_view: Option<View<T, dyn DisposableBean>>,
}

impl<T: Send + Sync + 'static> TypedClass<T> {
    pub fn new() -> Self {
        Self {
            ctor: None,
            setters: HashMap::new(),
            methods: HashMap::new(),
            static_factories: HashMap::new(),
            instance_factories: HashMap::new(),
            assignable: Vec::new(),
            factory_view: None,
            initializing_view: None,
            disposable_view: None,
        }
    }

    /// Class whose constructor ignores arguments and uses `T::default()`.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new().constructor(|_| Ok(T::default()))
    }

    pub fn constructor<F>(mut self, ctor: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<T, CapabilityError> + Send + Sync + 'static,
    {
        self.ctor = Some(Box::new(ctor));
        self
    }

    pub fn property<F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&T, Value) -> Result<(), CapabilityError> + Send + Sync + 'static,
    {
        self.setters.insert(name.into(), Box::new(setter));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&T) -> Result<(), CapabilityError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Box::new(method));
        self
    }

    /// Associated factory method, called without an instance.
    pub fn static_factory<U, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(Vec<Value>) -> Result<U, CapabilityError> + Send + Sync + 'static,
    {
        self.static_factories.insert(
            name.into(),
            Box::new(move |args| factory(args).map(|u| Arc::new(u) as AnyBean)),
        );
        self
    }

    /// Factory method called on an instance of `T` acting as factory bean.
    pub fn instance_factory<U, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(&T, Vec<Value>) -> Result<U, CapabilityError> + Send + Sync + 'static,
    {
        self.instance_factories.insert(
            name.into(),
            Box::new(move |this, args| factory(this, args).map(|u| Arc::new(u) as AnyBean)),
        );
        self
    }

    /// Declares that instances also satisfy lookups for `U`, typically a
    /// trait object type.
    pub fn assignable_to<U: ?Sized + 'static>(mut self) -> Self {
        self.assignable.push(TypeKey::of::<U>());
        self
    }

    pub fn factory_bean(mut self) -> Self
    where
        T: FactoryBean,
    {
        self.factory_view = Some(Box::new(|this| this as Arc<dyn FactoryBean>));
        self
    }

    pub fn initializing(mut self) -> Self
    where
        T: InitializingBean,
    {
        self.initializing_view = Some(Box::new(|this| this as Arc<dyn InitializingBean>));
        self
    }

    pub fn disposable(mut self) -> Self
    where
        T: DisposableBean,
    {
        self.disposable_view = Some(Box::new(|this| this as Arc<dyn DisposableBean>));
        self
    }

    pub fn build(self) -> Arc<dyn BeanClass> {
        Arc::new(self)
    }

    fn typed(&self, bean: &AnyBean) -> Result<Arc<T>, CapabilityError> {
        bean.clone()
            .downcast::<T>()
            .map_err(|_| format!("instance is not a {}", std::any::type_name::<T>()).into())
    }
}

impl<T: Send + Sync + 'static> Default for TypedClass<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> BeanClass for TypedClass<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn is_assignable_to(&self, ty: &TypeKey) -> bool {
        self.type_key() == *ty || self.assignable.contains(ty)
    }

    fn construct(&self, args: Vec<Value>) -> Result<AnyBean, CapabilityError> {
        let ctor = self
            .ctor
            .as_ref()
            .ok_or_else(|| format!("{} has no constructor", std::any::type_name::<T>()))?;
        Ok(Arc::new(ctor(args)?))
    }

    fn invoke_factory_method(
        &self,
        target: Option<&AnyBean>,
        method: &str,
        args: Vec<Value>,
    ) -> Result<AnyBean, CapabilityError> {
        match target {
            None => {
                let factory = self.static_factories.get(method).ok_or_else(|| {
                    format!("no static factory method '{}' on {}", method, std::any::type_name::<T>())
                })?;
                factory(args)
            }
            Some(bean) => {
                let factory = self.instance_factories.get(method).ok_or_else(|| {
                    format!("no factory method '{}' on {}", method, std::any::type_name::<T>())
                })?;
                let this = self.typed(bean)?;
                factory(&this, args)
            }
        }
    }

    fn set_property(&self, bean: &AnyBean, property: &str, value: Value) -> Result<(), CapabilityError> {
        let setter = self.setters.get(property).ok_or_else(|| {
            format!("no writable property '{}' on {}", property, std::any::type_name::<T>())
        })?;
        let this = self.typed(bean)?;
        setter(&this, value)
    }

    fn invoke(&self, bean: &AnyBean, method: &str) -> Result<(), CapabilityError> {
        let callback = self
            .methods
            .get(method)
            .ok_or_else(|| format!("no method '{}' on {}", method, std::any::type_name::<T>()))?;
        let this = self.typed(bean)?;
        callback(&this)
    }

    fn as_factory_bean(&self, bean: &AnyBean) -> Option<Arc<dyn FactoryBean>> {
        let view = self.factory_view.as_ref()?;
        bean.clone().downcast::<T>().ok().map(|this| view(this))
    }

    fn as_initializing(&self, bean: &AnyBean) -> Option<Arc<dyn InitializingBean>> {
        let view = self.initializing_view.as_ref()?;
        bean.clone().downcast::<T>().ok().map(|this| view(this))
    }

    fn as_disposable(&self, bean: &AnyBean) -> Option<Arc<dyn DisposableBean>> {
        let view = self.disposable_view.as_ref()?;
        bean.clone().downcast::<T>().ok().map(|this| view(this))
    }
}

impl<T: 'static> fmt::Debug for TypedClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut properties: Vec<_> = self.setters.keys().collect();
        properties.sort();
        f.debug_struct("TypedClass")
            .field("type", &std::any::type_name::<T>())
            .field("properties", &properties)
            .finish()
    }
}
