//! Bean descriptions: the declarative recipe a bean is built from.

use std::fmt;
use std::sync::Arc;

use crate::class::BeanClass;
use crate::key::TypeKey;
use crate::scope::Scope;
use crate::value::{Literal, ValueSpec};

/// Names the factory method a bean is produced by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryMethod {
    /// Bean whose instance the method is called on; `None` for an
    /// associated (static) method on the description's own class.
    pub factory_bean: Option<String>,
    pub method: String,
}

/// Declarative description of a bean.
///
/// Descriptions are built once, registered, and read-only afterwards; the
/// registry hands them out as `Arc<BeanDescription>`.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanDescription, Scope, TypedClass};
///
/// #[derive(Default)]
/// struct Repository;
///
/// let description = BeanDescription::new("repository", TypedClass::<Repository>::with_default().build())
///     .scope(Scope::Prototype)
///     .constructor_arg("users")
///     .property_ref("dataSource", "primaryDataSource")
///     .init_method("connect")
///     .lazy_init(true);
///
/// assert_eq!(description.name(), "repository");
/// assert!(description.scope_kind().is_prototype());
/// assert_eq!(description.referenced_beans(), vec!["primaryDataSource"]);
/// ```
#[derive(Clone)]
pub struct BeanDescription {
    name: String,
    class: Arc<dyn BeanClass>,
    scope: Scope,
    constructor_args: Vec<ValueSpec>,
    properties: Vec<(String, ValueSpec)>,
    factory_method: Option<FactoryMethod>,
    init_method: Option<String>,
    destroy_method: Option<String>,
    lazy_init: bool,
    factory_bean: bool,
    product_type: Option<TypeKey>,
    depends_on: Vec<String>,
    primary: bool,
}

impl BeanDescription {
    pub fn new(name: impl Into<String>, class: Arc<dyn BeanClass>) -> Self {
        Self {
            name: name.into(),
            class,
            scope: Scope::Singleton,
            constructor_args: Vec::new(),
            properties: Vec::new(),
            factory_method: None,
            init_method: None,
            destroy_method: None,
            lazy_init: false,
            factory_bean: false,
            product_type: None,
            depends_on: Vec::new(),
            primary: false,
        }
    }

    // ----- Builder -----

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn prototype(self) -> Self {
        self.scope(Scope::Prototype)
    }

    pub fn constructor_arg(mut self, value: impl Into<Literal>) -> Self {
        self.constructor_args.push(ValueSpec::literal(value));
        self
    }

    pub fn constructor_ref(mut self, bean_name: impl Into<String>) -> Self {
        self.constructor_args.push(ValueSpec::reference(bean_name));
        self
    }

    pub fn constructor_spec(mut self, spec: ValueSpec) -> Self {
        self.constructor_args.push(spec);
        self
    }

    /// Later declarations of the same property replace earlier ones.
    pub fn property_spec(mut self, name: impl Into<String>, spec: ValueSpec) -> Self {
        let name = name.into();
        if let Some(existing) = self.properties.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = spec;
        } else {
            self.properties.push((name, spec));
        }
        self
    }

    pub fn property(self, name: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.property_spec(name, ValueSpec::literal(value))
    }

    pub fn property_ref(self, name: impl Into<String>, bean_name: impl Into<String>) -> Self {
        self.property_spec(name, ValueSpec::reference(bean_name))
    }

    /// Produce the bean through an associated function of its class.
    pub fn static_factory_method(mut self, method: impl Into<String>) -> Self {
        self.factory_method = Some(FactoryMethod {
            factory_bean: None,
            method: method.into(),
        });
        self
    }

    /// Produce the bean by calling `method` on the bean named `factory_bean`.
    pub fn factory_method(mut self, factory_bean: impl Into<String>, method: impl Into<String>) -> Self {
        self.factory_method = Some(FactoryMethod {
            factory_bean: Some(factory_bean.into()),
            method: method.into(),
        });
        self
    }

    pub fn init_method(mut self, method: impl Into<String>) -> Self {
        self.init_method = Some(method.into());
        self
    }

    pub fn destroy_method(mut self, method: impl Into<String>) -> Self {
        self.destroy_method = Some(method.into());
        self
    }

    pub fn lazy_init(mut self, lazy: bool) -> Self {
        self.lazy_init = lazy;
        self
    }

    /// Marks the bean as a [`FactoryBean`](crate::FactoryBean): plain lookups
    /// return its product, `&name` returns the factory.
    pub fn as_factory_bean(mut self) -> Self {
        self.factory_bean = true;
        self
    }

    /// Static hint for the type a factory bean manufactures, so type queries
    /// need not instantiate the factory.
    pub fn product_type(mut self, ty: TypeKey) -> Self {
        self.product_type = Some(ty);
        self
    }

    pub fn depends_on(mut self, bean_name: impl Into<String>) -> Self {
        self.depends_on.push(bean_name.into());
        self
    }

    pub fn primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    // ----- Accessors -----

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &Arc<dyn BeanClass> {
        &self.class
    }

    pub fn type_key(&self) -> TypeKey {
        self.class.type_key()
    }

    pub fn scope_kind(&self) -> Scope {
        self.scope
    }

    pub fn is_singleton(&self) -> bool {
        self.scope.is_singleton()
    }

    pub fn is_prototype(&self) -> bool {
        self.scope.is_prototype()
    }

    pub fn constructor_args(&self) -> &[ValueSpec] {
        &self.constructor_args
    }

    pub fn properties(&self) -> &[(String, ValueSpec)] {
        &self.properties
    }

    pub fn factory_method_ref(&self) -> Option<&FactoryMethod> {
        self.factory_method.as_ref()
    }

    pub fn init_method_name(&self) -> Option<&str> {
        self.init_method.as_deref()
    }

    pub fn destroy_method_name(&self) -> Option<&str> {
        self.destroy_method.as_deref()
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn is_factory_bean(&self) -> bool {
        self.factory_bean
    }

    pub fn product_type_hint(&self) -> Option<TypeKey> {
        self.product_type
    }

    pub fn depends_on_names(&self) -> &[String] {
        &self.depends_on
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Names of all beans referenced by constructor arguments, properties or
    /// the factory method, in declaration order.
    pub fn referenced_beans(&self) -> Vec<&str> {
        let args = self.constructor_args.iter().filter_map(ValueSpec::referenced_bean);
        let props = self.properties.iter().filter_map(|(_, spec)| spec.referenced_bean());
        let factory = self
            .factory_method
            .as_ref()
            .and_then(|fm| fm.factory_bean.as_deref());
        args.chain(props).chain(factory).collect()
    }
}

impl fmt::Debug for BeanDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescription")
            .field("name", &self.name)
            .field("type", &self.class.type_key())
            .field("scope", &self.scope)
            .field("constructor_args", &self.constructor_args)
            .field("properties", &self.properties)
            .field("factory_method", &self.factory_method)
            .field("init_method", &self.init_method)
            .field("destroy_method", &self.destroy_method)
            .field("lazy_init", &self.lazy_init)
            .field("factory_bean", &self.factory_bean)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}
