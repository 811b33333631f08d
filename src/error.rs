//! Error types for the bean container.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error produced by externally supplied capabilities: constructors,
/// property setters, lifecycle callbacks and factory beans.
pub type CapabilityError = Box<dyn StdError + Send + Sync>;

/// Bean container errors
///
/// Every failure the container reports is a variant of this one enum, so
/// callers can match on the category they care about and propagate the rest
/// with `?`.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanError, BeanFactory};
///
/// let factory = BeanFactory::new();
/// match factory.get_bean("missing") {
///     Err(BeanError::NoSuchBeanDescription(name)) => assert_eq!(name, "missing"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_beans::BeanError;
///
/// let circular = BeanError::CircularDependencyUnresolvable {
///     path: vec!["a".into(), "b".into(), "a".into()],
/// };
/// assert_eq!(
///     circular.to_string(),
///     "Unresolvable circular reference: a -> b -> a"
/// );
/// ```
#[derive(Debug, Error)]
pub enum BeanError {
    /// No description is registered under the name, alias or type
    #[error("No bean named '{0}' is defined")]
    NoSuchBeanDescription(String),

    /// An alias chain revisits a name
    #[error("Alias cycle detected: {}", .path.join(" -> "))]
    AliasCycle { path: Vec<String> },

    /// Alias is already bound to a different name and overriding is disabled
    #[error("Cannot register alias '{alias}' for '{requested}': already registered for '{existing}'")]
    AliasOverride {
        alias: String,
        existing: String,
        requested: String,
    },

    /// The bean does not have the type the caller asked for
    #[error("Bean named '{name}' is expected to be of type '{required}' but was '{actual}'")]
    BeanTypeMismatch {
        name: String,
        required: &'static str,
        actual: String,
    },

    /// Zero or several candidates matched a type-directed lookup
    #[error("Expected a single bean of type '{required}' but found {}: [{}]", .candidates.len(), .candidates.join(", "))]
    NoUniqueBeanOfType {
        required: &'static str,
        candidates: Vec<String>,
    },

    /// A dependency cycle that early-reference exposure cannot break
    #[error("Unresolvable circular reference: {}", .path.join(" -> "))]
    CircularDependencyUnresolvable { path: Vec<String> },

    /// Raw construction failed
    #[error("Error creating bean '{name}': instantiation failed: {source}")]
    InstantiationFailure {
        name: String,
        #[source]
        source: CapabilityError,
    },

    /// Applying a property value failed
    #[error("Error creating bean '{name}': cannot set property '{property}': {source}")]
    PropertyPopulationFailure {
        name: String,
        property: String,
        #[source]
        source: CapabilityError,
    },

    /// An init callback or a post-processor failed
    #[error("Error initializing bean '{name}': {source}")]
    InitializationFailure {
        name: String,
        #[source]
        source: CapabilityError,
    },

    /// A destroy callback failed during teardown
    #[error("Error destroying bean '{name}': {source}")]
    DestructionFailure {
        name: String,
        #[source]
        source: CapabilityError,
    },

    /// `&name` was requested but `name` is not a factory bean
    #[error("Bean named '{0}' is not a factory bean")]
    NotAFactoryBean(String),

    /// A description with this name exists and overriding is disabled
    #[error("Cannot register bean description '{0}': a description with this name is already registered")]
    DescriptionOverride(String),

    /// A post-processor wrapped a bean whose raw early reference was already injected elsewhere
    #[error("Bean '{0}' has been injected into other beans in its raw version as part of a circular reference, but has eventually been wrapped")]
    WrappedEarlyReference(String),

    /// Maximum resolution depth exceeded
    #[error("Max resolution depth {0} exceeded")]
    DepthExceeded(usize),

    /// The factory is tearing down and refuses new singleton creation
    #[error("Singleton creation of '{0}' not allowed while singletons are being destroyed")]
    FactoryClosed(String),
}

impl BeanError {
    /// The bean name the error is about, when it carries one.
    pub fn bean_name(&self) -> Option<&str> {
        match self {
            BeanError::NoSuchBeanDescription(name)
            | BeanError::NotAFactoryBean(name)
            | BeanError::DescriptionOverride(name)
            | BeanError::WrappedEarlyReference(name)
            | BeanError::FactoryClosed(name) => Some(name),
            BeanError::BeanTypeMismatch { name, .. }
            | BeanError::InstantiationFailure { name, .. }
            | BeanError::PropertyPopulationFailure { name, .. }
            | BeanError::InitializationFailure { name, .. }
            | BeanError::DestructionFailure { name, .. } => Some(name),
            BeanError::AliasOverride { alias, .. } => Some(alias),
            BeanError::CircularDependencyUnresolvable { path } | BeanError::AliasCycle { path } => {
                path.first().map(String::as_str)
            }
            BeanError::NoUniqueBeanOfType { .. } | BeanError::DepthExceeded(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BeanError::NoSuchBeanDescription(_))
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, BeanError::CircularDependencyUnresolvable { .. })
    }
}

/// Result type for bean container operations
pub type BeanResult<T> = Result<T, BeanError>;
