//! Factory bean trait.

use crate::error::CapabilityError;
use crate::key::TypeKey;
use crate::AnyBean;

/// A bean whose purpose is to manufacture another object.
///
/// When a description is marked as a factory bean, `get_bean("name")`
/// returns the product of [`get_object`](FactoryBean::get_object) while
/// `get_bean("&name")` returns the factory itself.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{AnyBean, CapabilityError, FactoryBean, TypeKey, type_key};
/// use std::sync::Arc;
///
/// struct Connection { url: String }
///
/// struct ConnectionFactory { url: String }
///
/// impl FactoryBean for ConnectionFactory {
///     fn get_object(&self) -> Result<AnyBean, CapabilityError> {
///         Ok(Arc::new(Connection { url: self.url.clone() }))
///     }
///
///     fn object_type(&self) -> Option<TypeKey> {
///         Some(type_key::<Connection>())
///     }
/// }
/// ```
pub trait FactoryBean: Send + Sync {
    fn get_object(&self) -> Result<AnyBean, CapabilityError>;

    /// Type of the product, if known without calling `get_object`.
    fn object_type(&self) -> Option<TypeKey>;

    /// Whether the product is shared. Shared products of singleton
    /// factories are cached by the container.
    fn is_singleton(&self) -> bool {
        true
    }

    /// Whether pre-instantiation should also create the product.
    fn is_eager_init(&self) -> bool {
        false
    }
}
