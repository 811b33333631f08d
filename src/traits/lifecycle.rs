//! Lifecycle callback traits for beans.

use crate::error::CapabilityError;

/// Implemented by beans that need to run logic once all properties are set.
///
/// Runs after pre-initialization hooks and before the description's
/// declared init method.
pub trait InitializingBean: Send + Sync {
    fn after_properties_set(&self) -> Result<(), CapabilityError>;
}

/// Implemented by beans that release resources at factory teardown.
///
/// Runs before the description's declared destroy method. Only cached
/// singletons are destroyed by the container.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{CapabilityError, DisposableBean};
///
/// struct Pool;
///
/// impl DisposableBean for Pool {
///     fn destroy(&self) -> Result<(), CapabilityError> {
///         println!("pool closed");
///         Ok(())
///     }
/// }
/// ```
pub trait DisposableBean: Send + Sync {
    fn destroy(&self) -> Result<(), CapabilityError>;
}
