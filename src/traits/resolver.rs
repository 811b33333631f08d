//! Resolver trait used by collaborators that need to re-enter the factory.

use crate::error::BeanResult;
use crate::AnyBean;

/// Resolves beans by name.
///
/// The [`PropertyPopulator`](crate::PropertyPopulator) receives a
/// `&dyn BeanResolver` and calls back through it for every bean reference it
/// meets, so nested resolution runs synchronously on the caller's stack.
/// [`BeanFactory`](crate::BeanFactory) is the production implementation.
pub trait BeanResolver: Send + Sync {
    /// Returns the bean registered under `name` (alias or `&`-prefixed
    /// names included), creating it if needed.
    fn resolve_bean(&self, name: &str) -> BeanResult<AnyBean>;
}
