//! Raw instance construction.

use tracing::trace;

use crate::class::BeanClass;
use crate::description::BeanDescription;
use crate::error::{BeanError, BeanResult};
use crate::value::Value;
use crate::AnyBean;

/// The factory bean a description's factory method is called on.
pub struct FactoryTarget<'a> {
    pub bean: &'a AnyBean,
    pub class: &'a dyn BeanClass,
}

/// Produces raw, unpopulated instances from descriptions.
///
/// Arguments and the factory target arrive already resolved; the strategy
/// only decides how to call into the [`BeanClass`] capability.
pub trait InstantiationStrategy: Send + Sync {
    fn instantiate(
        &self,
        description: &BeanDescription,
        args: Vec<Value>,
        factory: Option<FactoryTarget<'_>>,
    ) -> BeanResult<AnyBean>;
}

/// Constructor call, associated factory method, or factory method on a
/// factory bean, depending on the description.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInstantiationStrategy;

impl InstantiationStrategy for DefaultInstantiationStrategy {
    fn instantiate(
        &self,
        description: &BeanDescription,
        args: Vec<Value>,
        factory: Option<FactoryTarget<'_>>,
    ) -> BeanResult<AnyBean> {
        let name = description.name();
        let result = match (description.factory_method_ref(), factory) {
            (None, _) => {
                trace!(bean = %name, args = args.len(), "Invoking constructor");
                description.class().construct(args)
            }
            (Some(fm), None) if fm.factory_bean.is_none() => {
                trace!(bean = %name, method = %fm.method, "Invoking static factory method");
                description.class().invoke_factory_method(None, &fm.method, args)
            }
            (Some(fm), Some(target)) => {
                trace!(bean = %name, method = %fm.method, "Invoking factory method on factory bean");
                target.class.invoke_factory_method(Some(target.bean), &fm.method, args)
            }
            (Some(fm), None) => Err(format!(
                "factory bean '{}' for method '{}' was not supplied",
                fm.factory_bean.as_deref().unwrap_or_default(),
                fm.method
            )
            .into()),
        };
        result.map_err(|source| BeanError::InstantiationFailure {
            name: name.to_string(),
            source,
        })
    }
}
