//! Property population and value resolution.

use tracing::trace;

use crate::description::BeanDescription;
use crate::error::{BeanError, BeanResult};
use crate::traits::BeanResolver;
use crate::value::{Value, ValueSpec};
use crate::AnyBean;

/// Turns declared values into resolved ones and applies properties.
///
/// Bean references are resolved through the supplied [`BeanResolver`]; this
/// is the re-entrant path that lets a bean under construction pull in its
/// dependencies, and where circular references meet early references.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyPopulator;

impl PropertyPopulator {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve_value(&self, spec: &ValueSpec, resolver: &dyn BeanResolver) -> BeanResult<Value> {
        match spec {
            ValueSpec::Literal(lit) => Ok(Value::Literal(lit.clone())),
            ValueSpec::Ref(name) => resolver.resolve_bean(name).map(Value::Bean),
        }
    }

    /// Resolves constructor arguments in declaration order.
    pub fn resolve_arguments(&self, specs: &[ValueSpec], resolver: &dyn BeanResolver) -> BeanResult<Vec<Value>> {
        specs.iter().map(|spec| self.resolve_value(spec, resolver)).collect()
    }

    /// Applies every declared property to `bean` in declaration order.
    ///
    /// A failing setter is reported as `PropertyPopulationFailure`; a failing
    /// nested resolution propagates unchanged.
    pub fn populate(&self, bean: &AnyBean, description: &BeanDescription, resolver: &dyn BeanResolver) -> BeanResult<()> {
        let class = description.class();
        for (property, spec) in description.properties() {
            let value = self.resolve_value(spec, resolver)?;
            trace!(bean = %description.name(), property = %property, "Setting property");
            class
                .set_property(bean, property, value)
                .map_err(|source| BeanError::PropertyPopulationFailure {
                    name: description.name().to_string(),
                    property: property.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
