//! Read-only questions about beans.
//!
//! These answer from descriptions and already cached instances. The only
//! queries that may create anything are [`BeanFactory::is_type_match`] and
//! [`BeanFactory::get_type`], and only when the type cannot be known
//! otherwise.

use std::sync::Arc;

use tracing::debug;

use super::{split_factory_prefix, BeanFactory};
use crate::description::BeanDescription;
use crate::error::{BeanError, BeanResult};
use crate::key::TypeKey;
use crate::traits::FactoryBean;
use crate::FACTORY_BEAN_PREFIX;

impl BeanFactory {
    /// True if a description or a cached singleton exists for `name`. With a
    /// `&` prefix the description must also be a factory bean.
    pub fn contains_bean(&self, name: &str) -> bool {
        let (factory_deref, bare) = split_factory_prefix(name);
        let Ok(canonical) = self.inner.registry.resolve_alias(bare) else {
            return false;
        };
        if factory_deref {
            return self
                .inner
                .registry
                .describe(&canonical)
                .is_ok_and(|d| d.is_factory_bean());
        }
        self.inner.registry.contains(&canonical) || self.inner.singletons.contains(&canonical)
    }

    /// Whether lookups of `name` share one instance. Never instantiates.
    ///
    /// For a factory bean's product this also asks the factory, but only if
    /// the factory already exists; otherwise the product of a singleton
    /// factory counts as shared.
    pub fn is_singleton(&self, name: &str) -> BeanResult<bool> {
        let (factory_deref, bare) = split_factory_prefix(name);
        let canonical = self.inner.registry.resolve_alias(bare)?;
        let description = self.describe_canonical(bare, &canonical)?;
        if factory_deref || !description.is_factory_bean() || !description.is_singleton() {
            return Ok(description.is_singleton());
        }
        Ok(self
            .cached_factory(&canonical, &description)
            .map_or(true, |factory| factory.is_singleton()))
    }

    /// Whether every lookup of `name` yields a fresh instance. Never
    /// instantiates.
    pub fn is_prototype(&self, name: &str) -> BeanResult<bool> {
        let (factory_deref, bare) = split_factory_prefix(name);
        let canonical = self.inner.registry.resolve_alias(bare)?;
        let description = self.describe_canonical(bare, &canonical)?;
        if factory_deref || !description.is_factory_bean() || description.is_prototype() {
            return Ok(description.is_prototype());
        }
        Ok(self
            .cached_factory(&canonical, &description)
            .is_some_and(|factory| !factory.is_singleton()))
    }

    /// Whether a lookup of `name` yields something usable as `ty`.
    ///
    /// Decided from the description when possible. Beans produced by a
    /// factory method or factory bean without a declared product type are
    /// created to inspect them.
    pub fn is_type_match(&self, name: &str, ty: &TypeKey) -> BeanResult<bool> {
        if let Some(matched) = self.match_without_init(name, ty)? {
            return Ok(matched);
        }
        Ok(self.get_type_with_init(name, true)?.is_some_and(|actual| actual == *ty))
    }

    /// The type a lookup of `name` yields; creates the bean if that is the
    /// only way to find out.
    pub fn get_type(&self, name: &str) -> BeanResult<Option<TypeKey>> {
        self.get_type_with_init(name, true)
    }

    /// Like [`get_type`](Self::get_type). With `allow_init == false` the
    /// answer is `None` whenever it would require creating something.
    pub fn get_type_with_init(&self, name: &str, allow_init: bool) -> BeanResult<Option<TypeKey>> {
        let (factory_deref, bare) = split_factory_prefix(name);
        let canonical = self.inner.registry.resolve_alias(bare)?;
        let description = self.describe_canonical(bare, &canonical)?;
        if factory_deref && !description.is_factory_bean() {
            return Ok(None);
        }
        if let Some(predicted) = self.predict_with(&canonical, &description, factory_deref) {
            return Ok(Some(predicted));
        }
        if !allow_init {
            return Ok(None);
        }

        debug!(bean = %canonical, "Instantiating bean to determine its type");
        if description.is_factory_bean() && !factory_deref {
            let factory = self.do_get_bean(&format!("{}{}", FACTORY_BEAN_PREFIX, canonical), None)?;
            let factory = description
                .class()
                .as_factory_bean(&factory)
                .ok_or_else(|| BeanError::NotAFactoryBean(bare.to_string()))?;
            return Ok(factory.object_type());
        }
        let bean = self.do_get_bean(name, None)?;
        Ok(Some(TypeKey::of_instance(&bean)))
    }

    /// Every name for the bean: canonical name first, then its aliases.
    pub fn get_aliases(&self, name: &str) -> Vec<String> {
        self.inner.registry.aliases_of(name)
    }

    /// Names of beans whose lookup yields a `ty`, in registration order.
    ///
    /// Factory beans contribute their plain name when the product matches
    /// and their `&` name when the factory itself does. Nothing is created.
    pub fn bean_names_for_type(&self, ty: &TypeKey) -> Vec<String> {
        let mut names = Vec::new();
        for description in self.inner.registry.descriptions() {
            let name = description.name();
            let plain = self
                .plain_class_match(&description, false, ty)
                .or_else(|| self.predict_with(name, &description, false).map(|p| p == *ty));
            if plain == Some(true) {
                names.push(name.to_string());
            }
            if description.is_factory_bean() && self.plain_class_match(&description, true, ty) == Some(true) {
                names.push(format!("{}{}", FACTORY_BEAN_PREFIX, name));
            }
        }
        names
    }

    /// Answers a type match from descriptions and cached instances only.
    pub(super) fn match_without_init(&self, name: &str, ty: &TypeKey) -> BeanResult<Option<bool>> {
        let (factory_deref, bare) = split_factory_prefix(name);
        let canonical = self.inner.registry.resolve_alias(bare)?;
        let description = self.describe_canonical(bare, &canonical)?;
        if factory_deref && !description.is_factory_bean() {
            return Ok(Some(false));
        }
        if let Some(matched) = self.plain_class_match(&description, factory_deref, ty) {
            return Ok(Some(matched));
        }
        Ok(self
            .predict_with(&canonical, &description, factory_deref)
            .map(|predicted| predicted == *ty))
    }

    /// Predicted type of a lookup without creating anything.
    pub(super) fn predict_type(&self, name: &str) -> BeanResult<Option<TypeKey>> {
        let (factory_deref, bare) = split_factory_prefix(name);
        let canonical = self.inner.registry.resolve_alias(bare)?;
        let description = self.describe_canonical(bare, &canonical)?;
        if factory_deref && !description.is_factory_bean() {
            return Ok(None);
        }
        Ok(self.predict_with(&canonical, &description, factory_deref))
    }

    // The lookup yields an instance of the description's own class: a
    // constructed bean that is not a factory bean, or the factory itself.
    fn plain_class_match(&self, description: &BeanDescription, factory_deref: bool, ty: &TypeKey) -> Option<bool> {
        let own_class = description.factory_method_ref().is_none()
            && (factory_deref || !description.is_factory_bean());
        own_class.then(|| description.class().is_assignable_to(ty))
    }

    fn predict_with(&self, canonical: &str, description: &BeanDescription, factory_deref: bool) -> Option<TypeKey> {
        let cached = || self.inner.singletons.get(canonical);
        if description.is_factory_bean() && !factory_deref {
            return description.product_type_hint().or_else(|| {
                self.cached_factory(canonical, description)
                    .and_then(|factory| factory.object_type())
            });
        }
        if description.factory_method_ref().is_some() {
            if !description.is_factory_bean() {
                if let Some(hint) = description.product_type_hint() {
                    return Some(hint);
                }
            }
            return cached().map(|bean| TypeKey::of_instance(&bean));
        }
        Some(description.type_key())
    }

    fn cached_factory(&self, canonical: &str, description: &BeanDescription) -> Option<Arc<dyn FactoryBean>> {
        let bean = self.inner.singletons.get(canonical)?;
        description.class().as_factory_bean(&bean)
    }
}
