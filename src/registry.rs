//! Description registry and alias table.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::description::BeanDescription;
use crate::error::{BeanError, BeanResult};
use crate::internal::{FastMap, FastSet};
use crate::FACTORY_BEAN_PREFIX;

#[derive(Default)]
struct Descriptions {
    by_name: FastMap<String, Arc<BeanDescription>>,
    order: Vec<String>,
}

#[derive(Default)]
struct Aliases {
    targets: FastMap<String, String>,
    order: Vec<String>,
}

/// Stores bean descriptions by canonical name and resolves aliases.
///
/// Reads take a shared lock and hand out `Arc` clones, so no lock is held
/// while a bean is being built from a description.
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::{BeanDescription, DescriptionRegistry, TypedClass};
///
/// #[derive(Default)]
/// struct Service;
///
/// let registry = DescriptionRegistry::new(true);
/// registry.register(BeanDescription::new("z", TypedClass::<Service>::with_default().build())).unwrap();
/// registry.register_alias("z", "y").unwrap();
/// registry.register_alias("y", "x").unwrap();
///
/// assert_eq!(registry.resolve_alias("x").unwrap(), "z");
/// assert_eq!(registry.aliases_of("z"), vec!["z", "y", "x"]);
/// assert_eq!(registry.describe("x").unwrap().name(), "z");
/// ```
pub struct DescriptionRegistry {
    descriptions: RwLock<Descriptions>,
    aliases: RwLock<Aliases>,
    allow_overriding: bool,
}

impl DescriptionRegistry {
    pub fn new(allow_overriding: bool) -> Self {
        Self {
            descriptions: RwLock::new(Descriptions::default()),
            aliases: RwLock::new(Aliases::default()),
            allow_overriding,
        }
    }

    /// Stores the description under its name; the last registration for a
    /// name wins unless overriding is disabled.
    pub fn register(&self, description: BeanDescription) -> BeanResult<()> {
        let name = description.name().to_string();
        let mut descriptions = self.descriptions.write();
        if descriptions.by_name.contains_key(&name) {
            if !self.allow_overriding {
                return Err(BeanError::DescriptionOverride(name));
            }
            warn!("Overriding bean description for '{}'", name);
        } else {
            descriptions.order.push(name.clone());
        }
        debug!(bean = %name, ty = %description.type_key(), "Registered bean description");
        descriptions.by_name.insert(name, Arc::new(description));
        Ok(())
    }

    /// Removes a description. Aliases pointing at it stay in place.
    pub fn remove(&self, name: &str) -> BeanResult<Arc<BeanDescription>> {
        let mut descriptions = self.descriptions.write();
        let removed = descriptions
            .by_name
            .remove(name)
            .ok_or_else(|| BeanError::NoSuchBeanDescription(name.to_string()))?;
        descriptions.order.retain(|n| n != name);
        Ok(removed)
    }

    /// Looks up the description for a name or alias.
    pub fn describe(&self, name: &str) -> BeanResult<Arc<BeanDescription>> {
        let canonical = self.resolve_alias(name)?;
        self.descriptions
            .read()
            .by_name
            .get(&canonical)
            .cloned()
            .ok_or_else(|| BeanError::NoSuchBeanDescription(name.to_string()))
    }

    pub fn contains(&self, canonical_name: &str) -> bool {
        self.descriptions.read().by_name.contains_key(canonical_name)
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.descriptions.read().order.clone()
    }

    /// Snapshot of all descriptions in registration order.
    pub fn descriptions(&self) -> Vec<Arc<BeanDescription>> {
        let descriptions = self.descriptions.read();
        descriptions
            .order
            .iter()
            .filter_map(|name| descriptions.by_name.get(name).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptions.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers `alias` as an alternate name for `name`.
    ///
    /// An alias equal to its target is dropped. Registering an alias that
    /// would make the chain revisit a name fails with `AliasCycle`.
    pub fn register_alias(&self, name: &str, alias: &str) -> BeanResult<()> {
        let mut aliases = self.aliases.write();
        if alias == name {
            if aliases.targets.remove(alias).is_some() {
                aliases.order.retain(|a| a != alias);
            }
            return Ok(());
        }
        if let Some(existing) = aliases.targets.get(alias) {
            if existing == name {
                return Ok(());
            }
            if !self.allow_overriding {
                return Err(BeanError::AliasOverride {
                    alias: alias.to_string(),
                    existing: existing.clone(),
                    requested: name.to_string(),
                });
            }
        }

        // Walk from the target; reaching the new alias would close a loop.
        let mut path = vec![alias.to_string(), name.to_string()];
        let mut current = name;
        while let Some(next) = aliases.targets.get(current) {
            path.push(next.clone());
            if next == alias {
                return Err(BeanError::AliasCycle { path });
            }
            if path.len() > aliases.targets.len() + 2 {
                break;
            }
            current = next;
        }

        if aliases.targets.insert(alias.to_string(), name.to_string()).is_none() {
            aliases.order.push(alias.to_string());
        }
        debug!(alias = %alias, target = %name, "Registered alias");
        Ok(())
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.read().targets.contains_key(name)
    }

    /// Follows the alias chain to a canonical name. Names that are not
    /// aliases are returned unchanged.
    pub fn resolve_alias(&self, name: &str) -> BeanResult<String> {
        let aliases = self.aliases.read();
        let mut current = name;
        let mut seen = FastSet::default();
        while let Some(next) = aliases.targets.get(current) {
            if !seen.insert(current) {
                let mut path: Vec<String> = vec![name.to_string()];
                let mut step = name;
                while let Some(n) = aliases.targets.get(step) {
                    path.push(n.clone());
                    if n == current {
                        break;
                    }
                    step = n;
                }
                return Err(BeanError::AliasCycle { path });
            }
            current = next;
        }
        Ok(current.to_string())
    }

    /// All names for a bean: the canonical name first, then every alias
    /// that resolves to it, in registration order. A `&` prefix on the
    /// queried name is carried over to every result.
    pub fn aliases_of(&self, name: &str) -> Vec<String> {
        let (prefix, bare) = match name.strip_prefix(FACTORY_BEAN_PREFIX) {
            Some(rest) => (FACTORY_BEAN_PREFIX, rest.trim_start_matches(FACTORY_BEAN_PREFIX)),
            None => ("", name),
        };
        let canonical = self.resolve_alias(bare).unwrap_or_else(|_| bare.to_string());
        let aliases = self.aliases.read();
        let mut result = vec![canonical.clone()];
        for alias in &aliases.order {
            if chain_reaches(&aliases.targets, alias, &canonical) {
                result.push(alias.clone());
            }
        }
        result.into_iter().map(|n| format!("{}{}", prefix, n)).collect()
    }
}

fn chain_reaches(targets: &FastMap<String, String>, start: &str, canonical: &str) -> bool {
    let mut current = start;
    for _ in 0..=targets.len() {
        match targets.get(current) {
            Some(next) if next == canonical => return true,
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}

impl Default for DescriptionRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}
