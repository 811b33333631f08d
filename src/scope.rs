//! Bean scope definitions.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Bean scope
///
/// Determines how bean instances are shared:
/// - `Singleton`: One instance per factory, created on first request (or at
///   pre-instantiation) and destroyed at teardown
/// - `Prototype`: A fresh instance per request; the container never tracks
///   or destroys it
///
/// # Examples
///
/// ```rust
/// use ferrous_beans::Scope;
///
/// assert_eq!(Scope::default(), Scope::Singleton);
/// assert_eq!("prototype".parse::<Scope>().unwrap(), Scope::Prototype);
/// assert!("request".parse::<Scope>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Scope {
    #[default]
    Singleton,
    Prototype,
}

impl Scope {
    pub fn is_singleton(self) -> bool {
        self == Scope::Singleton
    }

    pub fn is_prototype(self) -> bool {
        self == Scope::Prototype
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => f.write_str("singleton"),
            Scope::Prototype => f.write_str("prototype"),
        }
    }
}

/// Unknown scope name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope '{0}'")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "singleton" => Ok(Scope::Singleton),
            "prototype" => Ok(Scope::Prototype),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}
