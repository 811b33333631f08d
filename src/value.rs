//! Declared and resolved values for constructor arguments and properties.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::AnyBean;

/// A literal value written into a description.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(untagged))]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

impl Literal {
    fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Boolean(_) => "boolean",
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::List(_) => "list",
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Integer(i)
    }
}

impl From<i32> for Literal {
    fn from(i: i32) -> Self {
        Literal::Integer(i64::from(i))
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(items: Vec<T>) -> Self {
        Literal::List(items.into_iter().map(Into::into).collect())
    }
}

/// How a constructor argument or property value is declared: either a
/// literal, or a reference to another bean by name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum ValueSpec {
    Literal(Literal),
    Ref(String),
}

impl ValueSpec {
    pub fn literal(value: impl Into<Literal>) -> Self {
        ValueSpec::Literal(value.into())
    }

    pub fn reference(bean_name: impl Into<String>) -> Self {
        ValueSpec::Ref(bean_name.into())
    }

    pub fn referenced_bean(&self) -> Option<&str> {
        match self {
            ValueSpec::Ref(name) => Some(name),
            ValueSpec::Literal(_) => None,
        }
    }
}

/// Value handed to a constructor, factory method or property setter after
/// bean references have been resolved.
#[derive(Clone)]
pub enum Value {
    Literal(Literal),
    Bean(AnyBean),
}

/// A resolved value did not have the shape a setter or constructor expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Kind {
        expected: &'static str,
        found: &'static str,
    },
    #[error("expected a bean of type '{0}'")]
    BeanType(&'static str),
    #[error("expected {expected} argument(s), found {found}")]
    Arity { expected: usize, found: usize },
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Literal(lit) => lit.kind(),
            Value::Bean(_) => "bean reference",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::Kind {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Value::Literal(Literal::String(s)) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, ValueError> {
        match self {
            Value::Literal(Literal::Integer(i)) => Ok(*i),
            other => Err(other.mismatch("integer")),
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Result<f64, ValueError> {
        match self {
            Value::Literal(Literal::Float(f)) => Ok(*f),
            Value::Literal(Literal::Integer(i)) => Ok(*i as f64),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Literal(Literal::Boolean(b)) => Ok(*b),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn as_literal(&self) -> Result<&Literal, ValueError> {
        match self {
            Value::Literal(lit) => Ok(lit),
            other => Err(other.mismatch("literal")),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Literal(Literal::Null))
    }

    /// Downcasts a bean reference to its concrete type.
    pub fn bean<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ValueError> {
        match self {
            Value::Bean(bean) => bean
                .clone()
                .downcast::<T>()
                .map_err(|_| ValueError::BeanType(std::any::type_name::<T>())),
            other => Err(other.mismatch("bean reference")),
        }
    }

    pub fn into_bean(self) -> Result<AnyBean, ValueError> {
        match self {
            Value::Bean(bean) => Ok(bean),
            other => Err(other.mismatch("bean reference")),
        }
    }

    /// Splits an argument list into exactly `N` values.
    ///
    /// ```rust
    /// use ferrous_beans::Value;
    ///
    /// let args = vec![Value::from("a"), Value::from(2)];
    /// let [name, count] = Value::take_args::<2>(args).unwrap();
    /// assert_eq!(name.as_str().unwrap(), "a");
    /// assert_eq!(count.as_i64().unwrap(), 2);
    ///
    /// assert!(Value::take_args::<1>(vec![]).is_err());
    /// ```
    pub fn take_args<const N: usize>(args: Vec<Value>) -> Result<[Value; N], ValueError> {
        args.try_into().map_err(|rest: Vec<Value>| ValueError::Arity {
            expected: N,
            found: rest.len(),
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(lit) => f.debug_tuple("Literal").field(lit).finish(),
            Value::Bean(_) => f.write_str("Bean(..)"),
        }
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

macro_rules! value_from_literal {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Literal(Literal::from(v))
                }
            }
        )*
    };
}

value_from_literal!(&str, String, i64, i32, f64, bool);

impl Value {
    pub fn from_bean<T: Send + Sync + 'static>(bean: Arc<T>) -> Self {
        Value::Bean(bean)
    }
}
