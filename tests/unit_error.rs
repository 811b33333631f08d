/// Unit tests for BeanError and BeanResult
///
/// Display strings are part of the contract: they end up in logs and
/// in panic messages of applications wiring their beans at startup.

use ferrous_beans::{BeanError, BeanResult};
use std::error::Error;

fn capability(msg: &str) -> ferrous_beans::CapabilityError {
    msg.into()
}

#[test]
fn test_error_display_not_found() {
    let error = BeanError::NoSuchBeanDescription("userService".to_string());
    assert_eq!(error.to_string(), "No bean named 'userService' is defined");
    assert!(error.is_not_found());
    assert_eq!(error.bean_name(), Some("userService"));
}

#[test]
fn test_error_display_circular() {
    let error = BeanError::CircularDependencyUnresolvable {
        path: vec!["a".into(), "b".into(), "a".into()],
    };
    assert_eq!(error.to_string(), "Unresolvable circular reference: a -> b -> a");
    assert!(error.is_circular());
    assert!(!error.is_not_found());
    assert_eq!(error.bean_name(), Some("a"));
}

#[test]
fn test_error_display_alias_cycle() {
    let error = BeanError::AliasCycle {
        path: vec!["x".into(), "y".into(), "x".into()],
    };
    assert_eq!(error.to_string(), "Alias cycle detected: x -> y -> x");
    assert!(!error.is_circular());
}

#[test]
fn test_error_display_type_mismatch() {
    let error = BeanError::BeanTypeMismatch {
        name: "clock".into(),
        required: "app::Greeter",
        actual: "app::Clock".into(),
    };
    assert_eq!(
        error.to_string(),
        "Bean named 'clock' is expected to be of type 'app::Greeter' but was 'app::Clock'"
    );
    assert_eq!(error.bean_name(), Some("clock"));
}

#[test]
fn test_error_display_no_unique_bean() {
    let error = BeanError::NoUniqueBeanOfType {
        required: "app::Clock",
        candidates: vec!["utc".into(), "local".into()],
    };
    assert_eq!(
        error.to_string(),
        "Expected a single bean of type 'app::Clock' but found 2: [utc, local]"
    );
    assert_eq!(error.bean_name(), None);
}

#[test]
fn test_error_display_depth_exceeded() {
    let error = BeanError::DepthExceeded(100);
    assert_eq!(error.to_string(), "Max resolution depth 100 exceeded");
    assert_eq!(error.bean_name(), None);
}

#[test]
fn test_capability_failures_keep_their_source() {
    let error = BeanError::PropertyPopulationFailure {
        name: "service".into(),
        property: "timeout".into(),
        source: capability("expected integer"),
    };
    assert_eq!(
        error.to_string(),
        "Error creating bean 'service': cannot set property 'timeout': expected integer"
    );
    assert_eq!(error.source().map(|s| s.to_string()).as_deref(), Some("expected integer"));

    let error = BeanError::InitializationFailure {
        name: "db".into(),
        source: capability("not ready"),
    };
    assert_eq!(error.to_string(), "Error initializing bean 'db': not ready");
    assert!(error.source().is_some());
}

#[test]
fn test_alias_override_names_the_alias() {
    let error = BeanError::AliasOverride {
        alias: "name".into(),
        existing: "first".into(),
        requested: "second".into(),
    };
    assert_eq!(error.bean_name(), Some("name"));
    assert!(error.to_string().contains("already registered for 'first'"));
}

#[test]
fn test_result_alias_propagates() {
    fn lookup(found: bool) -> BeanResult<u32> {
        if found {
            Ok(1)
        } else {
            Err(BeanError::NotAFactoryBean("plain".into()))
        }
    }

    fn outer() -> BeanResult<u32> {
        let value = lookup(false)?;
        Ok(value + 1)
    }

    assert_eq!(lookup(true).unwrap(), 1);
    assert_eq!(outer().unwrap_err().to_string(), "Bean named 'plain' is not a factory bean");
}
