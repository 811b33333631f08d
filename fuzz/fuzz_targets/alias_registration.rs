#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_beans::{same_bean, BeanDescription, BeanError, BeanFactory, TypedClass};

#[derive(Default)]
struct Target;

// Byte pairs register `name{a % 8}` as an alias of `name{b % 8}`; only
// `name0` is a real bean.
fuzz_target!(|data: &[u8]| {
    let factory = BeanFactory::new();
    factory
        .register_description(BeanDescription::new("name0", TypedClass::<Target>::with_default().build()))
        .unwrap();

    for pair in data.chunks_exact(2) {
        let alias = format!("name{}", pair[0] % 8);
        let target = format!("name{}", pair[1] % 8);
        match factory.register_alias(&target, &alias) {
            Ok(()) | Err(BeanError::AliasCycle { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    // The alias graph must stay acyclic whatever was accepted.
    let canonical = factory.get_bean("name0").ok();
    for i in 0..8 {
        let name = format!("name{}", i);
        match factory.get_bean(&name) {
            Ok(bean) => {
                assert!(same_bean(&bean, canonical.as_ref().unwrap()));
                assert_eq!(factory.get_aliases(&name)[0], "name0");
            }
            Err(e) => assert!(e.is_not_found(), "unexpected error: {}", e),
        }
    }
});
