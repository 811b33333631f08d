#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_beans::{same_bean, AnyBean, BeanDescription, BeanFactory, TypedClass, Value};
use std::sync::OnceLock;

#[derive(Default)]
struct Node {
    next: OnceLock<AnyBean>,
}

// Each byte describes one bean:
//   bit 0     prototype scope
//   bit 1     constructor reference instead of a setter reference
//   bit 7     no reference at all
//   bits 2-6  index of the referenced bean
fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 16 {
        return;
    }

    let count = data.len();
    let factory = BeanFactory::new();
    for (i, byte) in data.iter().enumerate() {
        let class = TypedClass::<Node>::with_default()
            .property("next", |n: &Node, v: Value| {
                let _ = n.next.set(v.into_bean()?);
                Ok(())
            })
            .build();
        let mut description = BeanDescription::new(format!("bean{}", i), class);
        if byte & 0x01 != 0 {
            description = description.prototype();
        }
        if byte & 0x80 == 0 {
            let target = format!("bean{}", ((byte >> 2) & 0x1f) as usize % count);
            description = if byte & 0x02 != 0 {
                description.constructor_ref(target)
            } else {
                description.property_ref("next", target)
            };
        }
        factory.register_description(description).unwrap();
    }

    // Every lookup either succeeds or reports an unresolvable cycle.
    for i in 0..count {
        let name = format!("bean{}", i);
        match factory.get_bean(&name) {
            Ok(first) => {
                if factory.is_singleton(&name).unwrap() {
                    let second = factory.get_bean(&name).unwrap();
                    assert!(same_bean(&first, &second));
                }
            }
            Err(e) => assert!(e.is_circular(), "unexpected error: {}", e),
        }
        assert!(!factory.is_currently_in_creation(&name));
    }

    factory.destroy_singletons().unwrap();
    assert_eq!(factory.singleton_count(), 0);
});
