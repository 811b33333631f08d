/// Property-based tests for descriptions and aliases
///
/// These use proptest to generate registration sequences and check the
/// invariants that must hold for all of them.

use ferrous_beans::{same_bean, BeanDescription, BeanFactory, TypedClass, Value};
use proptest::prelude::*;

struct Tagged {
    tag: u32,
}

fn tagged(name: &str, tag: u32) -> BeanDescription {
    BeanDescription::new(
        name,
        TypedClass::<Tagged>::new()
            .constructor(|args| {
                let [tag] = Value::take_args::<1>(args)?;
                Ok(Tagged { tag: tag.as_i64()? as u32 })
            })
            .build(),
    )
    .constructor_arg(tag as i64)
}

// Property: re-registering a name replaces the description, last one wins
proptest! {
    #[test]
    fn last_registration_wins(tags in prop::collection::vec(0u32..1000, 1..10)) {
        let factory = BeanFactory::new();
        for tag in &tags {
            factory.register_description(tagged("bean", *tag)).unwrap();
        }

        prop_assert_eq!(factory.description_count(), 1);
        let bean = factory.get_bean_as::<Tagged>("bean").unwrap();
        prop_assert_eq!(bean.tag, *tags.last().unwrap());
    }
}

// Property: any alias chain resolves to the same singleton as the canonical name
proptest! {
    #[test]
    fn alias_chain_resolves_to_canonical(len in 1usize..12) {
        let factory = BeanFactory::new();
        factory.register_description(tagged("root", 7)).unwrap();

        let mut previous = "root".to_string();
        for i in 0..len {
            let alias = format!("alias{}", i);
            factory.register_alias(&previous, &alias).unwrap();
            previous = alias;
        }

        let canonical = factory.get_bean("root").unwrap();
        for i in 0..len {
            let via_alias = factory.get_bean(&format!("alias{}", i)).unwrap();
            prop_assert!(same_bean(&canonical, &via_alias));
        }

        let aliases = factory.get_aliases(&previous);
        prop_assert_eq!(aliases.len(), len + 1);
        prop_assert_eq!(&aliases[0], "root");
        prop_assert_eq!(factory.singleton_count(), 1);
    }
}

// Property: closing an alias chain into a loop is always rejected
proptest! {
    #[test]
    fn closing_alias_loop_is_rejected(len in 2usize..10) {
        let factory = BeanFactory::new();
        for i in 0..len - 1 {
            factory.register_alias(&format!("n{}", i), &format!("n{}", i + 1)).unwrap();
        }

        let err = factory.register_alias(&format!("n{}", len - 1), "n0").unwrap_err();
        let is_alias_cycle = matches!(err, ferrous_beans::BeanError::AliasCycle { .. });
        prop_assert!(is_alias_cycle);
        // The failed registration left the chain intact.
        prop_assert_eq!(factory.get_aliases("n0").len(), len);
    }
}

// Property: prototypes never share instances, singletons always do
proptest! {
    #[test]
    fn scope_decides_sharing(lookups in 2usize..8, prototype in any::<bool>()) {
        let factory = BeanFactory::new();
        let mut description = tagged("bean", 1);
        if prototype {
            description = description.prototype();
        }
        factory.register_description(description).unwrap();

        let beans: Vec<_> = (0..lookups).map(|_| factory.get_bean("bean").unwrap()).collect();
        for other in &beans[1..] {
            prop_assert_eq!(same_bean(&beans[0], other), !prototype);
        }
        prop_assert_eq!(factory.singleton_count(), usize::from(!prototype));
    }
}
