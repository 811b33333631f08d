use ferrous_beans::{
    same_bean, type_key, AnyBean, BeanDescription, BeanError, BeanFactory, CapabilityError, FactoryBean,
    TypeKey, TypedClass,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Connection {
    url: String,
}

struct ConnectionFactory {
    url: String,
    made: AtomicUsize,
    shared: bool,
}

impl FactoryBean for ConnectionFactory {
    fn get_object(&self) -> Result<AnyBean, CapabilityError> {
        self.made.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Connection { url: self.url.clone() }))
    }

    fn object_type(&self) -> Option<TypeKey> {
        Some(type_key::<Connection>())
    }

    fn is_singleton(&self) -> bool {
        self.shared
    }
}

fn register_factory(factory: &BeanFactory, name: &str, shared: bool) {
    factory
        .register_description(
            BeanDescription::new(
                name,
                TypedClass::<ConnectionFactory>::new()
                    .constructor(move |_| {
                        Ok(ConnectionFactory {
                            url: "db://primary".to_string(),
                            made: AtomicUsize::new(0),
                            shared,
                        })
                    })
                    .factory_bean()
                    .build(),
            )
            .as_factory_bean(),
        )
        .unwrap();
}

#[test]
fn test_prefix_selects_factory_or_product() {
    let factory = BeanFactory::new();
    register_factory(&factory, "svc", true);

    let product = factory.get_bean("svc").unwrap();
    let factory_bean = factory.get_bean("&svc").unwrap();

    assert!(!same_bean(&product, &factory_bean));
    assert_eq!(product.downcast_ref::<Connection>().unwrap().url, "db://primary");
    assert!(factory_bean.downcast_ref::<ConnectionFactory>().is_some());
}

#[test]
fn test_shared_product_is_cached() {
    let factory = BeanFactory::new();
    register_factory(&factory, "svc", true);

    let first = factory.get_bean("svc").unwrap();
    let second = factory.get_bean("svc").unwrap();
    assert!(same_bean(&first, &second));

    let made = factory.get_bean_as::<ConnectionFactory>("&svc").unwrap();
    assert_eq!(made.made.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unshared_product_is_fresh() {
    let factory = BeanFactory::new();
    register_factory(&factory, "svc", false);

    let first = factory.get_bean("svc").unwrap();
    let second = factory.get_bean("svc").unwrap();
    assert!(!same_bean(&first, &second));

    // The factory itself is still a singleton.
    assert!(same_bean(&factory.get_bean("&svc").unwrap(), &factory.get_bean("&svc").unwrap()));
    assert!(factory.is_prototype("svc").unwrap());
    assert!(!factory.is_singleton("svc").unwrap());
    assert!(factory.is_singleton("&svc").unwrap());
}

#[test]
fn test_factory_prefix_on_plain_bean() {
    #[derive(Default)]
    struct Plain;

    let factory = BeanFactory::new();
    factory
        .register_description(BeanDescription::new("plain", TypedClass::<Plain>::with_default().build()))
        .unwrap();

    assert!(matches!(
        factory.get_bean("&plain"),
        Err(BeanError::NotAFactoryBean(name)) if name == "plain"
    ));
    assert!(factory.get_bean("plain").is_ok());
    assert!(!factory.contains_bean("&plain"));
}

#[test]
fn test_factory_prefix_through_alias() {
    let factory = BeanFactory::new();
    register_factory(&factory, "svc", true);
    factory.register_alias("svc", "connections").unwrap();

    let via_alias = factory.get_bean("&connections").unwrap();
    assert!(same_bean(&via_alias, &factory.get_bean("&svc").unwrap()));
    assert_eq!(factory.get_aliases("&connections"), vec!["&svc", "&connections"]);
}

#[test]
fn test_typed_product_lookup() {
    let factory = BeanFactory::new();
    register_factory(&factory, "svc", true);

    let connection = factory.get_bean_as::<Connection>("svc").unwrap();
    assert_eq!(connection.url, "db://primary");
    let by_type = factory.get_bean_of_type::<Connection>().unwrap();
    assert!(Arc::ptr_eq(&connection, &by_type));
}

#[test]
fn test_product_failure_is_instantiation_failure() {
    struct Broken;

    impl FactoryBean for Broken {
        fn get_object(&self) -> Result<AnyBean, CapabilityError> {
            Err("backend unavailable".into())
        }

        fn object_type(&self) -> Option<TypeKey> {
            None
        }
    }

    let factory = BeanFactory::new();
    factory
        .register_description(
            BeanDescription::new(
                "broken",
                TypedClass::<Broken>::new().constructor(|_| Ok(Broken)).factory_bean().build(),
            )
            .as_factory_bean(),
        )
        .unwrap();

    let err = factory.get_bean("broken").unwrap_err();
    assert!(matches!(err, BeanError::InstantiationFailure { ref name, .. } if name == "broken"));
    // The factory itself was created and stays cached.
    assert!(factory.contains_singleton("broken"));
    assert!(factory.get_bean("&broken").is_ok());
}

#[test]
fn test_eager_product_on_pre_instantiation() {
    struct Eager {
        made: Arc<AtomicUsize>,
    }

    impl FactoryBean for Eager {
        fn get_object(&self) -> Result<AnyBean, CapabilityError> {
            self.made.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(42u32))
        }

        fn object_type(&self) -> Option<TypeKey> {
            Some(type_key::<u32>())
        }

        fn is_eager_init(&self) -> bool {
            true
        }
    }

    let made = Arc::new(AtomicUsize::new(0));
    let made_clone = made.clone();
    let factory = BeanFactory::new();
    factory
        .register_description(
            BeanDescription::new(
                "eager",
                TypedClass::<Eager>::new()
                    .constructor(move |_| Ok(Eager { made: made_clone.clone() }))
                    .factory_bean()
                    .build(),
            )
            .as_factory_bean(),
        )
        .unwrap();
    register_factory(&factory, "lazyProduct", true);

    factory.pre_instantiate_singletons().unwrap();
    assert_eq!(made.load(Ordering::SeqCst), 1);

    let lazy = factory.get_bean_as::<ConnectionFactory>("&lazyProduct").unwrap();
    assert_eq!(lazy.made.load(Ordering::SeqCst), 0);
}
