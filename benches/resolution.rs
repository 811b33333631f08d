use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_beans::*;
use std::sync::{Arc, OnceLock};

#[derive(Default)]
struct Leaf;

#[derive(Default)]
struct Node {
    next: OnceLock<AnyBean>,
}

fn leaf(name: &str) -> BeanDescription {
    BeanDescription::new(name, TypedClass::<Leaf>::with_default().build())
}

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let factory = BeanFactory::new();
    factory.register_description(leaf("leaf")).unwrap();

    // Prime the singleton
    let _ = factory.get_bean("leaf").unwrap();

    c.bench_function("singleton_hit", |b| {
        b.iter(|| {
            let bean = factory.get_bean(black_box("leaf")).unwrap();
            black_box(bean);
        })
    });

    c.bench_function("singleton_hit_typed", |b| {
        b.iter(|| {
            let bean = factory.get_bean_as::<Leaf>(black_box("leaf")).unwrap();
            black_box(bean);
        })
    });
}

fn bench_prototype(c: &mut Criterion) {
    let factory = BeanFactory::new();
    factory.register_description(leaf("leaf").prototype()).unwrap();

    c.bench_function("prototype_create", |b| {
        b.iter(|| {
            let bean = factory.get_bean(black_box("leaf")).unwrap();
            black_box(bean);
        })
    });
}

fn bench_alias_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("alias_chain");

    for len in [1usize, 4, 16] {
        let factory = BeanFactory::new();
        factory.register_description(leaf("leaf")).unwrap();
        let mut previous = "leaf".to_string();
        for i in 0..len {
            let alias = format!("alias{}", i);
            factory.register_alias(&previous, &alias).unwrap();
            previous = alias;
        }
        let _ = factory.get_bean("leaf").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(len), &previous, |b, name| {
            b.iter(|| {
                let bean = factory.get_bean(black_box(name)).unwrap();
                black_box(bean);
            })
        });
    }

    group.finish();
}

// ===== Macro Benchmarks =====

fn bench_cold_setter_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_setter_chain");

    for len in [8usize, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || {
                    let factory = BeanFactory::new();
                    for i in 0..len {
                        let class = TypedClass::<Node>::with_default()
                            .property("next", |n: &Node, v: Value| {
                                let _ = n.next.set(v.into_bean()?);
                                Ok(())
                            })
                            .build();
                        // The last node closes the ring back to the first.
                        let next = format!("node{}", (i + 1) % len);
                        factory
                            .register_description(BeanDescription::new(format!("node{}", i), class).property_ref("next", next))
                            .unwrap();
                    }
                    factory
                },
                |factory| {
                    factory.pre_instantiate_singletons().unwrap();
                    black_box(factory.singleton_count());
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_type_lookup(c: &mut Criterion) {
    let factory = BeanFactory::new();
    for i in 0..32 {
        factory
            .register_description(BeanDescription::new(format!("node{}", i), TypedClass::<Node>::with_default().build()))
            .unwrap();
    }
    factory.register_description(leaf("leaf")).unwrap();
    let _ = factory.get_bean("leaf").unwrap();

    c.bench_function("get_bean_of_type_among_33", |b| {
        b.iter(|| {
            let bean: Arc<Leaf> = factory.get_bean_of_type().unwrap();
            black_box(bean);
        })
    });
}

criterion_group!(micro_benches, bench_singleton_hit, bench_prototype, bench_alias_chain);
criterion_group!(macro_benches, bench_cold_setter_chain, bench_type_lookup);
criterion_main!(micro_benches, macro_benches);
