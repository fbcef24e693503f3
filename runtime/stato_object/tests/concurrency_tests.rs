//! Concurrent access to shared instances.
//!
//! Threads race on properties of one instance and check that exactly one
//! compare-and-set wins, that read-modify-write operations never lose
//! updates, and that fields packed into the same word as a contended field
//! keep their values.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use stato_object::{
    Kind, ModelConfig, ObjectModel, Referent, StaticObject, StaticProperty, StorageStrategy,
};

const THREADS: usize = 8;
const STRATEGIES: [StorageStrategy; 2] = [StorageStrategy::Array, StorageStrategy::Field];

/// Root shape with eight byte properties that share one storage word in
/// array mode.
fn packed_bytes(strategy: StorageStrategy) -> (Vec<StaticProperty>, StaticObject) {
    let model = ObjectModel::new(ModelConfig::default().with_strategy(strategy));
    let bytes: Vec<StaticProperty> = (0..THREADS)
        .map(|i| StaticProperty::new(format!("b{i}")))
        .collect();
    let mut builder = model.builder();
    for property in &bytes {
        builder.property(property, Kind::Byte, false).unwrap();
    }
    let shape = builder.build().unwrap();
    assert_eq!(shape.shape().layout().primitive_size(), 8);
    (bytes, shape.factory().create_default())
}

#[test]
fn racing_compare_and_set_has_one_winner() {
    for strategy in STRATEGIES {
        let (bytes, instance) = packed_bytes(strategy);
        let contended = &bytes[3];
        for (i, neighbour) in bytes.iter().enumerate() {
            if i != 3 {
                neighbour.set(&instance, i8::try_from(i).unwrap() + 10).unwrap();
            }
        }

        let winners = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);
        std::thread::scope(|scope| {
            for thread in 0..THREADS {
                let (winners, barrier, instance) = (&winners, &barrier, &instance);
                scope.spawn(move || {
                    let value = i8::try_from(thread).unwrap() + 1;
                    barrier.wait();
                    if contended.compare_and_set(instance, 0i8, value).unwrap() {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::Relaxed), 1, "{strategy:?}");
        assert_ne!(contended.get::<i8, _>(&instance).unwrap(), 0);
        for (i, neighbour) in bytes.iter().enumerate() {
            if i != 3 {
                assert_eq!(
                    neighbour.get::<i8, _>(&instance).unwrap(),
                    i8::try_from(i).unwrap() + 10,
                    "{strategy:?} byte {i}"
                );
            }
        }
    }
}

#[test]
fn neighbouring_bytes_count_independently() {
    const ROUNDS: i8 = 100;
    for strategy in STRATEGIES {
        let (bytes, instance) = packed_bytes(strategy);

        std::thread::scope(|scope| {
            for property in &bytes {
                let instance = &instance;
                scope.spawn(move || {
                    for _ in 0..ROUNDS {
                        loop {
                            let current = property.get_volatile::<i8, _>(instance).unwrap();
                            if property
                                .compare_and_set(instance, current, current + 1)
                                .unwrap()
                            {
                                break;
                            }
                        }
                    }
                });
            }
        });

        for property in &bytes {
            assert_eq!(property.get::<i8, _>(&instance).unwrap(), ROUNDS, "{strategy:?}");
        }
    }
}

#[test]
fn get_and_add_never_loses_increments() {
    const ROUNDS: i32 = 1_000;
    for strategy in STRATEGIES {
        let model = ObjectModel::new(ModelConfig::default().with_strategy(strategy));
        let counter = StaticProperty::new("counter");
        let flag = StaticProperty::new("flag");
        let mut builder = model.builder();
        builder
            .property(&counter, Kind::Int, false)
            .unwrap()
            .property(&flag, Kind::Boolean, false)
            .unwrap();
        let instance = builder.build().unwrap().factory().create_default();
        flag.set(&instance, true).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..ROUNDS {
                        counter.get_and_add(&instance, 1i32).unwrap();
                    }
                });
            }
        });

        let expected = ROUNDS * i32::try_from(THREADS).unwrap();
        assert_eq!(counter.get::<i32, _>(&instance).unwrap(), expected);
        assert!(flag.get::<bool, _>(&instance).unwrap());
    }
}

#[test]
fn racing_object_swaps_have_one_winner() {
    let model = ObjectModel::new(ModelConfig::default());
    let slot = StaticProperty::new("slot");
    let mut builder = model.builder();
    builder.property(&slot, Kind::Reference, false).unwrap();
    let instance = builder.build().unwrap().factory().create_default();

    let candidates: Vec<_> = (0..THREADS).map(Referent::new).collect();
    let winners = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        for candidate in &candidates {
            let (winners, instance, slot) = (&winners, &instance, &slot);
            scope.spawn(move || {
                if slot
                    .compare_and_set_object(instance, None, Some(Arc::clone(candidate)))
                    .unwrap()
                {
                    winners.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    assert_eq!(winners.load(Ordering::Relaxed), 1);
    let stored = slot.get_object(&instance).unwrap().unwrap();
    assert!(candidates.iter().any(|c| Arc::ptr_eq(c, &stored)));
}
