//! Shape hierarchies across both storage strategies.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use stato_object::{
    AccessError, Hole, Kind, LayoutConfig, ModelConfig, ObjectModel, StaticProperty, StaticShape,
    StorageStrategy,
};

const STRATEGIES: [StorageStrategy; 2] = [StorageStrategy::Array, StorageStrategy::Field];

fn extend(
    model: &ObjectModel,
    parent: Option<&StaticShape>,
    props: &[(&StaticProperty, Kind)],
) -> StaticShape {
    let mut builder = model.builder();
    for &(property, kind) in props {
        builder.property(property, kind, false).unwrap();
    }
    match parent {
        Some(parent) => builder.build_with_parent(parent).unwrap(),
        None => builder.build().unwrap(),
    }
}

#[test]
fn child_fills_parent_alignment_hole() {
    let model = ObjectModel::new(
        ModelConfig::default().with_layout(LayoutConfig::new(12, 8).unwrap()),
    );
    let a = StaticProperty::new("a");
    let b = StaticProperty::new("b");
    let c = StaticProperty::new("c");
    let parent = extend(&model, None, &[(&a, Kind::Long), (&b, Kind::Byte), (&c, Kind::Byte)]);

    assert_eq!([a.offset(), b.offset(), c.offset()], [Some(16), Some(15), Some(14)]);
    assert_eq!(parent.shape().layout().primitive_size(), 24);
    assert_eq!(parent.shape().layout().leftover_holes(), &[Hole::new(12, 14)]);

    let d = StaticProperty::new("d");
    let child = extend(&model, Some(&parent), &[(&d, Kind::Short)]);
    assert_eq!(d.offset(), Some(12));
    assert_eq!(child.shape().layout().primitive_size(), 24);
    assert_eq!(child.shape().layout().leftover_holes(), &[] as &[Hole]);
}

#[test]
fn field_strategy_never_shares_holes() {
    let model = ObjectModel::new(
        ModelConfig::default()
            .with_strategy(StorageStrategy::Field)
            .with_layout(LayoutConfig::new(12, 8).unwrap()),
    );
    let a = StaticProperty::new("a");
    let parent = extend(&model, None, &[(&a, Kind::Long)]);
    let d = StaticProperty::new("d");
    let child = extend(&model, Some(&parent), &[(&d, Kind::Short)]);

    assert_eq!(d.offset(), Some(1));
    assert!(child.shape().layout().primitive_size() > parent.shape().layout().primitive_size());
}

#[test]
fn three_levels_keep_values_apart() {
    for strategy in STRATEGIES {
        let model = ObjectModel::new(ModelConfig::default().with_strategy(strategy));
        let (l, b, s, r1, i, r2) = (
            StaticProperty::new("l"),
            StaticProperty::new("b"),
            StaticProperty::new("s"),
            StaticProperty::new("r1"),
            StaticProperty::new("i"),
            StaticProperty::new("r2"),
        );
        let root = extend(&model, None, &[(&l, Kind::Long), (&b, Kind::Byte)]);
        let middle = extend(&model, Some(&root), &[(&s, Kind::Short), (&r1, Kind::Reference)]);
        let leaf = extend(&model, Some(&middle), &[(&i, Kind::Int), (&r2, Kind::Reference)]);

        assert_eq!(leaf.shape().ancestors(), &[root.id(), middle.id(), leaf.id()]);
        assert_eq!(r1.offset(), Some(0));
        assert_eq!(r2.offset(), Some(1));
        assert_eq!(leaf.shape().layout().reference_count(), 2);

        let o = leaf.factory().create_default();
        l.set(&o, i64::MIN).unwrap();
        b.set(&o, -1i8).unwrap();
        s.set(&o, 0x1234i16).unwrap();
        i.set(&o, i32::MAX).unwrap();
        assert_eq!(l.get::<i64, _>(&o).unwrap(), i64::MIN);
        assert_eq!(b.get::<i8, _>(&o).unwrap(), -1);
        assert_eq!(s.get::<i16, _>(&o).unwrap(), 0x1234);
        assert_eq!(i.get::<i32, _>(&o).unwrap(), i32::MAX);

        let middle_instance = middle.factory().create_default();
        assert!(middle_instance.is_instance_of(root.shape()));
        assert!(!middle_instance.is_instance_of(leaf.shape()));
        assert_eq!(
            i.get::<i32, _>(&middle_instance),
            Err(AccessError::ShapeMismatch { id: "i".to_owned() })
        );
    }
}

#[test]
fn siblings_are_mutually_incompatible() {
    for strategy in STRATEGIES {
        let model = ObjectModel::new(ModelConfig::default().with_strategy(strategy));
        let base = StaticProperty::new("base");
        let root = extend(&model, None, &[(&base, Kind::Int)]);
        let left_p = StaticProperty::new("left");
        let right_p = StaticProperty::new("right");
        let left = extend(&model, Some(&root), &[(&left_p, Kind::Int)]);
        let right = extend(&model, Some(&root), &[(&right_p, Kind::Int)]);

        let left_instance = left.factory().create_default();
        let right_instance = right.factory().create_default();
        assert_eq!(left_p.offset(), right_p.offset());
        assert!(base.set(&left_instance, 1i32).is_ok());
        assert!(base.set(&right_instance, 2i32).is_ok());
        assert_eq!(
            left_p.get::<i32, _>(&right_instance),
            Err(AccessError::ShapeMismatch {
                id: "left".to_owned()
            })
        );
    }
}

#[test]
fn reference_only_child_keeps_primitive_size() {
    let model = ObjectModel::new(ModelConfig::default());
    let x = StaticProperty::new("x");
    let root = extend(&model, None, &[(&x, Kind::Double)]);
    let o = StaticProperty::new("o");
    let child = extend(&model, Some(&root), &[(&o, Kind::Reference)]);

    assert_eq!(
        child.shape().layout().primitive_size(),
        root.shape().layout().primitive_size()
    );
    assert_eq!(root.shape().layout().reference_count(), 0);
    assert_eq!(child.shape().layout().reference_count(), 1);
}
