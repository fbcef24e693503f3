use pretty_assertions::assert_eq;

use crate::{
    Arg, BaseType, BuildError, Constructor, FactoryError, FactoryInterface, FactoryMethod, Kind,
    ModelConfig, ObjectModel, ParamType, StaticProperty, StaticShape, TypeForm, Visibility,
    DEFAULT_METHOD,
};

#[derive(Debug, PartialEq)]
struct Node {
    label: String,
    weight: i32,
}

fn node_type() -> BaseType<Node> {
    BaseType::new("Node")
        .supertype("Object")
        .constructor(Constructor::new(
            vec![ParamType::Str, ParamType::Int],
            Visibility::Public,
            |args| match args {
                [Arg::Str(label), Arg::Int(weight)] if *weight >= 0 => Some(Node {
                    label: label.clone(),
                    weight: *weight,
                }),
                _ => None,
            },
        ))
        .constructor(Constructor::new(vec![ParamType::Long], Visibility::Private, |_| None))
}

fn node_factory() -> FactoryInterface {
    FactoryInterface::new("NodeFactory", TypeForm::Interface).method(FactoryMethod::new(
        "make",
        vec![ParamType::Str, ParamType::Int],
        "Object",
    ))
}

fn build(
    base: BaseType<Node>,
    interface: &FactoryInterface,
) -> Result<StaticShape<Node>, BuildError> {
    let model = ObjectModel::new(ModelConfig::default());
    let mut builder = model.builder();
    builder.property(&StaticProperty::new("x"), Kind::Int, false)?;
    builder.build_with_factory(base, interface)
}

#[test]
fn creates_instances_through_constructors() {
    let shape = build(node_type(), &node_factory()).unwrap();
    let factory = shape.factory();
    assert_eq!(factory.methods().collect::<Vec<_>>(), vec!["make"]);

    let node = factory
        .create("make", &[Arg::Str("root".to_owned()), Arg::Int(3)])
        .unwrap();
    assert_eq!(
        node.base(),
        &Node {
            label: "root".to_owned(),
            weight: 3
        }
    );
    assert_eq!(node.shape(), shape.shape());
}

#[test]
fn rejects_non_interfaces() {
    for form in [TypeForm::Class, TypeForm::AbstractClass] {
        let interface = FactoryInterface::new("NodeFactory", form);
        assert_eq!(
            build(node_type(), &interface).err(),
            Some(BuildError::InvalidFactory(FactoryError::NotAnInterface {
                name: "NodeFactory".to_owned()
            }))
        );
    }
}

#[test]
fn private_constructors_are_not_visible() {
    let interface = FactoryInterface::new("NodeFactory", TypeForm::Interface).method(
        FactoryMethod::new("fromId", vec![ParamType::Long], "Node"),
    );
    assert_eq!(
        build(node_type(), &interface).err(),
        Some(BuildError::InvalidFactory(FactoryError::NoMatchingConstructor {
            method: "fromId".to_owned()
        }))
    );
}

#[test]
fn return_type_must_accept_the_base_type() {
    let interface = FactoryInterface::new("NodeFactory", TypeForm::Interface).method(
        FactoryMethod::new("make", vec![ParamType::Str, ParamType::Int], "Edge"),
    );
    assert_eq!(
        build(node_type(), &interface).err(),
        Some(BuildError::InvalidFactory(FactoryError::ReturnTypeNotAssignable {
            method: "make".to_owned(),
            returns: "Edge".to_owned(),
            base: "Node".to_owned(),
        }))
    );
}

#[test]
fn create_checks_method_and_arguments() {
    let shape = build(node_type(), &node_factory()).unwrap();
    let factory = shape.factory();

    assert_eq!(
        factory.create("missing", &[]).err(),
        Some(FactoryError::UnknownMethod {
            method: "missing".to_owned()
        })
    );
    let mismatch = Some(FactoryError::ArgumentMismatch {
        method: "make".to_owned(),
    });
    assert_eq!(factory.create("make", &[Arg::Int(3)]).err(), mismatch);
    assert_eq!(
        factory
            .create("make", &[Arg::Int(3), Arg::Str("x".to_owned())])
            .err(),
        mismatch
    );
    // The constructor itself rejects negative weights.
    assert_eq!(
        factory
            .create("make", &[Arg::Str("x".to_owned()), Arg::Int(-1)])
            .err(),
        mismatch
    );
}

#[test]
fn child_shapes_reuse_parent_factory() {
    let model = ObjectModel::new(ModelConfig::default());
    let x = StaticProperty::new("x");
    let mut builder = model.builder();
    builder.property(&x, Kind::Int, false).unwrap();
    let parent = builder.build_with_factory(node_type(), &node_factory()).unwrap();

    let y = StaticProperty::new("y");
    let mut builder = model.builder();
    builder.property(&y, Kind::Long, false).unwrap();
    let child = builder.build_with_parent(&parent).unwrap();

    let node = child
        .factory()
        .create("make", &[Arg::Str("leaf".to_owned()), Arg::Int(1)])
        .unwrap();
    assert_eq!(node.shape(), child.shape());
    assert_eq!(node.base().label, "leaf");
    x.set(&node, 5i32).unwrap();
    y.set(&node, -5i64).unwrap();
    assert_eq!(x.get::<i32, _>(&node).unwrap(), 5);
    assert_eq!(y.get::<i64, _>(&node).unwrap(), -5);
}

#[test]
fn plain_builds_get_a_default_factory() {
    let model = ObjectModel::new(ModelConfig::default());
    let shape = model.builder().build().unwrap();
    let factory = shape.factory();

    assert_eq!(factory.methods().collect::<Vec<_>>(), vec![DEFAULT_METHOD]);
    let object = factory.create(DEFAULT_METHOD, &[]).unwrap();
    assert_eq!(object.shape(), shape.shape());
    assert!(factory.create_default().is_instance_of(shape.shape()));
}

#[test]
fn descriptors_expose_their_declarations() {
    let base = node_type();
    let interface = node_factory();
    assert_eq!(interface.name(), "NodeFactory");
    assert_eq!(interface.form(), TypeForm::Interface);
    assert_eq!(interface.methods()[0].params, vec![ParamType::Str, ParamType::Int]);

    let public = Constructor::<Node>::new(vec![ParamType::Str], Visibility::default(), |_| None);
    assert_eq!(public.params(), &[ParamType::Str]);
    assert_eq!(public.visibility(), Visibility::Public);
    assert_eq!(base.name(), "Node");

    let class = FactoryInterface::new("NodeClass", TypeForm::AbstractClass);
    assert_eq!(class.form(), TypeForm::AbstractClass);
}
