//! Storage base types, factory interfaces, and the factories built from them.
//!
//! A shape built with [`ShapeBuilder::build_with_factory`] allocates
//! instances whose base part is produced by one of the base type's
//! constructors. Which constructor a factory method calls is decided once at
//! build time: the method's parameter list must equal the parameter list of
//! a visible constructor, and its return type must be the base type or one
//! of its supertypes.
//!
//! [`ShapeBuilder::build_with_factory`]: crate::ShapeBuilder::build_with_factory

use std::fmt;

use crate::object::{ObjectRef, StaticObject};
use crate::shape::Shape;
use crate::FactoryError;

/// Declared type of a constructor or factory method parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Boolean,
    Int,
    Long,
    Double,
    Str,
    Object,
}

/// Argument passed to a factory method.
#[derive(Clone, Debug)]
pub enum Arg {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    Object(Option<ObjectRef>),
}

impl Arg {
    pub fn param_type(&self) -> ParamType {
        match self {
            Arg::Boolean(_) => ParamType::Boolean,
            Arg::Int(_) => ParamType::Int,
            Arg::Long(_) => ParamType::Long,
            Arg::Double(_) => ParamType::Double,
            Arg::Str(_) => ParamType::Str,
            Arg::Object(_) => ParamType::Object,
        }
    }
}

/// Accessibility of a constructor from generated storage types.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    fn is_visible(self) -> bool {
        !matches!(self, Visibility::Private)
    }
}

/// Initialiser of a base value; `None` rejects the arguments.
pub type Init<B> = fn(&[Arg]) -> Option<B>;

/// One constructor of a [`BaseType`].
pub struct Constructor<B> {
    params: Vec<ParamType>,
    visibility: Visibility,
    init: Init<B>,
}

impl<B> Constructor<B> {
    pub fn new(params: Vec<ParamType>, visibility: Visibility, init: Init<B>) -> Self {
        Constructor {
            params,
            visibility,
            init,
        }
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

impl<B> Clone for Constructor<B> {
    fn clone(&self) -> Self {
        Constructor {
            params: self.params.clone(),
            visibility: self.visibility,
            init: self.init,
        }
    }
}

impl<B> fmt::Debug for Constructor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// The type every instance of a shape embeds as its base value.
pub struct BaseType<B> {
    name: Box<str>,
    supertypes: Vec<Box<str>>,
    constructors: Vec<Constructor<B>>,
}

impl<B> BaseType<B> {
    pub fn new(name: impl Into<Box<str>>) -> Self {
        BaseType {
            name: name.into(),
            supertypes: Vec::new(),
            constructors: Vec::new(),
        }
    }

    #[must_use]
    pub fn supertype(mut self, name: impl Into<Box<str>>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    #[must_use]
    pub fn constructor(mut self, constructor: Constructor<B>) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a value of this type can be returned as `name`.
    pub fn is_assignable_to(&self, name: &str) -> bool {
        *self.name == *name || self.supertypes.iter().any(|s| **s == *name)
    }

    fn visible_constructor(&self, params: &[ParamType]) -> Option<&Constructor<B>> {
        self.constructors
            .iter()
            .find(|c| c.visibility.is_visible() && c.params == params)
    }
}

impl BaseType<()> {
    /// Base type of shapes built without a factory.
    pub fn unit() -> Self {
        BaseType::new("Object").constructor(Constructor::new(
            Vec::new(),
            Visibility::Public,
            |_| Some(()),
        ))
    }
}

/// What kind of type a factory descriptor describes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TypeForm {
    #[default]
    Interface,
    Class,
    AbstractClass,
}

/// One allocation method of a [`FactoryInterface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryMethod {
    pub name: Box<str>,
    pub params: Vec<ParamType>,
    /// Name of the declared return type.
    pub returns: Box<str>,
}

impl FactoryMethod {
    pub fn new(
        name: impl Into<Box<str>>,
        params: Vec<ParamType>,
        returns: impl Into<Box<str>>,
    ) -> Self {
        FactoryMethod {
            name: name.into(),
            params,
            returns: returns.into(),
        }
    }
}

/// Declared interface of a shape's factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryInterface {
    name: Box<str>,
    form: TypeForm,
    methods: Vec<FactoryMethod>,
}

/// Method name of the factory generated for plain builds.
pub const DEFAULT_METHOD: &str = "create";

impl FactoryInterface {
    pub fn new(name: impl Into<Box<str>>, form: TypeForm) -> Self {
        FactoryInterface {
            name: name.into(),
            form,
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: FactoryMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Interface with a single zero-argument method returning `base`.
    pub(crate) fn default_for<B>(base: &BaseType<B>) -> Self {
        FactoryInterface::new("DefaultFactory", TypeForm::Interface).method(FactoryMethod::new(
            DEFAULT_METHOD,
            Vec::new(),
            base.name(),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn form(&self) -> TypeForm {
        self.form
    }

    pub fn methods(&self) -> &[FactoryMethod] {
        &self.methods
    }
}

/// A factory method resolved against its constructor.
struct Binding<B> {
    method: FactoryMethod,
    init: Init<B>,
}

impl<B> Clone for Binding<B> {
    fn clone(&self) -> Self {
        Binding {
            method: self.method.clone(),
            init: self.init,
        }
    }
}

/// Resolved factory interface, not yet attached to a shape.
pub(crate) struct Bindings<B>(Vec<Binding<B>>);

impl<B> Bindings<B> {
    /// Resolve every method of `interface` against `base`.
    pub(crate) fn resolve(
        base: &BaseType<B>,
        interface: &FactoryInterface,
    ) -> Result<Self, FactoryError> {
        if interface.form != TypeForm::Interface {
            return Err(FactoryError::NotAnInterface {
                name: interface.name.to_string(),
            });
        }
        interface
            .methods
            .iter()
            .map(|method| {
                let constructor = base.visible_constructor(&method.params).ok_or_else(|| {
                    FactoryError::NoMatchingConstructor {
                        method: method.name.to_string(),
                    }
                })?;
                if !base.is_assignable_to(&method.returns) {
                    return Err(FactoryError::ReturnTypeNotAssignable {
                        method: method.name.to_string(),
                        returns: method.returns.to_string(),
                        base: base.name.to_string(),
                    });
                }
                Ok(Binding {
                    method: method.clone(),
                    init: constructor.init,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Bindings)
    }

    pub(crate) fn attach(self, shape: Shape) -> Factory<B> {
        Factory {
            shape,
            bindings: self.0,
        }
    }
}

/// Allocator of a shape's instances.
pub struct Factory<B> {
    shape: Shape,
    bindings: Vec<Binding<B>>,
}

impl<B> Factory<B> {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Names of the allocation methods, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| &*b.method.name)
    }

    /// Allocate an instance through `method`.
    pub fn create(&self, method: &str, args: &[Arg]) -> Result<StaticObject<B>, FactoryError> {
        let binding = self
            .bindings
            .iter()
            .find(|b| *b.method.name == *method)
            .ok_or_else(|| FactoryError::UnknownMethod {
                method: method.to_owned(),
            })?;
        let mismatch = || FactoryError::ArgumentMismatch {
            method: method.to_owned(),
        };
        let params_match = binding.method.params.len() == args.len()
            && binding
                .method
                .params
                .iter()
                .zip(args)
                .all(|(param, arg)| *param == arg.param_type());
        if !params_match {
            return Err(mismatch());
        }
        let base = (binding.init)(args).ok_or_else(mismatch)?;
        Ok(StaticObject::new(self.shape.clone(), base))
    }

    /// Same factory methods, allocating instances of `shape`.
    pub(crate) fn rebind(&self, shape: Shape) -> Factory<B> {
        Factory {
            shape,
            bindings: self.bindings.clone(),
        }
    }
}

impl Factory<()> {
    /// Allocate an instance with the unit base value.
    pub fn create_default(&self) -> StaticObject<()> {
        StaticObject::new(self.shape.clone(), ())
    }
}

impl<B> Clone for Factory<B> {
    fn clone(&self) -> Self {
        self.rebind(self.shape.clone())
    }
}

impl<B> fmt::Debug for Factory<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("shape", &self.shape.id())
            .field("methods", &self.methods().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
