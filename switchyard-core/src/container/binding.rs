// Bindings, constructor parameters and resolved arguments

use super::Resolver;
use crate::Error;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A resolved, type-erased value held by the container
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Factory closure invoked with the active resolver and the explicit arguments
pub type Factory = Arc<dyn Fn(&Resolver<'_>, &Arguments) -> Result<Instance, Error> + Send + Sync>;

/// The container key under which a type is auto-wired.
pub fn key_of<T: ?Sized + 'static>() -> &'static str {
    type_name::<T>()
}

/// A single named argument
#[derive(Clone)]
pub enum Argument {
    /// A primitive value (string, number, bool, ...)
    Value(Value),
    /// A resolved service
    Service(Instance),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Argument::Service(_) => f.write_str("Service(..)"),
        }
    }
}

/// Named arguments for a constructor, factory or method call
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    values: HashMap<String, Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a primitive argument
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values
            .insert(name.into(), Argument::Value(value.into()));
        self
    }

    /// Add an already-built service argument
    pub fn with_service<T: Any + Send + Sync>(mut self, name: impl Into<String>, service: Arc<T>) -> Self {
        self.values.insert(name.into(), Argument::Service(service));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, argument: Argument) {
        self.values.insert(name.into(), argument);
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a primitive argument, deserializing it into `T`
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        match self.values.get(name) {
            Some(Argument::Value(value)) => serde_json::from_value(value.clone()).map_err(|e| {
                Error::unresolvable(name, format!("argument has the wrong type: {}", e))
            }),
            Some(Argument::Service(_)) => Err(Error::unresolvable(
                name,
                "expected a primitive argument, found a service",
            )),
            None => Err(Error::unresolvable(name, "argument was not supplied")),
        }
    }

    /// Read a service argument as `Arc<T>`
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, Error> {
        match self.values.get(name) {
            Some(Argument::Service(instance)) => {
                instance.clone().downcast::<T>().map_err(|_| {
                    Error::unresolvable(
                        name,
                        format!("service argument is not a `{}`", type_name::<T>()),
                    )
                })
            }
            Some(Argument::Value(_)) => Err(Error::unresolvable(
                name,
                "expected a service argument, found a primitive",
            )),
            None => Err(Error::unresolvable(name, "argument was not supplied")),
        }
    }

    /// Copy over every argument from `other` that is not already present
    pub(crate) fn merge_missing(&mut self, other: &Arguments) {
        for (name, argument) in &other.values {
            self.values
                .entry(name.clone())
                .or_insert_with(|| argument.clone());
        }
    }
}

/// How a declared parameter is filled when no explicit argument is given
#[derive(Clone)]
pub enum ParameterKind {
    /// A primitive; `None` means there is no default and resolution fails
    Primitive { default: Option<Value> },
    /// A service resolved from the container
    Service {
        key: String,
        fallback: Option<Constructor>,
    },
}

/// A constructor or method parameter, in declaration order
#[derive(Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

impl Parameter {
    /// Primitive parameter with no default
    pub fn primitive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Primitive { default: None },
        }
    }

    /// Primitive parameter with a default value
    pub fn primitive_or(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Primitive {
                default: Some(default.into()),
            },
        }
    }

    /// Service parameter keyed by `T`'s type name; if nothing is bound under
    /// that key, `T` itself is constructed.
    pub fn service<T: Injectable>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Service {
                key: key_of::<T>().to_string(),
                fallback: Some(Constructor::of::<T>()),
            },
        }
    }

    /// Service parameter resolved from an explicit binding key
    pub fn bound(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Service {
                key: key.into(),
                fallback: None,
            },
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Parameter");
        debug.field("name", &self.name);
        match &self.kind {
            ParameterKind::Primitive { default } => debug.field("default", default),
            ParameterKind::Service { key, .. } => debug.field("service", key),
        };
        debug.finish()
    }
}

/// A type the container can construct by inspecting its parameters
pub trait Injectable: Any + Send + Sync + Sized {
    /// Constructor parameters, in order
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Build the value from fully resolved arguments
    fn construct(args: &Arguments) -> Result<Self, Error>;
}

/// Type-erased constructor of an [`Injectable`] type
#[derive(Clone)]
pub struct Constructor {
    type_name: &'static str,
    parameters: fn() -> Vec<Parameter>,
    build: fn(&Arguments) -> Result<Instance, Error>,
}

impl Constructor {
    pub fn of<T: Injectable>() -> Self {
        fn build<T: Injectable>(args: &Arguments) -> Result<Instance, Error> {
            Ok(Arc::new(T::construct(args)?))
        }

        Self {
            type_name: type_name::<T>(),
            parameters: T::parameters,
            build: build::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        (self.parameters)()
    }

    pub(crate) fn build(&self, args: &Arguments) -> Result<Instance, Error> {
        (self.build)(args)
    }
}

/// What a binding produces
#[derive(Clone)]
pub enum Concrete {
    Factory(Factory),
    Type(Constructor),
    Instance(Instance),
}

impl Concrete {
    /// A factory returning a concrete `T`
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Resolver<'_>, &Arguments) -> Result<T, Error> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(move |resolver, args| {
            Ok(Arc::new(factory(resolver, args)?) as Instance)
        }))
    }

    /// A constructible type
    pub fn of<T: Injectable>() -> Self {
        Concrete::Type(Constructor::of::<T>())
    }

    /// A fixed, already-built value
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        Concrete::Instance(Arc::new(value))
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Concrete::Factory(_) => "factory",
            Concrete::Type(_) => "type",
            Concrete::Instance(_) => "instance",
        }
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Type(constructor) => f.debug_tuple("Type").field(&constructor.type_name).finish(),
            other => f.write_str(other.describe()),
        }
    }
}

/// A registered binding
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) concrete: Concrete,
    pub(crate) singleton: bool,
    pub(crate) generation: u64,
}
