// Callables invoked through the container

use super::{Arguments, Constructor, Injectable, Instance, Parameter, key_of};
use crate::Error;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

type FunctionFn<R> = Arc<dyn Fn(&Arguments) -> Result<R, Error> + Send + Sync>;
type MethodFn<R> = Arc<dyn Fn(&Instance, &Arguments) -> Result<R, Error> + Send + Sync>;

/// Something the container can invoke: a free function, or a method on a
/// type resolved from the container.
pub enum Callable<R> {
    Function {
        parameters: Vec<Parameter>,
        func: FunctionFn<R>,
    },
    Method(BoundMethod<R>),
}

impl<R> Callable<R> {
    /// A free function with declared parameters
    pub fn function<F>(parameters: Vec<Parameter>, func: F) -> Self
    where
        F: Fn(&Arguments) -> Result<R, Error> + Send + Sync + 'static,
    {
        Callable::Function {
            parameters,
            func: Arc::new(func),
        }
    }

    /// A method on the instance bound under `type_key`
    pub fn method<T, F>(
        type_key: impl Into<String>,
        method: impl Into<String>,
        parameters: Vec<Parameter>,
        func: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &Arguments) -> Result<R, Error> + Send + Sync + 'static,
    {
        Callable::Method(BoundMethod::new(type_key, method, parameters, func))
    }

    /// A method on an [`Injectable`] type keyed by its type name; the type is
    /// constructed if nothing is bound under that key.
    pub fn method_of<T, F>(method: impl Into<String>, parameters: Vec<Parameter>, func: F) -> Self
    where
        T: Injectable,
        F: Fn(&T, &Arguments) -> Result<R, Error> + Send + Sync + 'static,
    {
        let mut bound = BoundMethod::new(key_of::<T>(), method, parameters, func);
        bound.fallback = Some(Constructor::of::<T>());
        Callable::Method(bound)
    }
}

impl<R> Clone for Callable<R> {
    fn clone(&self) -> Self {
        match self {
            Callable::Function { parameters, func } => Callable::Function {
                parameters: parameters.clone(),
                func: func.clone(),
            },
            Callable::Method(method) => Callable::Method(method.clone()),
        }
    }
}

impl<R> fmt::Debug for Callable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function { parameters, .. } => f
                .debug_struct("Function")
                .field("parameters", parameters)
                .finish(),
            Callable::Method(method) => f.debug_tuple("Method").field(method).finish(),
        }
    }
}

/// A `(type key, method)` pair with a typed invoker
pub struct BoundMethod<R> {
    type_key: String,
    method: String,
    parameters: Vec<Parameter>,
    fallback: Option<Constructor>,
    invoke: MethodFn<R>,
}

impl<R> BoundMethod<R> {
    pub fn new<T, F>(
        type_key: impl Into<String>,
        method: impl Into<String>,
        parameters: Vec<Parameter>,
        func: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &Arguments) -> Result<R, Error> + Send + Sync + 'static,
    {
        let type_key = type_key.into();
        let key = type_key.clone();
        Self {
            type_key,
            method: method.into(),
            parameters,
            fallback: None,
            invoke: Arc::new(move |instance, args| {
                let target = instance.downcast_ref::<T>().ok_or_else(|| {
                    Error::unresolvable(
                        key.as_str(),
                        format!("bound instance is not a `{}`", type_name::<T>()),
                    )
                })?;
                func(target, args)
            }),
        }
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Constructor used when the type key has no binding
    pub fn fallback(&self) -> Option<&Constructor> {
        self.fallback.as_ref()
    }

    /// `type_key::method`, for diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.type_key, self.method)
    }

    pub(crate) fn invoke(&self, instance: &Instance, args: &Arguments) -> Result<R, Error> {
        (self.invoke)(instance, args)
    }
}

impl<R> Clone for BoundMethod<R> {
    fn clone(&self) -> Self {
        Self {
            type_key: self.type_key.clone(),
            method: self.method.clone(),
            parameters: self.parameters.clone(),
            fallback: self.fallback.clone(),
            invoke: self.invoke.clone(),
        }
    }
}

impl<R> fmt::Debug for BoundMethod<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("type_key", &self.type_key)
            .field("method", &self.method)
            .field("parameters", &self.parameters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Concrete, Container};

    struct Greeter {
        greeting: String,
    }

    impl Greeter {
        fn greet(&self, args: &Arguments) -> Result<String, Error> {
            let name: String = args.value("name")?;
            let punctuation: String = args.value("punctuation")?;
            Ok(format!("{}, {}{}", self.greeting, name, punctuation))
        }
    }

    fn container() -> Container {
        let container = Container::new();
        container.instance(
            "greeter",
            Greeter {
                greeting: "Hello".to_string(),
            },
        );
        container
    }

    #[test]
    fn test_call_method_fills_parameters() {
        let container = container();
        let callable = Callable::method(
            "greeter",
            "greet",
            vec![
                Parameter::primitive("name"),
                Parameter::primitive_or("punctuation", "!"),
            ],
            Greeter::greet,
        );

        let out = container
            .call(&callable, &Arguments::new().with("name", "Ada"))
            .unwrap();
        assert_eq!(out, "Hello, Ada!");
    }

    #[test]
    fn test_call_extra_args_take_precedence() {
        let container = container();
        let callable = Callable::method(
            "greeter",
            "greet",
            vec![
                Parameter::primitive_or("name", "world"),
                Parameter::primitive_or("punctuation", "!"),
            ],
            Greeter::greet,
        );

        let out = container
            .call(&callable, &Arguments::new().with("punctuation", "?"))
            .unwrap();
        assert_eq!(out, "Hello, world?");
    }

    #[test]
    fn test_call_method_missing_primitive_fails() {
        let container = container();
        let callable = Callable::method(
            "greeter",
            "greet",
            vec![Parameter::primitive("name")],
            Greeter::greet,
        );

        let err = container.call(&callable, &Arguments::new()).unwrap_err();
        match err {
            Error::UnresolvableDependency { key, .. } => assert_eq!(key, "greeter::greet"),
            other => panic!("unexpected error: {other}"),
        }
    }

    struct Clock {
        offset: i64,
    }

    impl Injectable for Clock {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::primitive_or("offset", 2)]
        }

        fn construct(args: &Arguments) -> Result<Self, Error> {
            Ok(Self {
                offset: args.value("offset")?,
            })
        }
    }

    impl Clock {
        fn shift(&self, args: &Arguments) -> Result<i64, Error> {
            Ok(args.value::<i64>("hour")? + self.offset)
        }
    }

    #[test]
    fn test_call_method_of_constructs_unbound_type() {
        let container = Container::new();
        let callable = Callable::method_of::<Clock, _>(
            "shift",
            vec![Parameter::primitive("hour")],
            Clock::shift,
        );

        let out = container
            .call(&callable, &Arguments::new().with("hour", 10))
            .unwrap();
        assert_eq!(out, 12);
        assert!(!container.is_cached(key_of::<Clock>()));

        // A binding under the type key takes precedence
        container.instance(key_of::<Clock>(), Clock { offset: -1 });
        let out = container
            .call(&callable, &Arguments::new().with("hour", 10))
            .unwrap();
        assert_eq!(out, 9);
    }

    #[test]
    fn test_call_unbound_method_without_fallback_fails() {
        let container = Container::new();
        let callable = Callable::method(key_of::<Clock>(), "shift", Vec::new(), Clock::shift);

        let err = container.call(&callable, &Arguments::new()).unwrap_err();
        assert!(matches!(err, Error::UnresolvableDependency { .. }));
    }

    #[test]
    fn test_call_method_on_wrong_type_fails() {
        let container = Container::new();
        container.instance("greeter", 5u8);
        let callable = Callable::method("greeter", "greet", Vec::new(), Greeter::greet);

        assert!(container.call(&callable, &Arguments::new()).is_err());
    }

    #[test]
    fn test_call_function_resolves_services() {
        let container = Container::new();
        container.bind("factor", Concrete::factory(|_, _| Ok(3i64)), false);

        let callable = Callable::function(
            vec![Parameter::bound("factor", "factor"), Parameter::primitive("value")],
            |args| {
                let factor = args.service::<i64>("factor")?;
                let value: i64 = args.value("value")?;
                Ok(*factor * value)
            },
        );

        let out = container
            .call(&callable, &Arguments::new().with("value", 14))
            .unwrap();
        assert_eq!(out, 42);
    }

    #[test]
    fn test_call_function_sees_undeclared_extras() {
        let container = Container::new();
        let callable = Callable::function(Vec::new(), |args| args.value::<bool>("verbose"));

        assert!(
            container
                .call(&callable, &Arguments::new().with("verbose", true))
                .unwrap()
        );
    }
}
