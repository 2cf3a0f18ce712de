// Route handlers and the values they return

use super::RouteParams;
use crate::container::{Argument, Arguments, Constructor, Injectable, Instance, Parameter, key_of};
use crate::logging::trace;
use crate::{Container, Error, HttpResponse, RequestContext};
use serde_json::{Map, Value};
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// A plain handler function
pub type HandlerFn =
    Arc<dyn Fn(&mut RequestContext, &RouteParams) -> Result<Reply, Error> + Send + Sync>;

type ActionFn = Arc<
    dyn Fn(&Instance, &mut RequestContext, &RouteParams, &Arguments) -> Result<Reply, Error>
        + Send
        + Sync,
>;

/// What a handler returns before the dispatcher normalizes it
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A fully formed response; passed through untouched
    Response(HttpResponse),
    /// A key-value mapping; encoded by the codec
    Mapping(Map<String, Value>),
    /// Anything else; sent as the raw body
    Raw(Vec<u8>),
}

impl From<HttpResponse> for Reply {
    fn from(response: HttpResponse) -> Self {
        Reply::Response(response)
    }
}

impl From<Map<String, Value>> for Reply {
    fn from(map: Map<String, Value>) -> Self {
        Reply::Mapping(map)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Reply::Mapping(map),
            Value::String(text) => Reply::Raw(text.into_bytes()),
            other => Reply::Raw(other.to_string().into_bytes()),
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Raw(text.into_bytes())
    }
}

impl From<&'static str> for Reply {
    fn from(text: &'static str) -> Self {
        Reply::Raw(text.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Reply {
    fn from(bytes: Vec<u8>) -> Self {
        Reply::Raw(bytes)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Raw(Vec::new())
    }
}

/// A handler bound to a method of a type resolved through the container
#[derive(Clone)]
pub struct Action {
    type_key: String,
    method: String,
    parameters: Vec<Parameter>,
    fallback: Option<Constructor>,
    invoke: ActionFn,
}

impl Action {
    /// Bind to `method` on whatever the container holds under `type_key`
    pub fn bound<T, F, R>(type_key: impl Into<String>, method: impl Into<String>, func: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        Self::bound_with(type_key, method, Vec::new(), move |this: &T, ctx, params, _args| {
            func(this, ctx, params)
        })
    }

    /// Like [`Action::bound`], with declared parameters filled by the
    /// container. Route params are supplied as explicit named arguments.
    pub fn bound_with<T, F, R>(
        type_key: impl Into<String>,
        method: impl Into<String>,
        parameters: Vec<Parameter>,
        func: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &mut RequestContext, &RouteParams, &Arguments) -> Result<R, Error>
            + Send
            + Sync
            + 'static,
        R: Into<Reply>,
    {
        let type_key = type_key.into();
        let key = type_key.clone();
        Self {
            type_key,
            method: method.into(),
            parameters,
            fallback: None,
            invoke: Arc::new(move |instance, ctx, params, args| {
                let target = instance.downcast_ref::<T>().ok_or_else(|| {
                    Error::unresolvable(
                        key.as_str(),
                        format!("bound instance is not a `{}`", type_name::<T>()),
                    )
                })?;
                func(target, ctx, params, args).map(Into::into)
            }),
        }
    }

    /// Bind to a method of an [`Injectable`] controller keyed by its type
    /// name; the controller is constructed if nothing is bound.
    pub fn of<T, F, R>(method: impl Into<String>, func: F) -> Self
    where
        T: Injectable,
        F: Fn(&T, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let mut action = Self::bound(key_of::<T>(), method, func);
        action.fallback = Some(Constructor::of::<T>());
        action
    }

    /// Declare parameters filled by the container on each invocation
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resolve the target through the container and invoke it.
    pub fn invoke(
        &self,
        container: &Container,
        ctx: &mut RequestContext,
        params: &RouteParams,
    ) -> Result<Reply, Error> {
        let resolver = container.resolver();
        let instance = resolver.resolve_with(&self.type_key, self.fallback.as_ref(), &Arguments::new())?;

        let mut explicit = Arguments::new();
        for (name, value) in params.iter() {
            explicit.insert(name, Argument::Value(Value::from(value)));
        }
        let owner = format!("{}::{}", self.type_key, self.method);
        let args = resolver.arguments_for(&self.parameters, &explicit, &owner)?;

        trace!(action = %owner, "Invoking controller action");
        (self.invoke)(&instance, ctx, params, &args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("type_key", &self.type_key)
            .field("method", &self.method)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Reference to the code a route runs
#[derive(Clone)]
pub enum HandlerRef {
    Function(HandlerFn),
    Action(Action),
}

impl HandlerRef {
    /// Wrap a free function or closure
    pub fn function<F, R>(func: F) -> Self
    where
        F: Fn(&mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        HandlerRef::Function(Arc::new(move |ctx, params| func(ctx, params).map(Into::into)))
    }

    /// Shorthand for [`Action::of`]
    pub fn action<T, F, R>(method: impl Into<String>, func: F) -> Self
    where
        T: Injectable,
        F: Fn(&T, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        HandlerRef::Action(Action::of(method, func))
    }

    /// Run the handler
    pub fn invoke(
        &self,
        container: &Container,
        ctx: &mut RequestContext,
        params: &RouteParams,
    ) -> Result<Reply, Error> {
        match self {
            HandlerRef::Function(func) => func(ctx, params),
            HandlerRef::Action(action) => action.invoke(container, ctx, params),
        }
    }
}

impl From<Action> for HandlerRef {
    fn from(action: Action) -> Self {
        HandlerRef::Action(action)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Function(_) => f.write_str("Function"),
            HandlerRef::Action(action) => action.fmt(f),
        }
    }
}
