//! Request-dispatch kernel for the Switchyard framework
//!
//! Given an inbound method and path, the kernel decides which handler runs,
//! which middleware wraps it, and how the handler's dependencies are
//! supplied. Three pieces compose into the [`Kernel`]:
//!
//! - [`Container`] - binding registry and dependency resolver
//! - [`Router`] - route table, path patterns, groups
//! - [`Pipeline`] - onion-style middleware execution
//!
//! Everything is synchronous and in-memory. Accepting sockets, parsing HTTP
//! and scheduling requests is left to the transport that calls
//! [`Kernel::dispatch`].

pub mod codec;
pub mod config;
pub mod container;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod routing;

pub use crate::http::{HttpMethod, HttpResponse};
pub use codec::{Codec, Encoded, JsonCodec};
pub use config::KernelConfig;
pub use container::{
    Argument, Arguments, BoundMethod, Callable, Concrete, Constructor, Container, Injectable,
    Instance, Parameter, Resolver, ServiceProvider, key_of,
};
pub use context::{ContextState, RequestContext};
pub use dispatcher::Kernel;
pub use error::{Error, Result};
pub use middleware::{Endpoint, Middleware, MiddlewareRef, Next, middleware_fn};
pub use pipeline::Pipeline;
pub use routing::{
    Action, Controller, ControllerRoutes, GroupManifest, HandlerRef, HandlerRegistry, Reply, Route,
    RouteEntry, RouteGroup, RouteManifest, RouteMatch, RouteParams, Router,
};
