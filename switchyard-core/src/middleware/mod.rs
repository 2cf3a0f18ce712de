//! Middleware for request/response processing
//!
//! Middleware wrap a route's handler in the onion model: each layer receives
//! the request context and a [`Next`] continuation. A layer can run code
//! before and after calling `next`, or return without calling it to
//! short-circuit the rest of the chain.
//!
//! ```
//! use switchyard_core::middleware::{Middleware, Next};
//! use switchyard_core::{Error, HttpResponse, RequestContext};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
//!         let response = next.run(ctx)?;
//!         Ok(response.with_header("X-Powered-By", "switchyard"))
//!     }
//! }
//! ```

mod auth;
mod cors;
mod ip_access;
mod rate_limit;
mod request_id;
mod trace;

pub use auth::{AuthConfig, AuthMiddleware, Principal};
pub use cors::{CorsConfig, CorsMiddleware};
pub use ip_access::{IpAccessConfig, IpAccessMiddleware};
pub use rate_limit::{RateLimitConfig, RateLimitMiddleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdMiddleware};
pub use trace::TraceMiddleware;

use crate::container::{Arguments, Concrete, Injectable, Resolver};
use crate::logging::trace;
use crate::{Container, Error, HttpResponse, RequestContext};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

/// A unit of cross-cutting request processing
pub trait Middleware: Send + Sync {
    /// Process the request, calling `next` to continue down the chain
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error>;

    /// Name used in logs
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// The innermost step of a chain, usually the route handler
pub trait Endpoint {
    fn call(&self, ctx: &mut RequestContext) -> Result<HttpResponse, Error>;
}

impl<F> Endpoint for F
where
    F: Fn(&mut RequestContext) -> Result<HttpResponse, Error>,
{
    fn call(&self, ctx: &mut RequestContext) -> Result<HttpResponse, Error> {
        self(ctx)
    }
}

/// The rest of the chain after the current middleware.
///
/// Consumed by [`Next::run`], so a middleware continues at most once.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [Arc<dyn Middleware>], endpoint: &'a dyn Endpoint) -> Self {
        Self {
            remaining: chain,
            endpoint,
        }
    }

    /// Run the remaining middleware and then the endpoint
    pub fn run(self, ctx: &mut RequestContext) -> Result<HttpResponse, Error> {
        match self.remaining.split_first() {
            Some((current, rest)) => {
                trace!(middleware = current.name(), remaining = rest.len(), "Executing middleware");
                current.handle(ctx, Next::new(rest, self.endpoint))
            }
            None => {
                trace!("Middleware chain complete, calling endpoint");
                self.endpoint.call(ctx)
            }
        }
    }

    /// Number of middleware still ahead of the endpoint
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

/// Middleware backed by a closure
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Label the middleware in logs
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut RequestContext, Next<'_>) -> Result<HttpResponse, Error> + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
        (self.func)(ctx, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as middleware
pub fn middleware_fn<F>(func: F) -> FnMiddleware<F>
where
    F: Fn(&mut RequestContext, Next<'_>) -> Result<HttpResponse, Error> + Send + Sync,
{
    FnMiddleware {
        name: "middleware_fn".to_string(),
        func,
    }
}

/// A middleware as attached to a route or group: either an instance, or the
/// key of a container binding resolved on each request.
#[derive(Clone)]
pub enum MiddlewareRef {
    Instance(Arc<dyn Middleware>),
    Named(String),
}

impl MiddlewareRef {
    pub fn instance<M: Middleware + 'static>(middleware: M) -> Self {
        MiddlewareRef::Instance(Arc::new(middleware))
    }

    pub fn named(key: impl Into<String>) -> Self {
        MiddlewareRef::Named(key.into())
    }

    /// Produce the middleware to run for one request
    pub fn resolve(&self, container: &Container) -> Result<Arc<dyn Middleware>, Error> {
        match self {
            MiddlewareRef::Instance(middleware) => Ok(middleware.clone()),
            MiddlewareRef::Named(key) => {
                let instance = container.resolve_instance(key, &Arguments::new())?;
                instance
                    .downcast_ref::<Arc<dyn Middleware>>()
                    .cloned()
                    .ok_or_else(|| {
                        Error::InvalidMiddleware(format!(
                            "binding `{}` does not produce a middleware",
                            key
                        ))
                    })
            }
        }
    }
}

impl From<&str> for MiddlewareRef {
    fn from(key: &str) -> Self {
        MiddlewareRef::Named(key.to_string())
    }
}

impl From<String> for MiddlewareRef {
    fn from(key: String) -> Self {
        MiddlewareRef::Named(key)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        MiddlewareRef::Instance(middleware)
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Instance(middleware) => {
                f.debug_tuple("Instance").field(&middleware.name()).finish()
            }
            MiddlewareRef::Named(key) => f.debug_tuple("Named").field(key).finish(),
        }
    }
}

impl Container {
    /// Bind a middleware factory so that `key` can be used as a named
    /// middleware reference.
    pub fn bind_middleware<M, F>(&self, key: impl Into<String>, singleton: bool, factory: F)
    where
        M: Middleware + 'static,
        F: Fn(&Resolver<'_>) -> Result<M, Error> + Send + Sync + 'static,
    {
        self.bind(
            key,
            Concrete::factory(move |resolver, _| {
                Ok(Arc::new(factory(resolver)?) as Arc<dyn Middleware>)
            }),
            singleton,
        );
    }

    /// Bind a constructible middleware type under `key`
    pub fn bind_middleware_type<M>(&self, key: impl Into<String>, singleton: bool)
    where
        M: Middleware + Injectable,
    {
        self.bind(
            key,
            Concrete::factory(|resolver, args| {
                let filled = resolver.arguments_for(&M::parameters(), args, type_name::<M>())?;
                Ok(Arc::new(M::construct(&filled)?) as Arc<dyn Middleware>)
            }),
            singleton,
        );
    }

    /// Register an already-built middleware under `key`
    pub fn middleware_instance<M: Middleware + 'static>(&self, key: impl Into<String>, middleware: M) {
        self.instance(key, Arc::new(middleware) as Arc<dyn Middleware>);
    }
}
