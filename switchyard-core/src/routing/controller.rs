//! Controllers that declare their own routes
//!
//! A [`Controller`] names a path prefix and middleware shared by all of its
//! actions, and lists the actions with their methods and paths. Registering
//! it with [`Router::controller`] opens a route group for the prefix and
//! middleware and adds one route per declared method. Actions resolve the
//! controller through the container, constructing it when nothing is bound
//! under its type name.
//!
//! ```
//! use switchyard_core::routing::{Controller, ControllerRoutes};
//! use switchyard_core::{Arguments, Error, HttpMethod, Injectable, RequestContext, RouteParams, Router};
//!
//! struct PostController;
//!
//! impl Injectable for PostController {
//!     fn construct(_: &Arguments) -> Result<Self, Error> {
//!         Ok(PostController)
//!     }
//! }
//!
//! impl PostController {
//!     fn show(&self, _: &mut RequestContext, params: &RouteParams) -> Result<String, Error> {
//!         Ok(params.get("id").unwrap_or_default().to_string())
//!     }
//! }
//!
//! impl Controller for PostController {
//!     fn prefix() -> &'static str {
//!         "/posts"
//!     }
//!
//!     fn routes(routes: &mut ControllerRoutes<Self>) {
//!         routes.get("/{id}", "show", Self::show).name("posts.show");
//!     }
//! }
//!
//! let mut router = Router::new();
//! assert_eq!(router.controller::<PostController>().unwrap(), 1);
//! assert_eq!(router.named("posts.show").unwrap().path(), "/posts/{id}");
//! ```

use super::{Action, HandlerRef, Reply, RouteGroup, RouteParams, Router};
use crate::container::Injectable;
use crate::logging::debug;
use crate::middleware::MiddlewareRef;
use crate::{Error, HttpMethod, RequestContext};
use std::any::type_name;
use std::marker::PhantomData;

/// A type whose actions carry their own route declarations
pub trait Controller: Injectable {
    /// Path prefix shared by every action
    fn prefix() -> &'static str {
        ""
    }

    /// Middleware applied to every action, outermost first
    fn middleware() -> Vec<MiddlewareRef> {
        Vec::new()
    }

    /// Declare the controller's actions
    fn routes(routes: &mut ControllerRoutes<Self>);
}

/// One declared action: the methods it answers and its own middleware
#[derive(Debug, Clone)]
pub struct ControllerRoute {
    methods: Vec<HttpMethod>,
    path: String,
    handler: HandlerRef,
    middleware: Vec<MiddlewareRef>,
    name: Option<String>,
}

impl ControllerRoute {
    /// Append action-specific middleware, run after the controller's own
    pub fn middleware(&mut self, middleware: impl Into<MiddlewareRef>) -> &mut Self {
        self.middleware.push(middleware.into());
        self
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }
}

/// Collects the action declarations of a [`Controller`]
pub struct ControllerRoutes<C> {
    entries: Vec<ControllerRoute>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Controller> ControllerRoutes<C> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            _controller: PhantomData,
        }
    }

    /// Declare `method` on the controller under several HTTP methods
    pub fn route<F, R>(
        &mut self,
        methods: &[HttpMethod],
        path: &str,
        method: &str,
        func: F,
    ) -> &mut ControllerRoute
    where
        F: Fn(&C, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.action(methods, path, Action::of(method, func))
    }

    /// Declare a prepared [`Action`], for actions with injected parameters
    pub fn action(&mut self, methods: &[HttpMethod], path: &str, action: Action) -> &mut ControllerRoute {
        let index = self.entries.len();
        self.entries.push(ControllerRoute {
            methods: methods.to_vec(),
            path: path.to_string(),
            handler: HandlerRef::Action(action),
            middleware: Vec::new(),
            name: None,
        });
        &mut self.entries[index]
    }

    pub fn get<F, R>(&mut self, path: &str, method: &str, func: F) -> &mut ControllerRoute
    where
        F: Fn(&C, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(&[HttpMethod::GET], path, method, func)
    }

    pub fn post<F, R>(&mut self, path: &str, method: &str, func: F) -> &mut ControllerRoute
    where
        F: Fn(&C, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(&[HttpMethod::POST], path, method, func)
    }

    pub fn put<F, R>(&mut self, path: &str, method: &str, func: F) -> &mut ControllerRoute
    where
        F: Fn(&C, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(&[HttpMethod::PUT], path, method, func)
    }

    pub fn patch<F, R>(&mut self, path: &str, method: &str, func: F) -> &mut ControllerRoute
    where
        F: Fn(&C, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(&[HttpMethod::PATCH], path, method, func)
    }

    pub fn delete<F, R>(&mut self, path: &str, method: &str, func: F) -> &mut ControllerRoute
    where
        F: Fn(&C, &mut RequestContext, &RouteParams) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(&[HttpMethod::DELETE], path, method, func)
    }
}

impl Router {
    /// Register every action `C` declares, returning how many routes were
    /// added. Inside an enclosing group the controller's prefix and
    /// middleware nest under the group's.
    pub fn controller<C: Controller>(&mut self) -> Result<usize, Error> {
        let mut routes = ControllerRoutes::<C>::new();
        C::routes(&mut routes);

        let group = RouteGroup::new().prefix(C::prefix()).with_middleware(C::middleware());
        let before = self.len();
        self.group_with(group, |router| {
            for entry in &routes.entries {
                for method in &entry.methods {
                    let route = router.add_route(*method, &entry.path, entry.handler.clone())?;
                    for middleware in &entry.middleware {
                        route.middleware(middleware.clone());
                    }
                    if let Some(name) = &entry.name {
                        route.name(name.as_str());
                    }
                }
            }
            Ok(())
        })?;

        let added = self.len() - before;
        debug!(controller = type_name::<C>(), route_count = added, "Controller routes registered");
        Ok(added)
    }
}
