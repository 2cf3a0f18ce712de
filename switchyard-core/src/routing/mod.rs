// Routing system for HTTP requests

mod controller;
mod group;
mod handler;
mod manifest;
mod params;
mod pattern;

pub use controller::{Controller, ControllerRoute, ControllerRoutes};
pub use group::RouteGroup;
pub use handler::{Action, HandlerFn, HandlerRef, Reply};
pub use manifest::{GroupManifest, HandlerRegistry, RouteEntry, RouteManifest};
pub use params::RouteParams;
pub use pattern::{PathPattern, normalize_path};

use crate::logging::{debug, trace};
use crate::middleware::MiddlewareRef;
use crate::{Error, HttpMethod};

/// Route definition
#[derive(Debug, Clone)]
pub struct Route {
    method: HttpMethod,
    pattern: PathPattern,
    handler: HandlerRef,
    /// Middleware inherited from enclosing groups, outermost first
    inherited: Vec<MiddlewareRef>,
    /// Route-specific middleware
    middleware: Vec<MiddlewareRef>,
    name: Option<String>,
}

impl Route {
    /// Append route-specific middleware
    pub fn middleware(&mut self, middleware: impl Into<MiddlewareRef>) -> &mut Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Label the route for diagnostics
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Group middleware followed by route middleware, in invocation order
    pub fn chain(&self) -> impl Iterator<Item = &MiddlewareRef> {
        self.inherited.iter().chain(self.middleware.iter())
    }
}

/// Outcome of matching a request against the route table
#[derive(Debug)]
pub enum RouteMatch<'r> {
    Found { route: &'r Route, params: RouteParams },
    /// The path matched only under other methods, listed in registration order
    MethodNotAllowed(Vec<HttpMethod>),
    NotFound,
}

/// Route table with group context.
///
/// Routes are matched in registration order; the first route whose pattern
/// and method both match wins, with no specificity ranking.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    /// Active group frames; each frame is already merged with its parent
    groups: Vec<RouteGroup>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route under the current group context
    pub fn add_route(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Route, Error> {
        let (path, inherited) = match self.groups.last() {
            Some(group) => (group.apply_prefix(pattern), group.get_middleware().to_vec()),
            None => (pattern.to_string(), Vec::new()),
        };
        let pattern = PathPattern::parse(&path)?;

        debug!(
            method = %method,
            path = pattern.as_str(),
            inherited_middleware = inherited.len(),
            "Route registered"
        );

        let index = self.routes.len();
        self.routes.push(Route {
            method,
            pattern,
            handler: handler.into(),
            inherited,
            middleware: Vec::new(),
            name: None,
        });
        Ok(&mut self.routes[index])
    }

    pub fn get(&mut self, pattern: &str, handler: impl Into<HandlerRef>) -> Result<&mut Route, Error> {
        self.add_route(HttpMethod::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Into<HandlerRef>) -> Result<&mut Route, Error> {
        self.add_route(HttpMethod::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Into<HandlerRef>) -> Result<&mut Route, Error> {
        self.add_route(HttpMethod::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Into<HandlerRef>) -> Result<&mut Route, Error> {
        self.add_route(HttpMethod::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Into<HandlerRef>) -> Result<&mut Route, Error> {
        self.add_route(HttpMethod::DELETE, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: impl Into<HandlerRef>) -> Result<&mut Route, Error> {
        self.add_route(HttpMethod::OPTIONS, pattern, handler)
    }

    /// Register the same handler under several methods
    pub fn any_of(
        &mut self,
        methods: &[HttpMethod],
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<(), Error> {
        let handler = handler.into();
        for method in methods {
            self.add_route(*method, pattern, handler.clone())?;
        }
        Ok(())
    }

    /// Register routes inside a group with a prefix and middleware.
    ///
    /// The group frame is popped when `build` returns, whether or not it
    /// succeeded.
    pub fn group<I, F>(&mut self, prefix: &str, middleware: I, build: F) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: Into<MiddlewareRef>,
        F: FnOnce(&mut Router) -> Result<(), Error>,
    {
        let group = RouteGroup::new().prefix(prefix).with_middleware(middleware);
        self.group_with(group, build)
    }

    /// Like [`Router::group`], with a prepared [`RouteGroup`]
    pub fn group_with<F>(&mut self, group: RouteGroup, build: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Router) -> Result<(), Error>,
    {
        let frame = match self.groups.last() {
            Some(parent) => group.with_parent(parent),
            None => group,
        };
        trace!(prefix = frame.get_prefix(), depth = self.groups.len() + 1, "Entering route group");

        self.groups.push(frame);
        let result = build(self);
        self.groups.pop();
        result
    }

    /// Match a request.
    ///
    /// One trailing slash is stripped from any path but `/`. A path with
    /// consecutive slashes never matches. A HEAD request with no HEAD route
    /// falls back to the first matching GET route.
    pub fn match_route(&self, method: HttpMethod, path: &str) -> RouteMatch<'_> {
        let path = normalize_path(path);
        if path.contains("//") {
            trace!(method = %method, path, "Path contains empty segment");
            return RouteMatch::NotFound;
        }

        let mut allowed: Vec<HttpMethod> = Vec::new();
        let mut head_fallback = None;

        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };

            if route.method == method {
                trace!(method = %method, path, route = route.path(), "Route matched");
                return RouteMatch::Found { route, params };
            }
            if method == HttpMethod::HEAD && route.method == HttpMethod::GET && head_fallback.is_none() {
                head_fallback = Some((route, params));
                continue;
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method);
            }
        }

        if let Some((route, params)) = head_fallback {
            trace!(path, route = route.path(), "HEAD served by GET route");
            return RouteMatch::Found { route, params };
        }

        if allowed.is_empty() {
            trace!(method = %method, path, "No route matched");
            RouteMatch::NotFound
        } else {
            trace!(method = %method, path, allowed = ?allowed, "Method not allowed");
            RouteMatch::MethodNotAllowed(allowed)
        }
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find a route by its label
    pub fn named(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.get_name() == Some(name))
    }
}
