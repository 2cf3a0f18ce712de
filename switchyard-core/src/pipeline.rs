//! Middleware pipeline execution
//!
//! A [`Pipeline`] is the resolved, ordered middleware chain for one request.
//! Named references are resolved through the container each time a pipeline
//! is built; whether the same instance comes back across requests depends
//! only on the binding's singleton flag.

use crate::logging::debug;
use crate::middleware::{Endpoint, Middleware, MiddlewareRef, Next};
use crate::{Container, Error, HttpResponse, RequestContext};
use std::sync::Arc;

/// An ordered chain of middleware, outermost first
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from ready middleware
    pub fn through(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self { stages }
    }

    /// Resolve middleware references in order. The first reference that
    /// fails to resolve aborts the build.
    pub fn resolve<'r, I>(refs: I, container: &Container) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'r MiddlewareRef>,
    {
        let stages = refs
            .into_iter()
            .map(|reference| reference.resolve(container))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stages })
    }

    /// Append a stage (innermost so far)
    pub fn pipe(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.stages.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names, outermost first
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run the request through every stage and into `endpoint`
    pub fn run(&self, ctx: &mut RequestContext, endpoint: &dyn Endpoint) -> Result<HttpResponse, Error> {
        debug!(
            middleware_count = self.stages.len(),
            method = %ctx.method,
            path = %ctx.path,
            "Executing middleware pipeline"
        );
        Next::new(&self.stages, endpoint).run(ctx)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;
    use crate::middleware::middleware_fn;

    fn header_stamp(value: &'static str) -> Arc<dyn Middleware> {
        Arc::new(
            middleware_fn(move |ctx, next| {
                let mut seen = ctx
                    .state
                    .value("order")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                seen.push_str(value);
                ctx.state.set("order", seen);
                next.run(ctx)
            })
            .named(value),
        )
    }

    #[test]
    fn test_run_in_registration_order() {
        let pipeline = Pipeline::new()
            .pipe(header_stamp("a"))
            .pipe(header_stamp("b"))
            .pipe(header_stamp("c"));
        assert_eq!(pipeline.names(), vec!["a", "b", "c"]);

        let endpoint = |ctx: &mut RequestContext| -> Result<HttpResponse, Error> {
            let order = ctx.state.value("order").and_then(|v| v.as_str()).unwrap_or_default();
            Ok(HttpResponse::text(order))
        };
        let mut ctx = RequestContext::new(HttpMethod::GET, "/");
        let response = pipeline.run(&mut ctx, &endpoint).unwrap();
        assert_eq!(response.body_str(), Some("abc"));
    }

    #[test]
    fn test_empty_pipeline_calls_endpoint() {
        let endpoint =
            |_: &mut RequestContext| -> Result<HttpResponse, Error> { Ok(HttpResponse::no_content()) };
        let mut ctx = RequestContext::new(HttpMethod::GET, "/");
        assert_eq!(Pipeline::new().run(&mut ctx, &endpoint).unwrap().status, 204);
    }

    #[test]
    fn test_resolve_named_references() {
        let container = Container::new();
        container.middleware_instance("stamp", middleware_fn(|ctx, next| next.run(ctx)).named("stamp"));

        let refs = vec![MiddlewareRef::from("stamp"), MiddlewareRef::Instance(header_stamp("x"))];
        let pipeline = Pipeline::resolve(&refs, &container).unwrap();
        assert_eq!(pipeline.names(), vec!["stamp", "x"]);

        let refs = vec![MiddlewareRef::from("missing")];
        assert!(Pipeline::resolve(&refs, &container).is_err());
    }
}
