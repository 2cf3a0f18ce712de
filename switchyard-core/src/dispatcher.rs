//! Request dispatch
//!
//! The [`Kernel`] owns the booted route table and container and turns a
//! [`RequestContext`] into an [`HttpResponse`]. It is the single recovery
//! boundary: every error, and any panic unwinding out of middleware or a
//! handler, becomes a formatted error response.
//!
//! ```
//! use switchyard_core::{Container, HttpMethod, Kernel, RequestContext, Router};
//!
//! let mut router = Router::new();
//! router
//!     .get("/posts/{id}", switchyard_core::HandlerRef::function(|_, params| {
//!         Ok(serde_json::json!({"id": params.get("id")}))
//!     }))
//!     .unwrap();
//!
//! let kernel = Kernel::boot(router, Container::new());
//! let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/posts/42"));
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body, br#"{"id":"42"}"#.to_vec());
//! ```

use crate::codec::{Codec, JsonCodec};
use crate::logging::{debug, error, info, warn};
use crate::middleware::MiddlewareRef;
use crate::routing::{Reply, Route, RouteMatch, Router};
use crate::{Container, Error, HttpMethod, HttpResponse, KernelConfig, Pipeline, RequestContext};
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// The booted request-dispatch kernel
pub struct Kernel {
    router: Router,
    container: Container,
    config: KernelConfig,
    codec: Arc<dyn Codec>,
    /// Applied outermost to every matched route
    middleware: Vec<MiddlewareRef>,
}

impl Kernel {
    /// Freeze a route table and container into a kernel
    pub fn boot(router: Router, container: Container) -> Self {
        info!(route_count = router.len(), "Kernel booted");
        Self {
            router,
            container,
            config: KernelConfig::default(),
            codec: Arc::new(JsonCodec::new()),
            middleware: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the codec used for mapping replies and error bodies
    pub fn with_codec<C: Codec + 'static>(mut self, codec: C) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Add global middleware. Global middleware wraps group and route
    /// middleware and runs only once a route has matched.
    pub fn with_middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Dispatch one request. Never fails; errors become error responses.
    ///
    /// The context, and with it any request-scoped state, is dropped before
    /// this returns.
    pub fn dispatch(&self, mut ctx: RequestContext) -> HttpResponse {
        let started = Instant::now();
        let method = ctx.method;
        let path = ctx.path.clone();

        let result = match self.router.match_route(method, &path) {
            RouteMatch::Found { route, params } => {
                ctx.params = params;
                self.run_route(route, &mut ctx)
            }
            RouteMatch::MethodNotAllowed(allowed) => Err(Error::MethodNotAllowed {
                method,
                path: path.clone(),
                allowed,
            }),
            RouteMatch::NotFound => Err(Error::RouteNotFound {
                method,
                path: path.clone(),
            }),
        };
        drop(ctx);

        let mut response = match result {
            Ok(response) => response,
            Err(err) => self.render_error(&err),
        };

        if method == HttpMethod::HEAD {
            response.body.clear();
        }
        self.stamp_server(&mut response);

        debug!(
            method = %method,
            path = %path,
            status = response.status,
            duration_us = started.elapsed().as_micros() as u64,
            "Request dispatched"
        );
        response
    }

    /// Dispatch a request coming straight from an `http`-based transport
    pub fn dispatch_http(&self, request: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        let response = match RequestContext::from_http(request) {
            Ok(ctx) => self.dispatch(ctx),
            Err(err) => {
                let mut response = self.render_error(&err);
                self.stamp_server(&mut response);
                response
            }
        };

        response.into_http().unwrap_or_else(|err| {
            error!(error = %err, "Response could not be converted for the transport");
            let mut fallback = http::Response::new(Vec::new());
            *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }

    fn run_route(&self, route: &Route, ctx: &mut RequestContext) -> Result<HttpResponse, Error> {
        let endpoint = |ctx: &mut RequestContext| -> Result<HttpResponse, Error> {
            let params = ctx.params.clone();
            let reply = route.handler().invoke(&self.container, ctx, &params)?;
            self.normalize(reply)
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let pipeline = Pipeline::resolve(self.middleware.iter().chain(route.chain()), &self.container)?;
            pipeline.run(ctx, &endpoint)
        }));

        outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(route = route.path(), panic = %message, "Handler panicked");
            Err(Error::HandlerInvocation(format!("panicked: {}", message)))
        })
    }

    fn stamp_server(&self, response: &mut HttpResponse) {
        if let Some(server) = &self.config.server_header {
            if response.header("Server").is_none() {
                response.set_header("Server", server.as_str());
            }
        }
    }

    /// Turn a handler reply into a response
    fn normalize(&self, reply: Reply) -> Result<HttpResponse, Error> {
        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Mapping(mapping) => {
                let encoded = self.codec.encode(&mapping)?;
                Ok(HttpResponse::ok()
                    .with_header("Content-Type", encoded.content_type)
                    .with_body(encoded.body))
            }
            Reply::Raw(body) => Ok(HttpResponse::ok()
                .with_header("Content-Type", self.config.raw_content_type.as_str())
                .with_body(body)),
        }
    }

    fn render_error(&self, err: &Error) -> HttpResponse {
        let status = err.status_code();
        if err.is_server_error() {
            error!(error = %err, kind = err.kind(), status, "Request failed");
        } else {
            warn!(error = %err, status, "Request rejected");
        }

        let mut mapping = Map::new();
        mapping.insert("error".to_string(), Value::String(err.to_string()));
        mapping.insert("status".to_string(), Value::from(status));
        if self.config.expose_errors {
            mapping.insert("kind".to_string(), Value::String(err.kind().to_string()));
        }

        let mut response = match self.codec.encode(&mapping) {
            Ok(encoded) => HttpResponse::new(status)
                .with_header("Content-Type", encoded.content_type)
                .with_body(encoded.body),
            Err(encode_err) => {
                error!(error = %encode_err, "Error body could not be encoded");
                HttpResponse::new(status)
                    .with_header("Content-Type", self.config.raw_content_type.as_str())
                    .with_body(err.to_string().into_bytes())
            }
        };

        if let Error::MethodNotAllowed { allowed, .. } = err {
            let allow = allowed.iter().map(HttpMethod::as_str).collect::<Vec<_>>().join(", ");
            response = response.with_header("Allow", allow);
        }
        response
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("routes", &self.router.len())
            .field("middleware", &self.middleware)
            .field("config", &self.config)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encoded;
    use crate::middleware::{AuthConfig, AuthMiddleware, middleware_fn};
    use crate::routing::{HandlerRef, RouteParams};
    use serde_json::json;

    fn body_json(response: &HttpResponse) -> Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    fn kernel(router: Router) -> Kernel {
        Kernel::boot(router, Container::new())
    }

    #[test]
    fn test_mapping_reply_is_encoded() {
        let mut router = Router::new();
        router
            .get(
                "/posts/{id}",
                HandlerRef::function(|_: &mut RequestContext, params: &RouteParams| {
                    Ok(json!({"id": params.get("id")}))
                }),
            )
            .unwrap();

        let response = kernel(router).dispatch(RequestContext::new(HttpMethod::GET, "/posts/42"));
        assert_eq!(response.status, 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("server"), Some("switchyard"));
        assert_eq!(body_json(&response), json!({"id": "42"}));
    }

    #[test]
    fn test_raw_and_structured_replies() {
        let mut router = Router::new();
        router
            .get("/raw", HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| Ok("plain")))
            .unwrap();
        router
            .post(
                "/made",
                HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| {
                    Ok(HttpResponse::created().with_header("Location", "/made/1"))
                }),
            )
            .unwrap();
        let kernel = kernel(router);

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/raw"));
        assert_eq!(response.body_str(), Some("plain"));
        assert_eq!(response.header("Content-Type"), Some("text/plain; charset=utf-8"));

        let response = kernel.dispatch(RequestContext::new(HttpMethod::POST, "/made"));
        assert_eq!(response.status, 201);
        assert_eq!(response.header("Location"), Some("/made/1"));
        assert!(response.header("Content-Type").is_none());
    }

    #[test]
    fn test_not_found_and_method_not_allowed() {
        let mut router = Router::new();
        router
            .post("/items", HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| Ok(())))
            .unwrap();
        router
            .put("/items", HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| Ok(())))
            .unwrap();
        let kernel = kernel(router);

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/nothing"));
        assert_eq!(response.status, 404);
        assert_eq!(body_json(&response)["status"], 404);

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/items"));
        assert_eq!(response.status, 405);
        assert_eq!(response.header("Allow"), Some("POST, PUT"));
        assert!(body_json(&response).get("kind").is_none());
    }

    #[test]
    fn test_expose_errors_adds_kind() {
        let kernel = kernel(Router::new()).with_config(KernelConfig::new().expose_errors(true));
        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/"));
        assert_eq!(body_json(&response)["kind"], "RouteNotFound");
    }

    #[test]
    fn test_panic_becomes_500() {
        let mut router = Router::new();
        router
            .get(
                "/boom",
                HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| -> Result<(), Error> {
                    panic!("kaboom")
                }),
            )
            .unwrap();
        let kernel = kernel(router).with_config(KernelConfig::new().expose_errors(true));

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/boom"));
        assert_eq!(response.status, 500);
        let body = body_json(&response);
        assert_eq!(body["kind"], "HandlerInvocationError");
        assert!(body["error"].as_str().unwrap().contains("kaboom"));
    }

    #[test]
    fn test_unresolvable_middleware_is_500() {
        let mut router = Router::new();
        router
            .get("/", HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| Ok("home")))
            .unwrap()
            .middleware("missing");

        let response = kernel(router).dispatch(RequestContext::new(HttpMethod::GET, "/"));
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_global_middleware_runs_outermost() {
        let mut router = Router::new();
        router
            .group("/api", [MiddlewareRef::instance(middleware_fn(|ctx, next| {
                ctx.state.set("seen", "group");
                next.run(ctx)
            }))], |r| {
                r.get(
                    "/who",
                    HandlerRef::function(|ctx: &mut RequestContext, _: &RouteParams| {
                        Ok(ctx.state.value("seen").cloned().unwrap_or_default())
                    }),
                )?;
                Ok(())
            })
            .unwrap();

        let kernel = kernel(router).with_middleware(MiddlewareRef::instance(middleware_fn(|ctx, next| {
            let response = next.run(ctx)?;
            Ok(response.with_header("X-Global", "1"))
        })));

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/api/who"));
        assert_eq!(response.body_str(), Some("group"));
        assert_eq!(response.header("X-Global"), Some("1"));

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/missing"));
        assert!(response.header("X-Global").is_none());
    }

    #[test]
    fn test_auth_short_circuits_handler() {
        let container = Container::new();
        container.middleware_instance("auth", AuthMiddleware::new(AuthConfig::default()));

        let mut router = Router::new();
        router
            .get(
                "/posts/{id}",
                HandlerRef::function(|_: &mut RequestContext, params: &RouteParams| {
                    Ok(json!({"id": params.get("id")}))
                }),
            )
            .unwrap()
            .middleware("auth");
        let kernel = Kernel::boot(router, container);

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/posts/42"));
        assert_eq!(response.status, 401);

        let ctx = RequestContext::new(HttpMethod::GET, "/posts/42").with_header("Authorization", "Bearer t");
        let response = kernel.dispatch(ctx);
        assert_eq!(response.status, 200);
        assert_eq!(body_json(&response)["id"], "42");
    }

    #[test]
    fn test_head_strips_body() {
        let mut router = Router::new();
        router
            .get("/page", HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| Ok("content")))
            .unwrap();

        let response = kernel(router).dispatch(RequestContext::new(HttpMethod::HEAD, "/page"));
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_custom_codec_and_server_header() {
        struct Upper;
        impl Codec for Upper {
            fn encode(&self, mapping: &Map<String, Value>) -> Result<Encoded, Error> {
                Ok(Encoded {
                    body: Value::Object(mapping.clone()).to_string().to_uppercase().into_bytes(),
                    content_type: "text/x-upper".to_string(),
                })
            }
        }

        let mut router = Router::new();
        router
            .get("/", HandlerRef::function(|_: &mut RequestContext, _: &RouteParams| Ok(json!({"a": "b"}))))
            .unwrap();
        let kernel = kernel(router)
            .with_codec(Upper)
            .with_config(KernelConfig::new().server_header(None));

        let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/"));
        assert_eq!(response.body_str(), Some(r#"{"A":"B"}"#));
        assert_eq!(response.header("Content-Type"), Some("text/x-upper"));
        assert!(response.header("Server").is_none());
    }

    #[test]
    fn test_dispatch_http() {
        let mut router = Router::new();
        router
            .get(
                "/search",
                HandlerRef::function(|ctx: &mut RequestContext, _: &RouteParams| {
                    Ok(ctx.query_param("q").unwrap_or_default().to_string())
                }),
            )
            .unwrap();
        let kernel = kernel(router);

        let request = http::Request::builder()
            .method("GET")
            .uri("/search?q=rust%20lang")
            .body(Vec::new())
            .unwrap();
        let response = kernel.dispatch_http(request);
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.body(), b"rust lang");

        let request = http::Request::builder()
            .method("BREW")
            .uri("/search")
            .body(Vec::new())
            .unwrap();
        assert_eq!(kernel.dispatch_http(request).status(), http::StatusCode::BAD_REQUEST);
    }
}
