use switchyard_core::middleware::{
    CorsConfig, CorsMiddleware, RateLimitConfig, RateLimitMiddleware, RequestId,
    RequestIdMiddleware, TraceMiddleware,
};
use switchyard_core::*;
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

struct Step {
    name: &'static str,
    log: Log,
    short_circuit: bool,
}

impl Middleware for Step {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse> {
        self.log.lock().push(format!("{}-pre", self.name));
        let response = if self.short_circuit {
            HttpResponse::unauthorized()
        } else {
            next.run(ctx)?
        };
        self.log.lock().push(format!("{}-post", self.name));
        Ok(response)
    }

    fn name(&self) -> &str {
        self.name
    }
}

fn step(name: &'static str, log: &Log, short_circuit: bool) -> Arc<dyn Middleware> {
    Arc::new(Step {
        name,
        log: log.clone(),
        short_circuit,
    })
}

fn recording_endpoint(log: &Log) -> impl Fn(&mut RequestContext) -> Result<HttpResponse> + '_ {
    move |_: &mut RequestContext| {
        log.lock().push("handler".to_string());
        Ok(HttpResponse::ok())
    }
}

#[test]
fn test_pre_in_order_post_in_reverse() {
    let log: Log = Arc::default();
    let pipeline = Pipeline::through(vec![
        step("m1", &log, false),
        step("m2", &log, false),
        step("m3", &log, false),
    ]);

    let mut ctx = RequestContext::new(HttpMethod::GET, "/");
    let response = pipeline.run(&mut ctx, &recording_endpoint(&log)).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        *log.lock(),
        vec!["m1-pre", "m2-pre", "m3-pre", "handler", "m3-post", "m2-post", "m1-post"]
    );
}

#[test]
fn test_short_circuit_skips_rest_of_chain() {
    let log: Log = Arc::default();
    let pipeline = Pipeline::through(vec![
        step("m1", &log, false),
        step("m2", &log, true),
        step("m3", &log, false),
    ]);

    let mut ctx = RequestContext::new(HttpMethod::GET, "/");
    let response = pipeline.run(&mut ctx, &recording_endpoint(&log)).unwrap();
    assert_eq!(response.status, 401);
    assert_eq!(*log.lock(), vec!["m1-pre", "m2-pre", "m2-post", "m1-post"]);
}

#[test]
fn test_named_middleware_lifecycle_follows_binding() {
    let log: Log = Arc::default();
    let container = Container::new();
    {
        let log = log.clone();
        container.bind_middleware("step.transient", false, move |_| {
            log.lock().push("built".to_string());
            Ok(middleware_fn(|ctx, next| next.run(ctx)))
        });
    }

    let refs = vec![MiddlewareRef::from("step.transient")];
    Pipeline::resolve(&refs, &container).unwrap();
    Pipeline::resolve(&refs, &container).unwrap();
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn test_builtin_stack_through_kernel() {
    let container = Container::new();
    container.middleware_instance("request_id", RequestIdMiddleware);
    container.middleware_instance("trace", TraceMiddleware::new());
    container.middleware_instance(
        "throttle",
        RateLimitMiddleware::new(RateLimitConfig {
            limit: 1,
            window_secs: 60,
        }),
    );

    let mut router = Router::new();
    router
        .group("/api", ["request_id", "trace", "throttle"], |r| {
            r.get(
                "/ping",
                HandlerRef::function(|ctx: &mut RequestContext, _: &RouteParams| {
                    let id = ctx.state.get::<RequestId>().map(|id| id.0.clone());
                    Ok(serde_json::json!({"pong": true, "request_id": id}))
                }),
            )?;
            Ok(())
        })
        .unwrap();

    let kernel = Kernel::boot(router, container)
        .with_middleware(MiddlewareRef::instance(CorsMiddleware::new(CorsConfig::default())));

    let ctx = RequestContext::new(HttpMethod::GET, "/api/ping")
        .with_header("x-request-id", "req-1")
        .with_header("Origin", "https://app.example");
    let response = kernel.dispatch(ctx);
    assert_eq!(response.status, 200);
    assert_eq!(response.header("x-request-id"), Some("req-1"));
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("https://app.example"));
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["request_id"], "req-1");

    let response = kernel.dispatch(RequestContext::new(HttpMethod::GET, "/api/ping"));
    assert_eq!(response.status, 429);
    assert!(response.header("Retry-After").is_some());
}
