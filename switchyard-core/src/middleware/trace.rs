// Structured request start/finish logging

use super::{Middleware, Next, RequestId};
use crate::logging::{error, info};
use crate::{Error, HttpResponse, RequestContext};
use std::time::Instant;

/// Logs each request on entry and on completion with its duration.
///
/// Place it after [`super::RequestIdMiddleware`] to get the request id in
/// the log lines.
#[derive(Debug, Clone, Default)]
pub struct TraceMiddleware {
    log_body: bool,
}

impl TraceMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log the request body size
    pub fn with_body(mut self) -> Self {
        self.log_body = true;
        self
    }
}

impl Middleware for TraceMiddleware {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
        let start = Instant::now();
        let method = ctx.method;
        let path = ctx.path.clone();
        let request_id = ctx.state.get::<RequestId>().map(|id| id.0.clone()).unwrap_or_default();

        if self.log_body {
            info!(
                method = %method,
                path = %path,
                request_id = %request_id,
                body_bytes = ctx.body.len(),
                "Request started"
            );
        } else {
            info!(method = %method, path = %path, request_id = %request_id, "Request started");
        }

        let result = next.run(ctx);
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(response) => info!(
                method = %method,
                path = %path,
                request_id = %request_id,
                status = response.status,
                duration_ms,
                "Request completed"
            ),
            Err(err) => error!(
                method = %method,
                path = %path,
                request_id = %request_id,
                duration_ms,
                error = %err,
                "Request failed"
            ),
        }

        result
    }

    fn name(&self) -> &str {
        "trace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;
    use std::sync::Arc;

    #[test]
    fn test_passes_result_through() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(TraceMiddleware::new().with_body())];

        let ok = |_: &mut RequestContext| -> Result<HttpResponse, Error> { Ok(HttpResponse::created()) };
        let mut ctx = RequestContext::new(HttpMethod::POST, "/items").with_body("{}");
        assert_eq!(Next::new(&chain, &ok).run(&mut ctx).unwrap().status, 201);

        let failing =
            |_: &mut RequestContext| -> Result<HttpResponse, Error> { Err(Error::handler("boom")) };
        let mut ctx = RequestContext::new(HttpMethod::GET, "/items");
        assert!(Next::new(&chain, &failing).run(&mut ctx).is_err());
    }
}
