// Request id propagation

use super::{Middleware, Next};
use crate::{Error, HttpResponse, RequestContext};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The id assigned to the current request, stored in the request state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Reuses an incoming `x-request-id` or generates a UUID v4, records it in
/// the context state and echoes it on the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
        let request_id = ctx
            .header(REQUEST_ID_HEADER)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        ctx.state.insert(RequestId(request_id.clone()));

        let response = next.run(ctx)?;
        Ok(response.with_header(REQUEST_ID_HEADER, request_id))
    }

    fn name(&self) -> &str {
        "request_id"
    }
}
