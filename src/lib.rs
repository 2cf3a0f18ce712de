// Switchyard - a request-dispatch kernel for Rust
//
// Route matching, onion-style middleware and a dependency-injection
// container, composed into a synchronous kernel that any transport can call.

// Re-export core functionality
pub use switchyard_core::*;

#[cfg(feature = "testing")]
pub use switchyard_testing;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Action,
        Arguments,
        Concrete,
        Container,
        Controller,
        ControllerRoutes,
        Error,
        HandlerRef,
        HttpMethod,
        HttpResponse,
        Injectable,
        Kernel,
        KernelConfig,
        Middleware,
        MiddlewareRef,
        Next,
        Parameter,
        Reply,
        RequestContext,
        Resolver,
        RouteGroup,
        RouteParams,
        Router,
        ServiceProvider,
        middleware_fn,
    };
    pub use crate::logging::{debug, error, info, trace, warn};
    pub use crate::middleware::{
        AuthConfig, AuthMiddleware, CorsConfig, CorsMiddleware, Principal, RateLimitConfig,
        RateLimitMiddleware,
    };
}
