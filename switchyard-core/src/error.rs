// Error types for the Switchyard kernel

use crate::HttpMethod;
use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: HttpMethod, path: String },

    #[error("Method not allowed: {method} {path} (allowed: {})", join_methods(.allowed))]
    MethodNotAllowed {
        method: HttpMethod,
        path: String,
        allowed: Vec<HttpMethod>,
    },

    #[error("Unresolvable dependency `{key}`: {reason}")]
    UnresolvableDependency { key: String, reason: String },

    #[error("Circular dependency: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("Invalid middleware: {0}")]
    InvalidMiddleware(String),

    #[error("Handler invocation failed: {0}")]
    HandlerInvocation(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // 4xx errors raised deliberately by handlers and middleware
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequests(String),
}

fn join_methods(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Wrap an arbitrary failure coming out of a handler or middleware body.
    pub fn handler(err: impl std::fmt::Display) -> Self {
        Error::HandlerInvocation(err.to_string())
    }

    pub(crate) fn unresolvable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnresolvableDependency {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Get the HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Error::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,

            // Configuration and programmer errors are fatal
            Error::UnresolvableDependency { .. }
            | Error::CircularDependency { .. }
            | Error::InvalidMiddleware(_)
            | Error::HandlerInvocation(_)
            | Error::InvalidRoute(_)
            | Error::Serialization(_)
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    /// Short machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Error::RouteNotFound { .. } => "RouteNotFound",
            Error::MethodNotAllowed { .. } => "MethodNotAllowed",
            Error::UnresolvableDependency { .. } => "UnresolvableDependency",
            Error::CircularDependency { .. } => "CircularDependency",
            Error::InvalidMiddleware(_) => "InvalidMiddleware",
            Error::HandlerInvocation(_) => "HandlerInvocationError",
            Error::InvalidRoute(_) => "InvalidRoute",
            Error::Serialization(_) => "Serialization",
            Error::Config(_) => "Config",
            Error::BadRequest(_) => "BadRequest",
            Error::Unauthorized(_) => "Unauthorized",
            Error::Forbidden(_) => "Forbidden",
            Error::TooManyRequests(_) => "TooManyRequests",
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
