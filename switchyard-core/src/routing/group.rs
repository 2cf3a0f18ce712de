//! Route groups for organizing routes with shared configuration
//!
//! A group carries a path prefix and middleware that every route registered
//! inside it inherits. Nested groups concatenate prefixes outer-to-inner and
//! run the parent's middleware before their own.
//!
//! # Examples
//!
//! ```
//! use switchyard_core::RouteGroup;
//!
//! let api = RouteGroup::new().prefix("/api");
//! let v1 = RouteGroup::new().prefix("v1/").with_parent(&api);
//!
//! assert_eq!(v1.get_prefix(), "/api/v1");
//! assert_eq!(v1.apply_prefix("/users"), "/api/v1/users");
//! ```

use crate::middleware::MiddlewareRef;

/// Route group configuration
#[derive(Debug, Clone, Default)]
pub struct RouteGroup {
    /// Path prefix for all routes in this group
    prefix: String,

    /// Middleware applied to all routes, outermost first
    middleware: Vec<MiddlewareRef>,
}

impl RouteGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path prefix for this group.
    ///
    /// The prefix is normalized to start with `/` and not end with one, so
    /// `"api/"` becomes `"/api"` and `"/"` becomes the empty prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = if !prefix.starts_with('/') {
            format!("/{}", prefix)
        } else {
            prefix
        };
        self.prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// Add middleware to this group
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Add multiple middleware to this group
    pub fn with_middleware<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MiddlewareRef>,
    {
        self.middleware.extend(middleware.into_iter().map(Into::into));
        self
    }

    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get_middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    /// Apply the group's prefix to a path
    pub fn apply_prefix(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.to_string()
        } else {
            let path = path.trim_start_matches('/');
            if path.is_empty() {
                self.prefix.clone()
            } else {
                format!("{}/{}", self.prefix, path)
            }
        }
    }

    /// Combine this group with a parent group: prefixes concatenate and the
    /// parent's middleware comes first.
    pub fn with_parent(self, parent: &RouteGroup) -> Self {
        let mut middleware = parent.middleware.clone();
        middleware.extend(self.middleware);

        RouteGroup {
            prefix: format!("{}{}", parent.prefix, self.prefix),
            middleware,
        }
    }
}
