//! Declarative route tables
//!
//! A [`RouteManifest`] describes routes as data, typically deserialized from
//! a config file by the embedding application. Handler names are looked up
//! in a [`HandlerRegistry`] when the manifest is loaded, so an unknown name
//! fails at boot rather than on the first request.
//!
//! ```
//! use switchyard_core::{HandlerRef, HandlerRegistry, RouteManifest, Router};
//!
//! let manifest = RouteManifest::from_json(r#"{
//!     "groups": [{
//!         "prefix": "/api",
//!         "middleware": ["auth"],
//!         "routes": [{"method": "GET", "path": "/posts/{id}", "handler": "posts.show"}]
//!     }]
//! }"#).unwrap();
//!
//! let registry = HandlerRegistry::new()
//!     .with("posts.show", HandlerRef::function(|_, params| Ok(params.get("id").unwrap_or_default().to_string())));
//!
//! let mut router = Router::new();
//! router.load_manifest(&manifest, &registry).unwrap();
//! assert_eq!(router.routes()[0].path(), "/api/posts/{id}");
//! ```

use super::{HandlerRef, Router};
use crate::logging::debug;
use crate::middleware::MiddlewareRef;
use crate::{Error, HttpMethod};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single route entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub method: HttpMethod,
    pub path: String,
    /// Key into the [`HandlerRegistry`]
    pub handler: String,
    /// Named middleware, resolved through the container per request
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A group of routes sharing a prefix and middleware
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupManifest {
    pub prefix: String,
    pub middleware: Vec<String>,
    pub routes: Vec<RouteEntry>,
    pub groups: Vec<GroupManifest>,
}

/// A complete route table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteManifest {
    /// Top-level routes, registered before any group
    pub routes: Vec<RouteEntry>,
    pub groups: Vec<GroupManifest>,
}

impl RouteManifest {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidRoute(format!("malformed route manifest: {}", e)))
    }
}

/// Handler lookup by name
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerRef>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, handler: impl Into<HandlerRef>) -> Self {
        self.insert(name, handler);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: impl Into<HandlerRef>) {
        self.handlers.insert(name.into(), handler.into());
    }

    pub fn get(&self, name: &str) -> Option<&HandlerRef> {
        self.handlers.get(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Router {
    /// Register every route in `manifest`, returning how many were added
    pub fn load_manifest(
        &mut self,
        manifest: &RouteManifest,
        registry: &HandlerRegistry,
    ) -> Result<usize, Error> {
        let before = self.len();
        self.load_entries(&manifest.routes, registry)?;
        for group in &manifest.groups {
            self.load_group(group, registry)?;
        }

        let added = self.len() - before;
        debug!(route_count = added, "Route manifest loaded");
        Ok(added)
    }

    fn load_group(&mut self, group: &GroupManifest, registry: &HandlerRegistry) -> Result<(), Error> {
        let middleware = group.middleware.iter().map(|key| MiddlewareRef::named(key.as_str()));
        self.group(&group.prefix, middleware, |router| {
            router.load_entries(&group.routes, registry)?;
            for nested in &group.groups {
                router.load_group(nested, registry)?;
            }
            Ok(())
        })
    }

    fn load_entries(&mut self, entries: &[RouteEntry], registry: &HandlerRegistry) -> Result<(), Error> {
        for entry in entries {
            let handler = registry.get(&entry.handler).cloned().ok_or_else(|| {
                Error::InvalidRoute(format!(
                    "unknown handler `{}` for {} {}",
                    entry.handler, entry.method, entry.path
                ))
            })?;

            let route = self.add_route(entry.method, &entry.path, handler)?;
            for key in &entry.middleware {
                route.middleware(key.as_str());
            }
            if let Some(name) = &entry.name {
                route.name(name.as_str());
            }
        }
        Ok(())
    }
}
