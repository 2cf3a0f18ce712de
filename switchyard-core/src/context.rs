//! Per-request context threaded through the middleware pipeline.
//!
//! A [`RequestContext`] is the normalized view of an inbound request that the
//! kernel needs: method, path, headers, query, body and, once a route has
//! matched, the extracted route parameters. Anything a middleware wants to
//! hand to later layers (an authenticated principal, a request id) goes into
//! the context's [`ContextState`] rather than into ambient storage, so it is
//! dropped together with the context when the response has been produced.

use crate::routing::RouteParams;
use crate::{Error, HttpMethod};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::net::IpAddr;

/// Normalized request handed to [`crate::Kernel::dispatch`]
#[derive(Debug)]
pub struct RequestContext {
    pub method: HttpMethod,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Vec<u8>,
    pub params: RouteParams,
    pub remote_addr: Option<IpAddr>,
    pub state: ContextState,
}

impl RequestContext {
    /// Create a context from a method and a request target.
    ///
    /// Anything after `?` in `target` is parsed as a percent-encoded query
    /// string.
    pub fn new(method: HttpMethod, target: impl AsRef<str>) -> Self {
        let target = target.as_ref();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, HashMap::new()),
        };

        Self {
            method,
            path: path.to_string(),
            headers: HashMap::new(),
            query,
            body: Vec::new(),
            params: RouteParams::default(),
            remote_addr: None,
            state: ContextState::default(),
        }
    }

    /// Adapt an `http::Request` coming from the transport.
    pub fn from_http(request: http::Request<Vec<u8>>) -> Result<Self, Error> {
        let (parts, body) = request.into_parts();
        let method = HttpMethod::try_from(&parts.method)?;
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let mut ctx = Self::new(method, target);
        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                ctx.headers.insert(name.as_str().to_string(), value.to_string());
            }
        }
        ctx.body = body;
        Ok(ctx)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Get a route parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Get a query parameter by name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Parse the request body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::BadRequest(e.to_string()))
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

/// Request-scoped scratch state.
///
/// Holds typed values (one per type) and string-keyed JSON values.
#[derive(Default)]
pub struct ContextState {
    typed: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    values: HashMap<String, Value>,
}

impl ContextState {
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.typed
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.typed
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn take<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.typed
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.values.is_empty()
    }
}

impl std::fmt::Debug for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextState")
            .field("typed", &self.typed.len())
            .field("values", &self.values)
            .finish()
    }
}
