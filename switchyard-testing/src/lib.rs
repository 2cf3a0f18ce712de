//! Testing utilities for Switchyard.
//!
//! Drives a booted [`Kernel`](switchyard_core::Kernel) in-process, with no
//! transport and no runtime.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use switchyard_core::{Container, HandlerRef, Kernel, RequestContext, RouteParams, Router};
//! use switchyard_testing::*;
//!
//! let mut router = Router::new();
//! router
//!     .get("/hello/{name}", HandlerRef::function(|_: &mut RequestContext, params: &RouteParams| {
//!         Ok(format!("Hello, {}!", params.get("name").unwrap_or("stranger")))
//!     }))
//!     .unwrap();
//!
//! let client = TestClient::new(Arc::new(Kernel::boot(router, Container::new())));
//! let response = client.get("/hello/ada");
//!
//! assert_status(&response, 200);
//! assert_body_contains(&response, "Hello, ada!");
//! ```
//!
//! ## Custom Requests
//!
//! ```
//! # use std::sync::Arc;
//! # use switchyard_core::{Container, HttpMethod, Kernel, Router};
//! # use switchyard_testing::*;
//! # let client = TestClient::new(Arc::new(Kernel::boot(Router::new(), Container::new())));
//! let request = client
//!     .request(HttpMethod::POST, "/api/posts")
//!     .bearer("secret")
//!     .query("draft", "true")
//!     .json(&serde_json::json!({"title": "First"}))
//!     .unwrap();
//!
//! let response = client.send(request);
//! assert_status(&response, 404);
//! ```

mod assertions;
mod test_client;

pub use assertions::{
    assert_body_contains, assert_client_error, assert_header, assert_json,
    assert_json_content_type, assert_server_error, assert_status, assert_success,
};
pub use test_client::{TestClient, TestRequestBuilder, TestResponse};
