// In-process test client

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use switchyard_core::{Error, HttpMethod, HttpResponse, Kernel, RequestContext};

/// Test client that dispatches requests straight into a booted [`Kernel`]
#[derive(Debug, Clone)]
pub struct TestClient {
    kernel: Arc<Kernel>,
    default_headers: HashMap<String, String>,
}

impl TestClient {
    pub fn new(kernel: Arc<Kernel>) -> Self {
        Self {
            kernel,
            default_headers: HashMap::new(),
        }
    }

    /// Send `name: value` with every request unless the request sets it
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn get(&self, path: &str) -> TestResponse {
        self.send(TestRequestBuilder::new(HttpMethod::GET, path))
    }

    pub fn post(&self, path: &str, body: impl Into<Vec<u8>>) -> TestResponse {
        self.send(TestRequestBuilder::new(HttpMethod::POST, path).body(body))
    }

    pub fn put(&self, path: &str, body: impl Into<Vec<u8>>) -> TestResponse {
        self.send(TestRequestBuilder::new(HttpMethod::PUT, path).body(body))
    }

    pub fn patch(&self, path: &str, body: impl Into<Vec<u8>>) -> TestResponse {
        self.send(TestRequestBuilder::new(HttpMethod::PATCH, path).body(body))
    }

    pub fn delete(&self, path: &str) -> TestResponse {
        self.send(TestRequestBuilder::new(HttpMethod::DELETE, path))
    }

    /// Start building a request with a custom method
    pub fn request(&self, method: HttpMethod, path: &str) -> TestRequestBuilder {
        TestRequestBuilder::new(method, path)
    }

    /// Dispatch a built request
    pub fn send(&self, request: TestRequestBuilder) -> TestResponse {
        let mut ctx = request.build();
        for (name, value) in &self.default_headers {
            if ctx.header(name).is_none() {
                ctx.headers.insert(name.clone(), value.clone());
            }
        }
        TestResponse::new(self.kernel.dispatch(ctx))
    }
}

/// Builder for test requests
#[derive(Debug, Clone)]
pub struct TestRequestBuilder {
    method: HttpMethod,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    query_params: Vec<(String, String)>,
    remote_addr: Option<IpAddr>,
}

impl TestRequestBuilder {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
            query_params: Vec::new(),
            remote_addr: None,
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Shorthand for a bearer `Authorization` header
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and content type
    pub fn json<T: serde::Serialize>(mut self, data: &T) -> Result<Self, Error> {
        self.body = serde_json::to_vec(data)?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Add a query parameter; values are percent-encoded on build
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Build the request context
    pub fn build(self) -> RequestContext {
        let target = match serde_urlencoded::to_string(&self.query_params) {
            Ok(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path,
        };

        let mut ctx = RequestContext::new(self.method, target).with_body(self.body);
        ctx.headers = self.headers;
        ctx.remote_addr = self.remote_addr;
        ctx
    }
}

/// Response from a test request
#[derive(Debug, Clone, PartialEq)]
pub struct TestResponse {
    response: HttpResponse,
}

impl TestResponse {
    pub fn new(response: HttpResponse) -> Self {
        Self { response }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Case-insensitive header lookup
    pub fn header(&self, key: &str) -> Option<&str> {
        self.response.header(key)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.response.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.response.body
    }

    /// Body as text; invalid UTF-8 is replaced
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.response.body).into_owned()
    }

    pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.response.body)?)
    }

    pub fn into_inner(self) -> HttpResponse {
        self.response
    }
}

impl From<HttpResponse> for TestResponse {
    fn from(response: HttpResponse) -> Self {
        Self::new(response)
    }
}
