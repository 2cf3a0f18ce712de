// CORS (Cross-Origin Resource Sharing)

use super::{Middleware, Next};
use crate::logging::trace;
use crate::{Error, HttpMethod, HttpResponse, RequestContext};
use serde::{Deserialize, Serialize};

/// Configuration for [`CorsMiddleware`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any origin
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<HttpMethod>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds; 0 omits the header
    pub max_age: u64,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                HttpMethod::GET,
                HttpMethod::POST,
                HttpMethod::PUT,
                HttpMethod::DELETE,
                HttpMethod::OPTIONS,
            ],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            exposed_headers: Vec::new(),
            max_age: 86400,
            allow_credentials: false,
        }
    }
}

impl CorsConfig {
    /// Restrict to the given origins
    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }
}

/// Adds CORS headers and answers preflight (`OPTIONS`) requests with 204
/// without running the rest of the chain.
#[derive(Debug, Clone, Default)]
pub struct CorsMiddleware {
    config: CorsConfig,
}

impl CorsMiddleware {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    /// The `Access-Control-Allow-Origin` value for a request, if any
    fn allowed_origin(&self, origin: Option<&str>) -> Option<String> {
        let any = self.config.allowed_origins.iter().any(|o| o == "*");
        match origin {
            None | Some("") => any.then(|| "*".to_string()),
            Some(origin) if any => Some(origin.to_string()),
            Some(origin) => self
                .config
                .allowed_origins
                .iter()
                .any(|o| o == origin)
                .then(|| origin.to_string()),
        }
    }

    fn apply(&self, mut response: HttpResponse, origin: Option<String>) -> HttpResponse {
        let config = &self.config;
        let Some(origin) = origin else {
            return response;
        };

        if origin != "*" {
            let vary = match response.header("Vary") {
                None => Some("Origin".to_string()),
                Some(existing)
                    if existing.split(',').any(|v| v.trim().eq_ignore_ascii_case("origin")) =>
                {
                    None
                }
                Some(existing) => Some(format!("{}, Origin", existing)),
            };
            if let Some(vary) = vary {
                response.set_header("Vary", vary);
            }
        }

        let methods: Vec<&str> = config.allowed_methods.iter().map(HttpMethod::as_str).collect();
        response = response
            .with_header("Access-Control-Allow-Origin", origin)
            .with_header("Access-Control-Allow-Methods", methods.join(", "))
            .with_header("Access-Control-Allow-Headers", config.allowed_headers.join(", "));

        if !config.exposed_headers.is_empty() {
            response = response
                .with_header("Access-Control-Expose-Headers", config.exposed_headers.join(", "));
        }
        if config.max_age > 0 {
            response = response.with_header("Access-Control-Max-Age", config.max_age.to_string());
        }
        if config.allow_credentials {
            response = response.with_header("Access-Control-Allow-Credentials", "true");
        }
        response
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
        let origin = self.allowed_origin(ctx.header("Origin"));

        if ctx.method == HttpMethod::OPTIONS {
            trace!(path = %ctx.path, "Answering CORS preflight");
            return Ok(self.apply(HttpResponse::no_content(), origin));
        }

        let response = next.run(ctx)?;
        Ok(self.apply(response, origin))
    }

    fn name(&self) -> &str {
        "cors"
    }
}
