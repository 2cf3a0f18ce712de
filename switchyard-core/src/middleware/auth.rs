// Credential check on an authorization header

use super::{Middleware, Next};
use crate::logging::debug;
use crate::{Error, HttpResponse, RequestContext};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Configuration for [`AuthMiddleware`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the credential
    pub header: String,
    /// Required scheme prefix (e.g. `Bearer`); `None` takes the whole value
    pub scheme: Option<String>,
    /// Accepted tokens; empty accepts any non-empty credential
    pub tokens: Vec<String>,
    /// Realm advertised in `WWW-Authenticate`
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: "Authorization".to_string(),
            scheme: Some("Bearer".to_string()),
            tokens: Vec::new(),
            realm: "switchyard".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    pub fn with_scheme(mut self, scheme: Option<&str>) -> Self {
        self.scheme = scheme.map(str::to_string);
        self
    }
}

/// The authenticated caller, stored in the request state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub token: String,
}

/// Rejects requests without a valid credential with 401.
///
/// On success a [`Principal`] is inserted into the context state for later
/// middleware and handlers.
#[derive(Debug, Clone, Default)]
pub struct AuthMiddleware {
    config: AuthConfig,
}

impl AuthMiddleware {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    fn extract<'r>(&self, ctx: &'r RequestContext) -> Option<&'r str> {
        let value = ctx.header(&self.config.header)?.trim();
        let token = match &self.config.scheme {
            Some(scheme) => {
                let (given, rest) = value.split_once(char::is_whitespace)?;
                if !given.eq_ignore_ascii_case(scheme) {
                    return None;
                }
                rest.trim()
            }
            None => value,
        };
        (!token.is_empty()).then_some(token)
    }

    fn accepts(&self, token: &str) -> bool {
        self.config.tokens.is_empty() || self.config.tokens.iter().any(|t| t == token)
    }

    fn reject(&self, reason: &str) -> Result<HttpResponse, Error> {
        let challenge = match &self.config.scheme {
            Some(scheme) => format!("{} realm=\"{}\"", scheme, self.config.realm),
            None => format!("realm=\"{}\"", self.config.realm),
        };
        Ok(HttpResponse::unauthorized()
            .with_json(&json!({ "error": reason, "status": 401 }))?
            .with_header("WWW-Authenticate", challenge))
    }
}

impl Middleware for AuthMiddleware {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
        let token = match self.extract(ctx) {
            Some(token) => token.to_string(),
            None => {
                debug!(path = %ctx.path, "Missing credential");
                return self.reject("No credential provided");
            }
        };

        if !self.accepts(&token) {
            debug!(path = %ctx.path, "Invalid credential");
            return self.reject("Invalid credential");
        }

        ctx.state.insert(Principal { token });
        next.run(ctx)
    }

    fn name(&self) -> &str {
        "auth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;
    use std::sync::Arc;

    fn run(auth: AuthMiddleware, ctx: &mut RequestContext) -> HttpResponse {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(auth)];
        let endpoint = |ctx: &mut RequestContext| -> Result<HttpResponse, Error> {
            let principal = ctx.state.get::<Principal>().map(|p| p.token.clone());
            Ok(HttpResponse::text(principal.unwrap_or_default()))
        };
        Next::new(&chain, &endpoint).run(ctx).unwrap()
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let mut ctx = RequestContext::new(HttpMethod::GET, "/posts/1");
        let response = run(AuthMiddleware::default(), &mut ctx);

        assert_eq!(response.status, 401);
        assert_eq!(response.header("www-authenticate"), Some("Bearer realm=\"switchyard\""));
        assert!(ctx.state.get::<Principal>().is_none());
    }

    #[test]
    fn test_bearer_token_accepted() {
        let mut ctx = RequestContext::new(HttpMethod::GET, "/")
            .with_header("authorization", "Bearer abc123");
        let response = run(AuthMiddleware::default(), &mut ctx);

        assert_eq!(response.status, 200);
        assert_eq!(response.body_str(), Some("abc123"));
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let mut ctx =
            RequestContext::new(HttpMethod::GET, "/").with_header("Authorization", "Basic abc");
        assert_eq!(run(AuthMiddleware::default(), &mut ctx).status, 401);

        let mut ctx =
            RequestContext::new(HttpMethod::GET, "/").with_header("Authorization", "Bearer");
        assert_eq!(run(AuthMiddleware::default(), &mut ctx).status, 401);
    }

    #[test]
    fn test_token_allow_list() {
        let auth = AuthMiddleware::new(AuthConfig::default().with_token("good"));

        let mut ctx =
            RequestContext::new(HttpMethod::GET, "/").with_header("Authorization", "Bearer bad");
        assert_eq!(run(auth.clone(), &mut ctx).status, 401);

        let mut ctx =
            RequestContext::new(HttpMethod::GET, "/").with_header("Authorization", "bearer good");
        assert_eq!(run(auth, &mut ctx).status, 200);
    }

    #[test]
    fn test_custom_header_without_scheme() {
        let config = AuthConfig {
            header: "X-Api-Key".to_string(),
            ..AuthConfig::default()
        }
        .with_scheme(None);

        let mut ctx = RequestContext::new(HttpMethod::GET, "/").with_header("x-api-key", "k1");
        let response = run(AuthMiddleware::new(config), &mut ctx);
        assert_eq!(response.body_str(), Some("k1"));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: AuthConfig = serde_json::from_str(r#"{"tokens": ["t"]}"#).unwrap();
        assert_eq!(config.header, "Authorization");
        assert_eq!(config.tokens, vec!["t"]);
    }
}
