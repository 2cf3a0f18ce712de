// Kernel configuration

use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_SERVER_HEADER: &str = "SWITCHYARD_SERVER_HEADER";
pub const ENV_EXPOSE_ERRORS: &str = "SWITCHYARD_EXPOSE_ERRORS";
pub const ENV_DEBUG: &str = "SWITCHYARD_DEBUG";

/// Settings the dispatcher applies to every response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Value of the `Server` header; `None` leaves it off
    pub server_header: Option<String>,
    /// Include the error kind in error bodies
    pub expose_errors: bool,
    /// Content type for raw-body replies
    pub raw_content_type: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            server_header: Some("switchyard".to_string()),
            expose_errors: false,
            raw_content_type: "text/plain; charset=utf-8".to_string(),
        }
    }
}

impl KernelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `SWITCHYARD_*` environment variables
    pub fn from_env() -> Self {
        Self::default().overlay(|key| env::var(key).ok())
    }

    /// Overlay values from a variable lookup.
    ///
    /// An empty `SWITCHYARD_SERVER_HEADER` disables the header. Either
    /// `SWITCHYARD_EXPOSE_ERRORS` or `SWITCHYARD_DEBUG` set to a truthy value
    /// turns on error exposure.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup(ENV_SERVER_HEADER) {
            let server = server.trim();
            self.server_header = (!server.is_empty()).then(|| server.to_string());
        }
        if [ENV_EXPOSE_ERRORS, ENV_DEBUG]
            .iter()
            .any(|key| lookup(*key).is_some_and(|v| is_truthy(&v)))
        {
            self.expose_errors = true;
        }
        self
    }

    pub fn server_header(mut self, value: Option<&str>) -> Self {
        self.server_header = value.map(str::to_string);
        self
    }

    pub fn expose_errors(mut self, expose: bool) -> Self {
        self.expose_errors = expose;
        self
    }

    pub fn raw_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.raw_content_type = content_type.into();
        self
    }
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
