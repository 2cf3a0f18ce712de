// Allow/block lists on the client address

use super::{Middleware, Next};
use crate::logging::debug;
use crate::{Error, HttpResponse, RequestContext};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::IpAddr;

/// Configuration for [`IpAccessMiddleware`].
///
/// Entries are exact addresses, CIDR blocks (`10.0.0.0/8`, `fd00::/8`) or
/// wildcard patterns (`192.168.*.*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpAccessConfig {
    /// When non-empty, only matching clients get through
    pub allowed: Vec<String>,
    /// Matching clients are always denied
    pub blocked: Vec<String>,
}

#[derive(Debug, Clone)]
enum IpRule {
    Cidr { network: IpAddr, bits: u8 },
    Pattern(Regex),
}

impl IpRule {
    fn parse(entry: &str) -> Result<Self, Error> {
        let entry = entry.trim();
        if let Some((network, bits)) = entry.split_once('/') {
            let network: IpAddr = network
                .parse()
                .map_err(|_| Error::Config(format!("invalid CIDR network `{}`", entry)))?;
            let max = if network.is_ipv4() { 32 } else { 128 };
            let bits: u8 = bits
                .parse()
                .ok()
                .filter(|bits| *bits <= max)
                .ok_or_else(|| Error::Config(format!("invalid CIDR prefix length `{}`", entry)))?;
            return Ok(IpRule::Cidr { network, bits });
        }

        let expr = format!("^{}$", regex::escape(entry).replace(r"\*", ".*"));
        Regex::new(&expr)
            .map(IpRule::Pattern)
            .map_err(|e| Error::Config(format!("invalid address pattern `{}`: {}", entry, e)))
    }

    fn matches(&self, addr: IpAddr) -> bool {
        match (self, addr) {
            (IpRule::Cidr { network: IpAddr::V4(net), bits }, IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(*bits)).unwrap_or(0);
                u32::from(ip) & mask == u32::from(*net) & mask
            }
            (IpRule::Cidr { network: IpAddr::V6(net), bits }, IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(*bits)).unwrap_or(0);
                u128::from(ip) & mask == u128::from(*net) & mask
            }
            (IpRule::Cidr { .. }, _) => false,
            (IpRule::Pattern(regex), addr) => regex.is_match(&addr.to_string()),
        }
    }
}

/// Denies requests with 403 based on the client address.
///
/// The block list is checked first. A request without a known remote address
/// is denied whenever an allow list is configured.
#[derive(Debug, Clone)]
pub struct IpAccessMiddleware {
    allowed: Vec<IpRule>,
    blocked: Vec<IpRule>,
}

impl IpAccessMiddleware {
    /// Compile the configured lists; malformed entries are a config error.
    pub fn new(config: &IpAccessConfig) -> Result<Self, Error> {
        let compile = |entries: &[String]| -> Result<Vec<IpRule>, Error> {
            entries.iter().map(|entry| IpRule::parse(entry)).collect()
        };
        Ok(Self {
            allowed: compile(&config.allowed)?,
            blocked: compile(&config.blocked)?,
        })
    }

    /// Whether a client is let through
    pub fn permits(&self, addr: Option<IpAddr>) -> bool {
        match addr {
            Some(addr) => {
                if self.blocked.iter().any(|rule| rule.matches(addr)) {
                    return false;
                }
                self.allowed.is_empty() || self.allowed.iter().any(|rule| rule.matches(addr))
            }
            None => self.allowed.is_empty(),
        }
    }
}

impl Middleware for IpAccessMiddleware {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
        if !self.permits(ctx.remote_addr) {
            debug!(client = ?ctx.remote_addr, path = %ctx.path, "Client address denied");
            return HttpResponse::forbidden().with_json(&json!({ "error": "Access Denied", "status": 403 }));
        }
        next.run(ctx)
    }

    fn name(&self) -> &str {
        "ip_access"
    }
}
