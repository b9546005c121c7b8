//! Store address parsing
//!
//! Accepts the address shapes a deployment is likely to carry around in
//! configuration: `host`, `host:port` or a full connection URL.

use crate::store::error::{StoreError, StoreResult};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6379;

const URL_SCHEMES: &[&str] = &["redis", "rediss", "redis+unix", "unix"];

/// Location of the backing key-value store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAddress {
    /// Plain TCP endpoint
    HostPort { host: String, port: u16 },
    /// Connection URL passed through to the client untouched
    Url(String),
}

impl StoreAddress {
    /// Address for `host` on the default port
    pub fn host(host: &str) -> StoreResult<Self> {
        Self::host_port(host, DEFAULT_PORT)
    }

    pub fn host_port(host: &str, port: u16) -> StoreResult<Self> {
        validate_host(host, host)?;
        if port == 0 {
            return Err(invalid(host, "port must be greater than 0"));
        }
        Ok(StoreAddress::HostPort {
            host: host.to_string(),
            port,
        })
    }

    /// Connection URL understood by the redis client
    pub fn to_url(&self) -> String {
        match self {
            StoreAddress::HostPort { host, port } => format!("redis://{}:{}/", host, port),
            StoreAddress::Url(url) => url.clone(),
        }
    }
}

impl Default for StoreAddress {
    fn default() -> Self {
        StoreAddress::HostPort {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for StoreAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreAddress::HostPort { host, port } => write!(f, "{}:{}", host, port),
            StoreAddress::Url(url) => write!(f, "{}", url),
        }
    }
}

impl FromStr for StoreAddress {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = s.trim();
        if address.is_empty() {
            return Err(invalid(s, "address cannot be empty"));
        }

        if let Some((scheme, rest)) = address.split_once("://") {
            if !URL_SCHEMES.contains(&scheme) {
                return Err(invalid(
                    s,
                    &format!(
                        "unsupported scheme '{}' (expected one of: {})",
                        scheme,
                        URL_SCHEMES.join(", ")
                    ),
                ));
            }
            if rest.is_empty() {
                return Err(invalid(s, "URL has no host or path"));
            }
            return Ok(StoreAddress::Url(address.to_string()));
        }

        // Bracketed IPv6 literals keep their colons inside the brackets
        match address.rsplit_once(':') {
            Some((host, port))
                if !host.is_empty() && (!host.contains(':') || host.ends_with(']')) =>
            {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid(s, &format!("'{}' is not a valid port", port)))?;
                StoreAddress::host_port(host, port).map_err(|_| invalid(s, "invalid host or port"))
            }
            Some(_) => Err(invalid(s, "expected 'host', 'host:port' or a redis:// URL")),
            None => StoreAddress::host(address),
        }
    }
}

fn validate_host(host: &str, original: &str) -> StoreResult<()> {
    if host.is_empty() {
        return Err(invalid(original, "host cannot be empty"));
    }
    if host.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(invalid(
            original,
            "host cannot contain whitespace or path separators",
        ));
    }
    Ok(())
}

fn invalid(address: &str, reason: &str) -> StoreError {
    StoreError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}
