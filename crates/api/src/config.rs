//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;
use uuid::Uuid;

use fieldops_core::OrganizationId;

const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingJwtSecret,

    #[error("BIND_ADDR '{0}' is not a socket address")]
    InvalidBindAddr(String),

    #[error("TENANT_SUBDOMAINS entry '{0}' must look like 'subdomain=<uuid>'")]
    InvalidTenantMapping(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    /// Selects the Postgres store when set; otherwise everything is in memory.
    pub database_url: Option<String>,
    /// Seed for the in-memory organization resolver.
    pub tenant_subdomains: Vec<(String, OrganizationId)>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_subdomains", &self.tenant_subdomains)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let production = lookup("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if production => return Err(ConfigError::MissingJwtSecret),
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let raw_bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_bind.clone()))?;

        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());

        let tenant_subdomains = match lookup("TENANT_SUBDOMAINS") {
            Some(raw) => parse_tenant_subdomains(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            jwt_secret,
            bind_addr,
            database_url,
            tenant_subdomains,
        })
    }
}

/// Parse `acme=<uuid>,globex=<uuid>`. Blank entries are skipped.
pub fn parse_tenant_subdomains(raw: &str) -> Result<Vec<(String, OrganizationId)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ConfigError::InvalidTenantMapping(entry.to_string());
            let (sub, id) = entry.split_once('=').ok_or_else(invalid)?;
            let sub = sub.trim().to_lowercase();
            if sub.is_empty() {
                return Err(invalid());
            }
            let id = Uuid::parse_str(id.trim()).map_err(|_| invalid())?;
            Ok((sub, OrganizationId::from_uuid(id)))
        })
        .collect()
}
