use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::access::policy::UnknownRolePolicy;
use crate::access::routes::{Destinations, RouteTable, RouteTableError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub access: AccessConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection for user-scoped queries; row-level security applies.
    pub url: Option<String>,
    /// Service-role connection that bypasses row-level security.
    pub admin_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// Verify the backend-issued access token locally with the shared secret.
    Jwt,
    /// Ask the identity backend who the token belongs to.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub cookie_name: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    pub owner_paths: Vec<String>,
    pub team_member_paths: Vec<String>,
    pub bypass_paths: Vec<String>,
    pub auth_page: String,
    pub team_auth_page: String,
    pub owner_home: String,
    pub team_home: String,
    pub unknown_role: UnknownRolePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Invalid route table: {0}")]
    Routes(#[from] RouteTableError),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("AGENCY_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_ADMIN_URL") {
            self.database.admin_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        // Identity overrides
        match env::var("IDENTITY_MODE").as_deref() {
            Ok("remote") => self.identity.mode = IdentityMode::Remote,
            Ok("jwt") => self.identity.mode = IdentityMode::Jwt,
            _ => {}
        }
        if let Ok(v) = env::var("IDENTITY_JWT_SECRET") {
            self.identity.jwt_secret = v;
        }
        if let Ok(v) = env::var("IDENTITY_JWT_AUDIENCE") {
            self.identity.jwt_audience = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("IDENTITY_URL") {
            self.identity.url = Some(v);
        }
        if let Ok(v) = env::var("IDENTITY_API_KEY") {
            self.identity.api_key = Some(v);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.identity.cookie_name = v;
        }
        if let Ok(v) = env::var("IDENTITY_TIMEOUT_SECS") {
            self.identity.timeout_secs = v.parse().unwrap_or(self.identity.timeout_secs);
        }

        // Access overrides
        if let Ok(v) = env::var("ACCESS_OWNER_PATHS") {
            self.access.owner_paths = split_list(&v);
        }
        if let Ok(v) = env::var("ACCESS_TEAM_PATHS") {
            self.access.team_member_paths = split_list(&v);
        }
        if let Ok(v) = env::var("ACCESS_BYPASS_PATHS") {
            self.access.bypass_paths = split_list(&v);
        }
        if let Ok(v) = env::var("ACCESS_AUTH_PAGE") {
            self.access.auth_page = v;
        }
        if let Ok(v) = env::var("ACCESS_TEAM_AUTH_PAGE") {
            self.access.team_auth_page = v;
        }
        if let Ok(v) = env::var("ACCESS_OWNER_HOME") {
            self.access.owner_home = v;
        }
        if let Ok(v) = env::var("ACCESS_TEAM_HOME") {
            self.access.team_home = v;
        }
        if let Ok(v) = env::var("ACCESS_UNKNOWN_ROLE_POLICY") {
            match v.parse() {
                Ok(policy) => self.access.unknown_role = policy,
                Err(e) => tracing::warn!("Ignoring ACCESS_UNKNOWN_ROLE_POLICY: {}", e),
            }
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        self
    }

    /// Checks that must pass before the server accepts traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.identity.mode {
            IdentityMode::Jwt if self.identity.jwt_secret.is_empty() => {
                return Err(ConfigError::Missing("IDENTITY_JWT_SECRET"));
            }
            IdentityMode::Remote => {
                let url = self.identity.url.as_deref().ok_or(ConfigError::Missing("IDENTITY_URL"))?;
                url::Url::parse(url).map_err(|e| ConfigError::Invalid {
                    key: "IDENTITY_URL",
                    message: e.to_string(),
                })?;
            }
            IdentityMode::Jwt => {}
        }

        if self.identity.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "SESSION_COOKIE_NAME",
                message: "must not be empty".to_string(),
            });
        }

        self.access.route_table()?;
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                admin_url: None,
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            identity: IdentityConfig::default(),
            access: AccessConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                secure_cookies: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                admin_url: None,
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            identity: IdentityConfig::default(),
            access: AccessConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                secure_cookies: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                admin_url: None,
                max_connections: 50,
                acquire_timeout_secs: 5,
            },
            identity: IdentityConfig {
                timeout_secs: 3,
                ..IdentityConfig::default()
            },
            access: AccessConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                secure_cookies: true,
            },
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Jwt,
            jwt_secret: String::new(),
            jwt_audience: Some("authenticated".to_string()),
            url: None,
            api_key: None,
            cookie_name: "sb-access-token".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        let routes = RouteTable::default();
        let d = routes.destinations();
        Self {
            owner_paths: strings(&["/dashboard", "/clients", "/team", "/payments", "/settings"]),
            team_member_paths: strings(&["/team-dashboard", "/projects", "/tasks"]),
            bypass_paths: strings(&["/api", "/auth/callback", "/health", "/_next", "/static", "/favicon.ico"]),
            auth_page: routes.auth_page().to_string(),
            team_auth_page: routes.team_auth_page().to_string(),
            owner_home: d.owner_home.clone(),
            team_home: d.team_home.clone(),
            unknown_role: UnknownRolePolicy::default(),
        }
    }
}

impl AccessConfig {
    /// Build the validated route table. Login destinations are the auth pages.
    pub fn route_table(&self) -> Result<RouteTable, RouteTableError> {
        RouteTable::new(
            self.owner_paths.clone(),
            self.team_member_paths.clone(),
            self.bypass_paths.clone(),
            self.auth_page.clone(),
            self.team_auth_page.clone(),
            Destinations {
                owner_login: self.auth_page.clone(),
                team_login: self.team_auth_page.clone(),
                owner_home: self.owner_home.clone(),
                team_home: self.team_home.clone(),
            },
        )
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
