//! Per-request session resolution.
//!
//! A request's session is resolved once: identify the user from the access
//! token the identity backend issued, then look up their membership. The
//! result is a plain [`ResolvedSession`] value handed to the access policy
//! and stored in the request extensions for the handlers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::policy::SessionState;
use crate::config::{ConfigError, IdentityConfig, IdentityMode};
use crate::database::manager::DatabaseError;
use crate::database::models::Membership;

/// The identity-backend user behind a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected identity backend response: {0}")]
    InvalidResponse(String),
}

/// Turns request credentials into a user. `Ok(None)` means no valid session;
/// `Err` means the backend could not answer.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError>;
}

/// Membership lookup by user id.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// The user's membership, preferring an active one when several exist.
    async fn find_membership(&self, user_id: Uuid) -> Result<Option<Membership>, DatabaseError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipLookup {
    Found(Membership),
    NotFound,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSession {
    Anonymous,
    Authenticated {
        user: SessionUser,
        membership: MembershipLookup,
    },
}

impl ResolvedSession {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            ResolvedSession::Anonymous => None,
            ResolvedSession::Authenticated { user, .. } => Some(user),
        }
    }

    pub fn membership(&self) -> Option<&Membership> {
        match self {
            ResolvedSession::Authenticated {
                membership: MembershipLookup::Found(m),
                ..
            } => Some(m),
            _ => None,
        }
    }

    /// Policy input: a role is only known for an active membership.
    pub fn state(&self) -> SessionState {
        match self {
            ResolvedSession::Anonymous => SessionState::NoSession,
            ResolvedSession::Authenticated { membership, .. } => SessionState::Session {
                role: match membership {
                    MembershipLookup::Found(m) => m.active_role(),
                    MembershipLookup::NotFound | MembershipLookup::Failed => None,
                },
            },
        }
    }
}

/// Resolve the session for one request. Never fails: a backend error is
/// treated as no session, a membership error as an unknown role.
pub async fn resolve_request(
    resolver: &dyn SessionResolver,
    memberships: &dyn MembershipStore,
    headers: &HeaderMap,
) -> ResolvedSession {
    let user = match resolver.resolve(headers).await {
        Ok(Some(user)) => user,
        Ok(None) => return ResolvedSession::Anonymous,
        Err(e) => {
            tracing::warn!("Session resolution failed, treating request as anonymous: {}", e);
            return ResolvedSession::Anonymous;
        }
    };

    let membership = match memberships.find_membership(user.id).await {
        Ok(Some(m)) => MembershipLookup::Found(m),
        Ok(None) => MembershipLookup::NotFound,
        Err(e) => {
            tracing::warn!("Membership lookup failed for user {}: {}", user.id, e);
            MembershipLookup::Failed
        }
    };

    ResolvedSession::Authenticated { user, membership }
}

/// Access token from the session cookie, falling back to a Bearer header.
pub fn extract_access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| cookie::Cookie::split_parse(raw.to_string()))
        .filter_map(Result::ok)
        .find(|c| c.name() == cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Claims of an identity-backend access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies HS256 access tokens locally with the backend's signing secret
pub struct JwtSessionResolver {
    key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl JwtSessionResolver {
    pub fn new(secret: &str, audience: Option<&str>, cookie_name: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cookie_name: cookie_name.into(),
        }
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        let Some(token) = extract_access_token(headers, &self.cookie_name) else {
            return Ok(None);
        };

        match decode::<AccessClaims>(&token, &self.key, &self.validation) {
            Ok(data) => Ok(Some(SessionUser {
                id: data.claims.sub,
                email: data.claims.email,
            })),
            Err(e) => {
                tracing::debug!("Rejected access token: {}", e);
                Ok(None)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    email: Option<String>,
}

/// Asks the hosted identity backend who owns the access token
pub struct RemoteSessionResolver {
    client: reqwest::Client,
    user_endpoint: url::Url,
    api_key: Option<String>,
    cookie_name: String,
}

impl RemoteSessionResolver {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        cookie_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid { key: "IDENTITY_URL", message };

        let base = url::Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        let user_endpoint = base.join("auth/v1/user").map_err(|e| invalid(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            user_endpoint,
            api_key,
            cookie_name: cookie_name.into(),
        })
    }
}

#[async_trait]
impl SessionResolver for RemoteSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        let Some(token) = extract_access_token(headers, &self.cookie_name) else {
            return Ok(None);
        };

        let mut request = self.client.get(self.user_endpoint.clone()).bearer_auth(token);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let user: RemoteUser = response
                    .json()
                    .await
                    .map_err(|e| SessionError::InvalidResponse(e.to_string()))?;
                Ok(Some(SessionUser { id: user.id, email: user.email }))
            }
            status => Err(SessionError::Unavailable(format!("status {}", status))),
        }
    }
}

/// Build the resolver selected by configuration.
pub fn resolver_from_config(config: &IdentityConfig) -> Result<Arc<dyn SessionResolver>, ConfigError> {
    match config.mode {
        IdentityMode::Jwt => {
            if config.jwt_secret.is_empty() {
                return Err(ConfigError::Missing("IDENTITY_JWT_SECRET"));
            }
            Ok(Arc::new(JwtSessionResolver::new(
                &config.jwt_secret,
                config.jwt_audience.as_deref(),
                config.cookie_name.clone(),
            )))
        }
        IdentityMode::Remote => {
            let url = config.url.as_deref().ok_or(ConfigError::Missing("IDENTITY_URL"))?;
            Ok(Arc::new(RemoteSessionResolver::new(
                url,
                config.api_key.clone(),
                config.cookie_name.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
    }
}
