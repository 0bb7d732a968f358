use axum::{extract::FromRequestParts, http::request::Parts};

use crate::access::{authorize, resolve_request, Authorization, Requirement, ResolvedSession};
use crate::app::AppState;
use crate::error::ApiError;

/// The request's resolved session. Reuses the value the access middleware
/// stored; otherwise resolves it and stores it for later extractors.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub ResolvedSession);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<ResolvedSession>() {
            return Ok(CurrentSession(session.clone()));
        }

        let session = resolve_request(state.sessions.as_ref(), state.memberships.as_ref(), &parts.headers).await;
        parts.extensions.insert(session.clone());
        Ok(CurrentSession(session))
    }
}

macro_rules! access_extractor {
    ($(#[$doc:meta])* $name:ident, $requirement:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(pub Authorization);

        #[axum::async_trait]
        impl FromRequestParts<AppState> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
                let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
                authorize(&session, $requirement).map($name)
            }
        }
    };
}

access_extractor!(
    /// Any active member of an organization
    MemberAccess,
    Requirement::Member
);
access_extractor!(
    /// Owner or admin
    ManagerAccess,
    Requirement::Manager
);
access_extractor!(OwnerAccess, Requirement::Owner);
