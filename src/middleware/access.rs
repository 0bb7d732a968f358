use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::access::{resolve_request, Decision, RouteClass};
use crate::app::AppState;

/// Runs the access policy in front of every route.
///
/// Bypass and unclassified paths pass through without touching the identity
/// backend. Everything else resolves the session once, stores it in the
/// request extensions for the handlers, and either continues or answers with
/// a temporary redirect.
pub async fn access_policy_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let class = state.policy.classify(&path);

    if matches!(class, RouteClass::Bypass | RouteClass::Other) {
        return next.run(request).await;
    }

    let session = resolve_request(state.sessions.as_ref(), state.memberships.as_ref(), request.headers()).await;
    let decision = state.policy.evaluate(&path, session.state());
    tracing::debug!("Access decision for {} ({:?}): {:?}", path, class, decision);

    match decision {
        Decision::Allow => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Decision::Redirect(target) => Redirect::temporary(state.policy.routes().url(target)).into_response(),
    }
}
