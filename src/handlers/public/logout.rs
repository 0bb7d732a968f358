use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite};
use serde_json::json;

use crate::app::{AppState, SessionCookie};
use crate::middleware::ApiResponse;

/// POST /api/auth/logout - expire the session cookie. The token itself is
/// owned by the identity backend.
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = ApiResponse::success(json!({ "signed_out": true })).into_response();
    match HeaderValue::from_str(&expired_cookie(&state.cookie).to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!("Failed to build session cookie header: {}", e),
    }
    response
}

pub fn expired_cookie(settings: &SessionCookie) -> Cookie<'static> {
    Cookie::build((settings.name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}
