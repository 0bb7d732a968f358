//! Request body, query and path extractors that reject with `ApiError`
//! instead of axum's plain-text rejections.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const QUERY_PREFIX: &str = "Failed to deserialize query string: ";

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

/// Path parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            let detail = text.strip_prefix(JSON_DATA_PREFIX).unwrap_or(&text);
            data_error("Invalid request body", detail)
        }
        JsonRejection::JsonSyntaxError(err) => {
            ApiError::invalid_json(format!("Invalid JSON syntax: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Expected request with `Content-Type: application/json`")
        }
        JsonRejection::BytesRejection(err) => {
            ApiError::bad_request(format!("Failed to read request body: {}", err.body_text()))
        }
        other => {
            tracing::debug!("Unhandled JSON rejection: {}", other.body_text());
            ApiError::bad_request("Invalid request body")
        }
    }
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    let text = rejection.body_text();
    let detail = text.strip_prefix(QUERY_PREFIX).unwrap_or(&text);
    data_error("Invalid query parameters", detail)
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(err) => {
            ApiError::bad_request(format!("Invalid path parameter: {}", err.body_text()))
        }
        other => {
            tracing::error!("Path extraction failed: {}", other.body_text());
            ApiError::internal_server_error("Failed to read path parameters")
        }
    }
}

/// Serde data errors (wrong type, unknown enum variant, missing field) are
/// validation failures. A leading `field: ` path becomes a field error.
fn data_error(message: &str, detail: &str) -> ApiError {
    let field_errors = detail
        .split_once(": ")
        .filter(|(path, _)| !path.is_empty() && !path.contains(char::is_whitespace))
        .map(|(path, problem)| HashMap::from([(path.to_string(), problem.to_string())]));

    ApiError::validation_error(format!("{}: {}", message, detail), field_errors)
}
