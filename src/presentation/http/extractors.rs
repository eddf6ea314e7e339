//! Custom Extractors
//!
//! Body, query and path extractors that run untrusted input through the
//! validation layer and reject with a `VALIDATION_ERROR` envelope.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, RawPathParams, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::application::dto::parse_id;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_body, parse_query};

/// A JSON body that deserialized and passed validation.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::invalid_field("body", &e.body_text()))?;

        Ok(Self(parse_body(&bytes)?))
    }
}

/// A query string that deserialized and passed validation.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parse_query(&parts.uri)?))
    }
}

/// The single id segment of a route such as `/posts/{postId}`.
///
/// A non-numeric or non-positive id is a validation failure on the
/// segment's name.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub i64);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::server_error(format!("Path parameters unavailable: {}", e)))?;

        let (name, raw) = params
            .iter()
            .next()
            .ok_or_else(|| AppError::server_error("Route has no path parameter"))?;

        Ok(Self(parse_id(name, raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::request::CreateCommentRequest;
    use axum::{body::Body, http::StatusCode, response::IntoResponse, routing::post, Router};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn echo(PathId(id): PathId, ValidatedJson(body): ValidatedJson<CreateCommentRequest>) -> impl IntoResponse {
        format!("{}:{}", id, body.content)
    }

    fn app() -> Router {
        Router::new().route("/posts/{postId}/comments", post(echo))
    }

    async fn call(uri: &str, body: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_path_and_body_reach_handler() {
        let (status, body) = call("/posts/42/comments", r#"{"content":"hi"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "42:hi");
    }

    #[tokio::test]
    async fn bad_path_id_names_the_segment() {
        let (status, body) = call("/posts/abc/comments", r#"{"content":"hi"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(r#""field":"postId""#));
    }

    #[tokio::test]
    async fn empty_body_reports_missing_field() {
        let (status, body) = call("/posts/1/comments", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(r#""field":"content""#));
    }
}
