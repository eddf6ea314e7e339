//! Response Envelope
//!
//! The two canonical wire shapes:
//!
//! ```text
//! {"success": true,  "data": T, "meta"?: {...}}
//! {"success": false, "error": {"code", "message", "details"?}}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::error::{AppError, ErrorCode, FieldError};
use super::pagination::Page;

/// Optional list metadata. Only paginated endpoints attach it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Serialize)]
struct SuccessEnvelope<'a, T> {
    success: bool,
    data: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a ResponseMeta>,
}

#[derive(Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

/// Successful API response wrapped in the success envelope.
#[derive(Debug)]
pub struct ApiResponse<T> {
    data: T,
    meta: Option<ResponseMeta>,
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with `data`.
    pub fn success(data: T) -> Self {
        Self {
            data,
            meta: None,
            status: StatusCode::OK,
        }
    }

    /// 201 Created with `data`.
    pub fn created(data: T) -> Self {
        Self::success(data).with_status(StatusCode::CREATED)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn meta(&self) -> Option<&ResponseMeta> {
        self.meta.as_ref()
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Wrap a page of items, attaching cursor metadata.
    pub fn page(page: Page<T>) -> Self {
        let meta = page.meta();
        Self::success(page.items).with_meta(meta)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = SuccessEnvelope {
            success: true,
            data: &self.data,
            meta: self.meta.as_ref(),
        };

        match serde_json::to_vec(&envelope) {
            Ok(bytes) => (
                self.status,
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                bytes,
            )
                .into_response(),
            Err(e) => AppError::server_error(format!("Failed to serialize response: {}", e))
                .into_response(),
        }
    }
}

/// Build an error envelope response. Prefer the `AppError` constructors at call sites.
pub fn error_response(
    code: ErrorCode,
    message: impl Into<String>,
    status: StatusCode,
    details: Option<Vec<FieldError>>,
) -> Response {
    let envelope = ErrorEnvelope {
        success: false,
        error: ErrorBody {
            code,
            message: message.into(),
            details,
        },
    };

    (status, Json(envelope)).into_response()
}

/// Result type returned by every handler.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_omits_meta_when_absent() {
        let response = ApiResponse::success(json!({"id": "1"})).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body, json!({"success": true, "data": {"id": "1"}}));
    }

    #[tokio::test]
    async fn created_sets_status() {
        let response = ApiResponse::created("ok").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn meta_is_camel_cased_and_sparse() {
        let meta = ResponseMeta {
            cursor: Some("abc".into()),
            has_more: Some(true),
            ..Default::default()
        };
        let response = ApiResponse::success(vec![1, 2]).with_meta(meta).into_response();
        let body = body_json(response).await;

        assert_eq!(body["meta"], json!({"cursor": "abc", "hasMore": true}));
        assert!(body.get("error").is_none());
    }
}
