//! Response envelope tests

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use social_server::shared::{ApiResponse, AppError, FieldError, Page};

use crate::common::{body_json, Row};

#[tokio::test]
async fn success_wraps_data() {
    let response = ApiResponse::created(json!({ "id": "7" })).into_response();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "data": { "id": "7" } })
    );
}

#[tokio::test]
async fn page_carries_cursor_metadata() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let rows = vec![
        Row { id: 3, at },
        Row { id: 2, at },
        Row { id: 1, at },
    ];
    let page = Page::from_overfetch(rows, 2).map(|r| r.id);

    let body = body_json(ApiResponse::page(page).into_response()).await;

    assert_eq!(body["data"], json!([3, 2]));
    assert_eq!(body["meta"]["hasMore"], true);
    assert_eq!(body["meta"]["cursor"], format!("{}_2", at.timestamp_micros()));
}

#[test_case(AppError::unauthorized(), StatusCode::UNAUTHORIZED, "UNAUTHORIZED")]
#[test_case(AppError::forbidden(), StatusCode::FORBIDDEN, "FORBIDDEN")]
#[test_case(AppError::not_found("Post"), StatusCode::NOT_FOUND, "NOT_FOUND")]
#[test_case(AppError::already_exists("Post already liked"), StatusCode::CONFLICT, "ALREADY_EXISTS")]
#[test_case(AppError::InvalidFileType("text/plain".into()), StatusCode::BAD_REQUEST, "INVALID_FILE_TYPE")]
#[test_case(AppError::server_error("pool exhausted"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")]
#[tokio::test]
async fn errors_map_to_status_and_code(err: AppError, status: StatusCode, code: &str) {
    let response = err.into_response();

    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], code);
}

#[tokio::test]
async fn internal_error_detail_is_not_exposed() {
    let body = body_json(AppError::server_error("password=hunter2").into_response()).await;

    assert!(!body.to_string().contains("hunter2"));
}

#[tokio::test]
async fn validation_error_lists_fields() {
    let err = AppError::validation_error(vec![FieldError::new("email", "Invalid email format")]);
    let body = body_json(err.into_response()).await;

    assert_eq!(
        body["error"]["details"],
        json!([{ "field": "email", "message": "Invalid email format" }])
    );
}

#[tokio::test]
async fn rate_limit_error_sets_retry_after() {
    let response = AppError::rate_limit_error(30).into_response();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "30");
}
