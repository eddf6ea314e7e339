//! Request validation tests

use pretty_assertions::assert_eq;

use social_server::application::dto::request::{CreatePostRequest, RegisterRequest};
use social_server::shared::validation::parse_body;
use social_server::shared::AppError;

fn fields(err: AppError) -> Vec<String> {
    match err {
        AppError::Validation(details) => details.into_iter().map(|d| d.field).collect(),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn empty_body_reports_every_required_field() {
    let err = parse_body::<RegisterRequest>(b"  ").unwrap_err();

    assert_eq!(fields(err), vec!["displayName", "email", "password", "username"]);
}

#[test]
fn valid_registration_parses() {
    let body = br#"{"username":"ada_l","email":"ada@example.com","password":"correct horse","displayName":"Ada"}"#;

    let req = parse_body::<RegisterRequest>(body).unwrap();
    assert_eq!(req.display_name, "Ada");
}

#[test]
fn malformed_json_is_reported_on_body() {
    let err = parse_body::<RegisterRequest>(b"{\"username\":").unwrap_err();

    assert_eq!(fields(err), vec!["body"]);
}

#[test]
fn oversized_post_is_rejected() {
    let body = serde_json::json!({ "content": "x".repeat(5001) }).to_string();

    let err = parse_body::<CreatePostRequest>(body.as_bytes()).unwrap_err();
    assert_eq!(fields(err), vec!["content"]);
}
