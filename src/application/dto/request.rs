//! Request DTOs
//!
//! Data structures for API request bodies and query strings. Every struct
//! tolerates missing fields at the serde level; absent required fields
//! surface as validation details, not a body parse error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::{RsvpStatus, Visibility};
use crate::shared::error::AppError;
use crate::shared::pagination::PageLimits;

/// Suggestions returned when the client does not ask for a count.
pub const DEFAULT_SUGGESTIONS: i64 = 10;

/// Registration request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 64, message = "Display name must be 1-64 characters"))]
    pub display_name: String,
}

/// Login request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Email verification confirmation
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmVerificationRequest {
    #[validate(length(min = 1, max = 128, message = "Token is required"))]
    pub token: String,
}

/// Profile update. An empty string clears an optional field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64, message = "Display name must be 1-64 characters"))]
    pub display_name: Option<String>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,

    #[validate(custom(function = "validate_optional_url"))]
    pub avatar_url: Option<String>,

    #[validate(custom(function = "validate_optional_url"))]
    pub cover_url: Option<String>,

    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,

    #[validate(custom(function = "validate_optional_url"))]
    pub website: Option<String>,
}

/// `?cursor=&limit=` on list endpoints
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PageQuery {
    #[validate(length(max = 64, message = "Cursor is too long"))]
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// Notification list query
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationQuery {
    #[validate(length(max = 64, message = "Cursor is too long"))]
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

/// Suggestions query
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SuggestionQuery {
    pub limit: Option<i64>,
}

impl SuggestionQuery {
    /// Clamped like every other page size, with its own default.
    pub fn page_size(&self, limits: PageLimits) -> usize {
        let limits = PageLimits {
            default: DEFAULT_SUGGESTIONS,
            ..limits
        };
        usize::try_from(limits.clamp(self.limit)).unwrap_or(1)
    }
}

/// Create post request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: String,

    #[validate(length(max = 10, message = "At most 10 media attachments are allowed"))]
    pub media_urls: Vec<String>,

    #[validate(custom(function = "validate_visibility"))]
    pub visibility: Option<String>,
}

impl CreatePostRequest {
    pub fn visibility(&self) -> Visibility {
        self.visibility
            .as_deref()
            .and_then(parse_visibility)
            .unwrap_or_default()
    }
}

/// Update post request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: Option<String>,

    #[validate(custom(function = "validate_visibility"))]
    pub visibility: Option<String>,
}

impl UpdatePostRequest {
    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility.as_deref().and_then(parse_visibility)
    }
}

/// Create comment request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
}

/// Send friend request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct FriendRequestBody {
    #[validate(custom(function = "validate_id"))]
    pub user_id: String,
}

/// Open a direct conversation
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[validate(custom(function = "validate_id"))]
    pub participant_id: String,
}

/// Send message request. Content may be empty only when media is attached.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(max = 4000, message = "Content must be at most 4000 characters"))]
    pub content: String,

    #[validate(custom(function = "validate_optional_url"))]
    pub media_url: Option<String>,
}

/// Create event request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    #[validate(required(message = "Start time is required"))]
    pub starts_at: Option<DateTime<Utc>>,

    pub ends_at: Option<DateTime<Utc>>,
}

/// RSVP request. Defaults to `going` when no status is given.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendRequest {
    #[validate(custom(function = "validate_rsvp_status"))]
    pub status: Option<String>,
}

impl AttendRequest {
    pub fn status(&self) -> RsvpStatus {
        self.status
            .as_deref()
            .and_then(RsvpStatus::from_db)
            .unwrap_or(RsvpStatus::Going)
    }
}

/// Report content request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[validate(custom(function = "validate_report_target"))]
    pub target_type: String,

    #[validate(custom(function = "validate_id"))]
    pub target_id: String,

    #[validate(length(min = 1, max = 64, message = "Reason must be 1-64 characters"))]
    pub reason: String,

    #[validate(length(max = 1000, message = "Details must be at most 1000 characters"))]
    pub details: Option<String>,
}

/// `GET /search` query
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 100, message = "Query must be 1-100 characters"))]
    pub q: String,

    #[serde(rename = "type")]
    #[validate(custom(function = "validate_search_type"))]
    pub kind: Option<String>,

    #[validate(length(max = 64, message = "Cursor is too long"))]
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// Parse an id sent as a decimal string.
pub fn parse_id(field: &str, raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::invalid_field(field, "Invalid id"))
}

fn parse_visibility(raw: &str) -> Option<Visibility> {
    match raw {
        "public" => Some(Visibility::Public),
        "friends" => Some(Visibility::Friends),
        "private" => Some(Visibility::Private),
        _ => None,
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if !(3..=32).contains(&len) {
        return Err(invalid("length", "Username must be 3-32 characters"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            "username",
            "Username may only contain letters, numbers and underscores",
        ));
    }
    Ok(())
}

fn validate_optional_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > 2048 || !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(invalid("url", "Must be an http(s) URL"));
    }
    Ok(())
}

fn validate_visibility(value: &str) -> Result<(), ValidationError> {
    parse_visibility(value)
        .map(|_| ())
        .ok_or_else(|| invalid("visibility", "Visibility must be public, friends or private"))
}

fn validate_rsvp_status(value: &str) -> Result<(), ValidationError> {
    RsvpStatus::from_db(value)
        .map(|_| ())
        .ok_or_else(|| invalid("status", "Status must be going or interested"))
}

fn validate_report_target(value: &str) -> Result<(), ValidationError> {
    match value {
        "post" | "comment" | "user" => Ok(()),
        _ => Err(invalid("target_type", "Target type must be post, comment or user")),
    }
}

fn validate_search_type(value: &str) -> Result<(), ValidationError> {
    match value {
        "users" | "posts" => Ok(()),
        _ => Err(invalid("type", "Type must be users or posts")),
    }
}

fn validate_id(value: &str) -> Result<(), ValidationError> {
    match value.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(()),
        _ => Err(invalid("id", "Invalid id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::validation::{parse_body, parse_query};
    use test_case::test_case;

    #[test_case("ab" ; "too short")]
    #[test_case("has space" ; "space")]
    #[test_case("émile" ; "non ascii")]
    fn test_username_rejected(username: &str) {
        assert!(validate_username(username).is_err());
    }

    #[test]
    fn test_username_accepted() {
        assert!(validate_username("jane_doe42").is_ok());
    }

    #[test]
    fn test_empty_register_body_reports_every_field() {
        let err = parse_body::<RegisterRequest>(b"{}").unwrap_err();
        let AppError::Validation(details) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["displayName", "email", "password", "username"]);
    }

    #[test]
    fn test_post_visibility_defaults_to_public() {
        let req: CreatePostRequest = parse_body(br#"{"content": "hello"}"#).unwrap();
        assert_eq!(req.visibility(), Visibility::Public);
    }

    #[test]
    fn test_unknown_visibility_is_a_field_error() {
        let err = parse_body::<CreatePostRequest>(br#"{"content": "x", "visibility": "secret"}"#)
            .unwrap_err();
        let AppError::Validation(details) = err else {
            panic!("expected validation error");
        };
        assert_eq!(details[0].field, "visibility");
    }

    #[test]
    fn test_empty_url_clears_field() {
        let req: UpdateProfileRequest = parse_body(br#"{"website": ""}"#).unwrap();
        assert_eq!(req.website.as_deref(), Some(""));
    }

    #[test_case("12", Some(12))]
    #[test_case(" 7 ", Some(7))]
    #[test_case("0", None)]
    #[test_case("abc", None)]
    fn test_parse_id(raw: &str, expected: Option<i64>) {
        assert_eq!(parse_id("userId", raw).ok(), expected);
    }

    #[test_case("", 10)]
    #[test_case("?limit=5", 5)]
    #[test_case("?limit=500", 50)]
    #[test_case("?limit=0", 1)]
    #[test_case("?limit=-3", 1)]
    fn test_suggestion_limit_is_clamped(query: &str, expected: usize) {
        let uri: axum::http::Uri = format!("/users/suggestions{}", query).parse().unwrap();
        let parsed: SuggestionQuery = parse_query(&uri).unwrap();
        assert_eq!(parsed.page_size(PageLimits::default()), expected);
    }

    #[test]
    fn test_attend_defaults_to_going() {
        let req: AttendRequest = parse_body(b"").unwrap();
        assert_eq!(req.status(), RsvpStatus::Going);
    }
}
