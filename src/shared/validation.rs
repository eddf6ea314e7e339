//! Validation Utilities
//!
//! All untrusted input passes through [`parse_body`] or [`parse_query`] before a
//! handler sees it. Failures carry one detail entry per failing field.

use axum::{extract::Query, http::Uri};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use super::error::{AppError, FieldError};

/// Deserialize and validate a JSON body.
///
/// Each top-level field is type-checked on its own, so a body with several
/// wrong-typed fields reports all of them next to the `validator` failures
/// of the fields that did deserialize.
pub fn parse_body<T>(bytes: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        bytes
    };

    let parsed: Value = serde_json::from_slice(raw)
        .map_err(|e| AppError::invalid_field("body", &describe_json_error(&e)))?;
    let Value::Object(mut fields) = parsed else {
        return Err(AppError::invalid_field("body", "Request body must be a JSON object"));
    };

    let mut details = type_errors::<T>(&fields);
    for detail in &details {
        fields.remove(&detail.field);
    }
    let mistyped: Vec<String> = details.iter().map(|d| d.field.clone()).collect();

    let value: T = serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::invalid_field("body", &describe_json_error(&e)))?;

    if let Err(errors) = value.validate() {
        details.extend(
            field_details(errors)
                .into_iter()
                .filter(|d| !mistyped.contains(&d.field)),
        );
    }

    if details.is_empty() {
        return Ok(value);
    }
    details.sort_by(|a, b| a.field.cmp(&b.field));
    Err(AppError::validation_error(details))
}

/// Deserialize each field alone against `T`. Only meaningful when `T`
/// accepts an empty object, i.e. every field has a serde default.
fn type_errors<T: DeserializeOwned>(fields: &Map<String, Value>) -> Vec<FieldError> {
    if serde_json::from_value::<T>(Value::Object(Map::new())).is_err() {
        return Vec::new();
    }

    fields
        .iter()
        .filter_map(|(name, value)| {
            let mut single = Map::new();
            single.insert(name.clone(), value.clone());
            serde_json::from_value::<T>(Value::Object(single))
                .err()
                .map(|e| FieldError::new(name.clone(), capitalize(&e.to_string())))
        })
        .collect()
}

/// Deserialize and validate the query string of `uri`.
pub fn parse_query<T>(uri: &Uri) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let Query(value) = Query::<T>::try_from_uri(uri)
        .map_err(|e| AppError::invalid_field("query", &e.body_text()))?;

    value.validate().map_err(validation_error)?;
    Ok(value)
}

/// Convert validator errors into a `VALIDATION_ERROR` listing every field.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut details = field_details(errors);
    details.sort_by(|a, b| a.field.cmp(&b.field));
    AppError::validation_error(details)
}

fn field_details(errors: ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = to_camel_case(&field);
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                FieldError::new(field.clone(), message)
            })
        })
        .collect()
}

fn describe_json_error(err: &serde_json::Error) -> String {
    use serde_json::error::Category;

    match err.classify() {
        Category::Syntax | Category::Eof => "Malformed JSON body".into(),
        Category::Data => err.to_string(),
        Category::Io => "Unreadable request body".into(),
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(default, rename_all = "camelCase")]
    struct Sample {
        #[validate(length(min = 1, message = "Display name is required"))]
        display_name: String,
        #[validate(range(min = 1, max = 10, message = "Count must be between 1 and 10"))]
        count: i64,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                display_name: String::new(),
                count: 0,
            }
        }
    }

    #[test]
    fn reports_every_failing_field() {
        let err = parse_body::<Sample>(br#"{}"#).unwrap_err();
        let AppError::Validation(details) = err else {
            panic!("expected validation error");
        };

        assert_eq!(
            details,
            vec![
                FieldError::new("count", "Count must be between 1 and 10"),
                FieldError::new("displayName", "Display name is required"),
            ]
        );
    }

    #[test]
    fn empty_body_is_treated_as_empty_object() {
        let err = parse_body::<Sample>(b"  ").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref d) if d.len() == 2));
    }

    #[test]
    fn malformed_json_reports_body() {
        let err = parse_body::<Sample>(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref d) if d[0].field == "body"));
    }

    #[test]
    fn every_mistyped_field_is_named() {
        let err = parse_body::<Sample>(br#"{"displayName": 5, "count": "three"}"#).unwrap_err();
        let AppError::Validation(details) = err else {
            panic!("expected validation error");
        };

        let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["count", "displayName"]);
        assert!(details[0].message.starts_with("Invalid type"));
    }

    #[test]
    fn mistyped_and_invalid_fields_are_reported_together() {
        let err = parse_body::<Sample>(br#"{"displayName": "", "count": true}"#).unwrap_err();
        let AppError::Validation(details) = err else {
            panic!("expected validation error");
        };

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "count");
        assert!(details[0].message.starts_with("Invalid type"));
        assert_eq!(details[1], FieldError::new("displayName", "Display name is required"));
    }

    #[test]
    fn non_object_body_reports_body() {
        let err = parse_body::<Sample>(b"[1, 2]").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref d) if d.len() == 1 && d[0].field == "body"));
    }

    #[test]
    fn valid_query_is_returned() {
        let uri: Uri = "/x?displayName=ann&count=3".parse().unwrap();
        let sample: Sample = parse_query(&uri).unwrap();
        assert_eq!(sample.display_name, "ann");
        assert_eq!(sample.count, 3);
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_camel_case("media_urls"), "mediaUrls");
        assert_eq!(to_camel_case("content"), "content");
    }
}
