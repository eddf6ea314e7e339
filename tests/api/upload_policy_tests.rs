//! Upload policy tests

use pretty_assertions::assert_eq;
use test_case::test_case;

use social_server::domain::{object_key, UploadKind};
use social_server::shared::AppError;

const MB: u64 = 1024 * 1024;

#[test_case("avatar", 5 * MB)]
#[test_case("cover", 10 * MB)]
#[test_case("post", 50 * MB)]
#[test_case("message", 25 * MB)]
fn size_limits_per_kind(raw: &str, limit: u64) {
    let kind = UploadKind::parse(raw).unwrap();

    assert!(kind.check("image/png", limit).is_ok());
    assert!(matches!(
        kind.check("image/png", limit + 1),
        Err(AppError::FileTooLarge { max_bytes }) if max_bytes == limit
    ));
}

#[test]
fn unknown_kind_is_not_parsed() {
    assert_eq!(UploadKind::parse("banner"), None);
}

#[test]
fn pdf_only_allowed_in_messages() {
    assert!(UploadKind::parse("message").unwrap().check("application/pdf", 1).is_ok());
    assert!(matches!(
        UploadKind::parse("post").unwrap().check("application/pdf", 1),
        Err(AppError::InvalidFileType(_))
    ));
}

#[test]
fn key_layout() {
    let kind = UploadKind::parse("post").unwrap();
    assert_eq!(object_key(kind, 42, 9001, "webm"), "post/42/9001.webm");
}
