//! Upload kinds and their content policies.

use serde::Deserialize;

use crate::shared::error::AppError;

const MB: u64 = 1024 * 1024;

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

const VIDEO_TYPES: &[(&str, &str)] = &[("video/mp4", "mp4"), ("video/webm", "webm")];

const DOCUMENT_TYPES: &[(&str, &str)] = &[("application/pdf", "pdf")];

/// What an uploaded file is for. Selects the allow-list and size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Avatar,
    Cover,
    Post,
    Message,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Cover => "cover",
            Self::Post => "post",
            Self::Message => "message",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avatar" => Some(Self::Avatar),
            "cover" => Some(Self::Cover),
            "post" => Some(Self::Post),
            "message" => Some(Self::Message),
            _ => None,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        match self {
            Self::Avatar => 5 * MB,
            Self::Cover => 10 * MB,
            Self::Post => 50 * MB,
            Self::Message => 25 * MB,
        }
    }

    fn allowed(&self) -> impl Iterator<Item = &'static (&'static str, &'static str)> {
        let (video, documents): (&[_], &[_]) = match self {
            Self::Avatar | Self::Cover => (&[], &[]),
            Self::Post => (VIDEO_TYPES, &[]),
            Self::Message => (VIDEO_TYPES, DOCUMENT_TYPES),
        };
        IMAGE_TYPES.iter().chain(video).chain(documents)
    }

    /// File extension for an allowed content type.
    pub fn extension_for(&self, content_type: &str) -> Option<&'static str> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed()
            .find(|(mime, _)| *mime == essence)
            .map(|(_, ext)| *ext)
    }

    /// Check type then size. Returns the extension to store under.
    pub fn check(&self, content_type: &str, size: u64) -> Result<&'static str, AppError> {
        let ext = self
            .extension_for(content_type)
            .ok_or_else(|| AppError::InvalidFileType(content_type.to_string()))?;
        if size > self.max_bytes() {
            return Err(AppError::FileTooLarge {
                max_bytes: self.max_bytes(),
            });
        }
        Ok(ext)
    }

    /// Largest limit across kinds; the request body limit is derived from it.
    pub fn largest_limit() -> u64 {
        [Self::Avatar, Self::Cover, Self::Post, Self::Message]
            .iter()
            .map(Self::max_bytes)
            .max()
            .unwrap_or(50 * MB)
    }
}

/// `<type>/<userId>/<id>.<ext>`
pub fn object_key(kind: UploadKind, user_id: i64, id: i64, ext: &str) -> String {
    format!("{}/{}/{}.{}", kind.as_str(), user_id, id, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(UploadKind::Avatar, "image/png", Some("png"))]
    #[test_case(UploadKind::Avatar, "video/mp4", None)]
    #[test_case(UploadKind::Post, "video/webm", Some("webm"))]
    #[test_case(UploadKind::Post, "application/pdf", None)]
    #[test_case(UploadKind::Message, "application/pdf", Some("pdf"))]
    #[test_case(UploadKind::Cover, "IMAGE/JPEG; charset=binary", Some("jpg"))]
    fn test_allow_lists(kind: UploadKind, content_type: &str, expected: Option<&str>) {
        assert_eq!(kind.extension_for(content_type), expected);
    }

    #[test]
    fn test_type_is_checked_before_size() {
        let err = UploadKind::Avatar.check("text/html", u64::MAX).unwrap_err();
        assert!(matches!(err, AppError::InvalidFileType(_)));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let max = UploadKind::Avatar.max_bytes();
        assert!(UploadKind::Avatar.check("image/png", max).is_ok());
        assert!(matches!(
            UploadKind::Avatar.check("image/png", max + 1),
            Err(AppError::FileTooLarge { max_bytes }) if max_bytes == max
        ));
    }

    #[test]
    fn test_object_key_layout() {
        assert_eq!(object_key(UploadKind::Post, 7, 99, "mp4"), "post/7/99.mp4");
        assert_eq!(UploadKind::largest_limit(), 50 * MB);
    }
}
