//! Hashtag extraction.

/// Longest tag kept; longer runs are truncated.
pub const MAX_TAG_LENGTH: usize = 100;

/// Tags per post.
pub const MAX_TAGS: usize = 30;

/// Distinct lowercase hashtags in `content`, in order of first appearance,
/// without the leading `#`. A tag is `#` followed by letters, digits or `_`
/// and must not be preceded by a word character (so `a#b` is not a tag).
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut tags: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '#' || (i > 0 && is_tag_char(chars[i - 1])) {
            i += 1;
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < chars.len() && is_tag_char(chars[end]) {
            end += 1;
        }

        let tag: String = chars[start..end]
            .iter()
            .take(MAX_TAG_LENGTH)
            .flat_map(|c| c.to_lowercase())
            .collect();
        if !tag.is_empty() && !tag.chars().all(|c| c == '_') && !tags.contains(&tag) {
            tags.push(tag);
            if tags.len() == MAX_TAGS {
                break;
            }
        }

        i = end.max(start);
    }

    tags
}

/// Normalize a search term like `#Rust` or `rust` to the stored form.
pub fn normalize_tag(term: &str) -> Option<String> {
    let tag: String = term
        .trim()
        .trim_start_matches('#')
        .chars()
        .take_while(|c| is_tag_char(*c))
        .flat_map(char::to_lowercase)
        .collect();
    (!tag.is_empty()).then_some(tag)
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("no tags here", &[])]
    #[test_case("#Rust is #fun", &["rust", "fun"])]
    #[test_case("#rust #RUST #Rust", &["rust"])]
    #[test_case("email@x#nottag and #ok", &["ok"])]
    #[test_case("#snake_case, #tag2!", &["snake_case", "tag2"])]
    #[test_case("## #", &[])]
    #[test_case("#café", &["café"])]
    fn test_extract(content: &str, expected: &[&str]) {
        assert_eq!(extract_hashtags(content), expected);
    }

    #[test]
    fn test_tag_count_is_capped() {
        let content: String = (0..50).map(|i| format!("#t{} ", i)).collect();
        assert_eq!(extract_hashtags(&content).len(), MAX_TAGS);
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("#Rust"), Some("rust".to_string()));
        assert_eq!(normalize_tag("  tokio  "), Some("tokio".to_string()));
        assert_eq!(normalize_tag("#"), None);
    }
}
